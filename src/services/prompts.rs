use std::collections::HashMap;

use tracing::debug;

use crate::models::Mode;

/// Used when `DEFAULT` is not configured.
pub const BUILTIN_DEFAULT_PROMPT: &str = "You are a legal assistant. Read the following text and \
respond clearly and accurately in plain language.";

/// Mode-keyed prompt templates, configured out of band.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    default: String,
    by_mode: HashMap<Mode, String>,
}

impl PromptTemplates {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            by_mode: HashMap::new(),
        }
    }

    pub fn with_template(mut self, mode: Mode, template: impl Into<String>) -> Self {
        let template = template.into();
        if mode == Mode::Default {
            self.default = template;
        } else {
            self.by_mode.insert(mode, template);
        }
        self
    }

    /// Reads `DEFAULT`, `SUMMARY_PROMPT`, `SECTION_WISE_SUMMARY_PROMPT` and `CHATBOT`.
    /// Blank values count as unset.
    pub fn from_source<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |mode: Mode| lookup(mode.env_var()).filter(|value| !value.trim().is_empty());

        let mut templates = Self::new(
            read(Mode::Default).unwrap_or_else(|| BUILTIN_DEFAULT_PROMPT.to_string()),
        );
        for mode in [Mode::Quick, Mode::Sectioned, Mode::Chat] {
            if let Some(template) = read(mode) {
                templates = templates.with_template(mode, template);
            }
        }
        templates
    }

    /// Template for `mode`, falling back to the default when the mode has none.
    pub fn select(&self, mode: Mode) -> &str {
        match self.by_mode.get(&mode) {
            Some(template) => template,
            None => {
                if mode != Mode::Default {
                    debug!(mode = %mode, "No template configured for mode, using default");
                }
                &self.default
            }
        }
    }

    pub fn default_template(&self) -> &str {
        &self.default
    }

    pub fn has_template(&self, mode: Mode) -> bool {
        mode == Mode::Default || self.by_mode.contains_key(&mode)
    }
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self::new(BUILTIN_DEFAULT_PROMPT)
    }
}
