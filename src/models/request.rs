use serde::{Deserialize, Serialize};

use super::Mode;

/// Body of `POST /analyze`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl AnalyzeRequest {
    pub fn new(text: impl Into<String>, mode: Option<Mode>) -> Self {
        Self {
            text: Some(text.into()),
            mode: mode.map(|m| m.wire_key().to_string()),
        }
    }

    pub fn resolved_mode(&self) -> Mode {
        Mode::resolve(self.mode.as_deref())
    }

    /// The submitted text, or `None` when absent or blank.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}
