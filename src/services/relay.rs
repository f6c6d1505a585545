use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::error::AppResult;
use crate::models::{Mode, NO_RESPONSE};
use crate::services::prompts::PromptTemplates;
use crate::services::provider::GenerativeProvider;

/// Stateless core of `POST /analyze`: template selection plus one provider call.
pub struct RelayService {
    provider: Arc<dyn GenerativeProvider>,
    templates: PromptTemplates,
}

impl RelayService {
    pub fn new(provider: Arc<dyn GenerativeProvider>, templates: PromptTemplates) -> Self {
        Self {
            provider,
            templates,
        }
    }

    /// Always yields a string on success; an empty provider answer becomes
    /// [`NO_RESPONSE`]. Provider failures propagate without retry.
    pub async fn analyze(&self, text: &str, mode: Mode) -> AppResult<String> {
        let start = Instant::now();
        let template = self.templates.select(mode);

        let reply = self.provider.generate(template, text).await?;
        let result = match reply {
            Some(reply) => reply,
            None => {
                warn!(mode = %mode, "Provider produced no candidate, returning placeholder");
                NO_RESPONSE.to_string()
            }
        };

        info!(
            mode = %mode,
            text_chars = text.len(),
            result_chars = result.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Analysis relayed"
        );
        Ok(result)
    }

    pub fn templates(&self) -> &PromptTemplates {
        &self.templates
    }

    pub fn is_ready(&self) -> bool {
        self.provider.is_configured()
    }
}
