use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::{Config, GenerationSettings};
use crate::error::{AppError, AppResult};

/// A generative-language backend the relay forwards prompts to.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Sends `template` and `text` as a two-part user turn.
    ///
    /// `Ok(None)` means the provider answered but produced no usable
    /// candidate; callers degrade that to a placeholder.
    async fn generate(&self, template: &str, text: &str) -> AppResult<Option<String>>;

    fn is_configured(&self) -> bool {
        true
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

impl From<GenerationSettings> for GenerationConfig {
    fn from(settings: GenerationSettings) -> Self {
        Self {
            temperature: settings.temperature,
            top_k: settings.top_k,
            top_p: settings.top_p,
            max_output_tokens: settings.max_output_tokens,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, all parts concatenated.
    fn first_candidate_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiProvider {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    generation: GenerationSettings,
}

impl GeminiProvider {
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.provider_timeout())
            .build()
            .map_err(|e| AppError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.provider_url.clone(),
            api_key: config.provider_api_key.clone(),
            generation: config.generation,
        })
    }
}

#[async_trait]
impl GenerativeProvider for GeminiProvider {
    async fn generate(&self, template: &str, text: &str) -> AppResult<Option<String>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::config("GEMINI_API_KEY is not set"))?;

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: template }, Part { text }],
            }],
            generation_config: self.generation.into(),
        };

        let start = Instant::now();
        info!(
            template_chars = template.len(),
            text_chars = text.len(),
            "Forwarding prompt to provider"
        );

        let response = self
            .client
            .post(&self.url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Provider request failed");
                AppError::from(e)
            })?;

        let status = response.status();
        let payload = response.text().await.map_err(AppError::from)?;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        if !status.is_success() {
            warn!(status = %status, elapsed_ms, "Provider returned an error status");
            return Err(AppError::ProviderRejected {
                status: status.as_u16(),
                message: truncate_for_log(&payload),
            });
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&payload).map_err(|e| AppError::ProviderMalformed {
                message: e.to_string(),
            })?;

        let reply = parsed.first_candidate_text();
        debug!(elapsed_ms, has_reply = reply.is_some(), "Provider call completed");
        Ok(reply)
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

fn truncate_for_log(payload: &str) -> String {
    const LIMIT: usize = 512;
    if payload.chars().count() <= LIMIT {
        payload.to_string()
    } else {
        let mut cut: String = payload.chars().take(LIMIT).collect();
        cut.push('…');
        cut
    }
}
