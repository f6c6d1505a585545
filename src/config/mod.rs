use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use tracing::{info, warn};

use crate::services::prompts::PromptTemplates;

pub const DEFAULT_PROVIDER_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub provider_api_key: Option<String>,
    pub provider_url: String,
    pub provider_timeout_seconds: u64,
    pub max_body_mb: usize,
    pub allowed_origin: String,
    pub generation: GenerationSettings,
    pub prompts: PromptTemplates,
}

/// Sampling parameters forwarded verbatim to the provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");
        Self::from_source(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = GenerationSettings::default();

        // PORT is what hosting platforms inject; SERVER_PORT is the local override.
        let port_var = if lookup("PORT").is_some() { "PORT" } else { "SERVER_PORT" };

        let config = Config {
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| {
                info!("SERVER_HOST not set, using default: 0.0.0.0");
                "0.0.0.0".to_string()
            }),
            server_port: parse_var(&lookup, port_var, 3000)
                .context("Failed to parse PORT")?,
            provider_api_key: lookup("GEMINI_API_KEY")
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            provider_url: lookup("PROVIDER_URL")
                .unwrap_or_else(|| DEFAULT_PROVIDER_URL.to_string()),
            provider_timeout_seconds: parse_var(&lookup, "PROVIDER_TIMEOUT_SECONDS", 30)
                .context("Failed to parse PROVIDER_TIMEOUT_SECONDS")?,
            max_body_mb: parse_var(&lookup, "MAX_BODY_MB", 16)
                .context("Failed to parse MAX_BODY_MB")?,
            allowed_origin: lookup("ALLOWED_ORIGIN").unwrap_or_else(|| "*".to_string()),
            generation: GenerationSettings {
                temperature: parse_var(&lookup, "TEMPERATURE", defaults.temperature)?,
                top_k: parse_var(&lookup, "TOP_K", defaults.top_k)?,
                top_p: parse_var(&lookup, "TOP_P", defaults.top_p)?,
                max_output_tokens: parse_var(&lookup, "MAX_OUTPUT_TOKENS", defaults.max_output_tokens)?,
            },
            prompts: PromptTemplates::from_source(&lookup),
        };

        config.validate()?;

        if config.provider_api_key.is_none() {
            warn!("No provider API key configured. Set GEMINI_API_KEY environment variable.");
        }

        info!(
            host = %config.server_host,
            port = config.server_port,
            provider_url = %config.provider_url,
            timeout_s = config.provider_timeout_seconds,
            allowed_origin = %config.allowed_origin,
            "Configuration loaded successfully"
        );
        Ok(config)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_seconds)
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_mb * 1024 * 1024
    }

    /// `None` means any origin is allowed.
    pub fn cors_origin(&self) -> Result<Option<HeaderValue>> {
        let origin = self.allowed_origin.trim();
        if origin == "*" {
            return Ok(None);
        }
        let value = HeaderValue::from_str(origin)
            .with_context(|| format!("ALLOWED_ORIGIN is not a valid header value: {}", origin))?;
        Ok(Some(value))
    }

    fn validate(&self) -> Result<()> {
        if self.server_port == 0 {
            return Err(anyhow::anyhow!("PORT must be greater than 0"));
        }
        if self.provider_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("PROVIDER_TIMEOUT_SECONDS must be greater than 0"));
        }
        if self.max_body_mb == 0 {
            return Err(anyhow::anyhow!("MAX_BODY_MB must be greater than 0"));
        }
        if self.provider_url.trim().is_empty() {
            return Err(anyhow::anyhow!("PROVIDER_URL must not be empty"));
        }
        self.cors_origin()?;
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, var_name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy + std::fmt::Debug,
    T::Err: std::fmt::Display,
{
    match lookup(var_name) {
        Some(val) => match val.trim().parse() {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                warn!("Failed to parse {}: {} (using default: {:?})", var_name, e, default);
                Ok(default)
            }
        },
        None => {
            info!("{} not set, using default: {:?}", var_name, default);
            Ok(default)
        }
    }
}
