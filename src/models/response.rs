use serde::{Deserialize, Serialize};

/// Reply literal used when the provider yields no usable candidate.
pub const NO_RESPONSE: &str = "No response.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub result: String,
}

impl AnalyzeResponse {
    pub fn new(result: impl Into<String>) -> Self {
        Self {
            result: result.into(),
        }
    }

    /// Response to a wake probe.
    pub fn awake() -> Self {
        Self::new(String::new())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}
