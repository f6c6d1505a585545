use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unsupported file type: .{extension}")]
    UnsupportedFileType { extension: String },

    #[error("File too large: {size} bytes exceeds limit of {limit} bytes")]
    FileTooLarge { size: usize, limit: usize },

    #[error("No document selected")]
    MissingFile,

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Text extraction failed: {message}")]
    ExtractionError { message: String },

    #[error("Document was not recognised as a legal document")]
    NotLegalDocument,

    #[error("Relay request failed: {message}")]
    RelayTransport { message: String },

    #[error("Relay returned HTTP {status}")]
    RelayStatus { status: u16 },

    #[error("Provider unreachable: {message}")]
    ProviderUnreachable { message: String },

    #[error("Provider returned a malformed payload: {message}")]
    ProviderMalformed { message: String },

    #[error("Provider rejected the request with HTTP {status}: {message}")]
    ProviderRejected { status: u16, message: String },

    #[error("Provider request timed out")]
    Timeout,

    #[error("An analysis is already in progress")]
    AnalysisInProgress,

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Sign-in required")]
    Unauthenticated,

    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::UnsupportedFileType { .. } => "UNSUPPORTED_FILE_TYPE",
            AppError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            AppError::MissingFile => "MISSING_FILE",
            AppError::ValidationError { .. } => "VALIDATION_ERROR",
            AppError::ExtractionError { .. } => "EXTRACTION_ERROR",
            AppError::NotLegalDocument => "NOT_LEGAL_DOCUMENT",
            AppError::RelayTransport { .. } => "RELAY_TRANSPORT_ERROR",
            AppError::RelayStatus { .. } => "RELAY_STATUS_ERROR",
            AppError::ProviderUnreachable { .. } => "PROVIDER_UNREACHABLE",
            AppError::ProviderMalformed { .. } => "PROVIDER_MALFORMED",
            AppError::ProviderRejected { .. } => "PROVIDER_REJECTED",
            AppError::Timeout => "PROVIDER_TIMEOUT",
            AppError::AnalysisInProgress => "ANALYSIS_IN_PROGRESS",
            AppError::Storage { .. } => "STORAGE_ERROR",
            AppError::Unauthenticated => "UNAUTHENTICATED",
            AppError::Auth { .. } => "AUTH_ERROR",
            AppError::ConfigError { .. } => "CONFIG_ERROR",
            AppError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UnsupportedFileType { .. } => StatusCode::BAD_REQUEST,
            AppError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::MissingFile => StatusCode::BAD_REQUEST,
            AppError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            AppError::ExtractionError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotLegalDocument => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::RelayTransport { .. } => StatusCode::BAD_GATEWAY,
            AppError::RelayStatus { .. } => StatusCode::BAD_GATEWAY,
            // Every provider-side failure surfaces as a plain 500 to relay callers.
            AppError::ProviderUnreachable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ProviderMalformed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ProviderRejected { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Timeout => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::AnalysisInProgress => StatusCode::CONFLICT,
            AppError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Auth { .. } => StatusCode::UNAUTHORIZED,
            AppError::ConfigError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text for the dismissible notification shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            AppError::UnsupportedFileType { .. } => {
                "Invalid file type. Upload PDF, DOC, DOCX, or TXT".to_string()
            }
            AppError::FileTooLarge { .. } => "File size must be less than 10MB".to_string(),
            AppError::MissingFile => "Please select a document first!".to_string(),
            AppError::NotLegalDocument => {
                "❌ This doesn't look like a legal document. Please upload a valid legal file."
                    .to_string()
            }
            AppError::ExtractionError { .. } => {
                "Could not read text from this document. Please try another file.".to_string()
            }
            AppError::AnalysisInProgress => {
                "An analysis is already running. Please wait for it to finish.".to_string()
            }
            AppError::ValidationError { message } | AppError::Auth { message } => message.clone(),
            AppError::Unauthenticated => "Please sign in to continue.".to_string(),
            _ => "Error analyzing document. Please try again.".to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::UnsupportedFileType { .. }
                | AppError::FileTooLarge { .. }
                | AppError::MissingFile
                | AppError::ValidationError { .. }
        )
    }
}

/// An [`AppError`] tagged with the id of the request that produced it, so the
/// error body carries the same id as the logs and the `x-request-id` header.
#[derive(Debug)]
pub struct RequestError {
    pub request_id: String,
    pub error: AppError,
}

impl AppError {
    pub fn with_request_id(self, request_id: impl Into<String>) -> RequestError {
        RequestError {
            request_id: request_id.into(),
            error: self,
        }
    }

    fn into_response_for(self, request_id: String) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();
        let timestamp = chrono::Utc::now().to_rfc3339();

        tracing::error!(
            error_code = error_code,
            status_code = %status,
            request_id = %request_id,
            error_message = %message,
            "API error occurred"
        );

        let body = Json(json!({
            "error": message,
            "code": error_code,
            "request_id": request_id,
            "timestamp": timestamp
        }));

        (status, body).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_response_for(Uuid::new_v4().to_string())
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        self.error.into_response_for(self.request_id)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ValidationError {
            message: format!("JSON parsing error: {}", err),
        }
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        AppError::Timeout
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout
        } else if err.is_decode() {
            AppError::ProviderMalformed {
                message: err.to_string(),
            }
        } else {
            AppError::ProviderUnreachable {
                message: err.to_string(),
            }
        }
    }
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationError {
            message: message.into(),
        }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        AppError::ExtractionError {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        AppError::ConfigError {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        AppError::Storage {
            message: message.into(),
        }
    }

    pub fn relay_transport(message: impl Into<String>) -> Self {
        AppError::RelayTransport {
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        AppError::Auth {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal {
            message: message.into(),
        }
    }
}
