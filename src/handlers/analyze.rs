use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use std::time::Instant;
use tracing::{debug, error, info};

use super::AppState;
use crate::error::{AppError, AppResult, RequestError};
use crate::middleware::logging::request_id;
use crate::models::{AnalyzeRequest, AnalyzeResponse};

/// `POST /analyze`. An empty body is a wake probe and never reaches the provider.
pub async fn analyze_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AnalyzeResponse>, RequestError> {
    let request_id = request_id(&headers);
    run_analysis(&state, &request_id, &body)
        .await
        .map(Json)
        .map_err(|e| e.with_request_id(request_id))
}

async fn run_analysis(state: &AppState, request_id: &str, body: &[u8]) -> AppResult<AnalyzeResponse> {
    let start = Instant::now();

    if body.iter().all(|b| b.is_ascii_whitespace()) {
        debug!(request_id = %request_id, "Wake probe received");
        return Ok(AnalyzeResponse::awake());
    }

    let request: AnalyzeRequest = serde_json::from_slice(body)?;
    let text = request
        .text()
        .ok_or_else(|| AppError::validation("Text is required"))?;
    let mode = request.resolved_mode();

    info!(
        request_id = %request_id,
        mode = %mode,
        requested_mode = ?request.mode,
        text_chars = text.len(),
        "Starting analysis request"
    );

    let result = match state.relay.analyze(text, mode).await {
        Ok(result) => result,
        Err(e) => {
            error!(request_id = %request_id, error = %e, "Analysis failed");
            return Err(e);
        }
    };

    info!(
        request_id = %request_id,
        total_time_ms = start.elapsed().as_millis() as u64,
        "Request completed successfully"
    );

    Ok(AnalyzeResponse::new(result))
}

/// `HEAD /analyze`, used by clients to wake a cold instance.
pub async fn wake_handler() -> StatusCode {
    debug!("HEAD wake probe received");
    StatusCode::OK
}
