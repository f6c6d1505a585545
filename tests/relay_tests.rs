//! Relay service: router contract and provider client.

mod common;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::Query,
    http::{header, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use legalease::error::AppError;
use legalease::handlers::{create_router, AppState};
use legalease::middleware::REQUEST_ID_HEADER;
use legalease::models::{Mode, NO_RESPONSE};
use legalease::services::{GeminiProvider, GenerativeProvider, PromptTemplates, RelayService};

use common::{closed_addr, config_from, serve, FakeProvider};

const BODY_LIMIT: usize = 1024 * 1024;

fn templates() -> PromptTemplates {
    PromptTemplates::new("DEFAULT PROMPT")
        .with_template(Mode::Quick, "QUICK PROMPT")
        .with_template(Mode::Sectioned, "SECTION PROMPT")
        .with_template(Mode::Chat, "CHAT PROMPT")
}

fn router_with(provider: Arc<FakeProvider>) -> Router {
    let relay = RelayService::new(provider, templates());
    create_router(AppState::new(relay), None, BODY_LIMIT)
}

async fn post_json(app: Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_analyze_uses_mode_template() {
    let provider = Arc::new(FakeProvider::replying("A short summary"));
    let (status, body) = post_json(
        router_with(provider.clone()),
        json!({ "text": "The lease text", "mode": "a" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "result": "A short summary" }));
    assert_eq!(
        provider.calls(),
        vec![("QUICK PROMPT".to_string(), "The lease text".to_string())]
    );
}

#[tokio::test]
async fn test_unknown_and_missing_mode_use_default() {
    let provider = Arc::new(FakeProvider::replying("ok"));
    post_json(router_with(provider.clone()), json!({ "text": "one", "mode": "zzz" })).await;
    post_json(router_with(provider.clone()), json!({ "text": "two" })).await;

    let templates: Vec<String> = provider.calls().into_iter().map(|(t, _)| t).collect();
    assert_eq!(templates, vec!["DEFAULT PROMPT", "DEFAULT PROMPT"]);
}

#[tokio::test]
async fn test_empty_candidate_becomes_placeholder() {
    let provider = Arc::new(FakeProvider::new(|_, _| Ok(None)));
    let (status, body) = post_json(router_with(provider), json!({ "text": "anything" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], NO_RESPONSE);
}

#[tokio::test]
async fn test_provider_failure_is_500_with_error_string() {
    let provider = Arc::new(FakeProvider::new(|_, _| {
        Err(AppError::ProviderUnreachable {
            message: "connection refused".into(),
        })
    }));
    let (status, body) = post_json(router_with(provider), json!({ "text": "anything" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("connection refused"));
    assert_eq!(body["code"], "PROVIDER_UNREACHABLE");
}

#[tokio::test]
async fn test_missing_text_is_rejected() {
    let provider = Arc::new(FakeProvider::replying("unused"));
    let (status, body) = post_json(router_with(provider.clone()), json!({ "mode": "a" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Text is required"));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_empty_post_is_wake_probe() {
    let provider = Arc::new(FakeProvider::replying("unused"));
    let request = Request::builder()
        .method(Method::POST)
        .uri("/analyze")
        .body(Body::empty())
        .unwrap();
    let response = router_with(provider.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "result": "" }));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_head_is_wake_probe() {
    let provider = Arc::new(FakeProvider::replying("unused"));
    let request = Request::builder()
        .method(Method::HEAD)
        .uri("/analyze")
        .body(Body::empty())
        .unwrap();
    let response = router_with(provider.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_health_and_ready() {
    let app = router_with(Arc::new(FakeProvider::replying("x").unconfigured()));

    let response = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(&bytes[..], b"OK");

    let response = app
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_cors_is_open_by_default() {
    let app = router_with(Arc::new(FakeProvider::replying("x")));
    let request = Request::get("/health")
        .header(header::ORIGIN, "https://somewhere.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = router_with(Arc::new(FakeProvider::replying("x")));
    let request = Request::get("/health")
        .header(REQUEST_ID_HEADER, "trace-123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers().get(REQUEST_ID_HEADER).unwrap(), "trace-123");
}

#[tokio::test]
async fn test_error_body_carries_request_id() {
    let app = router_with(Arc::new(FakeProvider::replying("unused")));
    let request = Request::builder()
        .method(Method::POST)
        .uri("/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .header(REQUEST_ID_HEADER, "trace-err-1")
        .body(Body::from(json!({ "mode": "a" }).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers().get(REQUEST_ID_HEADER).unwrap(), "trace-err-1");
    let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["request_id"], "trace-err-1");

    // Without an incoming id, the generated one is shared by header and body.
    let request = Request::builder()
        .method(Method::POST)
        .uri("/analyze")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let header_id = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["request_id"], header_id.as_str());
}

// ---------------------------------------------------------------------------
// GeminiProvider against a local mock of the generateContent endpoint.
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Captured {
    key: Option<String>,
    body: Option<Value>,
}

async fn mock_provider(reply: Response) -> (String, Arc<Mutex<Captured>>) {
    let captured = Arc::new(Mutex::new(Captured::default()));
    let sink = captured.clone();
    let reply = Arc::new(Mutex::new(Some(reply)));
    let app = Router::new().route(
        "/v1/generate",
        post(
            move |Query(query): Query<HashMap<String, String>>, Json(body): Json<Value>| {
                {
                    let mut captured = sink.lock().unwrap();
                    captured.key = query.get("key").cloned();
                    captured.body = Some(body);
                }
                let response = reply
                    .lock()
                    .unwrap()
                    .take()
                    .unwrap_or_else(|| StatusCode::GONE.into_response());
                async move { response }
            },
        ),
    );
    let addr = serve(app).await;
    (format!("http://{}/v1/generate", addr), captured)
}

fn gemini(url: &str, timeout: &str) -> GeminiProvider {
    let config = config_from(&[
        ("GEMINI_API_KEY", "test-key"),
        ("PROVIDER_URL", url),
        ("PROVIDER_TIMEOUT_SECONDS", timeout),
    ]);
    GeminiProvider::new(&config).unwrap()
}

#[tokio::test]
async fn test_gemini_sends_two_part_turn() {
    let reply = Json(json!({
        "candidates": [
            { "content": { "parts": [ { "text": "Hello " }, { "text": "there" } ] } },
            { "content": { "parts": [ { "text": "ignored" } ] } }
        ]
    }))
    .into_response();
    let (url, captured) = mock_provider(reply).await;

    let result = gemini(&url, "5").generate("TEMPLATE", "USER TEXT").await.unwrap();
    assert_eq!(result.as_deref(), Some("Hello there"));

    let captured = captured.lock().unwrap();
    assert_eq!(captured.key.as_deref(), Some("test-key"));
    let body = captured.body.as_ref().unwrap();
    assert_eq!(body["contents"][0]["role"], "user");
    assert_eq!(body["contents"][0]["parts"][0]["text"], "TEMPLATE");
    assert_eq!(body["contents"][0]["parts"][1]["text"], "USER TEXT");
    assert_eq!(body["generationConfig"]["topK"], 40);
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
}

#[tokio::test]
async fn test_gemini_without_candidates_is_none() {
    let (url, _) = mock_provider(Json(json!({})).into_response()).await;
    let relay = RelayService::new(Arc::new(gemini(&url, "5")), templates());
    assert_eq!(relay.analyze("x", Mode::Default).await.unwrap(), NO_RESPONSE);
}

#[tokio::test]
async fn test_gemini_error_status_is_rejected() {
    let reply = (StatusCode::TOO_MANY_REQUESTS, "quota exceeded").into_response();
    let (url, _) = mock_provider(reply).await;
    match gemini(&url, "5").generate("T", "x").await {
        Err(AppError::ProviderRejected { status, message }) => {
            assert_eq!(status, 429);
            assert!(message.contains("quota"));
        }
        other => panic!("Expected ProviderRejected, got {:?}", other),
    }
}

#[tokio::test]
async fn test_gemini_malformed_payload() {
    let reply = (StatusCode::OK, "<html>not json</html>").into_response();
    let (url, _) = mock_provider(reply).await;
    assert!(matches!(
        gemini(&url, "5").generate("T", "x").await,
        Err(AppError::ProviderMalformed { .. })
    ));
}

#[tokio::test]
async fn test_gemini_unreachable() {
    let addr = closed_addr().await;
    let url = format!("http://{}/v1/generate", addr);
    assert!(matches!(
        gemini(&url, "5").generate("T", "x").await,
        Err(AppError::ProviderUnreachable { .. })
    ));
}

#[tokio::test]
async fn test_gemini_timeout() {
    let app = Router::new().route(
        "/v1/generate",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({}))
        }),
    );
    let addr = serve(app).await;
    let url = format!("http://{}/v1/generate", addr);
    assert!(matches!(
        gemini(&url, "1").generate("T", "x").await,
        Err(AppError::Timeout)
    ));
}

#[tokio::test]
async fn test_gemini_requires_key() {
    let config = config_from(&[("PROVIDER_URL", "http://127.0.0.1:9/unused")]);
    let provider = GeminiProvider::new(&config).unwrap();
    assert!(!provider.is_configured());
    assert!(matches!(
        provider.generate("T", "x").await,
        Err(AppError::ConfigError { .. })
    ));
}
