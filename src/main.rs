use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use legalease::handlers::{create_router, AppState};
use legalease::services::{GeminiProvider, RelayService};
use legalease::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "legalease=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // The API key and templates are read once here and never reloaded.
    let config = Config::from_env()?;

    tracing::info!("Starting LegalEase relay");
    tracing::info!("Provider timeout: {}s", config.provider_timeout_seconds);
    tracing::info!("Max body size: {}MB", config.max_body_mb);

    let provider = GeminiProvider::new(&config)?;
    let relay = RelayService::new(Arc::new(provider), config.prompts.clone());
    let app = create_router(
        AppState::new(relay),
        config.cors_origin()?,
        config.max_body_bytes(),
    );

    let addr = format!("{}:{}", config.server_host, config.server_port);
    tracing::info!("Server listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
