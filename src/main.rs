//! promptline backend - forwards prompts to Gemini over HTTP

use promptline::api::{create_router, AppState};
use promptline::config::ServerConfig;
use promptline::llm::{GeminiService, LlmService, LoggingService};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env is optional
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "promptline=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = ServerConfig::from_env();

    let llm: Option<Arc<dyn LlmService>> = match config.gemini_api_key.as_deref() {
        Some(key) => match GeminiService::new(key, &config.gemini_model, Some(&config.gemini_base_url)) {
            Ok(gemini) => {
                tracing::info!(model = %config.gemini_model, endpoint = %gemini.endpoint(), "Gemini client initialized");
                let service: Arc<dyn LlmService> = Arc::new(LoggingService::new(Arc::new(gemini)));
                Some(service)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to configure Gemini client");
                None
            }
        },
        None => {
            tracing::warn!("GEMINI_API_KEY not set; ask requests will fail with 500");
            None
        }
    };

    let state = AppState::new(&config, llm);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(app = %config.app_name, version = %config.app_version, %addr, "Starting up the application");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    tracing::info!("Shutting down the application");
    Ok(())
}
