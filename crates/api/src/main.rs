use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use move37_api::config::ServerConfig;
use move37_api::router::build_app_router;
use move37_api::state::AppState;
use move37_core::store::DataStore;
use move37_genai::{GeminiClient, GenAiConfig, ImagenClient};
use move37_pipeline::{ReferenceGenerator, ThrottlePolicy};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "move37_api=debug,move37_pipeline=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        data_root = %config.data_root.display(),
        "Loaded server configuration"
    );

    let genai = GenAiConfig::from_env();
    if genai.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set, generation endpoints will fail");
    }
    let throttle = ThrottlePolicy::from_env();
    tracing::info!(
        image_model = %genai.image_model,
        text_model = %genai.text_model,
        pause_secs = throttle.pause_between_calls.as_secs(),
        quota_retries = throttle.max_quota_retries,
        "Loaded generation configuration"
    );

    // --- Capability clients ---
    let http = genai
        .http_client()
        .expect("Failed to build generation HTTP client");
    let images = Arc::new(ImagenClient::new(http.clone(), &genai));
    let text = Arc::new(GeminiClient::new(http, &genai));

    // --- App state ---
    let store = DataStore::new(config.data_root.clone());
    let state = AppState {
        references: Arc::new(ReferenceGenerator::new(store.clone(), images, throttle)),
        store,
        text,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
