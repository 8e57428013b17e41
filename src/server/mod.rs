//! HTTP front end for the conversion pipeline.
//!
//! ## Endpoints
//!
//! | Method | Path                                | Purpose                          |
//! |--------|-------------------------------------|----------------------------------|
//! | POST   | `/api/convert`                      | multipart upload → artifact info |
//! | GET    | `/api/convert/download/{filename}`  | fetch a generated PDF or ZIP     |
//! | GET    | `/`                                 | upload limits and accepted types |
//! | GET    | `/health`                           | liveness probe                   |
//!
//! Conversions run on tokio's blocking pool; a semaphore caps how many run
//! at once. Downloads are streamed from disk. Downloaded artifacts are deleted by the [`ArtifactJanitor`] after
//! the configured grace period.

mod handlers;
mod types;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::cleanup::ArtifactJanitor;
use crate::config::{ConversionConfig, ServerConfig};

pub use handlers::*;
pub use types::*;

/// State shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConversionConfig>,
    pub janitor: ArtifactJanitor,
    /// Bounds concurrent conversions.
    pub permits: Arc<Semaphore>,
    /// Maximum accepted request body in bytes.
    pub body_limit: usize,
}

impl AppState {
    #[must_use]
    pub fn new(config: ConversionConfig, server: &ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            janitor: ArtifactJanitor::new(server.cleanup_delay),
            permits: Arc::new(Semaphore::new(server.max_concurrent_conversions.max(1))),
            body_limit: server.max_request_bytes,
        }
    }
}

/// Build the API router with all endpoints
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.body_limit;
    Router::new()
        // Service info and health check
        .route("/", get(service_info))
        .route("/health", get(health_check))
        // Conversion and download
        .route("/api/convert", post(convert_images))
        .route("/api/convert/download/{filename}", get(download))
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API on an already bound listener until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    std::fs::create_dir_all(&state.config.temp_dir)?;
    info!(
        "Serving on {} (temp dir {})",
        listener.local_addr()?,
        state.config.temp_dir.display()
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

/// Start the API server
pub async fn start_server(addr: &str, state: AppState) -> Result<(), std::io::Error> {
    info!("Starting API server on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    serve(listener, state).await
}

async fn shutdown_signal() {
    // An unsupported platform leaves the server running until it is killed.
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    } else {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn state_follows_server_config() {
        let server = ServerConfig {
            max_concurrent_conversions: 3,
            cleanup_delay: Duration::from_secs(5),
            ..ServerConfig::default()
        };
        let state = AppState::new(ConversionConfig::default(), &server);
        assert_eq!(state.permits.available_permits(), 3);
        assert_eq!(state.janitor.delay(), Duration::from_secs(5));
        assert_eq!(state.body_limit, 512 * 1024 * 1024);
    }

    #[test]
    fn zero_concurrency_still_admits_one() {
        let server = ServerConfig {
            max_concurrent_conversions: 0,
            ..ServerConfig::default()
        };
        let state = AppState::new(ConversionConfig::default(), &server);
        assert_eq!(state.permits.available_permits(), 1);
    }
}
