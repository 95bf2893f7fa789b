//! HTTP conversion service.
//!
//! Accepts a PDF upload, converts it with a [`ConversionEngine`] inside a
//! request-scoped [`Workspace`], and answers with a flat zip of the
//! rendered pages. Requests share nothing but the engine (immutable) and
//! the configuration; each one owns its workspace exclusively.
//!
//! ```rust,no_run
//! use pdf2img::{ConversionEngine, ServerConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! pdf2img::service::serve(ServerConfig::default(), ConversionEngine::default()).await?;
//! # Ok(())
//! # }
//! ```

mod error;
pub mod routes;
pub mod workspace;

pub use error::ServiceError;
pub use workspace::Workspace;

use crate::config::ServerConfig;
use crate::convert::ConversionEngine;
use crate::error::Pdf2ImgError;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Per-process context handed to every request handler.
#[derive(Clone)]
pub struct ServiceState {
    pub engine: ConversionEngine,
    pub config: Arc<ServerConfig>,
}

impl ServiceState {
    pub fn new(engine: ConversionEngine, config: ServerConfig) -> Self {
        Self {
            engine,
            config: Arc::new(config),
        }
    }
}

/// Build the service router.
pub fn router(state: ServiceState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/convert", post(routes::convert))
        .route("/health", get(routes::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `config.bind` and serve until Ctrl+C / SIGTERM.
///
/// Stale workspaces left by an earlier crash are swept before the
/// listener opens.
pub async fn serve(config: ServerConfig, engine: ConversionEngine) -> Result<(), Pdf2ImgError> {
    std::fs::create_dir_all(&config.workspace_root).map_err(|e| {
        Pdf2ImgError::OutputWriteFailed {
            path: config.workspace_root.clone(),
            source: e,
        }
    })?;
    workspace::sweep_stale(&config.workspace_root, config.stale_workspace_age);

    let addr = config.bind;
    let app = router(ServiceState::new(engine, config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Pdf2ImgError::Internal(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!("pdf2img service listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Pdf2ImgError::Internal(format!("Server error: {e}")))?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
