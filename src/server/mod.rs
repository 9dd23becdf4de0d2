//! HTTP front-end: upload reports, read the results table, download workbooks.
//!
//! ```text
//! GET  /                                 upload page
//! GET  /_stcore/health                   liveness probe ("ok")
//! POST /api/convert                      multipart upload → JSON results
//! GET  /api/jobs/:id/files/:name         one workbook
//! GET  /api/jobs/:id/archive             ZIP of every workbook
//! ```
//!
//! Finished batches live in memory only; see [`state::JobStore`].

pub mod error;
pub mod handlers;
pub mod state;

use crate::config::{ConversionConfig, ServerConfig};
use crate::error::Xps2XlsxError;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use error::ApiError;
pub use state::{AppState, JobStore};

/// Build the router. Request bodies above `max_upload_bytes` get a 413.
pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/_stcore/health", get(handlers::health))
        .route("/api/convert", post(handlers::convert))
        .route("/api/jobs/:id/files/:name", get(handlers::download_file))
        .route("/api/jobs/:id/archive", get(handlers::download_archive))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `server.bind_addr()` and serve until Ctrl-C.
pub async fn serve(server: ServerConfig, conversion: ConversionConfig) -> Result<(), Xps2XlsxError> {
    let addr = server.bind_addr();
    let state = AppState::new(conversion, server.max_retained_jobs);
    let router = create_router(state, server.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Xps2XlsxError::BindFailed {
            addr: addr.clone(),
            source: e,
        })?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Xps2XlsxError::Internal(format!("server error: {e}")))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down"),
        Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
    }
}
