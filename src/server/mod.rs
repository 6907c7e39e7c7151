//! # HTTP Server
//!
//! JSON/multipart API over every qrdeck operation: payload encoding, single
//! renders, still-image scanning, batch sheets and the merge list.
//!
//! ## Usage
//!
//! ```bash
//! qrdeck serve --listen 127.0.0.1:8080
//! ```
//!
//! ## Routes
//!
//! | Method | Path | Body | Returns |
//! |--------|------|------|---------|
//! | GET | `/api/schemes` | | payload types and field names |
//! | POST | `/api/payload` | `{type, fields}` | `{payload, looks_like_url}` |
//! | POST | `/api/render/svg`, `/api/render/png` | `{type, fields, payload?, options, logo?}` | file |
//! | POST | `/api/scan` | multipart `image` | `{text, looks_like_url}` |
//! | POST | `/api/batch/svg`, `/api/batch/png` | `{text, options}` | file |
//! | GET, POST, DELETE | `/api/merge/items` | multipart `image`, `label` | list / item |
//! | PATCH, DELETE | `/api/merge/items/:id` | `{label}` | list |
//! | POST | `/api/merge/svg`, `/api/merge/png` | | file |
//!
//! Errors come back as `{"success": false, "error": "..."}` with 400 for bad
//! input, 422 when a code cannot be generated or found or an image cannot be
//! decoded, 503 when a
//! collaborator is unavailable and 500 otherwise.

mod handlers;
mod state;

pub use state::{AppState, ServerConfig};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
};
use std::sync::Arc;

use crate::error::QrDeckError;

/// Upload limit for scan images and merge items.
const UPLOAD_LIMIT: usize = 20 * 1024 * 1024;

/// Build the API router around shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Payload API
        .route("/api/schemes", get(handlers::payload::schemes))
        .route("/api/payload", post(handlers::payload::encode))
        // Render API
        .route("/api/render/svg", post(handlers::render::svg))
        .route("/api/render/png", post(handlers::render::png))
        // Scan API
        .route(
            "/api/scan",
            post(handlers::scan::decode).layer(DefaultBodyLimit::max(UPLOAD_LIMIT)),
        )
        // Batch API
        .route("/api/batch/svg", post(handlers::batch::svg))
        .route("/api/batch/png", post(handlers::batch::png))
        // Merge API
        .route(
            "/api/merge/items",
            get(handlers::merge::list)
                .post(handlers::merge::add)
                .delete(handlers::merge::clear)
                .layer(DefaultBodyLimit::max(UPLOAD_LIMIT)),
        )
        .route(
            "/api/merge/items/:id",
            patch(handlers::merge::relabel).delete(handlers::merge::remove),
        )
        .route("/api/merge/svg", post(handlers::merge::svg))
        .route("/api/merge/png", post(handlers::merge::png))
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use qrdeck::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), qrdeck::QrDeckError> {
/// let config = ServerConfig {
///     listen_addr: "127.0.0.1:8080".to_string(),
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), QrDeckError> {
    let app_state = Arc::new(AppState::new(config.clone()));
    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            QrDeckError::Transport(format!("Failed to bind to {}: {}", config.listen_addr, e))
        })?;

    log::info!("qrdeck HTTP server listening on http://{}/", config.listen_addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| QrDeckError::Transport(format!("Server error: {}", e)))?;

    Ok(())
}
