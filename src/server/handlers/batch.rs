//! Batch sheet handlers.

use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, blocking, file_response};
use crate::compose::{BatchOptions, build_batch};
use crate::export;

use super::super::state::AppState;

/// Request body for batch endpoints.
#[derive(Debug, Deserialize)]
pub struct BatchBody {
    /// One code per line, optionally `label,value`
    pub text: String,
    #[serde(default)]
    pub options: BatchOptions,
}

/// POST /api/batch/svg - Batch sheet as SVG.
pub async fn svg(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BatchBody>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = state.engine.clone();
    let sheet = blocking(move || build_batch(engine.as_ref(), &body.text, &body.options)).await?;
    Ok(file_response(export::BATCH_SVG_FILENAME, sheet.svg.into_bytes()))
}

/// POST /api/batch/png - Batch sheet as PNG.
pub async fn png(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BatchBody>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = state.engine.clone();
    let png = blocking(move || build_batch(engine.as_ref(), &body.text, &body.options)?.png()).await?;
    Ok(file_response(export::BATCH_PNG_FILENAME, png))
}
