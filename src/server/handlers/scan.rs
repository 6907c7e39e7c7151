//! Still-image scan handler.

use axum::{
    Json,
    extract::{Multipart, State},
};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, api_error, decode_upload, read_upload};
use crate::payload::looks_like_url;
use crate::scan;

use super::super::state::AppState;

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub text: String,
    pub looks_like_url: bool,
}

/// POST /api/scan - Decode the first QR code in an uploaded image.
pub async fn decode(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ScanResponse>, ApiError> {
    let upload = read_upload(multipart).await?;
    let image = decode_upload(upload.bytes).await?;

    let text = scan::decode_image(state.scanner.as_ref(), &image)
        .await
        .map_err(api_error)?;
    log::debug!("scan decoded {} bytes", text.len());

    Ok(Json(ScanResponse {
        looks_like_url: looks_like_url(&text),
        text,
    }))
}
