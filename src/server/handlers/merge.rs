//! Merge list and merged grid handlers.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;

use super::{ApiError, api_error, blocking, decode_upload, file_response, read_upload};
use crate::compose::merge::{MAX_MERGE_ITEMS, MergeItemInfo};
use crate::error::QrDeckError;
use crate::export;

use super::super::state::AppState;

#[derive(Debug, Serialize)]
pub struct ItemsResponse {
    pub items: Vec<MergeItemInfo>,
    pub max: usize,
    pub can_generate: bool,
}

#[derive(Debug, Deserialize)]
pub struct LabelBody {
    pub label: String,
}

async fn snapshot(state: &AppState) -> ItemsResponse {
    let list = state.merge.read().await;
    ItemsResponse {
        items: list.items().iter().map(|item| item.info()).collect(),
        max: MAX_MERGE_ITEMS,
        can_generate: list.can_generate(),
    }
}

/// GET /api/merge/items - Current merge list.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<ItemsResponse> {
    Json(snapshot(&state).await)
}

/// POST /api/merge/items - Upload an image (multipart `image`, optional `label`).
pub async fn add(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<MergeItemInfo>, ApiError> {
    let upload = read_upload(multipart).await?;
    // Reject before decoding; `add` checks again under the write lock
    if state.merge.read().await.is_full() {
        return Err(api_error(QrDeckError::TooManyCodes { max: MAX_MERGE_ITEMS }));
    }
    let image = decode_upload(upload.bytes).await?;

    let mut list = state.merge.write().await;
    let id = list.add(image, upload.label).map_err(api_error)?;
    let item = list.get(id).map_err(api_error)?;
    Ok(Json(item.info()))
}

/// PATCH /api/merge/items/:id - Change a label.
pub async fn relabel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<LabelBody>,
) -> Result<Json<ItemsResponse>, ApiError> {
    state
        .merge
        .write()
        .await
        .set_label(id, body.label)
        .map_err(api_error)?;
    Ok(Json(snapshot(&state).await))
}

/// DELETE /api/merge/items/:id - Remove one image.
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ItemsResponse>, ApiError> {
    state.merge.write().await.remove(id).map_err(api_error)?;
    Ok(Json(snapshot(&state).await))
}

/// DELETE /api/merge/items - Clear the list.
pub async fn clear(State(state): State<Arc<AppState>>) -> Json<Value> {
    state.merge.write().await.clear();
    Json(json!({"success": true}))
}

/// POST /api/merge/svg - Merged grid as SVG.
pub async fn svg(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let list = state.merge.read().await.clone();
    let grid = blocking(move || list.generate()).await?;
    Ok(file_response(export::MERGED_SVG_FILENAME, grid.svg.into_bytes()))
}

/// POST /api/merge/png - Merged grid as PNG.
pub async fn png(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let list = state.merge.read().await.clone();
    let png = blocking(move || list.generate()?.png()).await?;
    Ok(file_response(export::MERGED_PNG_FILENAME, png))
}
