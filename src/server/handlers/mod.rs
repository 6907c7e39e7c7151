//! HTTP handlers for the server.

pub mod batch;
pub mod merge;
pub mod payload;
pub mod render;
pub mod scan;

use axum::{
    Json,
    extract::Multipart,
    http::{StatusCode, header},
    response::IntoResponse,
};
use image::DynamicImage;
use serde_json::{Value, json};

use crate::compose;
use crate::error::{ErrorCategory, QrDeckError};
use crate::export;

/// Error response shared by every handler: `{"success": false, "error": ...}`.
pub type ApiError = (StatusCode, Json<Value>);

/// Status code for a library error.
pub fn status_for(err: &QrDeckError) -> StatusCode {
    match (err, err.category()) {
        (QrDeckError::NoCodeFound | QrDeckError::Generation(_) | QrDeckError::Image(_), _) => StatusCode::UNPROCESSABLE_ENTITY,
        (_, ErrorCategory::Input) => StatusCode::BAD_REQUEST,
        (_, ErrorCategory::Unavailable) => StatusCode::SERVICE_UNAVAILABLE,
        (_, ErrorCategory::Transient) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn api_error(err: QrDeckError) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        log::warn!("request failed: {}", err);
    }
    (status, Json(json!({"success": false, "error": err.to_string()})))
}

pub fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"success": false, "error": message.into()})),
    )
}

/// Attachment response with the content type derived from `filename`.
pub fn file_response(filename: &str, bytes: Vec<u8>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, export::mime_for(filename)),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
}

/// Run CPU-bound work on the blocking pool.
pub async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, QrDeckError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"success": false, "error": format!("Task failed: {}", e)})),
            )
        })?
        .map_err(api_error)
}

/// Decode uploaded image bytes on the blocking pool.
pub async fn decode_upload(bytes: Vec<u8>) -> Result<DynamicImage, ApiError> {
    blocking(move || compose::load_image(&bytes)).await
}

/// Uploaded image plus the optional `label` text field.
pub struct Upload {
    pub bytes: Vec<u8>,
    pub label: String,
}

/// Read an `image` file field (required) and a `label` field (optional).
pub async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    let mut bytes = None;
    let mut label = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Multipart error: {}", e)))?
    {
        match field.name().unwrap_or("") {
            "image" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(format!("Failed to read image: {}", e)))?;
                bytes = Some(data.to_vec());
            }
            "label" => {
                label = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("Failed to read label: {}", e)))?;
            }
            _ => {}
        }
    }

    let bytes = bytes.ok_or_else(|| bad_request("No image field found"))?;
    Ok(Upload { bytes, label })
}
