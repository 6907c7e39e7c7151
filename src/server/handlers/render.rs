//! Single QR render handlers.

use axum::{Json, extract::State, response::IntoResponse};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, bad_request, blocking, decode_upload, file_response};
use crate::error::QrDeckError;
use crate::export;
use crate::payload::{self, FieldMap};
use crate::render::{self, Logo, RenderOptions, raster};

use super::super::state::AppState;

/// Logo sent inline as base64 image bytes.
#[derive(Debug, Deserialize)]
pub struct LogoBody {
    pub data: String,
    #[serde(default = "default_ratio")]
    pub ratio: f32,
    #[serde(default)]
    pub white_backdrop: bool,
}

fn default_ratio() -> f32 {
    0.2
}

/// Request body for render endpoints.
#[derive(Debug, Deserialize)]
pub struct RenderBody {
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub fields: FieldMap,
    /// Manual payload; replaces the one built from `fields`.
    #[serde(default)]
    pub payload: Option<String>,
    #[serde(default)]
    pub options: RenderOptions,
    #[serde(default)]
    pub logo: Option<LogoBody>,
}

fn default_kind() -> String {
    "text".to_string()
}

impl RenderBody {
    async fn resolve(self) -> Result<(String, RenderOptions), ApiError> {
        let payload = match &self.payload {
            Some(text) => text.trim().to_string(),
            None => payload::encode_fields(&self.kind, &self.fields),
        };

        let mut options = self.options;
        if let Some(logo) = self.logo {
            let bytes = BASE64
                .decode(logo.data.as_bytes())
                .map_err(|e| bad_request(format!("Invalid logo data: {}", e)))?;
            let image = decode_upload(bytes).await?;
            options.logo = Some(Logo {
                image: Arc::new(image),
                ratio: logo.ratio,
                white_backdrop: logo.white_backdrop,
            });
        }
        Ok((payload, options.clamped()))
    }
}

/// POST /api/render/svg - Render the payload as an SVG download.
pub async fn svg(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RenderBody>,
) -> Result<impl IntoResponse, ApiError> {
    let (payload, options) = body.resolve().await?;
    let engine = state.engine.clone();
    let svg = blocking(move || {
        render::render_payload(engine.as_ref(), &payload, &options).map(|r| r.svg)
    })
    .await?;
    Ok(file_response(export::QR_SVG_FILENAME, svg.into_bytes()))
}

/// POST /api/render/png - Render the payload as a PNG download.
pub async fn png(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RenderBody>,
) -> Result<impl IntoResponse, ApiError> {
    let (payload, options) = body.resolve().await?;
    let engine = state.engine.clone();
    let png = blocking(move || -> Result<Vec<u8>, QrDeckError> {
        let rendered = render::render_payload(engine.as_ref(), &payload, &options)?;
        raster::encode_png(&rendered.raster)
    })
    .await?;
    Ok(file_response(export::QR_PNG_FILENAME, png))
}
