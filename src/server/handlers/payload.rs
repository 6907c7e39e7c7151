//! Payload API handlers.

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::payload::{self, FieldMap, SchemeKind};

#[derive(Debug, Serialize)]
pub struct SchemeInfo {
    #[serde(rename = "type")]
    pub kind: SchemeKind,
    pub fields: &'static [&'static str],
}

/// Request body for payload encoding.
#[derive(Debug, Deserialize)]
pub struct PayloadBody {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub fields: FieldMap,
}

#[derive(Debug, Serialize)]
pub struct PayloadResponse {
    pub payload: String,
    pub looks_like_url: bool,
}

/// GET /api/schemes - Payload types and their field names.
pub async fn schemes() -> Json<Vec<SchemeInfo>> {
    Json(
        SchemeKind::ALL
            .into_iter()
            .map(|kind| SchemeInfo {
                kind,
                fields: kind.field_names(),
            })
            .collect(),
    )
}

/// POST /api/payload - Encode form fields. Unknown types encode to "".
pub async fn encode(Json(body): Json<PayloadBody>) -> Json<PayloadResponse> {
    let payload = payload::encode_fields(&body.kind, &body.fields);
    Json(PayloadResponse {
        looks_like_url: payload::looks_like_url(&payload),
        payload,
    })
}
