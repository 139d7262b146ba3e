//! 그림 제출 핸들러

use super::error::ApiError;
use super::form::FormFields;
use crate::canvas;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::sync::Arc;

const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// `data:image/png;base64,...` 에서 이미지 바이트 추출
pub fn decode_data_url(data: &str) -> Result<Vec<u8>, ApiError> {
    let encoded = data
        .strip_prefix(DATA_URL_PREFIX)
        .ok_or(ApiError::BadRequest("img prefix"))?;
    BASE64
        .decode(encoded.trim())
        .map_err(|_| ApiError::BadRequest("img base64"))
}

/// 완성된 그림 제출
pub async fn send_strokes(
    State(state): State<Arc<AppState>>,
    fields: FormFields,
) -> Result<StatusCode, ApiError> {
    let room_id = fields.parse_id("id")?;
    let uid = fields.parse_id("uid")?;
    let img = fields.get("img").ok_or(ApiError::BadRequest("img"))?;
    let bytes = decode_data_url(img)?;

    tracing::debug!(room_id = room_id, uid = uid, size = bytes.len(), "Got incoming strokes");

    canvas::submit_stroke(
        &state.registry,
        room_id,
        uid,
        bytes,
        state.config.canvas.max_image_pixels,
    )
    .await?;

    Ok(StatusCode::OK)
}
