//! 방 관리 핸들러

use super::error::ApiError;
use super::form::FormFields;
use crate::cosmetic;
use crate::protocol::{create_room_response, progress_response, ConfigResponse};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;

/// 방 생성 (`num`명)
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    fields: FormFields,
) -> Result<Json<Vec<u32>>, ApiError> {
    let num: u8 = fields
        .get("num")
        .ok_or(ApiError::BadRequest("num"))?
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest("num"))?;
    if num == 0 {
        return Err(ApiError::BadRequest("num"));
    }

    let created = match state.registry.create_room(num).await {
        Ok(created) => created,
        Err(e) => {
            // ID 유일성을 보장할 수 없으므로 계속 실행하지 않음
            tracing::error!(error = %e, "Could not generate room id");
            std::process::abort();
        }
    };

    Ok(Json(create_room_response(&created)))
}

/// 설정 조회
///
/// `id`가 없으면 싱글플레이용 설정을 새로 만들어 준다.
pub async fn get_config(
    State(state): State<Arc<AppState>>,
    fields: FormFields,
) -> Result<Json<ConfigResponse>, ApiError> {
    if fields.get("id").is_none() {
        return Ok(Json(ConfigResponse {
            user: cosmetic::random_user_style(1),
            room: cosmetic::random_room_style(),
            submitted: false,
        }));
    }

    let room_id = fields.parse_id("id")?;
    let uid = fields.parse_id("uid")?;

    let config = state
        .registry
        .config(room_id, uid)
        .await
        .ok_or(ApiError::NotFound)?;

    Ok(Json(ConfigResponse {
        user: config.user,
        room: config.room,
        submitted: config.submitted,
    }))
}

/// 제출 현황 조회 (폴링)
pub async fn get_done(
    State(state): State<Arc<AppState>>,
    fields: FormFields,
) -> Result<Json<[usize; 3]>, ApiError> {
    let room_id = fields.parse_id("id")?;
    let uid = fields.parse_id("uid")?;

    let progress = state
        .registry
        .progress(room_id, uid)
        .await
        .ok_or(ApiError::NotFound)?;

    Ok(Json(progress_response(&progress)))
}
