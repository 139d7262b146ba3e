//! HTTP 에러 응답

use crate::error::StrokeError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// 핸들러 에러
#[derive(Debug)]
pub enum ApiError {
    /// 필드 누락/형식 오류
    BadRequest(&'static str),
    /// 알 수 없는 방 또는 사용자
    NotFound,
    Stroke(StrokeError),
}

impl From<StrokeError> for ApiError {
    fn from(err: StrokeError) -> Self {
        Self::Stroke(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::NotFound => StatusCode::BAD_REQUEST,
            Self::Stroke(StrokeError::AlreadySubmitted) => StatusCode::CONFLICT,
            Self::Stroke(err) if err.is_internal() => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Stroke(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::BadRequest(reason) => tracing::warn!(reason = %reason, "Rejected request"),
            Self::NotFound => tracing::warn!("Unknown room or user"),
            Self::Stroke(err) if err.is_internal() => {
                tracing::error!(error = %err, "Stroke submission failed")
            }
            Self::Stroke(err) => tracing::warn!(error = %err, "Stroke rejected"),
        }
        status.into_response()
    }
}
