//! 에러 타입 정의

use thiserror::Error;

/// 프로세스를 계속 실행할 수 없는 에러
#[derive(Error, Debug)]
pub enum FatalError {
    #[error("randomness source unavailable: {0}")]
    Entropy(#[from] rand::Error),
}

/// 스트로크 제출 실패
#[derive(Error, Debug)]
pub enum StrokeError {
    #[error("room or user not found")]
    NotFound,

    #[error("user already submitted")]
    AlreadySubmitted,

    #[error("could not decode image: {0}")]
    Decode(String),

    #[error("image is {width}x{height}, canvas is {canvas_width}x{canvas_height}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        canvas_width: u32,
        canvas_height: u32,
    },

    #[error("canvas I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("canvas image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("canvas task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl StrokeError {
    /// 서버 내부 문제 여부 (클라이언트 입력 문제가 아님)
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Image(_) | Self::Task(_))
    }
}
