//! 환경 변수 기반 설정 관리

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// 서버 설정
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
    /// 정적 사이트 디렉터리 (sigl.html 등)
    pub site_dir: PathBuf,
    pub room: RoomConfig,
    pub canvas: CanvasConfig,
    pub log_level: String,
}

/// 방 설정
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// 방 생성 후 만료까지의 시간
    pub ttl: Duration,
    /// 만료 방 정리 주기
    pub sweep_interval: Duration,
}

/// 캔버스 설정
#[derive(Debug, Clone)]
pub struct CanvasConfig {
    /// 방별 PNG 파일이 저장되는 디렉터리
    pub image_dir: PathBuf,
    pub max_image_pixels: u64,
    pub max_body_bytes: usize,
}

impl Config {
    /// 환경 변수에서 설정 로드
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "10987".to_string())
                .parse()
                .unwrap_or(10987),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            site_dir: env::var("SITE_DIR")
                .unwrap_or_else(|_| "site".to_string())
                .into(),
            room: RoomConfig {
                ttl: Duration::from_secs(
                    env::var("ROOM_TTL_SECS")
                        .unwrap_or_else(|_| "75600".to_string())
                        .parse()
                        .unwrap_or(75600),
                ),
                sweep_interval: Duration::from_secs(
                    env::var("SWEEP_INTERVAL_SECS")
                        .unwrap_or_else(|_| "3600".to_string())
                        .parse()
                        .unwrap_or(3600),
                ),
            },
            canvas: CanvasConfig {
                image_dir: env::var("IMAGE_DIR")
                    .unwrap_or_else(|_| "testimgs".to_string())
                    .into(),
                max_image_pixels: env::var("MAX_IMAGE_PIXELS")
                    .unwrap_or_else(|_| "16777216".to_string())
                    .parse()
                    .unwrap_or(16_777_216),
                max_body_bytes: env::var("MAX_BODY_BYTES")
                    .unwrap_or_else(|_| "8388608".to_string())
                    .parse()
                    .unwrap_or(8 * 1024 * 1024),
            },
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// 모든 출처 허용 여부 (`*`)
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*")
    }
}
