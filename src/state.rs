//! 애플리케이션 상태 관리

use crate::config::Config;
use crate::registry::Registry;
use std::sync::Arc;

/// 전역 애플리케이션 상태
pub struct AppState {
    /// 방 레지스트리 (room_id -> Room)
    pub registry: Arc<Registry>,
    /// 설정
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let registry = Registry::new(config.canvas.image_dir.clone(), config.room.ttl);
        Self {
            registry: Arc::new(registry),
            config: Arc::new(config),
        }
    }
}
