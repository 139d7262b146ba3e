//! 만료 방 정리

use crate::canvas;
use crate::registry::Registry;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 정리 한 번 수행. 제거한 방 수를 돌려준다.
///
/// 만료된 방을 하나 찾아 지우는 것을 더 찾을 게 없을 때까지 반복한다.
pub async fn sweep(registry: &Registry, now: Instant) -> usize {
    let mut deleted = 0;

    while let Some(room_id) = registry.first_expired(now).await {
        // 그 사이 다른 쪽에서 지웠을 수 있음
        let Some(room) = registry.delete(room_id).await else {
            continue;
        };

        if let Err(e) = canvas::discard(&room).await {
            tracing::error!(
                room_id = room_id,
                path = %room.canvas_path().display(),
                error = %e,
                "Failed to remove canvas of expired room"
            );
        }

        tracing::info!(room_id = room_id, "Cleaned up expired room");
        deleted += 1;
    }

    deleted
}

/// 주기적으로 정리하는 백그라운드 루프
pub async fn run(registry: Arc<Registry>, every: Duration) {
    let mut interval = tokio::time::interval(every.max(Duration::from_secs(1)));
    loop {
        interval.tick().await;
        tracing::debug!("Clean sweep");

        let deleted = sweep(&registry, Instant::now()).await;
        if deleted > 0 {
            tracing::info!(deleted_rooms = deleted, "Cleanup completed");
        }
    }
}
