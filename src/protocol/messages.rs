//! 클라이언트-서버 HTTP 메시지 정의

use crate::cosmetic::{RoomStyle, UserStyle};
use crate::registry::{CreatedRoom, Progress};
use serde::{Deserialize, Serialize};

/// 설정 응답
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponse {
    #[serde(rename = "Uc")]
    pub user: UserStyle,
    #[serde(rename = "Rc")]
    pub room: RoomStyle,
    #[serde(rename = "Submitted")]
    pub submitted: bool,
}

/// 방 생성 응답: `[uid_0, ..., uid_n-1, room_id]`
pub fn create_room_response(created: &CreatedRoom) -> Vec<u32> {
    let mut resp = Vec::with_capacity(created.user_ids.len() + 1);
    resp.extend_from_slice(&created.user_ids);
    resp.push(created.room_id);
    resp
}

/// 진행 상황 응답: `[제출 수, 전체, 본인 제출 여부(0|1)]`
pub fn progress_response(progress: &Progress) -> [usize; 3] {
    [
        progress.submitted,
        progress.total,
        usize::from(progress.self_submitted),
    ]
}
