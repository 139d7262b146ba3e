//! 방/사용자 레지스트리
//!
//! 락 획득 순서: 레지스트리 RwLock → 방별 캔버스 Mutex.
//! 캔버스 락을 잡은 채로 레지스트리 락을 다시 잡지 않으며, 레지스트리 락을 잡은 채로 파일 I/O를 하지 않는다.

use crate::cosmetic::{self, RoomStyle, UserStyle};
use crate::error::FatalError;
use crate::ids;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, MutexGuard, RwLock};

/// 방 참가자
pub struct User {
    pub uid: u32,
    /// true로만 바뀐다
    submitted: AtomicBool,
    pub style: UserStyle,
}

impl User {
    fn new(uid: u32, style: UserStyle) -> Self {
        Self {
            uid,
            submitted: AtomicBool::new(false),
            style,
        }
    }

    pub fn submitted(&self) -> bool {
        self.submitted.load(Ordering::Acquire)
    }
}

/// 캔버스 파일 락이 보호하는 상태
#[derive(Debug, Default)]
struct CanvasState {
    /// 방이 레지스트리에서 제거되어 더 이상 파일을 쓰면 안 됨
    retired: bool,
}

/// 방 정보
pub struct Room {
    pub id: u32,
    pub expires_at: Instant,
    /// 생성 시 크기가 고정됨
    pub users: Box<[User]>,
    pub style: RoomStyle,
    canvas_path: PathBuf,
    /// 레지스트리에서 제거됨. 쓰기 락 아래에서만 설정된다.
    removed: AtomicBool,
    canvas: Mutex<CanvasState>,
}

impl Room {
    pub fn canvas_path(&self) -> &Path {
        &self.canvas_path
    }

    pub fn submitted_count(&self) -> usize {
        self.users.iter().filter(|u| u.submitted()).count()
    }

    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }

    fn position(&self, uid: u32) -> Option<usize> {
        self.users.iter().position(|u| u.uid == uid)
    }

    /// 캔버스 파일 락 획득
    pub async fn lock_canvas(&self) -> CanvasGuard<'_> {
        CanvasGuard {
            room: self,
            state: self.canvas.lock().await,
        }
    }
}

/// 방별 캔버스 파일 락을 잡고 있다는 증명
pub struct CanvasGuard<'a> {
    room: &'a Room,
    state: MutexGuard<'a, CanvasState>,
}

impl CanvasGuard<'_> {
    pub fn path(&self) -> &Path {
        self.room.canvas_path()
    }

    pub fn is_retired(&self) -> bool {
        self.state.retired
    }

    /// 방 삭제 후 호출. 이후 이 방의 캔버스는 쓰이지 않는다.
    pub fn retire(&mut self) {
        self.state.retired = true;
    }
}

/// 한 방의 한 사용자를 가리키는 핸들
#[derive(Clone)]
pub struct Seat {
    room: Arc<Room>,
    index: usize,
}

impl Seat {
    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn user(&self) -> &User {
        &self.room.users[self.index]
    }

    pub async fn lock_canvas(&self) -> CanvasGuard<'_> {
        self.room.lock_canvas().await
    }

    /// 제출 완료 표시. 캔버스 락을 잡고 있어야만 호출할 수 있다.
    ///
    /// 이번 호출이 플래그를 바꿨으면 true, 이미 제출된 상태였으면 false.
    pub fn mark_submitted(&self, guard: &CanvasGuard<'_>) -> bool {
        debug_assert!(std::ptr::eq(guard.room, &*self.room));
        !self.user().submitted.swap(true, Ordering::AcqRel)
    }
}

/// 방 생성 결과
#[derive(Debug, Clone)]
pub struct CreatedRoom {
    pub room_id: u32,
    /// 방 생성 시에만 공개되는 사용자 ID 목록 (방 범위 접근 토큰)
    pub user_ids: Vec<u32>,
}

/// 사용자에게 내려주는 설정 스냅샷
#[derive(Debug, Clone)]
pub struct SeatConfig {
    pub room: RoomStyle,
    pub user: UserStyle,
    pub submitted: bool,
}

/// 방 진행 상황
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub submitted: usize,
    pub total: usize,
    pub self_submitted: bool,
}

/// 방 수명 상한 (Instant 덧셈 overflow 방지)
pub const MAX_ROOM_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// 방 레지스트리 (room_id -> Room)
pub struct Registry {
    rooms: RwLock<HashMap<u32, Arc<Room>>>,
    image_dir: PathBuf,
    ttl: Duration,
}

impl Registry {
    pub fn new(image_dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            image_dir: image_dir.into(),
            ttl: ttl.min(MAX_ROOM_TTL),
        }
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    fn canvas_path(&self, room_id: u32) -> PathBuf {
        self.image_dir.join(format!("{}.png", room_id))
    }

    /// 방 생성
    ///
    /// 파일은 첫 제출 때 만들어진다.
    pub async fn create_room(&self, participants: u8) -> Result<CreatedRoom, FatalError> {
        let user_ids = ids::new_user_ids(usize::from(participants));
        let users: Box<[User]> = user_ids
            .iter()
            .map(|&uid| User::new(uid, cosmetic::random_user_style(participants)))
            .collect();
        let style = cosmetic::random_room_style();
        let now = Instant::now();
        let expires_at = now
            .checked_add(self.ttl)
            .or_else(|| now.checked_add(MAX_ROOM_TTL))
            .unwrap_or(now);

        let room = {
            let mut rooms = self.rooms.write().await;
            let room_id = ids::new_room_id(|id| rooms.contains_key(&id))?;
            let room = Arc::new(Room {
                id: room_id,
                expires_at,
                users,
                style,
                canvas_path: self.canvas_path(room_id),
                removed: AtomicBool::new(false),
                canvas: Mutex::new(CanvasState::default()),
            });
            rooms.insert(room_id, room.clone());
            room
        };

        tracing::info!(
            room_id = room.id,
            participants = participants,
            path = %room.canvas_path.display(),
            "Room created"
        );

        Ok(CreatedRoom {
            room_id: room.id,
            user_ids,
        })
    }

    /// 방/사용자 조회
    pub async fn lookup(&self, room_id: u32, uid: u32) -> Option<Seat> {
        let rooms = self.rooms.read().await;
        let room = rooms.get(&room_id)?;
        let index = room.position(uid)?;
        Some(Seat {
            room: room.clone(),
            index,
        })
    }

    /// 사용자 설정 조회
    pub async fn config(&self, room_id: u32, uid: u32) -> Option<SeatConfig> {
        let rooms = self.rooms.read().await;
        let room = rooms.get(&room_id)?;
        let user = &room.users[room.position(uid)?];
        Some(SeatConfig {
            room: room.style.clone(),
            user: user.style.clone(),
            submitted: user.submitted(),
        })
    }

    /// 제출 진행 상황 조회
    pub async fn progress(&self, room_id: u32, uid: u32) -> Option<Progress> {
        let rooms = self.rooms.read().await;
        let room = rooms.get(&room_id)?;
        let user = &room.users[room.position(uid)?];
        Some(Progress {
            submitted: room.submitted_count(),
            total: room.users.len(),
            self_submitted: user.submitted(),
        })
    }

    /// 방 제거
    ///
    /// 캔버스 파일 삭제는 호출자가 락 밖에서 한다.
    pub async fn delete(&self, room_id: u32) -> Option<Arc<Room>> {
        let mut rooms = self.rooms.write().await;
        let room = rooms.remove(&room_id)?;
        room.removed.store(true, Ordering::Release);
        Some(room)
    }

    /// 만료된 방 하나 찾기
    pub async fn first_expired(&self, now: Instant) -> Option<u32> {
        let rooms = self.rooms.read().await;
        rooms
            .values()
            .find(|room| room.is_expired(now))
            .map(|room| room.id)
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }
}
