//! 방/사용자 식별자 생성

use crate::error::FatalError;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};

/// 새 방 ID 생성
///
/// OS 난수원에서 32비트 전체 범위를 뽑고, `taken`이 true를 돌려주는 값은 다시 뽑는다.
/// 확인과 삽입 사이에 다른 생성이 끼어들지 않도록 호출자가 레지스트리 쓰기 락을 잡고 있어야 한다.
pub fn new_room_id(taken: impl Fn(u32) -> bool) -> Result<u32, FatalError> {
    let mut bytes = [0u8; 4];
    loop {
        OsRng.try_fill_bytes(&mut bytes)?;
        let id = u32::from_le_bytes(bytes);
        if !taken(id) {
            return Ok(id);
        }
    }
}

/// 새 사용자 ID 생성 (방 안에서만 유일하면 됨)
pub fn new_user_id(exclude: &[u32]) -> u32 {
    let mut rng = rand::thread_rng();
    loop {
        let uid: u32 = rng.gen();
        if !exclude.contains(&uid) {
            return uid;
        }
    }
}

/// 참가자 수만큼 서로 다른 사용자 ID 생성
pub fn new_user_ids(count: usize) -> Vec<u32> {
    let mut uids = Vec::with_capacity(count);
    for _ in 0..count {
        let uid = new_user_id(&uids);
        uids.push(uid);
    }
    uids
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashSet;

    #[test]
    fn test_user_ids_are_distinct() {
        let uids = new_user_ids(255);
        let unique: HashSet<_> = uids.iter().collect();
        assert_eq!(uids.len(), 255);
        assert_eq!(unique.len(), 255);
    }

    #[test]
    fn test_room_id_retries_on_collision() {
        let attempts = Cell::new(0);
        let result = new_room_id(|_| {
            attempts.set(attempts.get() + 1);
            attempts.get() < 3
        });
        assert!(result.is_ok());
        assert_eq!(attempts.get(), 3);
    }
}
