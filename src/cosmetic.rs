//! 브러시/배경 꾸밈 설정 무작위 생성
//!
//! 레지스트리와 합성기는 이 값들을 해석하지 않고 저장만 한다.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// 사용자별 브러시 스타일
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStyle {
    pub clr: String,
    pub ink: f32,
    pub depth: f32,
    pub centered: u32,
    pub bristles: u32,
    pub smoothing: f32,
    pub lift_smoothing: f32,
    pub start_smoothing: f32,
}

/// 배경 장식 (점 무늬)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DotsStyle {
    pub clr: String,
    pub points: u32,
    pub d: f32,
    pub rp: f32,
    pub pointup: bool,
}

/// 방 공통 배경 스타일
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomStyle {
    pub bg: String,
    pub dots: Vec<DotsStyle>,
}

/// `hsl(H, S%, L%)` 형식의 무작위 색상
fn random_color(rng: &mut impl Rng, luma_base: f32, luma_spread: f32, sat_max: f32) -> String {
    let luma = rng.gen::<f32>() * 2.0 * luma_spread + (luma_base - luma_spread);
    let sat = rng.gen::<f32>() * sat_max;
    let hue = rng.gen_range(0..360);

    format!("hsl({}, {}%, {}%)", hue, sat as i32, luma as i32)
}

pub fn random_room_style() -> RoomStyle {
    let mut rng = rand::thread_rng();

    let bg = random_color(&mut rng, 60.0, 12.0, 12.0);
    let count = rng.gen_range(0..5);
    let dots = (0..count)
        .map(|_| DotsStyle {
            clr: "#000000".to_string(),
            points: rng.gen_range(3..11),
            d: 2.0 / 3.0 + rng.gen::<f32>() - 0.5,
            rp: 3.0,
            pointup: rng.gen(),
        })
        .collect();

    RoomStyle { bg, dots }
}

/// 참가자 수에 따라 잉크량이 나뉘는 브러시 스타일
pub fn random_user_style(participants: u8) -> UserStyle {
    let mut rng = rand::thread_rng();

    UserStyle {
        clr: random_color(&mut rng, 24.0, 15.0, 45.0),
        ink: 240_000.0 / f32::from(participants.max(1)),
        depth: 72.0,
        centered: rng.gen_range(6..18),
        bristles: rng.gen_range(60..150),
        smoothing: 0.21,
        lift_smoothing: 0.06,
        start_smoothing: 0.021,
    }
}
