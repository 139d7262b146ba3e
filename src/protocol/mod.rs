//! 프로토콜 정의

pub mod messages;

pub use messages::*;
