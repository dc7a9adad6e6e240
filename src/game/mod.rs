pub mod board;
pub mod clock;
pub mod constants;
pub mod controller;
pub mod runner;
pub mod snake;
pub mod stats;
pub mod types;

use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
