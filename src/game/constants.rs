pub const BOARD_WIDTH: i32 = 35;
pub const BOARD_HEIGHT: i32 = 28;
pub const SNAKE_COUNT: usize = 2;
pub const INITIAL_MAX_LENGTH: usize = 5;

pub const BASE_SLEEP_MS: u64 = 80;
pub const TURBO_SLEEP_MS: u64 = 40;
pub const TURBO_WINDOW_STEPS: u32 = 100;
pub const TURN_PROBABILITY: f64 = 0.10;
pub const TURBO_TURN_PROBABILITY: f64 = 0.05;
pub const PAUSE_POLL_MS: u64 = 100;

pub const OBSTACLE_COUNT: usize = 14;
pub const MOUSE_COUNT: usize = 6;
pub const TURBO_COUNT: usize = 4;
pub const TELEPORT_PAIRS: usize = 2;
pub const MAX_PLACEMENT_ATTEMPTS: usize = 32;

pub const CLOCK_FPS: u32 = 60;
