pub const MIN_BOARD_SIZE: i32 = 10;
pub const INITIAL_SNAKE_LENGTH: usize = 3;
pub const MIN_SNAKE_LENGTH: usize = 3;

pub const BASE_LOGIC_INTERVAL_MS: f64 = 1000.0 / 10.0;
pub const SCORE_SPEEDUP_PER_POINT: f64 = 0.01;
pub const MIN_INTERVAL_SCALE: f64 = 0.5;

pub const FOOD_POINTS: u32 = 100;
pub const POWER_UP_POINTS: u32 = 50;
pub const DOUBLE_POINTS_FACTOR: u32 = 2;

pub const MAX_QUEUED_DIRECTIONS: usize = 2;
pub const MAX_POWER_UPS: usize = 2;
pub const MAX_POWER_UPS_PER_SPAWN: usize = 2;

pub const INITIAL_POWER_UP_SPAWN_DELAY_MS: i64 = 5_000;
pub const MIN_POWER_UP_SPAWN_DELAY_MS: i64 = 5_000;
pub const MAX_POWER_UP_SPAWN_DELAY_MS: i64 = 15_000;

pub const SPEED_BOOST_MULTIPLIER: f64 = 1.5;
pub const SHRINK_SEGMENTS: usize = 3;
