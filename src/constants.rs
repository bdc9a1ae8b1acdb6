pub const TICK_RATE: u32 = 20;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const MAZE_WIDTH: i32 = 25;
pub const MAZE_HEIGHT: i32 = 25;
pub const TIME_LIMIT_MS: u64 = 300_000;

pub const STAR_COUNT: u32 = 5;
pub const ENHANCED_UNLOCK_STARS: u32 = 3;

pub const PLAYER_MOVE_DELAY_MS: u64 = 150;
pub const SPRINT_DELAY_FACTOR: f64 = 0.5;
pub const SPRINT_COOLDOWN_MS: u64 = 3_000;
pub const STEALTH_CHARGES: u32 = 5;
pub const STEALTH_DURATION_MS: u64 = 5_000;

pub const GLOBAL_EVENT_DURATION_MS: u64 = 5_000;
pub const MINIMAP_DURATION_MS: u64 = 5_000;
pub const ENEMY_SPEED_UP_FACTOR: f64 = 0.5;

pub const PLAYER_VISION_RADIUS: f64 = 5.0;
pub const PATROL_VISION_RADIUS: f64 = 7.0;

pub const PATROL_MOVE_DELAY_MS: u64 = 300;
pub const DETECTOR_MOVE_DELAY_MS: u64 = 500;
pub const ENHANCED_MOVE_DELAY_MS: u64 = 250;
pub const PREDICTION_STEPS: i32 = 3;
pub const PATROL_WAYPOINTS: usize = 8;
pub const PATROL_STRIDE: i32 = 3;

pub const STAR_MIN_DISTANCE: f64 = 5.0;
pub const MINIMAP_MIN_DISTANCE: f64 = 8.0;
pub const EVENT_BOX_MIN_DISTANCE: f64 = 10.0;
pub const PURSUER_MIN_DISTANCE: f64 = 5.0;
pub const PURSUER_MAX_DISTANCE_RATIO: f64 = 0.7;
pub const ENHANCED_MIN_DISTANCE: f64 = 8.0;
pub const EXIT_DISTANCE_MARGIN: f64 = 3.0;

pub const NOTICE_MS: u64 = 2_000;
pub const NOTICE_LONG_MS: u64 = 3_000;
pub const NOTICE_PLACEMENT_MS: u64 = 2_500;
pub const NOTICE_ANOMALY_MS: u64 = 5_000;

pub fn exit_min_distance() -> f64 {
    PLAYER_VISION_RADIUS + EXIT_DISTANCE_MARGIN
}

pub fn pursuer_max_distance(width: i32) -> f64 {
    width as f64 * PURSUER_MAX_DISTANCE_RATIO
}

pub fn player_move_delay_ms(sprinting: bool) -> u64 {
    if sprinting {
        (PLAYER_MOVE_DELAY_MS as f64 * SPRINT_DELAY_FACTOR).round() as u64
    } else {
        PLAYER_MOVE_DELAY_MS
    }
}

pub fn sped_up_delay_ms(base_ms: u64) -> u64 {
    (base_ms as f64 * ENEMY_SPEED_UP_FACTOR).round() as u64
}
