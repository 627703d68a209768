use super::engine::GameState;
use super::geometry::{Direction, Position};
use super::power_up::PowerUpKind;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoardSize {
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerUpSnapshot {
    pub kind: PowerUpKind,
    pub position: Position,
    pub remaining_expiry: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveEffectSnapshot {
    pub kind: PowerUpKind,
    pub remaining_effect: f64,
    pub effect_duration_secs: i64,
}

/// Everything a client needs to draw one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub board_size: BoardSize,
    pub snake: Vec<Position>,
    pub food: Position,
    pub score: u32,
    pub game_state: GameState,
    pub direction: Direction,
    pub power_ups: Vec<PowerUpSnapshot>,
    pub active_effects: Vec<ActiveEffectSnapshot>,
    pub is_shield_active: bool,
    pub is_double_points_active: bool,
    pub speed_multiplier: f64,
    pub elapsed_ms: i64,
}
