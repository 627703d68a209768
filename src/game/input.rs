use super::engine::{Engine, GameState};
use super::geometry::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Turn(Direction),
    TogglePause,
}

pub fn parse_key(key: &str) -> Option<KeyCommand> {
    if key == " " {
        return Some(KeyCommand::TogglePause);
    }
    let command = match key.to_ascii_lowercase().as_str() {
        "arrowup" | "w" => KeyCommand::Turn(Direction::Up),
        "arrowdown" | "s" => KeyCommand::Turn(Direction::Down),
        "arrowleft" | "a" => KeyCommand::Turn(Direction::Left),
        "arrowright" | "d" => KeyCommand::Turn(Direction::Right),
        _ => return None,
    };
    Some(command)
}

/// Applies a raw keyboard key to the engine. Returns whether the key did anything.
pub fn handle_key(engine: &mut Engine, key: &str) -> bool {
    if engine.state() == GameState::GameOver {
        return false;
    }
    match parse_key(key) {
        Some(KeyCommand::TogglePause) => {
            engine.toggle_pause();
            true
        }
        Some(KeyCommand::Turn(direction)) => engine.change_direction(direction),
        None => false,
    }
}
