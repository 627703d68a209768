use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Folds the position back onto a `width` x `height` torus.
    pub fn wrapped(self, width: i32, height: i32) -> Self {
        Self {
            x: self.x.rem_euclid(width),
            y: self.y.rem_euclid(height),
        }
    }

    pub fn is_within(self, width: i32, height: i32) -> bool {
        self.x >= 0 && self.x < width && self.y >= 0 && self.y < height
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, other: Position) -> Position {
        Position::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, other: Position) -> Position {
        Position::new(self.x - other.x, self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Unit step on a y-down grid.
    pub fn to_vector(self) -> Position {
        match self {
            Direction::Up => Position::new(0, -1),
            Direction::Right => Position::new(1, 0),
            Direction::Down => Position::new(0, 1),
            Direction::Left => Position::new(-1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    pub fn is_opposite(self, other: Direction) -> bool {
        self.opposite() == other
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::Up => "Up",
            Direction::Right => "Right",
            Direction::Down => "Down",
            Direction::Left => "Left",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown direction `{0}`")]
pub struct ParseDirectionError(String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Direction::ALL
            .into_iter()
            .find(|direction| direction.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseDirectionError(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_symmetric_and_unique() {
        for direction in Direction::ALL {
            let opposites: Vec<Direction> = Direction::ALL
                .into_iter()
                .filter(|other| direction.is_opposite(*other))
                .collect();
            assert_eq!(opposites, vec![direction.opposite()]);
            assert!(direction.opposite().is_opposite(direction));
            assert!(!direction.is_opposite(direction));
        }
    }

    #[test]
    fn vectors_of_opposites_cancel_out() {
        for direction in Direction::ALL {
            let sum = direction.to_vector() + direction.opposite().to_vector();
            assert_eq!(sum, Position::new(0, 0));
        }
    }

    #[test]
    fn wrapping_folds_negative_and_overflowing_coordinates() {
        assert_eq!(Position::new(-1, 5).wrapped(10, 12), Position::new(9, 5));
        assert_eq!(Position::new(10, 12).wrapped(10, 12), Position::new(0, 0));
        assert_eq!(Position::new(3, 4) - Position::new(1, 1), Position::new(2, 3));
    }

    #[test]
    fn directions_parse_case_insensitively() {
        assert_eq!("up".parse::<Direction>(), Ok(Direction::Up));
        assert_eq!(" LEFT ".parse::<Direction>(), Ok(Direction::Left));
        assert!("sideways".parse::<Direction>().is_err());
    }
}
