pub mod clock;
pub mod constants;
pub mod engine;
pub mod geometry;
pub mod input;
pub mod power_up;
pub mod snapshot;

pub use engine::{Engine, GameState};
pub use geometry::Direction;
pub use snapshot::GameSnapshot;
