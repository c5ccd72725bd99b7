// Library exports for the snake simulation core
// The terminal driver and the soak runner both build on these modules.

pub mod collision;
pub mod config;
pub mod engine;
pub mod error;
pub mod food;
pub mod grid;
pub mod scores;
pub mod snake;
pub mod tick_logger;
pub mod types;

pub use engine::{GameMode, Phase, SimulationEngine, Snapshot, TickEvent, TickResult};
pub use error::SimError;
pub use types::{Cell, Direction, Player};
