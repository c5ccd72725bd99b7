//! Error taxonomy for the simulation core.
//!
//! Nothing in a tick is recoverable: game outcomes (death, wrap, tie) are
//! state, so every variant here means the caller or the board geometry broke
//! an assumption. Callers treat errors from `tick()` as fatal.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Rejection sampling ran past its safety cap; the board-capacity assumption was violated.
    #[error("food spawner exhausted: {requested} cell(s) requested, gave up after {attempts} draws")]
    FoodSpawnExhausted { requested: usize, attempts: u64 },
    #[error("tick() called after the round ended at tick {tick}")]
    RoundOver { tick: u64 },
    #[error("invalid board: {0}")]
    InvalidBoard(String),
    #[error("invalid game mode: {0}")]
    InvalidMode(String),
}
