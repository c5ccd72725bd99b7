// Configuration module for reading Game.toml
// Board geometry, round rules, frame timing and the locations of the score and tick logs.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::Result as SimResult;
use crate::grid::Board;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub board: BoardConfig,
    pub rules: RulesConfig,
    pub food: FoodConfig,
    pub timing: TimingConfig,
    pub scores: ScoresConfig,
    pub debug: DebugConfig,
}

/// Board geometry in pixels
#[derive(Debug, Deserialize, Clone)]
pub struct BoardConfig {
    pub width: i32,
    pub height: i32,
    pub block_size: i32,
    pub header_height: i32,
}

/// Round setup
#[derive(Debug, Deserialize, Clone)]
pub struct RulesConfig {
    pub initial_length: usize,
    /// Cells between the two starting heads in multiplayer
    pub multiplayer_spawn_offset: i32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FoodConfig {
    /// Rejection-sampling draws allowed per requested cell
    pub spawn_attempt_cap: u64,
}

/// Frame clock of the terminal driver
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    pub tick_interval_ms: u64,
}

/// Score persistence
#[derive(Debug, Deserialize, Clone)]
pub struct ScoresConfig {
    pub store_path: String,
    pub top_limit: usize,
}

/// Per-tick JSONL logging
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Game.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        toml::from_str(&contents).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Loads default configuration from Game.toml in the working directory
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Game.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the values in Game.toml
    pub fn default_hardcoded() -> Self {
        Config {
            board: BoardConfig {
                width: 800,
                height: 800,
                block_size: 10,
                header_height: 50,
            },
            rules: RulesConfig {
                initial_length: 3,
                multiplayer_spawn_offset: 5,
            },
            food: FoodConfig {
                spawn_attempt_cap: 10_000,
            },
            timing: TimingConfig {
                tick_interval_ms: 50,
            },
            scores: ScoresConfig {
                store_path: "scores.jsonl".to_string(),
                top_limit: 10,
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "snake_ticks.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            log::warn!("Could not load Game.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }

    /// Builds the validated board described by `[board]`
    pub fn board(&self) -> SimResult<Board> {
        Board::new(
            self.board.width,
            self.board.height,
            self.board.block_size,
            self.board.header_height,
        )
    }
}
