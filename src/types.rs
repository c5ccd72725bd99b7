// Core value types shared by every simulation module
// Cells are grid units; pixel conversion lives in the grid module.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 2D cell on the board, in grid units (not pixels)
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Cell { x, y }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Represents the four possible movement directions for a snake.
/// Screen coordinates: `Up` decreases `y`, the header band sits at the top.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Returns all possible directions
    pub fn all() -> [Direction; 4] {
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// The complementary direction; a committed direction never flips to it in one tick
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn is_opposite(&self, other: Direction) -> bool {
        self.opposite() == other
    }

    /// Calculates the next cell when moving one step in this direction
    pub fn apply(&self, cell: &Cell) -> Cell {
        match self {
            Direction::Up => Cell { x: cell.x, y: cell.y - 1 },
            Direction::Down => Cell { x: cell.x, y: cell.y + 1 },
            Direction::Left => Cell { x: cell.x - 1, y: cell.y },
            Direction::Right => Cell { x: cell.x + 1, y: cell.y },
        }
    }

    /// Parses the lowercase names used by logs and the terminal driver
    pub fn parse(s: &str) -> Result<Direction, String> {
        match s.to_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            _ => Err(format!("Invalid direction: {}", s)),
        }
    }
}

/// Player slot. Externally numbered 1 and 2.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub fn all() -> [Player; 2] {
        [Player::One, Player::Two]
    }

    /// Zero-based index into per-player tables
    pub fn index(&self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }

    pub fn number(&self) -> u8 {
        self.index() as u8 + 1
    }

    pub fn from_number(n: u8) -> Option<Player> {
        match n {
            1 => Some(Player::One),
            2 => Some(Player::Two),
            _ => None,
        }
    }

    pub fn other(&self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.number())
    }
}
