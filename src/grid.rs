// Board geometry: the coordinate system and bounds queries over the playable area.
//
// The board is described in pixels (as the render collaborator sees it) but every
// query works in cells. Rows `0..header_rows` are reserved for the header band.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::types::Cell;

/// Immutable board dimensions for one session
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    width: i32,
    height: i32,
    block_size: i32,
    header_height: i32,
}

impl Board {
    /// Validates and builds a board from pixel dimensions
    ///
    /// # Errors
    /// `SimError::InvalidBoard` when the cell size is not positive or no playable
    /// column/row remains below the header band.
    pub fn new(width: i32, height: i32, block_size: i32, header_height: i32) -> Result<Self> {
        if block_size <= 0 {
            return Err(SimError::InvalidBoard(format!(
                "block_size must be positive, got {}",
                block_size
            )));
        }
        if header_height < 0 {
            return Err(SimError::InvalidBoard(format!(
                "header_height must not be negative, got {}",
                header_height
            )));
        }

        let board = Board {
            width,
            height,
            block_size,
            header_height,
        };

        if board.columns() <= 0 {
            return Err(SimError::InvalidBoard(format!(
                "width {} holds no {}px column",
                width, block_size
            )));
        }
        if board.playable_rows() <= 0 {
            return Err(SimError::InvalidBoard(format!(
                "height {} leaves no playable row below a {}px header",
                height, header_height
            )));
        }

        Ok(board)
    }

    /// Board measured directly in cells with no header band
    pub fn from_cells(columns: i32, rows: i32) -> Result<Self> {
        Board::new(columns, rows, 1, 0)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn block_size(&self) -> i32 {
        self.block_size
    }

    pub fn header_height(&self) -> i32 {
        self.header_height
    }

    pub fn columns(&self) -> i32 {
        self.width / self.block_size
    }

    pub fn rows(&self) -> i32 {
        self.height / self.block_size
    }

    /// First playable row. A row partially covered by the header counts as header.
    pub fn header_rows(&self) -> i32 {
        (self.header_height + self.block_size - 1) / self.block_size
    }

    pub fn playable_rows(&self) -> i32 {
        self.rows() - self.header_rows()
    }

    pub fn playable_cells(&self) -> usize {
        (self.columns().max(0) as usize) * (self.playable_rows().max(0) as usize)
    }

    /// Converts a pixel position to the cell containing it
    pub fn to_cell(&self, px: i32, py: i32) -> Cell {
        Cell {
            x: px.div_euclid(self.block_size),
            y: py.div_euclid(self.block_size),
        }
    }

    /// Top-left pixel of a cell; always a multiple of `block_size`
    pub fn to_pixel(&self, cell: Cell) -> (i32, i32) {
        (cell.x * self.block_size, cell.y * self.block_size)
    }

    pub fn is_in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0
            && cell.x < self.columns()
            && cell.y >= self.header_rows()
            && cell.y < self.rows()
    }

    pub fn is_in_header(&self, cell: Cell) -> bool {
        cell.y >= 0 && cell.y < self.header_rows()
    }

    /// Folds a cell that left the playable area back onto the opposite edge
    pub fn wrap(&self, cell: Cell) -> Cell {
        let header = self.header_rows();
        Cell {
            x: cell.x.rem_euclid(self.columns()),
            y: header + (cell.y - header).rem_euclid(self.playable_rows()),
        }
    }

    /// Uniformly random playable cell
    pub fn random_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Cell {
        Cell {
            x: rng.random_range(0..self.columns()),
            y: rng.random_range(self.header_rows()..self.rows()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn board() -> Board {
        // 80 columns, 80 rows, 5 header rows
        Board::new(800, 800, 10, 50).unwrap()
    }

    #[test]
    fn test_dimensions() {
        let b = board();
        assert_eq!(b.columns(), 80);
        assert_eq!(b.rows(), 80);
        assert_eq!(b.header_rows(), 5);
        assert_eq!(b.playable_rows(), 75);
        assert_eq!(b.playable_cells(), 80 * 75);
    }

    #[test]
    fn test_partial_header_row_counts_as_header() {
        let b = Board::new(100, 100, 10, 45).unwrap();
        assert_eq!(b.header_rows(), 5);
    }

    #[test]
    fn test_bounds_checking() {
        let b = board();
        assert!(b.is_in_bounds(Cell::new(0, 5)));
        assert!(b.is_in_bounds(Cell::new(79, 79)));
        assert!(!b.is_in_bounds(Cell::new(-1, 10)));
        assert!(!b.is_in_bounds(Cell::new(80, 10)));
        assert!(!b.is_in_bounds(Cell::new(10, 4)));
        assert!(!b.is_in_bounds(Cell::new(10, 80)));
        assert!(b.is_in_header(Cell::new(10, 4)));
        assert!(!b.is_in_header(Cell::new(10, 5)));
    }

    #[test]
    fn test_pixel_conversion() {
        let b = board();
        assert_eq!(b.to_cell(405, 399), Cell::new(40, 39));
        assert_eq!(b.to_cell(-1, 0), Cell::new(-1, 0));
        let (px, py) = b.to_pixel(Cell::new(12, 7));
        assert_eq!((px, py), (120, 70));
        assert_eq!(px % b.block_size(), 0);
        assert_eq!(py % b.block_size(), 0);
    }

    #[test]
    fn test_wrap_all_edges() {
        let b = board();
        assert_eq!(b.wrap(Cell::new(80, 20)), Cell::new(0, 20));
        assert_eq!(b.wrap(Cell::new(-1, 20)), Cell::new(79, 20));
        assert_eq!(b.wrap(Cell::new(30, 4)), Cell::new(30, 79));
        assert_eq!(b.wrap(Cell::new(30, 80)), Cell::new(30, 5));
        // In-bounds cells are untouched
        assert_eq!(b.wrap(Cell::new(30, 30)), Cell::new(30, 30));
    }

    #[test]
    fn test_random_cell_stays_playable() {
        let b = board();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2_000 {
            let c = b.random_cell(&mut rng);
            assert!(b.is_in_bounds(c), "{} escaped the playable area", c);
        }
    }

    #[test]
    fn test_invalid_boards_rejected() {
        assert!(matches!(Board::new(800, 800, 0, 0), Err(SimError::InvalidBoard(_))));
        assert!(matches!(Board::new(5, 800, 10, 0), Err(SimError::InvalidBoard(_))));
        assert!(matches!(Board::new(800, 50, 10, 50), Err(SimError::InvalidBoard(_))));
        assert!(matches!(Board::new(800, 800, 10, -10), Err(SimError::InvalidBoard(_))));
    }
}
