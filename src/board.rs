//! Board: fixed 6x12 occupancy grid. Each cell is empty or holds the id of the seated piece there.

use crate::piece::PieceId;

/// Columns on the board.
pub const BOARD_WIDTH: usize = 6;
/// Visible rows on the board. Row 0 is the top; rows above it are negative and never stored.
pub const BOARD_HEIGHT: usize = 12;

/// Occupancy grid, indexed `cells[col][row]`.
///
/// Out-of-range coordinates are a caller bug: bounds-check with [`Board::contains`]
/// (or the piece position) before converting to `usize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[Option<PieceId>; BOARD_HEIGHT]; BOARD_WIDTH],
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [[None; BOARD_HEIGHT]; BOARD_WIDTH],
        }
    }

    /// True if (col, row) lies inside the visible grid.
    #[inline]
    pub fn contains(col: i32, row: i32) -> bool {
        col >= 0 && row >= 0 && (col as usize) < BOARD_WIDTH && (row as usize) < BOARD_HEIGHT
    }

    #[inline]
    pub fn occupant_at(&self, col: usize, row: usize) -> Option<PieceId> {
        self.cells[col][row]
    }

    #[inline]
    pub fn is_occupied(&self, col: usize, row: usize) -> bool {
        self.cells[col][row].is_some()
    }

    #[inline]
    pub fn set(&mut self, col: usize, row: usize, id: PieceId) {
        self.cells[col][row] = Some(id);
    }

    #[inline]
    pub fn clear(&mut self, col: usize, row: usize) {
        self.cells[col][row] = None;
    }

    /// Mark every cell empty.
    pub fn reset(&mut self) {
        for column in &mut self.cells {
            column.fill(None);
        }
    }

    /// Occupied cells as (col, row, id), column-major.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, PieceId)> + '_ {
        self.cells.iter().enumerate().flat_map(|(col, column)| {
            column
                .iter()
                .enumerate()
                .filter_map(move |(row, cell)| cell.map(|id| (col, row, id)))
        })
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
