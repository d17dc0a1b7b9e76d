//! Field: the owned simulation context (live pieces + board) that every component operates on.

use crate::board::Board;
use crate::piece::{Piece, PieceColor, PieceId, PieceState};
use std::cmp::Reverse;

#[derive(Debug, Clone, Default)]
pub struct Field {
    pub board: Board,
    /// Live pieces; `pieces[i].id == i` after every compaction.
    pub pieces: Vec<Piece>,
}

impl Field {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn piece(&self, id: PieceId) -> &Piece {
        &self.pieces[id]
    }

    #[inline]
    pub fn piece_mut(&mut self, id: PieceId) -> &mut Piece {
        &mut self.pieces[id]
    }

    /// Append a new Initial piece and return its id.
    pub fn add(&mut self, color: PieceColor, col: i32, row: i32, fall_delay: u32) -> PieceId {
        let id = self.pieces.len();
        self.pieces.push(Piece::new(id, color, col, row, fall_delay));
        id
    }

    pub fn all_seated(&self) -> bool {
        self.pieces.iter().all(Piece::is_seated)
    }

    /// True if any seated piece came to rest above the visible top.
    pub fn overflowed(&self) -> bool {
        self.pieces.iter().any(|p| p.is_seated() && p.row < 0)
    }

    /// Give every piece its positional id.
    pub fn reindex(&mut self) {
        for (i, piece) in self.pieces.iter_mut().enumerate() {
            piece.id = i;
        }
    }

    /// Clear the board and re-register every seated, on-board piece.
    pub fn rebuild_board(&mut self) {
        self.board.reset();
        for piece in &self.pieces {
            if piece.state != PieceState::Seated {
                continue;
            }
            if let Some((col, row)) = piece.cell() {
                self.board.set(col, row, piece.id);
            }
        }
    }

    /// Run one gravity step on every piece, bottom row first (ties by id),
    /// so a piece below has settled before the one above checks its cell.
    pub fn advance_gravity(&mut self, fall_delay: u32) {
        let mut order: Vec<PieceId> = (0..self.pieces.len()).collect();
        order.sort_by_key(|&id| (Reverse(self.pieces[id].row), id));
        let Self { board, pieces } = self;
        for id in order {
            pieces[id].step_gravity(board, fall_delay);
        }
    }

    /// Board and pieces agree: each seated on-board piece owns exactly its own
    /// cell and every occupied cell belongs to such a piece.
    pub fn is_consistent(&self) -> bool {
        let seated_ok = self
            .pieces
            .iter()
            .filter(|p| p.is_seated())
            .filter_map(|p| p.cell().map(|cell| (p.id, cell)))
            .all(|(id, (col, row))| self.board.occupant_at(col, row) == Some(id));
        let cells_ok = self.board.occupied().all(|(col, row, id)| {
            self.pieces
                .get(id)
                .is_some_and(|p| p.is_seated() && p.cell() == Some((col, row)))
        });
        seated_ok && cells_ok
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Field with seated pieces at the given (col, row, colour) and a consistent board.
    pub(crate) fn seated_field(cells: &[(i32, i32, PieceColor)]) -> Field {
        let mut field = Field::new();
        for &(col, row, color) in cells {
            let id = field.add(color, col, row, 2);
            field.piece_mut(id).state = PieceState::Seated;
        }
        field.rebuild_board();
        field
    }

    #[test]
    fn rebuild_registers_only_seated_pieces() {
        let mut field = seated_field(&[(0, 11, PieceColor::Red), (1, 11, PieceColor::Blue)]);
        field.piece_mut(1).state = PieceState::Falling;
        field.rebuild_board();
        assert_eq!(field.board.occupant_at(0, 11), Some(0));
        assert_eq!(field.board.occupant_at(1, 11), None);
        assert!(field.is_consistent());
    }

    #[test]
    fn reindex_assigns_positions() {
        let mut field = seated_field(&[(0, 11, PieceColor::Red), (1, 11, PieceColor::Blue)]);
        field.pieces.remove(0);
        field.reindex();
        assert_eq!(field.piece(0).id, 0);
        assert_eq!(field.piece(0).color, PieceColor::Blue);
    }

    #[test]
    fn stacked_falling_pieces_settle_without_sharing_cells() {
        // Ids deliberately ordered top-down so id order would process the upper piece first.
        let mut field = Field::new();
        for row in [6, 7, 8] {
            let id = field.add(PieceColor::Green, 2, row, 2);
            field.piece_mut(id).state = PieceState::Falling;
        }
        for _ in 0..40 {
            field.advance_gravity(2);
            assert!(field.is_consistent());
        }
        let mut rows: Vec<i32> = field.pieces.iter().map(|p| p.row).collect();
        rows.sort_unstable();
        assert_eq!(rows, vec![9, 10, 11]);
        assert!(field.all_seated());
    }

    #[test]
    fn overflow_detects_seated_piece_above_top() {
        let mut field = seated_field(&[(3, 0, PieceColor::Red)]);
        assert!(!field.overflowed());
        let id = field.add(PieceColor::Red, 3, -1, 2);
        field.piece_mut(id).state = PieceState::Seated;
        assert!(field.overflowed());
    }

    #[test]
    fn consistency_catches_stale_cells() {
        let mut field = seated_field(&[(0, 11, PieceColor::Red)]);
        field.board.set(4, 4, 0);
        assert!(!field.is_consistent());
    }
}
