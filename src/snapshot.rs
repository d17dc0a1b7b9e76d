//! Read-only view of the simulation, sampled after a tick for the presentation layer.

use crate::piece::{Piece, PieceColor, PieceId, PieceState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceView {
    pub id: PieceId,
    pub color: PieceColor,
    pub state: PieceState,
    pub col: i32,
    pub row: i32,
}

impl From<&Piece> for PieceView {
    fn from(p: &Piece) -> Self {
        Self {
            id: p.id,
            color: p.color,
            state: p.state,
            col: p.col,
            row: p.row,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Ordered by id.
    pub pieces: Vec<PieceView>,
    pub score: u32,
    pub chain_level: u32,
    pub game_over: bool,
    /// A falling pair is under control or still landing.
    pub pair_active: bool,
    /// A settle point was reached and a resolution pass is due or running.
    pub resolving: bool,
}

impl Snapshot {
    /// Pieces inside the visible grid.
    pub fn visible(&self) -> impl Iterator<Item = &PieceView> {
        self.pieces.iter().filter(|p| p.row >= 0)
    }
}
