//! Match resolution: neighbour rebuild, same-colour group search and removal.
//!
//! Only the first qualifying group (in id order) is removed per call. A second
//! simultaneous group waits for the next settle-and-resolve round, which also
//! means it scores at the next chain level.

use crate::board::Board;
use crate::field::Field;
use crate::piece::{PieceColor, PieceId, PieceState};
use crate::scoring::Scoring;
use tracing::info;

/// Minimum connected same-colour pieces that get removed.
pub const MATCH_THRESHOLD: usize = 4;

/// Up, down, left, right.
const NEIGHBOURS_4: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// A removed piece, as it was just before removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Popped {
    pub col: i32,
    pub row: i32,
    pub color: PieceColor,
}

/// Outcome of one successful resolution round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub popped: Vec<Popped>,
    pub points: u32,
    /// Chain level the points were scaled by (before the increment).
    pub chain_level: u32,
}

/// Recompute every piece's neighbour set from the board (4-connectivity, clipped at the edges).
pub fn rebuild_neighbors(field: &mut Field) {
    let Field { board, pieces } = field;
    for piece in pieces.iter_mut() {
        piece.neighbors.clear();
        let Some((col, row)) = piece.cell() else {
            continue;
        };
        for (dc, dr) in NEIGHBOURS_4 {
            let (c, r) = (col as i32 + dc, row as i32 + dr);
            if !Board::contains(c, r) {
                continue;
            }
            if let Some(id) = board.occupant_at(c as usize, r as usize) {
                if id != piece.id {
                    piece.neighbors.push(id);
                }
            }
        }
    }
}

/// First same-colour component of at least [`MATCH_THRESHOLD`] pieces, seeding in id order.
/// Uses the neighbour sets as they stand; call [`rebuild_neighbors`] first.
pub fn find_first_group(field: &Field) -> Option<Vec<PieceId>> {
    let mut visited = vec![false; field.pieces.len()];
    for seed in 0..field.pieces.len() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        let color = field.piece(seed).color;
        let mut group = vec![seed];
        let mut stack = vec![seed];
        while let Some(id) = stack.pop() {
            for &n in &field.piece(id).neighbors {
                if !visited[n] && field.piece(n).color == color {
                    visited[n] = true;
                    group.push(n);
                    stack.push(n);
                }
            }
        }
        if group.len() >= MATCH_THRESHOLD {
            return Some(group);
        }
    }
    None
}

/// Remove the first qualifying group, if any: award points, compact and reindex the
/// pieces, drop every survivor back to Falling and rebuild the board. None means
/// nothing to resolve (the chain level is left alone).
pub fn resolve_round(field: &mut Field, scoring: &mut Scoring) -> Option<Resolution> {
    let group = find_first_group(field)?;
    let chain_level = scoring.chain_level;

    let mut doomed = vec![false; field.pieces.len()];
    let popped = group
        .iter()
        .map(|&id| {
            doomed[id] = true;
            let p = field.piece(id);
            Popped {
                col: p.col,
                row: p.row,
                color: p.color,
            }
        })
        .collect::<Vec<_>>();

    field.pieces.retain(|p| !doomed[p.id]);
    field.reindex();
    for piece in &mut field.pieces {
        piece.state = PieceState::Falling;
        piece.neighbors.clear();
    }
    field.rebuild_board();

    let points = scoring.award(group.len());
    info!(
        color = popped[0].color.name(),
        size = group.len(),
        points,
        chain_level,
        "group resolved"
    );
    Some(Resolution {
        popped,
        points,
        chain_level,
    })
}
