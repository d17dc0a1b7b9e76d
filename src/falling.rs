//! Falling pair: spawning, shifting and rotating the player-controlled primary + partner.
//!
//! Every command is validated against the board first and is a no-op when rejected.

use crate::board::{BOARD_HEIGHT, BOARD_WIDTH, Board};
use crate::field::Field;
use crate::piece::{Piece, PieceColor, PieceId, PieceState};

/// Column new pairs appear in (horizontal centre).
pub const SPAWN_COLUMN: i32 = (BOARD_WIDTH / 2) as i32;

const WIDTH: i32 = BOARD_WIDTH as i32;
const HEIGHT: i32 = BOARD_HEIGHT as i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    Left,
    Right,
    Down,
}

impl Shift {
    fn delta(self) -> (i32, i32) {
        match self {
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::Down => (0, 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spin {
    Clockwise,
    CounterClockwise,
}

/// Where the partner sits relative to the primary (the pivot).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Above,
    Right,
    Below,
    Left,
}

impl Orientation {
    pub fn offset(self) -> (i32, i32) {
        match self {
            Self::Above => (0, -1),
            Self::Right => (1, 0),
            Self::Below => (0, 1),
            Self::Left => (-1, 0),
        }
    }

    pub fn clockwise(self) -> Self {
        match self {
            Self::Above => Self::Right,
            Self::Right => Self::Below,
            Self::Below => Self::Left,
            Self::Left => Self::Above,
        }
    }

    pub fn counter_clockwise(self) -> Self {
        match self {
            Self::Above => Self::Left,
            Self::Left => Self::Below,
            Self::Below => Self::Right,
            Self::Right => Self::Above,
        }
    }

    /// Orientation of `partner` around `pivot`; None if they are not orthogonally adjacent.
    pub fn between(pivot: &Piece, partner: &Piece) -> Option<Self> {
        match (partner.col - pivot.col, partner.row - pivot.row) {
            (0, -1) => Some(Self::Above),
            (1, 0) => Some(Self::Right),
            (0, 1) => Some(Self::Below),
            (-1, 0) => Some(Self::Left),
            _ => None,
        }
    }
}

/// Create a new pair in the spawn column: primary on the top visible row,
/// partner directly above it (off-board). Returns the primary's id.
pub fn spawn_pair(
    field: &mut Field,
    primary_color: PieceColor,
    partner_color: PieceColor,
    fall_delay: u32,
) -> PieceId {
    let primary = field.add(primary_color, SPAWN_COLUMN, 0, fall_delay);
    let partner = field.add(partner_color, SPAWN_COLUMN, -1, fall_delay);
    field.piece_mut(primary).partner = Some(partner);
    primary
}

/// The partner id, if the pair currently accepts commands: both pieces Initial
/// and the primary on the board.
fn controllable_partner(field: &Field, primary: PieceId) -> Option<PieceId> {
    let pivot = field.piece(primary);
    let partner = pivot.partner?;
    let controllable = pivot.state == PieceState::Initial
        && field.piece(partner).state == PieceState::Initial
        && pivot.row >= 0;
    controllable.then_some(partner)
}

#[inline]
fn occupied(board: &Board, col: i32, row: i32) -> bool {
    Board::contains(col, row) && board.is_occupied(col as usize, row as usize)
}

/// Translate both pieces one cell. Neither may leave the board, and each piece whose
/// destination is not its partner's current cell (the leading side) needs a free cell.
pub fn shift_pair(field: &mut Field, primary: PieceId, shift: Shift) -> bool {
    let Some(partner) = controllable_partner(field, primary) else {
        return false;
    };
    let (dc, dr) = shift.delta();
    let ids = [primary, partner];
    let at = ids.map(|id| {
        let p = field.piece(id);
        (p.col, p.row)
    });

    for (i, &(col, row)) in at.iter().enumerate() {
        let dest = (col + dc, row + dr);
        if dest.0 < 0 || dest.0 >= WIDTH || dest.1 >= HEIGHT {
            return false;
        }
        let leading = dest != at[1 - i];
        if leading && occupied(&field.board, dest.0, dest.1) {
            return false;
        }
    }

    for id in ids {
        let piece = field.piece_mut(id);
        piece.col += dc;
        piece.row += dr;
    }
    true
}

/// Move the partner one step around the primary. Sideways destinations are
/// edge-checked; the one above the pivot needs only the occupancy check.
pub fn rotate_pair(field: &mut Field, primary: PieceId, spin: Spin) -> bool {
    let Some(partner) = controllable_partner(field, primary) else {
        return false;
    };
    let pivot = field.piece(primary);
    let Some(current) = Orientation::between(pivot, field.piece(partner)) else {
        return false;
    };
    let target = match spin {
        Spin::Clockwise => current.clockwise(),
        Spin::CounterClockwise => current.counter_clockwise(),
    };
    let (dc, dr) = target.offset();
    let (col, row) = (pivot.col + dc, pivot.row + dr);

    let off_board = match target {
        Orientation::Left | Orientation::Right => !(0..WIDTH).contains(&col),
        // Pivot on the bottom row: the cell below does not exist.
        Orientation::Below => row >= HEIGHT,
        Orientation::Above => false,
    };
    if off_board || occupied(&field.board, col, row) {
        return false;
    }

    let satellite = field.piece_mut(partner);
    satellite.col = col;
    satellite.row = row;
    true
}
