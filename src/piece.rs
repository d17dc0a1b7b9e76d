//! Piece: a single coloured blob with a lifecycle state and its own gravity timer.

use crate::board::{BOARD_HEIGHT, Board};
use arrayvec::ArrayVec;
use rand::Rng;

/// Positional index into the live piece collection. Reassigned whenever the
/// collection is compacted, so never hold one across a resolution round.
pub type PieceId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceColor {
    Red,
    Blue,
    Green,
    Yellow,
}

impl PieceColor {
    pub const ALL: [Self; 4] = [Self::Red, Self::Blue, Self::Green, Self::Yellow];

    /// Uniform pick over the four colours.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    /// Index 0..4, used for theme lookup.
    pub fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Blue => 1,
            Self::Green => 2,
            Self::Yellow => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Yellow => "yellow",
        }
    }
}

/// Lifecycle of a piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceState {
    /// Just spawned: falls under gravity and, while its partner is also Initial, obeys player commands.
    Initial,
    /// Falling after material beneath it was cleared; not player-controllable.
    Falling,
    /// At rest; occupies a board cell and takes part in matching.
    Seated,
}

#[derive(Debug, Clone)]
pub struct Piece {
    pub id: PieceId,
    pub color: PieceColor,
    /// Column, 0..BOARD_WIDTH.
    pub col: i32,
    /// Row; negative while above the visible top.
    pub row: i32,
    pub state: PieceState,
    /// Set on the primary of the falling pair only.
    pub partner: Option<PieceId>,
    /// Ids of the occupants of the up to four orthogonally adjacent cells.
    pub neighbors: ArrayVec<PieceId, 4>,
    fall_timer: u32,
}

impl Piece {
    pub fn new(id: PieceId, color: PieceColor, col: i32, row: i32, fall_delay: u32) -> Self {
        Self {
            id,
            color,
            col,
            row,
            state: PieceState::Initial,
            partner: None,
            neighbors: ArrayVec::new(),
            fall_timer: fall_delay,
        }
    }

    /// Board cell of this piece, or None while it is above the top row.
    #[inline]
    pub fn cell(&self) -> Option<(usize, usize)> {
        Board::contains(self.col, self.row).then(|| (self.col as usize, self.row as usize))
    }

    #[inline]
    pub fn is_seated(&self) -> bool {
        self.state == PieceState::Seated
    }

    /// One gravity step. Order matters:
    /// 1. reaching the floor row seats the piece there;
    /// 2. standing in a cell owned by another piece backs off one row and seats;
    /// 3. a seated piece (re-)registers its cell and resets its timer;
    /// 4. otherwise the timer counts down and the piece drops one row when it expires.
    ///
    /// Rows above the board are never looked up.
    pub fn step_gravity(&mut self, board: &mut Board, fall_delay: u32) {
        let floor = BOARD_HEIGHT as i32 - 1;
        if self.row >= floor {
            self.row = floor;
            self.state = PieceState::Seated;
        }
        if let Some((col, row)) = self.cell() {
            if board.occupant_at(col, row).is_some_and(|other| other != self.id) {
                self.row -= 1;
                self.state = PieceState::Seated;
            }
        }

        if self.state == PieceState::Seated {
            if let Some((col, row)) = self.cell() {
                board.set(col, row, self.id);
            }
            self.fall_timer = fall_delay;
            return;
        }

        self.fall_timer = self.fall_timer.saturating_sub(1);
        if self.fall_timer == 0 {
            self.row += 1;
            self.fall_timer = fall_delay;
        }
    }
}
