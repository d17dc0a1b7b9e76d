//! Game state: the per-tick round orchestration over the field.
//!
//! Each tick runs, in order: settle check for the falling pair (or, with no pair and
//! everything at rest, one resolution round and a spawn if nothing matched), one
//! queued command, then one gravity step for every piece.

use crate::GameConfig;
use crate::command::{Command, CommandQueue};
use crate::falling::{self, Shift, Spin};
use crate::field::Field;
use crate::piece::{PieceColor, PieceId};
use crate::resolve::{self, Popped};
use crate::scoring::Scoring;
use crate::snapshot::{PieceView, Snapshot};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::VecDeque;
use tracing::{debug, info};

/// Upcoming pairs kept ready for the preview.
pub const NEXT_PREVIEW: usize = 2;

#[derive(Debug)]
pub struct GameState {
    field: Field,
    scoring: Scoring,
    /// Primary of the falling pair while one exists.
    active_pair: Option<PieceId>,
    commands: CommandQueue,
    next_pairs: VecDeque<(PieceColor, PieceColor)>,
    rng: StdRng,
    fall_delay: u32,
    game_over: bool,
    resolving: bool,
    /// Pieces removed since the presentation last asked.
    popped: Vec<Popped>,
    pub ticks: u64,
}

impl GameState {
    pub fn new(config: &GameConfig) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self::with_rng(rng, config.fall_delay)
    }

    pub fn with_rng(rng: StdRng, fall_delay: u32) -> Self {
        let mut state = Self {
            field: Field::new(),
            scoring: Scoring::default(),
            active_pair: None,
            commands: CommandQueue::default(),
            next_pairs: VecDeque::with_capacity(NEXT_PREVIEW + 1),
            rng,
            fall_delay,
            game_over: false,
            resolving: false,
            popped: Vec::new(),
            ticks: 0,
        };
        state.refill_next();
        state
    }

    pub fn score(&self) -> u32 {
        self.scoring.score
    }

    pub fn chain_level(&self) -> u32 {
        self.scoring.chain_level
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn has_active_pair(&self) -> bool {
        self.active_pair.is_some()
    }

    pub fn next_pairs(&self) -> impl Iterator<Item = &(PieceColor, PieceColor)> {
        self.next_pairs.iter().take(NEXT_PREVIEW)
    }

    /// Replace the upcoming pairs; random pairs follow once these run out.
    pub fn preset_next(&mut self, pairs: &[(PieceColor, PieceColor)]) {
        self.next_pairs.clear();
        self.next_pairs.extend(pairs.iter().copied());
        self.refill_next();
    }

    /// Queue a command for a later tick. Ignored after game over.
    pub fn push_command(&mut self, command: Command) {
        if !self.game_over {
            self.commands.push(command);
        }
    }

    /// Removed pieces accumulated since the last call.
    pub fn take_popped(&mut self) -> Vec<Popped> {
        std::mem::take(&mut self.popped)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            pieces: self.field.pieces.iter().map(PieceView::from).collect(),
            score: self.scoring.score,
            chain_level: self.scoring.chain_level,
            game_over: self.game_over,
            pair_active: self.active_pair.is_some(),
            resolving: self.resolving,
        }
    }

    pub fn tick(&mut self) {
        if self.game_over {
            return;
        }
        self.ticks += 1;

        if let Some(primary) = self.active_pair {
            if self.pair_landed(primary) {
                self.field.piece_mut(primary).partner = None;
                self.active_pair = None;
                self.resolving = true;
                debug!(tick = self.ticks, "pair seated");
                if self.field.overflowed() {
                    self.game_over = true;
                    self.commands.clear();
                    info!(score = self.scoring.score, tick = self.ticks, "game over");
                }
            }
        } else if self.field.all_seated() {
            self.field.rebuild_board();
            resolve::rebuild_neighbors(&mut self.field);
            match resolve::resolve_round(&mut self.field, &mut self.scoring) {
                Some(resolution) => {
                    self.resolving = true;
                    self.popped.extend(resolution.popped);
                }
                None => {
                    self.resolving = false;
                    self.spawn_pair();
                }
            }
        }

        if let Some(command) = self.commands.take_next() {
            self.apply(command);
        }

        self.field.advance_gravity(self.fall_delay);
    }

    fn pair_landed(&self, primary: PieceId) -> bool {
        let pivot = self.field.piece(primary);
        pivot.is_seated()
            && pivot
                .partner
                .is_none_or(|partner| self.field.piece(partner).is_seated())
    }

    /// Apply a command to the falling pair; consumed silently when there is none.
    fn apply(&mut self, command: Command) {
        let Some(primary) = self.active_pair else {
            return;
        };
        let field = &mut self.field;
        let accepted = match command {
            Command::MoveLeft => falling::shift_pair(field, primary, Shift::Left),
            Command::MoveRight => falling::shift_pair(field, primary, Shift::Right),
            Command::MoveDown => falling::shift_pair(field, primary, Shift::Down),
            Command::RotateCcw => falling::rotate_pair(field, primary, Spin::CounterClockwise),
            Command::RotateCw => falling::rotate_pair(field, primary, Spin::Clockwise),
        };
        if !accepted {
            debug!(?command, "command rejected");
        }
    }

    fn spawn_pair(&mut self) {
        let (primary_color, partner_color) = match self.next_pairs.pop_front() {
            Some(pair) => pair,
            None => self.random_pair(),
        };
        self.refill_next();
        let primary =
            falling::spawn_pair(&mut self.field, primary_color, partner_color, self.fall_delay);
        self.active_pair = Some(primary);
        self.scoring.reset_chain();
        debug!(
            primary = primary_color.name(),
            partner = partner_color.name(),
            tick = self.ticks,
            "pair spawned"
        );
    }

    fn random_pair(&mut self) -> (PieceColor, PieceColor) {
        (
            PieceColor::random(&mut self.rng),
            PieceColor::random(&mut self.rng),
        )
    }

    fn refill_next(&mut self) {
        while self.next_pairs.len() < NEXT_PREVIEW {
            let pair = self.random_pair();
            self.next_pairs.push_back(pair);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BOARD_HEIGHT;
    use crate::falling::SPAWN_COLUMN;
    use crate::piece::PieceState;
    use PieceColor::{Blue, Green, Red, Yellow};
    use rand::Rng;

    const DELAY: u32 = 2;

    fn state(seed: u64) -> GameState {
        GameState::with_rng(StdRng::seed_from_u64(seed), DELAY)
    }

    /// Tick until `done` holds; panics after `limit` ticks.
    fn tick_until(state: &mut GameState, limit: usize, mut done: impl FnMut(&GameState) -> bool) {
        for _ in 0..limit {
            if done(state) {
                return;
            }
            state.tick();
        }
        assert!(done(state), "condition not reached within {limit} ticks");
    }

    fn place_seated(state: &mut GameState, cells: &[(i32, i32, PieceColor)]) {
        for &(col, row, color) in cells {
            let id = state.field.add(color, col, row, DELAY);
            state.field.piece_mut(id).state = PieceState::Seated;
        }
        state.field.rebuild_board();
    }

    fn cells(state: &GameState) -> Vec<(i32, i32, PieceColor)> {
        let mut v: Vec<_> = state
            .snapshot()
            .pieces
            .iter()
            .map(|p| (p.col, p.row, p.color))
            .collect();
        v.sort_by_key(|&(c, r, _)| (c, r));
        v
    }

    #[test]
    fn first_tick_spawns_a_pair() {
        let mut s = state(1);
        s.preset_next(&[(Red, Blue)]);
        s.tick();
        let snap = s.snapshot();
        assert!(snap.pair_active);
        assert_eq!(snap.pieces.len(), 2);
        assert_eq!((snap.pieces[0].col, snap.pieces[0].row), (SPAWN_COLUMN, 0));
        assert_eq!((snap.pieces[1].col, snap.pieces[1].row), (SPAWN_COLUMN, -1));
        assert_eq!(snap.pieces[0].color, Red);
        assert_eq!(snap.pieces[1].color, Blue);
        assert_eq!(snap.chain_level, 0);
        assert_eq!(s.next_pairs().count(), NEXT_PREVIEW);
    }

    #[test]
    fn one_command_per_tick_by_priority() {
        let mut s = state(2);
        s.tick();
        s.push_command(Command::RotateCw);
        s.push_command(Command::MoveLeft);
        s.tick();
        let snap = s.snapshot();
        assert_eq!(snap.pieces[0].col, SPAWN_COLUMN - 1);
        // Rotation still pending: partner is above the primary.
        assert_eq!(snap.pieces[1].col, SPAWN_COLUMN - 1);
        s.tick();
        let snap = s.snapshot();
        assert_eq!(snap.pieces[1].col, SPAWN_COLUMN);
        assert_eq!(snap.pieces[1].row, snap.pieces[0].row);
    }

    #[test]
    fn pair_drops_and_seats_in_spawn_column() {
        let mut s = state(3);
        s.preset_next(&[(Green, Yellow)]);
        s.tick();
        tick_until(&mut s, 500, |s| !s.has_active_pair());
        assert_eq!(
            cells(&s),
            vec![
                (SPAWN_COLUMN, BOARD_HEIGHT as i32 - 2, Yellow),
                (SPAWN_COLUMN, BOARD_HEIGHT as i32 - 1, Green),
            ]
        );
        assert!(s.snapshot().resolving);
        assert!(s.field.is_consistent());
    }

    #[test]
    fn end_to_end_match_of_two_pairs() {
        let mut s = state(4);
        s.preset_next(&[(Red, Red), (Red, Red), (Blue, Green)]);
        s.tick();
        assert_eq!(s.chain_level(), 0);
        tick_until(&mut s, 500, |s| !s.has_active_pair());

        // Nothing to resolve yet: the second pair spawns and is steered next to the first.
        s.tick();
        assert!(s.has_active_pair());
        assert_eq!(s.score(), 0);
        s.push_command(Command::MoveLeft);
        s.tick();
        assert_eq!(s.snapshot().pieces[2].col, SPAWN_COLUMN - 1);

        tick_until(&mut s, 500, |s| s.score() > 0);
        assert_eq!(s.score(), 50 * 4);
        assert_eq!(s.chain_level(), 1);
        assert!(s.snapshot().pieces.is_empty());
        assert_eq!(s.take_popped().len(), 4);

        // Next spawn resets the chain.
        s.tick();
        assert!(s.has_active_pair());
        assert_eq!(s.chain_level(), 0);
        assert_eq!(s.score(), 200);
    }

    #[test]
    fn cascade_scales_second_round() {
        let mut s = state(5);
        place_seated(
            &mut s,
            &[
                (0, 11, Red),
                (0, 10, Red),
                (0, 9, Red),
                (1, 11, Green),
                (1, 10, Green),
                (1, 9, Green),
                (1, 8, Green),
                (1, 7, Red),
            ],
        );
        s.tick();
        assert_eq!(s.score(), 200);
        assert_eq!(s.chain_level(), 1);
        assert!(!s.has_active_pair());

        tick_until(&mut s, 500, |s| s.score() > 200);
        assert_eq!(s.score(), 200 + 400);
        assert_eq!(s.chain_level(), 2);
        assert!(s.snapshot().pieces.is_empty());

        s.tick();
        assert_eq!(s.chain_level(), 0);
    }

    #[test]
    fn simultaneous_groups_resolve_one_round_apart() {
        let mut s = state(6);
        place_seated(
            &mut s,
            &[
                (0, 11, Blue),
                (1, 11, Blue),
                (2, 11, Blue),
                (3, 11, Blue),
                (5, 11, Yellow),
                (5, 10, Yellow),
                (5, 9, Yellow),
                (5, 8, Yellow),
            ],
        );
        s.tick();
        assert_eq!(s.score(), 200);
        assert_eq!(s.snapshot().pieces.len(), 4);
        assert!(s.snapshot().pieces.iter().all(|p| p.color == Yellow));

        tick_until(&mut s, 500, |s| s.score() > 200);
        assert_eq!(s.score(), 600);
        assert!(s.snapshot().pieces.is_empty());
    }

    #[test]
    fn overflow_ends_the_game() {
        let mut s = state(7);
        let column: Vec<_> = (0..BOARD_HEIGHT as i32)
            .map(|row| (SPAWN_COLUMN, row, if row % 2 == 0 { Blue } else { Yellow }))
            .collect();
        place_seated(&mut s, &column);
        s.preset_next(&[(Red, Green)]);
        s.tick();
        assert!(s.has_active_pair());

        tick_until(&mut s, 500, |s| s.is_game_over());
        let snap = s.snapshot();
        assert!(snap.game_over);
        assert!(
            snap.pieces
                .iter()
                .any(|p| p.state == PieceState::Seated && p.row < 0)
        );

        // Terminal: no spawns, no gravity, commands inert.
        let frozen = s.snapshot();
        s.push_command(Command::MoveLeft);
        for _ in 0..50 {
            s.tick();
        }
        assert_eq!(s.snapshot(), frozen);
    }

    #[test]
    fn seated_pieces_match_board_after_every_tick() {
        for seed in 0..4 {
            let mut s = state(100 + seed);
            let mut input = StdRng::seed_from_u64(seed);
            for _ in 0..3000 {
                if input.gen_range(0..4) == 0 {
                    s.push_command(Command::PRIORITY[input.gen_range(0..5)]);
                }
                s.tick();
                assert!(s.field.is_consistent(), "seed {seed} tick {}", s.ticks);
                if s.is_game_over() {
                    break;
                }
            }
        }
    }

    #[test]
    fn gravity_never_skips_or_rises_except_to_seat() {
        let mut s = state(9);
        for _ in 0..2000 {
            let before: Vec<PieceView> = s.snapshot().pieces;
            s.tick();
            let removed = !s.take_popped().is_empty();
            if removed {
                continue;
            }
            let after = s.snapshot().pieces;
            for (old, new) in before.iter().zip(&after) {
                let delta = new.row - old.row;
                assert!((-1..=1).contains(&delta), "piece {} moved {delta}", old.id);
                if delta == -1 {
                    assert_eq!(new.state, PieceState::Seated);
                }
            }
            if s.is_game_over() {
                break;
            }
        }
    }
}
