//! Score and chain level.

/// Points for each removed piece before the chain multiplier.
pub const POINTS_PER_PIECE: u32 = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scoring {
    pub score: u32,
    /// Resolution rounds since the last pair spawn.
    pub chain_level: u32,
}

impl Scoring {
    /// Points one piece is worth at the current chain level.
    #[inline]
    pub fn piece_value(&self) -> u32 {
        POINTS_PER_PIECE * (self.chain_level + 1)
    }

    /// Credit `removed` pieces at the current chain level, then advance the chain.
    /// Returns the points awarded.
    pub fn award(&mut self, removed: usize) -> u32 {
        let points = self.piece_value() * removed as u32;
        self.score = self.score.saturating_add(points);
        self.chain_level += 1;
        points
    }

    pub fn reset_chain(&mut self) {
        self.chain_level = 0;
    }
}
