//! Player commands as sticky flags, drained one per tick by fixed priority.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveLeft,
    MoveRight,
    MoveDown,
    RotateCcw,
    RotateCw,
}

impl Command {
    /// Highest priority first.
    pub const PRIORITY: [Self; 5] = [
        Self::MoveLeft,
        Self::MoveRight,
        Self::MoveDown,
        Self::RotateCcw,
        Self::RotateCw,
    ];

    fn slot(self) -> usize {
        match self {
            Self::MoveLeft => 0,
            Self::MoveRight => 1,
            Self::MoveDown => 2,
            Self::RotateCcw => 3,
            Self::RotateCw => 4,
        }
    }
}

/// At most one pending entry per command; a command stays pending until it is the
/// highest-priority one at the start of a tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandQueue {
    pending: [bool; 5],
}

impl CommandQueue {
    pub fn push(&mut self, command: Command) {
        self.pending[command.slot()] = true;
    }

    /// Clear and return the highest-priority pending command.
    pub fn take_next(&mut self) -> Option<Command> {
        let next = Command::PRIORITY
            .into_iter()
            .find(|c| self.pending[c.slot()])?;
        self.pending[next.slot()] = false;
        Some(next)
    }

    pub fn is_empty(&self) -> bool {
        !self.pending.contains(&true)
    }

    pub fn clear(&mut self) {
        self.pending = [false; 5];
    }
}
