use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the (at most two) participants of a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Party {
    One,
    Two,
}

impl Party {
    /// Zero-based slot used to index per-party state.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Party::One => 0,
            Party::Two => 1,
        }
    }

    /// One-based number as shown to players.
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Party::One => 1,
            Party::Two => 2,
        }
    }

    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Party::One => Party::Two,
            Party::Two => Party::One,
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "party {}", self.number())
    }
}
