use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two observed output lanes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lane {
    First,
    Second,
}

impl Lane {
    pub const ALL: [Lane; 2] = [Lane::First, Lane::Second];

    pub fn number(&self) -> u8 {
        match self {
            Lane::First => 1,
            Lane::Second => 2,
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lane {}", self.number())
    }
}

/// Where a classifier output index leads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// Drained and discarded without being counted
    Sink,
    Observed(Lane),
}
