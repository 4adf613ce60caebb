//! Position - the atomic event agents produce
//!
//! A position is an immutable `(t, y, x)` triple. Two different notions of
//! equality are in use:
//! - placement uniqueness compares the grid cell only ([`Position::cell`])
//! - replay ordering compares the timestamp only ([`Position::t`])
//!
//! The derived `PartialEq`/`Ord` compare the full `(t, y, x)` triple.

use serde::{Deserialize, Serialize};

/// Logical time, counted in ticks since the experiment epoch
pub type LogicalTime = u64;

/// Timestamped grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Logical time at which the agent occupied the cell
    pub t: LogicalTime,
    /// Row
    pub y: usize,
    /// Column
    pub x: usize,
}

impl Position {
    pub fn new(t: LogicalTime, y: usize, x: usize) -> Self {
        Self { t, y, x }
    }

    /// Position at the experiment epoch
    pub fn origin(y: usize, x: usize) -> Self {
        Self::new(0, y, x)
    }

    /// Grid cell `(y, x)` without the timestamp
    #[inline]
    pub fn cell(&self) -> (usize, usize) {
        (self.y, self.x)
    }

    /// Same cell, later time
    pub fn at(&self, t: LogicalTime) -> Self {
        Self::new(t, self.y, self.x)
    }

    /// Whether both positions refer to the same grid cell
    #[inline]
    pub fn same_cell(&self, other: &Position) -> bool {
        self.cell() == other.cell()
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(t={}, y={}, x={})", self.t, self.y, self.x)
    }
}
