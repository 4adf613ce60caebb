//! Initial placement strategies
//!
//! A closed set of strategies; adding one means adding a variant and
//! handling it in every exhaustive match.

use std::collections::HashSet;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use vivarium_common::LabError;

/// Placement strategy for the initial population
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distribution {
    /// Independent uniform draws, duplicates rejected
    #[default]
    Random,
}

impl Distribution {
    /// Every supported strategy
    pub const ALL: [Distribution; 1] = [Distribution::Random];

    pub fn name(&self) -> &'static str {
        match self {
            Distribution::Random => "random",
        }
    }

    /// Names accepted by [`FromStr`]
    pub fn names() -> Vec<String> {
        Self::ALL.iter().map(|d| d.name().to_string()).collect()
    }

    /// Draw `count` distinct cells of a `height` x `width` grid.
    ///
    /// Capacity is checked before drawing, so an impossible request fails
    /// instead of looping forever.
    pub fn draw<R: Rng + ?Sized>(
        &self,
        count: usize,
        height: usize,
        width: usize,
        rng: &mut R,
    ) -> Result<Vec<(usize, usize)>, LabError> {
        if height == 0 || width == 0 {
            return Err(LabError::EmptyUniverse { height, width });
        }
        let capacity = height.saturating_mul(width);
        if count > capacity {
            return Err(LabError::CapacityExceeded {
                requested: count,
                height,
                width,
                capacity,
            });
        }

        match self {
            Distribution::Random => {
                let mut seen = HashSet::with_capacity(count);
                let mut cells = Vec::with_capacity(count);
                while cells.len() < count {
                    let cell = (rng.gen_range(0..height), rng.gen_range(0..width));
                    if seen.insert(cell) {
                        cells.push(cell);
                    }
                }
                Ok(cells)
            }
        }
    }
}

impl FromStr for Distribution {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LabError::UnsupportedDistribution {
                name: s.to_string(),
                valid: Self::names(),
            })
    }
}

impl std::fmt::Display for Distribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
