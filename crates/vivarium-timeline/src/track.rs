//! Replay track - one agent's recorded movement, owned by the timeline

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use vivarium_common::{AgentId, LogicalTime, Position, Rgb};

/// Owned replay input for a single agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Agent identity
    pub id: AgentId,
    /// Phenome color painted for this agent
    pub color: Rgb,
    /// Current replay position (last consumed event, or the initial position)
    pub position: Position,
    /// Remaining, unconsumed events in non-decreasing `t` order
    pub path: VecDeque<Position>,
    /// Death time, if the agent died during the experiment
    pub death_date: Option<LogicalTime>,
}

impl Track {
    pub fn new(
        id: AgentId,
        color: Rgb,
        position: Position,
        path: impl IntoIterator<Item = Position>,
        death_date: Option<LogicalTime>,
    ) -> Self {
        let path: VecDeque<Position> = path.into_iter().collect();
        debug_assert!(
            path.iter().zip(path.iter().skip(1)).all(|(a, b)| a.t <= b.t),
            "track path must be ordered by time"
        );
        Self {
            id,
            color,
            position,
            path,
            death_date,
        }
    }

    /// Whether events remain to be replayed
    #[inline]
    pub fn is_active(&self) -> bool {
        !self.path.is_empty()
    }

    /// Time of the next unconsumed event
    #[inline]
    pub fn next_time(&self) -> Option<LogicalTime> {
        self.path.front().map(|p| p.t)
    }

    /// Pop every event with `t <= clock`, moving the track to the last one.
    ///
    /// Returns the number of events consumed.
    pub fn advance_to(&mut self, clock: LogicalTime) -> usize {
        let mut consumed = 0;
        while self.path.front().is_some_and(|p| p.t <= clock) {
            if let Some(next) = self.path.pop_front() {
                self.position = next;
                consumed += 1;
            }
        }
        consumed
    }

    /// Whether the track is visible at `clock`
    #[inline]
    pub fn is_visible_at(&self, clock: LogicalTime) -> bool {
        self.position.t <= clock
    }

    /// Whether the agent has died at or before `clock`
    #[inline]
    pub fn is_dead_at(&self, clock: LogicalTime) -> bool {
        self.death_date.is_some_and(|d| d <= clock)
    }
}
