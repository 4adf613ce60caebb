//! Agent - one autonomous, concurrently running unit
//!
//! An agent's mutable state (position, path, status) is only written by its
//! own task while it lives. The population registry owns membership and
//! records the death date when the agent dies. Everything else reads the
//! state only once the agent is dead or the experiment has drained.

pub mod behavior;
pub(crate) mod process;

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use vivarium_common::{AgentId, LogicalTime, Phenome, Position};
use vivarium_timeline::Track;

use crate::signal::StopSignal;
use behavior::Behavior;

/// Alive/dead status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Alive,
    Dead,
}

/// Mutable agent state
#[derive(Debug, Clone)]
pub struct AgentState {
    /// Current position
    pub position: Position,
    /// Recorded events, ordered by time
    pub path: VecDeque<Position>,
    pub status: AgentStatus,
    pub death_date: Option<LogicalTime>,
    /// Steps taken so far
    pub steps: u64,
}

/// Simulated agent
pub struct Agent {
    id: AgentId,
    generation: u32,
    parents: Vec<AgentId>,
    phenome: Phenome,
    state: Mutex<AgentState>,
    stop: StopSignal,
    behavior: Mutex<Option<Box<dyn Behavior>>>,
}

impl Agent {
    /// Create a living agent standing at `initial`
    ///
    /// The initial position is the first event of the path.
    pub fn new(
        initial: Position,
        generation: u32,
        parents: Vec<AgentId>,
        phenome: Phenome,
        behavior: Box<dyn Behavior>,
    ) -> Self {
        Self::with_id(AgentId::new(), initial, generation, parents, phenome, behavior)
    }

    pub fn with_id(
        id: AgentId,
        initial: Position,
        generation: u32,
        parents: Vec<AgentId>,
        phenome: Phenome,
        behavior: Box<dyn Behavior>,
    ) -> Self {
        Self {
            id,
            generation,
            parents,
            phenome,
            state: Mutex::new(AgentState {
                position: initial,
                path: VecDeque::from([initial]),
                status: AgentStatus::Alive,
                death_date: None,
                steps: 0,
            }),
            stop: StopSignal::new(),
            behavior: Mutex::new(Some(behavior)),
        }
    }

    /// Generation-0 agent with no parents
    pub fn founder(initial: Position, phenome: Phenome, behavior: Box<dyn Behavior>) -> Self {
        Self::new(initial, 0, Vec::new(), phenome, behavior)
    }

    #[inline]
    pub fn id(&self) -> AgentId {
        self.id
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn parents(&self) -> &[AgentId] {
        &self.parents
    }

    #[inline]
    pub fn phenome(&self) -> &Phenome {
        &self.phenome
    }

    /// Individual stop control, set by the lifecycle controller
    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    pub fn position(&self) -> Position {
        self.state.lock().position
    }

    pub fn status(&self) -> AgentStatus {
        self.state.lock().status
    }

    pub fn is_alive(&self) -> bool {
        self.status() == AgentStatus::Alive
    }

    pub fn death_date(&self) -> Option<LogicalTime> {
        self.state.lock().death_date
    }

    pub fn path_len(&self) -> usize {
        self.state.lock().path.len()
    }

    /// Copy of the recorded path
    pub fn path(&self) -> Vec<Position> {
        self.state.lock().path.iter().copied().collect()
    }

    /// Copy of the whole state
    pub fn state(&self) -> AgentState {
        self.state.lock().clone()
    }

    /// Replay track that leaves the recorded path in place
    pub fn track(&self) -> Track {
        let state = self.state.lock();
        Track::new(
            self.id,
            self.phenome.color,
            state.position,
            state.path.iter().copied(),
            state.death_date,
        )
    }

    /// Replay track that takes the recorded path; the agent keeps an empty one
    pub fn take_track(&self) -> Track {
        let mut state = self.state.lock();
        let path = std::mem::take(&mut state.path);
        Track::new(
            self.id,
            self.phenome.color,
            state.position,
            path,
            state.death_date,
        )
    }

    /// Registry-only: flip status and stamp the death date
    pub(crate) fn record_death(&self, at: LogicalTime) {
        let mut state = self.state.lock();
        state.status = AgentStatus::Dead;
        state.death_date = Some(at);
    }

    /// Moved into the agent's task when it is spawned
    pub(crate) fn take_behavior(&self) -> Option<Box<dyn Behavior>> {
        self.behavior.lock().take()
    }

    pub(crate) fn lock_state(&self) -> parking_lot::MutexGuard<'_, AgentState> {
        self.state.lock()
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("generation", &self.generation)
            .field("position", &state.position)
            .field("path_len", &state.path.len())
            .field("status", &state.status)
            .field("death_date", &state.death_date)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::behavior::RandomWalk;
    use std::time::Duration;
    use vivarium_common::Rgb;

    fn agent_at(y: usize, x: usize) -> Agent {
        Agent::founder(
            Position::origin(y, x),
            Phenome::new(Rgb::new(10, 20, 30)),
            Box::new(RandomWalk::new(0, Duration::from_millis(10), None)),
        )
    }

    #[test]
    fn test_founder_starts_alive_with_initial_event() {
        let agent = agent_at(2, 3);
        assert_eq!(agent.generation(), 0);
        assert!(agent.parents().is_empty());
        assert!(agent.is_alive());
        assert_eq!(agent.path(), vec![Position::origin(2, 3)]);
        assert_eq!(agent.death_date(), None);
    }

    #[test]
    fn test_take_track_drains_path() {
        let agent = agent_at(0, 0);
        let first = agent.take_track();
        assert_eq!(first.path.len(), 1);
        assert_eq!(first.color, Rgb::new(10, 20, 30));
        assert_eq!(agent.path_len(), 0);

        let second = agent.take_track();
        assert!(second.path.is_empty());
        assert_eq!(second.position, Position::origin(0, 0));
    }

    #[test]
    fn test_track_preserves_path() {
        let agent = agent_at(0, 0);
        assert_eq!(agent.track(), agent.track());
        assert_eq!(agent.path_len(), 1);
    }

    #[test]
    fn test_behavior_taken_once() {
        let agent = agent_at(0, 0);
        assert!(agent.take_behavior().is_some());
        assert!(agent.take_behavior().is_none());
    }

    #[test]
    fn test_record_death() {
        let agent = agent_at(0, 0);
        agent.record_death(12);
        assert_eq!(agent.status(), AgentStatus::Dead);
        assert_eq!(agent.death_date(), Some(12));
    }
}
