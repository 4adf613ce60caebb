//! Population registry - living/dead partition of every agent
//!
//! The registry is the single source of truth for population size and
//! membership. Every mutation goes through one mutex; readers that do real
//! work take a [`PopulationSnapshot`] instead of holding the lock, so agent
//! deaths are never blocked behind an analysis pass.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;
use vivarium_common::{AgentId, LogicalTime, RegistryError};

use crate::agent::Agent;

#[derive(Debug, Default)]
struct Partitions {
    living: HashMap<AgentId, Arc<Agent>>,
    dead: HashMap<AgentId, Arc<Agent>>,
}

/// Shared living/dead registry
#[derive(Debug, Default)]
pub struct PopulationRegistry {
    inner: Mutex<Partitions>,
}

impl PopulationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a newly created agent to the living partition
    pub fn register(&self, agent: Arc<Agent>) -> Result<(), RegistryError> {
        let id = agent.id();
        let mut inner = self.inner.lock();
        if inner.living.contains_key(&id) || inner.dead.contains_key(&id) {
            return Err(RegistryError::AlreadyRegistered(id));
        }
        inner.living.insert(id, agent);
        Ok(())
    }

    /// Move a living agent to the dead partition, stamping its death date.
    ///
    /// One-way: fails if the agent is not currently living, including when it
    /// is already dead.
    pub fn mark_dead(&self, id: AgentId, at: LogicalTime) -> Result<Arc<Agent>, RegistryError> {
        let mut inner = self.inner.lock();
        let agent = inner
            .living
            .remove(&id)
            .ok_or(RegistryError::NotLiving(id))?;
        agent.record_death(at);
        inner.dead.insert(id, agent.clone());
        debug!(agent = %id.short(), at, living = inner.living.len(), "Agent died");
        Ok(agent)
    }

    pub fn living_count(&self) -> usize {
        self.inner.lock().living.len()
    }

    pub fn dead_count(&self) -> usize {
        self.inner.lock().dead.len()
    }

    /// Every agent ever registered
    pub fn total_count(&self) -> usize {
        let inner = self.inner.lock();
        inner.living.len() + inner.dead.len()
    }

    pub fn is_living(&self, id: &AgentId) -> bool {
        self.inner.lock().living.contains_key(id)
    }

    pub fn is_dead(&self, id: &AgentId) -> bool {
        self.inner.lock().dead.contains_key(id)
    }

    pub fn get(&self, id: &AgentId) -> Option<Arc<Agent>> {
        let inner = self.inner.lock();
        inner.living.get(id).or_else(|| inner.dead.get(id)).cloned()
    }

    /// Copy of both partitions, each ordered by agent id
    pub fn snapshot(&self) -> PopulationSnapshot {
        let (mut living, mut dead) = {
            let inner = self.inner.lock();
            (
                inner.living.values().cloned().collect::<Vec<_>>(),
                inner.dead.values().cloned().collect::<Vec<_>>(),
            )
        };
        living.sort_by_key(|a| a.id());
        dead.sort_by_key(|a| a.id());
        PopulationSnapshot { living, dead }
    }
}

/// Point-in-time copy of the registry partitions
#[derive(Debug, Clone, Default)]
pub struct PopulationSnapshot {
    pub living: Vec<Arc<Agent>>,
    pub dead: Vec<Arc<Agent>>,
}

impl PopulationSnapshot {
    /// Living agents first, then dead ones
    pub fn all(&self) -> impl Iterator<Item = &Arc<Agent>> {
        self.living.iter().chain(self.dead.iter())
    }

    pub fn len(&self) -> usize {
        self.living.len() + self.dead.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::behavior::RandomWalk;
    use std::collections::HashSet;
    use std::time::Duration;
    use vivarium_common::{Phenome, Position, Rgb};

    fn agent() -> Arc<Agent> {
        Arc::new(Agent::founder(
            Position::origin(0, 0),
            Phenome::new(Rgb::new(1, 2, 3)),
            Box::new(RandomWalk::new(0, Duration::from_millis(10), None)),
        ))
    }

    #[test]
    fn test_register_and_count() {
        let registry = PopulationRegistry::new();
        registry.register(agent()).unwrap();
        registry.register(agent()).unwrap();
        assert_eq!(registry.living_count(), 2);
        assert_eq!(registry.dead_count(), 0);
    }

    #[test]
    fn test_double_registration_fails() {
        let registry = PopulationRegistry::new();
        let a = agent();
        registry.register(a.clone()).unwrap();
        assert_eq!(
            registry.register(a.clone()),
            Err(RegistryError::AlreadyRegistered(a.id()))
        );

        registry.mark_dead(a.id(), 1).unwrap();
        assert_eq!(
            registry.register(a.clone()),
            Err(RegistryError::AlreadyRegistered(a.id()))
        );
    }

    #[test]
    fn test_mark_dead_moves_partition() {
        let registry = PopulationRegistry::new();
        let a = agent();
        registry.register(a.clone()).unwrap();

        let dead = registry.mark_dead(a.id(), 7).unwrap();
        assert_eq!(dead.death_date(), Some(7));
        assert!(!dead.is_alive());
        assert!(registry.is_dead(&a.id()));
        assert!(!registry.is_living(&a.id()));
        assert_eq!(registry.total_count(), 1);
    }

    #[test]
    fn test_mark_dead_twice_fails() {
        let registry = PopulationRegistry::new();
        let a = agent();
        registry.register(a.clone()).unwrap();
        registry.mark_dead(a.id(), 1).unwrap();

        let err = registry.mark_dead(a.id(), 2).unwrap_err();
        assert_eq!(err, RegistryError::NotLiving(a.id()));
        // first death date is kept
        assert_eq!(a.death_date(), Some(1));
    }

    #[test]
    fn test_mark_dead_unknown_fails() {
        let registry = PopulationRegistry::new();
        let id = AgentId::new();
        assert_eq!(registry.mark_dead(id, 0).unwrap_err(), RegistryError::NotLiving(id));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let registry = PopulationRegistry::new();
        let a = agent();
        registry.register(a.clone()).unwrap();
        let snapshot = registry.snapshot();
        registry.mark_dead(a.id(), 3).unwrap();
        assert_eq!(snapshot.living.len(), 1);
        assert!(snapshot.dead.is_empty());
    }

    #[test]
    fn test_concurrent_deaths_keep_partitions_disjoint() {
        let registry = Arc::new(PopulationRegistry::new());
        let agents: Vec<_> = (0..64).map(|_| agent()).collect();
        for a in &agents {
            registry.register(a.clone()).unwrap();
        }

        let handles: Vec<_> = agents
            .iter()
            .enumerate()
            .filter(|(i, _)| i % 2 == 0)
            .map(|(i, a)| {
                let registry = registry.clone();
                let id = a.id();
                std::thread::spawn(move || registry.mark_dead(id, i as u64).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let snapshot = registry.snapshot();
        let living: HashSet<_> = snapshot.living.iter().map(|a| a.id()).collect();
        let dead: HashSet<_> = snapshot.dead.iter().map(|a| a.id()).collect();
        let all: HashSet<_> = agents.iter().map(|a| a.id()).collect();

        assert_eq!(living.len(), 32);
        assert_eq!(dead.len(), 32);
        assert!(living.is_disjoint(&dead));
        assert_eq!(living.union(&dead).copied().collect::<HashSet<_>>(), all);
    }
}
