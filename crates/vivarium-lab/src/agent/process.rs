//! Agent process - the run loop executed by each agent task

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, error, trace};
use vivarium_common::Position;

use super::behavior::{Behavior, Step, StepContext};
use super::Agent;
use crate::clock::LabClock;
use crate::registry::PopulationRegistry;
use crate::signal::Authorization;
use crate::universe::Universe;

/// Shared handles an agent task runs against
#[derive(Clone)]
pub(crate) struct AgentRuntime {
    pub universe: Arc<RwLock<Universe>>,
    pub registry: Arc<PopulationRegistry>,
    pub authorization: Authorization,
    pub clock: LabClock,
    /// Opens once every agent of the experiment has been spawned
    pub start_gate: watch::Receiver<bool>,
}

/// Why an agent loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Exit {
    Stopped,
    Died,
}

/// Run one agent until it is stopped or dies
pub(crate) async fn run(
    agent: Arc<Agent>,
    mut behavior: Box<dyn Behavior>,
    mut rt: AgentRuntime,
) -> Exit {
    // Sender dropped means the controller is gone: nothing to run for
    if rt.start_gate.wait_for(|open| *open).await.is_err() {
        return Exit::Stopped;
    }
    debug!(agent = %agent.id().short(), "Agent started");

    loop {
        if !rt.authorization.is_granted() || agent.stop_signal().is_set() {
            debug!(agent = %agent.id().short(), "Agent stopping");
            return Exit::Stopped;
        }

        if step_once(&agent, behavior.as_mut(), &rt) == Some(Exit::Died) {
            return Exit::Died;
        }

        tokio::select! {
            _ = tokio::time::sleep(behavior.cadence()) => {}
            _ = rt.authorization.revoked() => {}
            _ = agent.stop_signal().wait() => {}
        }
    }
}

/// Decide and apply one step; no lock is held on return
fn step_once(agent: &Agent, behavior: &mut dyn Behavior, rt: &AgentRuntime) -> Option<Exit> {
    let (position, steps_taken) = {
        let state = agent.lock_state();
        (state.position, state.steps)
    };

    let step = {
        let universe = rt.universe.read();
        behavior.step(&StepContext {
            id: agent.id(),
            position,
            steps_taken,
            universe: &universe,
        })
    };

    match step {
        Step::Move { y, x } => {
            let moved = rt
                .universe
                .write()
                .relocate(agent.id(), position.cell(), (y, x));
            let mut state = agent.lock_state();
            state.steps += 1;
            // The target may have been claimed since the decision was taken
            if moved {
                let next = Position::new(rt.clock.now(), y, x);
                state.position = next;
                state.path.push_back(next);
                trace!(agent = %agent.id().short(), position = %next, "Agent moved");
            }
            None
        }
        Step::Stay => {
            agent.lock_state().steps += 1;
            None
        }
        Step::Die => {
            let at = rt.clock.now();
            rt.universe.write().clear(position.y, position.x);
            if let Err(e) = rt.registry.mark_dead(agent.id(), at) {
                error!(
                    agent = %agent.id().short(),
                    error = %e,
                    "Registry invariant violated on death"
                );
            }
            Some(Exit::Died)
        }
    }
}
