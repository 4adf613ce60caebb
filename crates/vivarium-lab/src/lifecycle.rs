//! Lifecycle controller - starts agent tasks and broadcasts a cooperative stop
//!
//! Each living agent runs as its own tokio task. Tasks are spawned parked
//! behind a start gate and released together, so no agent gets a head start
//! while the rest of the population is still being spawned.
//!
//! Stopping is level-triggered and fire-and-forget: [`LifecycleController::stop_all`]
//! revokes the lab [`Authorization`], sets every agent's own stop signal and
//! returns. Agents honor it at their next check point; an agent in the middle
//! of a step finishes that step first.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};
use vivarium_common::LifecycleError;

use crate::agent::process::{self, AgentRuntime};
use crate::clock::LabClock;
use crate::registry::PopulationRegistry;
use crate::signal::Authorization;
use crate::universe::Universe;

/// Owner of the lab authorization and of every agent task handle
pub struct LifecycleController {
    registry: Arc<PopulationRegistry>,
    universe: Arc<RwLock<Universe>>,
    authorization: Authorization,
    start_gate: watch::Sender<bool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    running: Arc<AtomicUsize>,
    started: AtomicBool,
    time_resolution: u64,
}

/// Decrements the running-task count when an agent task ends, even on panic
struct RunningGuard(Arc<AtomicUsize>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl LifecycleController {
    pub fn new(
        registry: Arc<PopulationRegistry>,
        universe: Arc<RwLock<Universe>>,
        time_resolution: u64,
    ) -> Self {
        let (start_gate, _) = watch::channel(false);
        Self {
            registry,
            universe,
            authorization: Authorization::new(),
            start_gate,
            handles: Mutex::new(Vec::new()),
            running: Arc::new(AtomicUsize::new(0)),
            started: AtomicBool::new(false),
            time_resolution,
        }
    }

    /// Lab-wide authorization shared with every agent
    pub fn authorization(&self) -> &Authorization {
        &self.authorization
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Whether stop_all has been issued
    pub fn is_stopped(&self) -> bool {
        !self.authorization.is_granted()
    }

    /// Spawn and release every living agent. Allowed once per experiment.
    pub fn start_all(&self) -> Result<usize, LifecycleError> {
        let spawned = self.spawn_all()?;
        self.release();
        Ok(spawned)
    }

    /// Spawn one parked task per living agent without releasing them.
    ///
    /// Must run inside a tokio runtime, after the population is registered.
    pub(crate) fn spawn_all(&self) -> Result<usize, LifecycleError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(LifecycleError::AlreadyStarted);
        }

        let runtime = AgentRuntime {
            universe: self.universe.clone(),
            registry: self.registry.clone(),
            authorization: self.authorization.clone(),
            clock: LabClock::start(self.time_resolution),
            start_gate: self.start_gate.subscribe(),
        };

        let living = self.registry.snapshot().living;
        let mut handles = self.handles.lock();
        for agent in living {
            let Some(behavior) = agent.take_behavior() else {
                warn!(agent = %agent.id().short(), "Agent has no behavior, not spawning");
                continue;
            };
            let rt = runtime.clone();
            self.running.fetch_add(1, Ordering::SeqCst);
            let guard = RunningGuard(self.running.clone());
            handles.push(tokio::spawn(async move {
                let _guard = guard;
                let id = agent.id();
                let exit = process::run(agent, behavior, rt).await;
                debug!(agent = %id.short(), ?exit, "Agent task finished");
            }));
        }

        debug!(spawned = handles.len(), "Agent tasks spawned");
        Ok(handles.len())
    }

    /// Open the start gate
    pub(crate) fn release(&self) {
        self.start_gate.send_replace(true);
    }

    /// Request every agent to stop. Idempotent.
    ///
    /// Returns true only for the call that revoked the authorization. Does not
    /// wait for agents to finish; see [`LifecycleController::drain`].
    #[instrument(skip(self))]
    pub fn stop_all(&self) -> bool {
        let first = self.authorization.revoke();

        let living = self.registry.snapshot().living;
        for agent in &living {
            agent.stop_signal().set();
        }

        // Parked tasks must wake up to observe the revocation
        self.release();

        if first {
            info!(living = living.len(), "Stop requested for all agents");
        }
        first
    }

    /// Agent tasks that have not finished yet
    pub fn running_tasks(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    /// No spawned agent task is still running
    pub fn is_quiescent(&self) -> bool {
        self.running_tasks() == 0
    }

    /// Wait for every agent task to finish, up to `timeout`.
    ///
    /// Returns false if some tasks were still running at the deadline; their
    /// handles are kept so a later call can wait again.
    pub async fn drain(&self, timeout: Duration) -> bool {
        let mut pending = std::mem::take(&mut *self.handles.lock());
        let deadline = tokio::time::Instant::now() + timeout;

        while let Some(mut handle) = pending.pop() {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %e, "Agent task failed"),
                Err(_) => {
                    pending.push(handle);
                    let remaining = pending.len();
                    self.handles.lock().extend(pending);
                    warn!(remaining, "Agent tasks still running after drain timeout");
                    return false;
                }
            }
        }
        true
    }
}

impl std::fmt::Debug for LifecycleController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleController")
            .field("started", &self.is_started())
            .field("stopped", &self.is_stopped())
            .field("running_tasks", &self.running_tasks())
            .finish()
    }
}
