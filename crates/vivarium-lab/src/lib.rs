//! # Lab
//!
//! Concurrent agent population lifecycle and experiment driver.
//!
//! ## Components
//!
//! - [`Universe`]: 2D occupancy grid shared by all agents
//! - [`Agent`]: one autonomous unit, run as its own tokio task
//! - [`PopulationRegistry`]: lock-protected living/dead partition
//! - [`LifecycleController`]: starts every agent task and broadcasts a
//!   cooperative stop through the lab [`Authorization`]
//! - [`Lab`]: bootstraps the population, runs bounded experiments and hands
//!   recorded paths to the [`vivarium_timeline::Timeline`] replay engine
//!
//! ## Stopping
//!
//! Stopping is a request. [`LifecycleController::stop_all`] revokes the
//! authorization and sets every agent's stop signal, then returns without
//! waiting. Agents observe the signals between steps. Callers that need
//! quiescence (replay does) must wait with [`Lab::wait_for_quiescence`].

pub mod agent;
pub mod analysis;
pub mod clock;
pub mod config;
pub mod lab;
pub mod lifecycle;
pub mod placement;
pub mod registry;
pub mod signal;
pub mod universe;

pub use agent::{
    behavior::{Behavior, RandomWalk, Step, StepContext},
    Agent, AgentState, AgentStatus,
};
pub use analysis::PopulationAnalysis;
pub use clock::LabClock;
pub use config::{BehaviorSettings, LabConfig};
pub use lab::{ExitReason, ExperimentReport, Lab};
pub use lifecycle::LifecycleController;
pub use placement::Distribution;
pub use registry::{PopulationRegistry, PopulationSnapshot};
pub use signal::{Authorization, StopSignal};
pub use universe::Universe;

/// Default grace period when waiting for agent tasks to finish, in milliseconds
pub const DEFAULT_DRAIN_TIMEOUT_MS: u64 = 5000;

/// Default delay between two steps of a random-walk agent, in milliseconds
pub const DEFAULT_CADENCE_MS: u64 = 50;
