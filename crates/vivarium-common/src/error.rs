//! Error types for Vivarium
//!
//! Provides a unified error type and per-concern error variants. Precondition
//! failures are raised before any state is mutated; registry errors are
//! invariant violations and indicate a coordination bug.

use crate::types::agent_id::AgentId;
use thiserror::Error;

/// Result type alias using VivariumError
pub type Result<T> = std::result::Result<T, VivariumError>;

/// Unified error type for Vivarium operations
#[derive(Debug, Error)]
pub enum VivariumError {
    #[error("Lab error: {0}")]
    Lab(#[from] LabError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Replay error: {0}")]
    Replay(#[from] ReplayError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Experiment setup and driver errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LabError {
    #[error("Population of {requested} does not fit a {height}x{width} universe ({capacity} cells)")]
    CapacityExceeded {
        requested: usize,
        height: usize,
        width: usize,
        capacity: usize,
    },

    #[error("Universe must have non-zero dimensions, got {height}x{width}")]
    EmptyUniverse { height: usize, width: usize },

    #[error("Unsupported distribution '{name}'. Possible distributions: {valid:?}")]
    UnsupportedDistribution { name: String, valid: Vec<String> },

    #[error("Agents are still running: {running} task(s) have not finished")]
    ExperimentRunning { running: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Population registry invariant violations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Agent {0} is already registered")]
    AlreadyRegistered(AgentId),

    #[error("Agent {0} is not living")]
    NotLiving(AgentId),
}

/// Lifecycle controller errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Agents have already been started for this experiment")]
    AlreadyStarted,
}

/// Timeline replay errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error("Time step must be positive, got {0}")]
    InvalidTimeStep(u64),
}

// Writer failures surfaced by serde_json are reported as IO errors
impl From<serde_json::Error> for VivariumError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            VivariumError::Io(err.to_string())
        } else {
            VivariumError::Serialization(err.to_string())
        }
    }
}

impl From<std::io::Error> for VivariumError {
    fn from(err: std::io::Error) -> Self {
        VivariumError::Io(err.to_string())
    }
}
