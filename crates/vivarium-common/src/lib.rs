//! # Vivarium Common
//!
//! Shared types and errors for the Vivarium agent simulation.
//!
//! ## Core Types
//!
//! - [`AgentId`]: UUID-based agent identity
//! - [`Position`]: immutable timestamped grid coordinate, the unit of an agent's path
//! - [`LogicalTime`]: replay clock unit, unrelated to wall-clock time
//! - [`Phenome`]/[`Rgb`]: visual attributes used only for rendering
//!
//! ## Errors
//!
//! - [`VivariumError`]: unified error wrapping the per-concern enums
//!   ([`LabError`], [`RegistryError`], [`LifecycleError`], [`ReplayError`])

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{LabError, LifecycleError, RegistryError, ReplayError, Result, VivariumError};
pub use types::{
    agent_id::AgentId,
    phenome::{Phenome, Rgb},
    position::{LogicalTime, Position},
};

/// Vivarium version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default poll interval of the experiment driver, in milliseconds
pub const DEFAULT_TICK_MS: u64 = 1000;

/// Default number of logical time units per second of runtime
pub const DEFAULT_TIME_RESOLUTION: u64 = 1000;

/// Color of an empty cell in rendered frames
pub const BACKGROUND: Rgb = Rgb::BLACK;
