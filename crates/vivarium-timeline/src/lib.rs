//! # Timeline
//!
//! Post-hoc replay engine for Vivarium experiments.
//!
//! Agents record their paths concurrently and in agent-local order. The
//! [`Timeline`] merges every recorded path into one globally ordered,
//! lazily produced sequence of [`Frame`]s, advancing a logical clock by a
//! fixed `time_step` per frame.
//!
//! ## Consumption
//!
//! Replay is destructive: each [`Track`] is owned by the timeline and its
//! path is popped from the front as the clock advances. A timeline is finite
//! and cannot be restarted; replaying again requires fresh, unconsumed tracks.
//!
//! ## Catch-up
//!
//! When a single clock advance consumes more than one event of the same
//! track, intermediate positions are skipped. This is counted per frame
//! ([`Frame::catch_ups`]) and in [`TimelineStats`], and logged, but never
//! interpolated: it means `time_step` is coarse relative to that agent's
//! event density.

pub mod frame;
pub mod timeline;
pub mod track;

pub use frame::Frame;
pub use timeline::{Timeline, TimelineStats};
pub use track::Track;
