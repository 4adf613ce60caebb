//! Core Vivarium types

pub mod agent_id;
pub mod phenome;
pub mod position;
