//! Lab configuration

use serde::{Deserialize, Serialize};
use vivarium_common::{LabError, DEFAULT_TICK_MS, DEFAULT_TIME_RESOLUTION};

use crate::placement::Distribution;

/// Experiment configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabConfig {
    /// Universe rows
    pub height: usize,
    /// Universe columns
    pub width: usize,
    /// Number of generation-0 agents created at bootstrap
    pub init_population: usize,
    /// Initial placement strategy
    pub distribution: Distribution,
    /// Length of one driver tick, in milliseconds
    pub tick_ms: u64,
    /// Logical time units per second of runtime
    pub time_resolution: u64,
    /// RNG seed for placement, colors and behaviors (random when unset)
    pub seed: Option<u64>,
    /// Default random-walk behavior
    pub behavior: BehaviorSettings,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            height: 64,
            width: 64,
            init_population: 32,
            distribution: Distribution::Random,
            tick_ms: DEFAULT_TICK_MS,
            time_resolution: DEFAULT_TIME_RESOLUTION,
            seed: None,
            behavior: BehaviorSettings::default(),
        }
    }
}

impl LabConfig {
    /// Config for a `height` x `width` universe with `init_population` agents
    pub fn new(height: usize, width: usize, init_population: usize) -> Self {
        Self {
            height,
            width,
            init_population,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_tick_ms(mut self, tick_ms: u64) -> Self {
        self.tick_ms = tick_ms;
        self
    }

    pub fn with_behavior(mut self, behavior: BehaviorSettings) -> Self {
        self.behavior = behavior;
        self
    }

    /// Number of cells in the universe
    pub fn capacity(&self) -> usize {
        self.height.saturating_mul(self.width)
    }

    /// Validate configuration before anything is built
    pub fn validate(&self) -> Result<(), LabError> {
        if self.height == 0 || self.width == 0 {
            return Err(LabError::EmptyUniverse {
                height: self.height,
                width: self.width,
            });
        }

        if self.height.checked_mul(self.width).is_none() {
            return Err(LabError::InvalidConfig(format!(
                "a {}x{} universe overflows usize",
                self.height, self.width
            )));
        }

        if self.init_population > self.capacity() {
            return Err(LabError::CapacityExceeded {
                requested: self.init_population,
                height: self.height,
                width: self.width,
                capacity: self.capacity(),
            });
        }

        if self.tick_ms == 0 {
            return Err(LabError::InvalidConfig("tick_ms must be positive".into()));
        }

        if self.time_resolution == 0 {
            return Err(LabError::InvalidConfig(
                "time_resolution must be positive".into(),
            ));
        }

        if self.behavior.cadence_ms == 0 {
            return Err(LabError::InvalidConfig(
                "behavior.cadence_ms must be positive".into(),
            ));
        }

        Ok(())
    }
}

/// Random-walk behavior settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorSettings {
    /// Delay between two steps, in milliseconds
    pub cadence_ms: u64,
    /// Steps an agent lives before dying (immortal when unset)
    pub lifespan_steps: Option<u64>,
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        Self {
            cadence_ms: crate::DEFAULT_CADENCE_MS,
            lifespan_steps: Some(200),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(LabConfig::default().validate().is_ok());
    }

    #[test]
    fn test_capacity_exceeded() {
        let err = LabConfig::new(2, 2, 5).validate().unwrap_err();
        assert_eq!(
            err,
            LabError::CapacityExceeded {
                requested: 5,
                height: 2,
                width: 2,
                capacity: 4,
            }
        );
    }

    #[test]
    fn test_overflowing_dimensions_rejected() {
        let err = LabConfig::new(usize::MAX, 2, 1).validate().unwrap_err();
        assert!(matches!(err, LabError::InvalidConfig(_)));
    }

    #[test]
    fn test_full_universe_is_allowed() {
        assert!(LabConfig::new(2, 2, 4).validate().is_ok());
    }

    #[test]
    fn test_zero_tick_rejected() {
        let err = LabConfig::new(2, 2, 1).with_tick_ms(0).validate().unwrap_err();
        assert!(matches!(err, LabError::InvalidConfig(_)));
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = LabConfig::new(8, 9, 3).with_seed(42);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"distribution\":\"random\""));
        let back: LabConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
