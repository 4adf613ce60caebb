//! Lab clock - converts elapsed runtime into logical time

use std::time::Duration;

use tokio::time::Instant;
use vivarium_common::LogicalTime;

/// Logical clock anchored at the experiment epoch
///
/// Uses tokio's `Instant`, so paused test runtimes drive it deterministically.
#[derive(Debug, Clone, Copy)]
pub struct LabClock {
    epoch: Instant,
    /// Logical time units per second
    resolution: u64,
}

impl LabClock {
    /// Start a clock now
    pub fn start(resolution: u64) -> Self {
        Self {
            epoch: Instant::now(),
            resolution: resolution.max(1),
        }
    }

    pub fn resolution(&self) -> u64 {
        self.resolution
    }

    /// Logical time elapsed since the epoch
    pub fn now(&self) -> LogicalTime {
        self.to_logical(self.epoch.elapsed())
    }

    /// Convert a runtime duration into logical units, rounding down
    pub fn to_logical(&self, elapsed: Duration) -> LogicalTime {
        let units = elapsed.as_nanos() * self.resolution as u128 / 1_000_000_000;
        units.min(LogicalTime::MAX as u128) as LogicalTime
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion() {
        let clock = LabClock::start(1000);
        assert_eq!(clock.to_logical(Duration::from_millis(1500)), 1500);
        assert_eq!(clock.to_logical(Duration::from_micros(999)), 0);

        let coarse = LabClock::start(10);
        assert_eq!(coarse.to_logical(Duration::from_millis(1500)), 15);
    }

    #[test]
    fn test_zero_resolution_is_clamped() {
        assert_eq!(LabClock::start(0).resolution(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_now_follows_runtime_time() {
        let clock = LabClock::start(1000);
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(clock.now(), 250);
    }
}
