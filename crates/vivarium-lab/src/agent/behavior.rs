//! Agent behavior - the opaque decision policy
//!
//! A behavior only decides; the agent process applies the decision against
//! the shared universe, records the path event and handles death.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use vivarium_common::{AgentId, Position};

use crate::config::BehaviorSettings;
use crate::universe::Universe;

/// Decision taken by a behavior for one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Move to the given cell
    Move { y: usize, x: usize },
    /// Stay put, recording nothing
    Stay,
    /// Die at the current cell
    Die,
}

/// Read-only view handed to a behavior
#[derive(Debug)]
pub struct StepContext<'a> {
    pub id: AgentId,
    /// Current position
    pub position: Position,
    /// Steps already taken by this agent
    pub steps_taken: u64,
    pub universe: &'a Universe,
}

/// Decision policy of one agent
pub trait Behavior: Send {
    /// Decide the next step
    fn step(&mut self, ctx: &StepContext<'_>) -> Step;

    /// Delay before the next step
    fn cadence(&self) -> Duration;
}

/// Uniform random walk over free 4-neighbours with a finite lifespan
#[derive(Debug)]
pub struct RandomWalk {
    rng: StdRng,
    cadence: Duration,
    lifespan: Option<u64>,
}

impl RandomWalk {
    pub fn new(seed: u64, cadence: Duration, lifespan: Option<u64>) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            cadence,
            lifespan,
        }
    }

    pub fn from_settings(seed: u64, settings: &BehaviorSettings) -> Self {
        Self::new(
            seed,
            Duration::from_millis(settings.cadence_ms),
            settings.lifespan_steps,
        )
    }
}

impl Behavior for RandomWalk {
    fn step(&mut self, ctx: &StepContext<'_>) -> Step {
        if self.lifespan.is_some_and(|l| ctx.steps_taken >= l) {
            return Step::Die;
        }

        let neighbors = ctx.universe.free_neighbors(ctx.position.y, ctx.position.x);
        match neighbors.choose(&mut self.rng) {
            Some(&(y, x)) => Step::Move { y, x },
            None => Step::Stay,
        }
    }

    fn cadence(&self) -> Duration {
        self.cadence
    }
}
