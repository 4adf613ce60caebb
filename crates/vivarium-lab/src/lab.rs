//! Lab - experiment driver
//!
//! Owns the universe, the population registry and the lifecycle controller.
//!
//! ```text
//! Lab::new          validate -> universe -> invoke_population
//! Lab::experiment   spawn -> release -> poll once per tick -> stop_all
//! Lab::replay_*     (after quiescence) reset universe -> Timeline
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use vivarium_common::{
    AgentId, LabError, Phenome, Position, ReplayError, Result, VivariumError,
};
use vivarium_timeline::{Frame, Timeline, Track};

use crate::agent::behavior::{Behavior, RandomWalk};
use crate::agent::Agent;
use crate::analysis::{self, PopulationAnalysis};
use crate::config::LabConfig;
use crate::lifecycle::LifecycleController;
use crate::placement::Distribution;
use crate::registry::PopulationRegistry;
use crate::universe::Universe;

/// Builds the behavior of a new agent from its id, initial position and a seed
pub type BehaviorFactory =
    Box<dyn Fn(AgentId, Position, u64) -> Box<dyn Behavior> + Send + Sync>;

/// Why the experiment loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Zero-duration run, no tick was executed
    ZeroDuration,
    /// Every agent died
    PopulationExhausted,
    /// The duration budget ran out
    DurationElapsed,
}

/// Outcome of one experiment run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Requested budget, in ticks
    pub max_duration: u64,
    /// Ticks actually polled
    pub ticks: u64,
    pub exit: ExitReason,
    /// Living agents when the stop was requested
    pub living: usize,
    /// Dead agents when the stop was requested
    pub dead: usize,
}

/// Experiment driver
pub struct Lab {
    config: LabConfig,
    universe: Arc<RwLock<Universe>>,
    registry: Arc<PopulationRegistry>,
    controller: LifecycleController,
    factory: BehaviorFactory,
    rng: StdRng,
}

impl Lab {
    /// Bootstrap a lab whose agents random-walk per `config.behavior`
    pub fn new(config: LabConfig) -> Result<Self> {
        let settings = config.behavior.clone();
        Self::with_behavior(config, move |_, _, seed| {
            Box::new(RandomWalk::from_settings(seed, &settings))
        })
    }

    /// Bootstrap a lab with a custom behavior per agent
    pub fn with_behavior<F>(config: LabConfig, factory: F) -> Result<Self>
    where
        F: Fn(AgentId, Position, u64) -> Box<dyn Behavior> + Send + Sync + 'static,
    {
        config.validate()?;

        let universe = Arc::new(RwLock::new(Universe::new(config.height, config.width)?));
        let registry = Arc::new(PopulationRegistry::new());
        let controller =
            LifecycleController::new(registry.clone(), universe.clone(), config.time_resolution);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut lab = Self {
            config,
            universe,
            registry,
            controller,
            factory: Box::new(factory),
            rng,
        };

        let count = lab.config.init_population;
        lab.invoke_population(count, lab.config.distribution)?;

        let occupied = lab.universe.read().occupied_count();
        if occupied != count {
            return Err(VivariumError::Internal(format!(
                "bootstrap occupied {} cells for {} agents",
                occupied, count
            )));
        }

        info!(
            height = lab.config.height,
            width = lab.config.width,
            population = count,
            distribution = %lab.config.distribution,
            "Lab bootstrapped"
        );
        Ok(lab)
    }

    /// Create one generation-0 agent per drawn cell
    fn invoke_population(
        &mut self,
        count: usize,
        distribution: Distribution,
    ) -> Result<Vec<Arc<Agent>>> {
        let (height, width) = {
            let universe = self.universe.read();
            (universe.height(), universe.width())
        };
        let cells = distribution.draw(count, height, width, &mut self.rng)?;

        let mut agents = Vec::with_capacity(count);
        let mut universe = self.universe.write();
        for (y, x) in cells {
            let id = AgentId::new();
            let position = Position::origin(y, x);
            let behavior = (self.factory)(id, position, self.rng.gen());
            let phenome = Phenome::random(&mut self.rng);
            let agent = Arc::new(Agent::with_id(id, position, 0, Vec::new(), phenome, behavior));

            self.registry.register(agent.clone())?;
            universe.set(y, x, id);
            agents.push(agent);
        }

        debug!(created = agents.len(), "Population invoked");
        Ok(agents)
    }

    pub fn config(&self) -> &LabConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<PopulationRegistry> {
        &self.registry
    }

    pub fn universe(&self) -> &Arc<RwLock<Universe>> {
        &self.universe
    }

    pub fn controller(&self) -> &LifecycleController {
        &self.controller
    }

    pub fn living_count(&self) -> usize {
        self.registry.living_count()
    }

    pub fn dead_count(&self) -> usize {
        self.registry.dead_count()
    }

    /// Run the population for at most `max_duration` ticks.
    ///
    /// Polls once per tick and ends early when every agent has died. The stop
    /// request is always issued on exit, but agents are not awaited: call
    /// [`Lab::wait_for_quiescence`] before reading their final state.
    #[instrument(skip(self))]
    pub async fn experiment(&self, max_duration: u64) -> Result<ExperimentReport> {
        let started_at = Utc::now();
        let spawned = self.controller.spawn_all()?;
        info!(agents = spawned, max_duration, "Experiment starting");

        let tick = Duration::from_millis(self.config.tick_ms);
        let mut remaining = max_duration;
        let mut ticks = 0u64;

        if max_duration > 0 {
            self.controller.release();
            while remaining > 0 && self.registry.living_count() > 0 {
                tokio::time::sleep(tick).await;
                remaining -= 1;
                ticks += 1;
                debug!(
                    tick = ticks,
                    living = self.registry.living_count(),
                    dead = self.registry.dead_count(),
                    "Experiment tick"
                );
            }
        }

        let living = self.registry.living_count();
        let dead = self.registry.dead_count();
        let exit = if max_duration == 0 {
            ExitReason::ZeroDuration
        } else if living == 0 {
            ExitReason::PopulationExhausted
        } else {
            ExitReason::DurationElapsed
        };

        self.controller.stop_all();
        info!(ticks, living, dead, ?exit, "Experiment stopped");

        Ok(ExperimentReport {
            started_at,
            finished_at: Utc::now(),
            max_duration,
            ticks,
            exit,
            living,
            dead,
        })
    }

    /// Wait until every agent task has finished, up to `timeout`
    pub async fn wait_for_quiescence(&self, timeout: Duration) -> bool {
        self.controller.drain(timeout).await
    }

    fn ensure_quiescent(&self) -> Result<()> {
        let running = self.controller.running_tasks();
        if running > 0 {
            return Err(LabError::ExperimentRunning { running }.into());
        }
        Ok(())
    }

    fn replay_with<F>(&self, time_step: u64, to_track: F) -> Result<Timeline>
    where
        F: Fn(&Agent) -> Track,
    {
        if time_step == 0 {
            return Err(ReplayError::InvalidTimeStep(time_step).into());
        }
        self.ensure_quiescent()?;

        let (height, width) = {
            let mut universe = self.universe.write();
            universe.init_space();
            (universe.height(), universe.width())
        };

        let snapshot = self.registry.snapshot();
        let tracks: Vec<Track> = snapshot.all().map(|agent| to_track(agent.as_ref())).collect();
        info!(tracks = tracks.len(), time_step, "Replaying timeline");

        Ok(Timeline::new(tracks, time_step, height, width)?)
    }

    /// Replay every agent's path, consuming it.
    ///
    /// Agents are left with empty paths, so a second call produces an empty
    /// timeline. Fails while agent tasks are still running.
    pub fn replay_timeline(&self, time_step: u64) -> Result<Timeline> {
        self.replay_with(time_step, Agent::take_track)
    }

    /// Replay from copies of every path, leaving agents untouched
    pub fn replay_timeline_preserving(&self, time_step: u64) -> Result<Timeline> {
        self.replay_with(time_step, Agent::track)
    }

    /// Population summary, logged and returned
    pub fn analyze(&self) -> PopulationAnalysis {
        let analysis = PopulationAnalysis::from_snapshot(&self.registry.snapshot());
        info!(
            living = analysis.living,
            dead = analysis.dead,
            mean_path_len = analysis.mean_path_len,
            median_path_len = analysis.median_path_len,
            "Population analysis"
        );
        analysis
    }

    /// Path rasters of up to `n` agents, living ones first
    pub fn path_rasters(&self, n: usize) -> Vec<(AgentId, Frame)> {
        let (height, width) = (self.config.height, self.config.width);
        self.registry
            .snapshot()
            .all()
            .take(n)
            .map(|a| (a.id(), analysis::path_raster(a, height, width)))
            .collect()
    }
}

impl std::fmt::Debug for Lab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lab")
            .field("config", &self.config)
            .field("living", &self.living_count())
            .field("dead", &self.dead_count())
            .field("controller", &self.controller)
            .finish()
    }
}
