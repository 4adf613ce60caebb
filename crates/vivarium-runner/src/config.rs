//! Runner configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;
use vivarium_lab::{Distribution, LabConfig, DEFAULT_DRAIN_TIMEOUT_MS};

/// Runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Lab to bootstrap
    pub lab: LabConfig,
    /// Experiment budget, in ticks
    pub duration: u64,
    /// Replay step, in logical time units
    pub time_step: u64,
    /// How long to wait for agent tasks after the stop request
    pub drain_timeout_ms: u64,
    /// JSON-lines file receiving every replayed frame
    pub frames_out: Option<PathBuf>,
    /// Number of agent path rasters to report
    pub path_rasters: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            lab: LabConfig::default(),
            duration: 10,
            time_step: 50,
            drain_timeout_ms: DEFAULT_DRAIN_TIMEOUT_MS,
            frames_out: None,
            path_rasters: 3,
        }
    }
}

impl RunnerConfig {
    /// Load configuration from `.env` and `VIVARIUM_*` environment variables
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from a variable lookup, starting from defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        // Universe and population
        set_parsed(&lookup, "VIVARIUM_HEIGHT", &mut cfg.lab.height);
        set_parsed(&lookup, "VIVARIUM_WIDTH", &mut cfg.lab.width);
        set_parsed(&lookup, "VIVARIUM_POPULATION", &mut cfg.lab.init_population);
        if let Some(name) = lookup("VIVARIUM_DISTRIBUTION") {
            cfg.lab.distribution = name
                .parse::<Distribution>()
                .context("VIVARIUM_DISTRIBUTION")?;
        }
        if let Some(val) = lookup("VIVARIUM_SEED") {
            match val.parse() {
                Ok(seed) => cfg.lab.seed = Some(seed),
                Err(_) => warn!(value = %val, "Ignoring unparseable VIVARIUM_SEED"),
            }
        }

        // Timing
        set_parsed(&lookup, "VIVARIUM_TICK_MS", &mut cfg.lab.tick_ms);
        set_parsed(&lookup, "VIVARIUM_TIME_RESOLUTION", &mut cfg.lab.time_resolution);

        // Behavior
        set_parsed(&lookup, "VIVARIUM_CADENCE_MS", &mut cfg.lab.behavior.cadence_ms);
        if let Some(val) = lookup("VIVARIUM_LIFESPAN_STEPS") {
            if val.eq_ignore_ascii_case("none") {
                cfg.lab.behavior.lifespan_steps = None;
            } else if let Ok(v) = val.parse() {
                cfg.lab.behavior.lifespan_steps = Some(v);
            } else {
                warn!(value = %val, "Ignoring unparseable VIVARIUM_LIFESPAN_STEPS");
            }
        }

        // Run
        set_parsed(&lookup, "VIVARIUM_DURATION", &mut cfg.duration);
        set_parsed(&lookup, "VIVARIUM_TIME_STEP", &mut cfg.time_step);
        set_parsed(&lookup, "VIVARIUM_DRAIN_TIMEOUT_MS", &mut cfg.drain_timeout_ms);
        set_parsed(&lookup, "VIVARIUM_PATH_RASTERS", &mut cfg.path_rasters);
        if let Some(path) = lookup("VIVARIUM_FRAMES_OUT") {
            if !path.is_empty() {
                cfg.frames_out = Some(PathBuf::from(path));
            }
        }

        cfg.lab.validate()?;
        Ok(cfg)
    }
}

fn set_parsed<F, T>(lookup: &F, key: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(val) = lookup(key) {
        match val.parse() {
            Ok(v) => *slot = v,
            Err(_) => warn!(key, value = %val, "Ignoring unparseable variable"),
        }
    }
}
