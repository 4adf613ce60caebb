//! Vivarium Runner Binary
//!
//! Bootstraps a lab, runs one experiment, waits for the population to settle,
//! then analyses and replays the recorded paths.

mod config;

use std::fs::File;
use std::io::BufWriter;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vivarium_common::VERSION;
use vivarium_lab::Lab;

use crate::config::RunnerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting Vivarium runner v{}", VERSION);

    // Load configuration
    let config = RunnerConfig::load()?;
    info!("Loaded configuration: {:?}", config);

    let lab = Lab::new(config.lab.clone())?;

    let report = lab.experiment(config.duration).await?;
    info!(
        "Experiment finished after {} tick(s): {:?}, {} living, {} dead",
        report.ticks, report.exit, report.living, report.dead
    );
    info!("Report: {}", serde_json::to_string(&report)?);

    let drain_timeout = Duration::from_millis(config.drain_timeout_ms);
    if !lab.wait_for_quiescence(drain_timeout).await {
        anyhow::bail!(
            "{} agent task(s) still running after {:?}",
            lab.controller().running_tasks(),
            drain_timeout
        );
    }

    let analysis = lab.analyze();
    info!("Analysis: {}", serde_json::to_string(&analysis)?);
    for (id, raster) in lab.path_rasters(config.path_rasters) {
        info!("Agent {} visited {} cell(s)", id.short(), raster.painted_count());
    }

    let mut timeline = lab.replay_timeline(config.time_step)?;
    let stats = match &config.frames_out {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating frame dump {}", path.display()))?;
            timeline
                .write_json_lines(BufWriter::new(file))
                .with_context(|| format!("writing frame dump {}", path.display()))?
        }
        None => {
            timeline.by_ref().for_each(drop);
            timeline.stats()
        }
    };
    if stats.catch_ups > 0 {
        warn!("Replay lagged behind the recorded paths {} time(s)", stats.catch_ups);
    }
    info!(
        "Replayed {} frame(s), {} event(s) consumed",
        stats.frames, stats.events_consumed
    );

    info!("Shutting down Vivarium runner");
    Ok(())
}
