//! Population analysis - summary statistics and per-agent path rasters

use serde::{Deserialize, Serialize};
use vivarium_timeline::Frame;

use crate::agent::Agent;
use crate::registry::PopulationSnapshot;

/// Post-run population summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationAnalysis {
    pub living: usize,
    pub dead: usize,
    /// Mean recorded path length, rounded down
    pub mean_path_len: usize,
    /// Upper median of recorded path lengths
    pub median_path_len: usize,
    pub longest_path_len: usize,
}

impl PopulationAnalysis {
    pub fn from_snapshot(snapshot: &PopulationSnapshot) -> Self {
        let mut lengths: Vec<usize> = snapshot.all().map(|a| a.path_len()).collect();
        lengths.sort_unstable();

        let (mean, median, longest) = if lengths.is_empty() {
            (0, 0, 0)
        } else {
            (
                lengths.iter().sum::<usize>() / lengths.len(),
                lengths[lengths.len() / 2],
                lengths[lengths.len() - 1],
            )
        };

        Self {
            living: snapshot.living.len(),
            dead: snapshot.dead.len(),
            mean_path_len: mean,
            median_path_len: median,
            longest_path_len: longest,
        }
    }
}

/// Every cell the agent visited, painted in its color
///
/// The frame clock is the time of the agent's last recorded event.
pub fn path_raster(agent: &Agent, height: usize, width: usize) -> Frame {
    let path = agent.path();
    let clock = path.last().map(|p| p.t).unwrap_or_else(|| agent.position().t);
    let mut frame = Frame::new(clock, height, width);
    for p in &path {
        frame.paint(p.y, p.x, agent.phenome().color);
    }
    frame
}
