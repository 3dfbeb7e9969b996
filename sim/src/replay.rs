//! Replay: serialize/deserialize observation logs for offline scoring.

use anyhow::Context;
use sensor_models::{Observation, SensorConfig, TargetState};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// A full recorded simulation log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayLog {
    pub scenario_name: String,
    /// Registry name of the model that produced the observations
    pub model: String,
    pub seed: u64,
    pub sim_dt: f64,
    pub duration: f64,
    pub config: SensorConfig,
    /// One frame per observation, in time order
    pub frames: Vec<ObservationFrame>,
}

/// Ground truth and the observation sampled from it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObservationFrame {
    pub time: f64,
    pub states: Vec<TargetState>,
    pub observation: Observation,
}

/// Save a replay log to a JSON file.
pub fn save_replay(log: &ReplayLog, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating replay {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), log)?;
    tracing::info!(path = %path.display(), frames = log.frames.len(), "replay saved");
    Ok(())
}

/// Load a replay log from a JSON file.
pub fn load_replay(path: &Path) -> anyhow::Result<ReplayLog> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening replay {}", path.display()))?;
    let log: ReplayLog = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing replay {}", path.display()))?;
    log.config.validate()?;
    Ok(log)
}
