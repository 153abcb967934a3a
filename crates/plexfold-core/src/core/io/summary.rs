use serde::Serialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Failed to write summary table: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to serialize configuration snapshot: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One row of the machine-readable ranking table, one per produced candidate.
#[derive(Debug, Clone, Serialize)]
pub struct RankingRow {
    pub model: String,
    pub seed: u64,
    pub score: f64,
    pub iterations: usize,
    pub stop_reason: String,
    pub duration_ms: u64,
    pub selected: bool,
    pub rank: Option<usize>,
}

/// Snapshot of the configuration values a run was executed with.
#[derive(Debug, Clone, Serialize)]
pub struct RunConfigSnapshot {
    pub job: String,
    pub composition: String,
    pub database_preset: String,
    pub recycle_budget: usize,
    pub recycle_tolerance: f64,
    pub seeds: Vec<u64>,
    pub models: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_region: Option<[usize; 2]>,
    pub max_candidates: usize,
}

/// Writes the per-candidate ranking table as CSV.
pub fn write_ranking(path: &Path, rows: &[RankingRow]) -> Result<(), SummaryError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the run configuration snapshot as TOML.
pub fn write_config_snapshot(path: &Path, snapshot: &RunConfigSnapshot) -> Result<(), SummaryError> {
    let rendered = toml::to_string_pretty(snapshot)?;
    fs::write(path, rendered)?;
    Ok(())
}
