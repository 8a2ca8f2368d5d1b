//! Export of the canonical dataset and derived tables
//!
//! Three CSV outputs (combined dataset, per-activity rollup table,
//! period-aggregated table) plus a JSON dump of the full dataset.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::aggregate::{aggregate_by_period, rollup_by_activity, PeriodKey};
use crate::models::ActivityDataset;

pub mod csv;
pub mod json;

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported table: {0}")]
    UnsupportedTable(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Nothing to export: {0}")]
    EmptyDataset(String),
}

/// Which derived table to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportTable {
    /// Canonical activity rows from tabular sources.
    Activities,
    /// Canonical FIT samples.
    TrackPoints,
    /// One row per FIT activity.
    Rollup,
    /// Week or month aggregation of activity rows.
    Period,
}

impl ExportTable {
    pub fn parse(s: &str) -> Result<Self, ExportError> {
        match s.to_lowercase().as_str() {
            "activities" => Ok(ExportTable::Activities),
            "trackpoints" | "track_points" | "samples" => Ok(ExportTable::TrackPoints),
            "rollup" | "summary" => Ok(ExportTable::Rollup),
            "period" => Ok(ExportTable::Period),
            _ => Err(ExportError::UnsupportedTable(s.to_string())),
        }
    }
}

/// Write the requested table of the dataset to a CSV file.
pub fn export_csv<P: AsRef<Path>>(
    dataset: &ActivityDataset,
    table: ExportTable,
    period: PeriodKey,
    output_path: P,
) -> Result<(), ExportError> {
    match table {
        ExportTable::Activities => csv::export_activities(&dataset.activities, output_path),
        ExportTable::TrackPoints => csv::export_track_points(&dataset.track_points, output_path),
        ExportTable::Rollup => {
            let rollups = rollup_by_activity(&dataset.track_points, &dataset.session_summaries);
            csv::export_rollups(&rollups, output_path)
        }
        ExportTable::Period => {
            let summaries = aggregate_by_period(&dataset.activities, period);
            csv::export_period_summaries(&summaries, output_path)
        }
    }
}
