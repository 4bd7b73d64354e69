//! Error types for the FX lakehouse pipeline

use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for pipeline operations
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No raw snapshot found for {date}")]
    SnapshotNotFound { date: NaiveDate },

    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    #[error("No records passed validation for {date}")]
    EmptyBatch { date: NaiveDate },

    #[error("No silver data for period {start} to {end}")]
    NoDataForPeriod { start: NaiveDate, end: NaiveDate },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("DataFrame error: {0}")]
    DataFrame(#[from] polars::error::PolarsError),
}

impl PipelineError {
    /// Stable category identifier used in run reports
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::SnapshotNotFound { .. } => "snapshot_not_found",
            PipelineError::MalformedSnapshot(_) => "malformed_snapshot",
            PipelineError::EmptyBatch { .. } => "empty_batch",
            PipelineError::NoDataForPeriod { .. } => "no_data_for_period",
            PipelineError::Storage(_) => "storage",
            PipelineError::Io(_) => "io",
            PipelineError::Serde(_) => "serialization",
            PipelineError::DataFrame(_) => "dataframe",
        }
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
