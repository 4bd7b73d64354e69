//! Structured processing reports
//!
//! Every run returns one of these: status, target date, wall-clock time, and
//! either stage counters or an error category + message. Serializable so the
//! CLI can emit them as JSON for downstream tooling.

use crate::error::PipelineError;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;

/// Outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Error,
}

/// Error category and message carried by failed runs
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub kind: String,
    pub message: String,
}

impl From<&PipelineError> for ErrorReport {
    fn from(err: &PipelineError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Counters from a successful silver (validation) run
#[derive(Debug, Clone, Serialize)]
pub struct SilverCounters {
    pub raw_records: usize,
    pub accepted_records: usize,
    pub rejected_records: usize,
    pub validation_success_rate: f64,
    pub quality_score: f64,
    pub output_file: PathBuf,
}

/// Report of one silver run
#[derive(Debug, Serialize)]
pub struct SilverReport {
    pub status: RunStatus,
    pub target_date: NaiveDate,
    pub execution_time_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counters: Option<SilverCounters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

impl SilverReport {
    pub fn success(target_date: NaiveDate, seconds: f64, counters: SilverCounters) -> Self {
        Self {
            status: RunStatus::Success,
            target_date,
            execution_time_seconds: seconds,
            counters: Some(counters),
            error: None,
        }
    }

    pub fn failure(target_date: NaiveDate, seconds: f64, err: &PipelineError) -> Self {
        Self {
            status: RunStatus::Error,
            target_date,
            execution_time_seconds: seconds,
            counters: None,
            error: Some(err.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

/// Counters from a successful gold (aggregation) run
#[derive(Debug, Clone, Serialize)]
pub struct GoldCounters {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub days_included: usize,
    pub silver_records: usize,
    pub daily_metrics: usize,
    pub trend_points: usize,
    pub currencies_analyzed: usize,
    pub files_created: Vec<PathBuf>,
}

/// Report of one gold run
#[derive(Debug, Serialize)]
pub struct GoldReport {
    pub status: RunStatus,
    pub target_date: NaiveDate,
    pub execution_time_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counters: Option<GoldCounters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

impl GoldReport {
    pub fn success(target_date: NaiveDate, seconds: f64, counters: GoldCounters) -> Self {
        Self {
            status: RunStatus::Success,
            target_date,
            execution_time_seconds: seconds,
            counters: Some(counters),
            error: None,
        }
    }

    pub fn failure(target_date: NaiveDate, seconds: f64, err: &PipelineError) -> Self {
        Self {
            status: RunStatus::Error,
            target_date,
            execution_time_seconds: seconds,
            counters: None,
            error: Some(err.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}
