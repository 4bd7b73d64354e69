//! Raw layer: one JSON snapshot per collection date

use crate::error::{PipelineError, Result};
use crate::snapshot::RawSnapshot;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

/// Date-keyed store of raw provider snapshots
#[derive(Debug, Clone)]
pub struct RawStore {
    path: PathBuf,
}

impl RawStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the snapshot file for one date
    pub fn snapshot_path(&self, date: NaiveDate) -> PathBuf {
        self.path.join(format!("{}.json", date))
    }

    /// Load and structurally validate the snapshot for a date.
    pub fn load(&self, date: NaiveDate) -> Result<RawSnapshot> {
        let path = self.snapshot_path(date);
        if !path.exists() {
            return Err(PipelineError::SnapshotNotFound { date });
        }

        log::info!("Loading raw snapshot from {}", path.display());
        let contents = fs::read_to_string(&path)?;
        let snapshot: RawSnapshot = serde_json::from_str(&contents)
            .map_err(|e| PipelineError::MalformedSnapshot(e.to_string()))?;

        if snapshot.api_response.result != "success" {
            return Err(PipelineError::MalformedSnapshot(format!(
                "provider reported '{}' instead of success",
                snapshot.api_response.result
            )));
        }
        if snapshot.api_response.conversion_rates.is_empty() {
            return Err(PipelineError::MalformedSnapshot(
                "snapshot contains no conversion rates".to_string(),
            ));
        }

        Ok(snapshot)
    }

    /// Persist a snapshot under its collection date. Used by the upstream
    /// collector and by test fixtures.
    pub fn save(&self, snapshot: &RawSnapshot) -> Result<PathBuf> {
        fs::create_dir_all(&self.path)?;
        let path = self.snapshot_path(snapshot.pipeline_metadata.collection_date);
        let contents = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, contents)?;
        log::info!("Saved raw snapshot to {}", path.display());
        Ok(path)
    }
}
