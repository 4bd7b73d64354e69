//! Silver layer: validated observations as date-keyed parquet

use crate::error::Result;
use crate::observation::RateObservation;
use crate::store::frame;
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use std::fs;
use std::path::{Path, PathBuf};

/// Date-keyed store of validated observation tables
#[derive(Debug, Clone)]
pub struct SilverStore {
    path: PathBuf,
}

impl SilverStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the observation table for one date
    pub fn table_path(&self, date: NaiveDate) -> PathBuf {
        self.path.join(format!("exchange_rates_{}.parquet", date))
    }

    /// Write one date's observation frame. Staged through a temp file so a
    /// failed write never leaves a partial table behind.
    pub fn write(&self, df: &mut DataFrame, date: NaiveDate) -> Result<PathBuf> {
        fs::create_dir_all(&self.path)?;
        let path = self.table_path(date);
        let tmp = path.with_extension("parquet.tmp");

        frame::write_parquet(&tmp, df)?;
        fs::rename(&tmp, &path)?;

        log::info!(
            "Wrote silver table {} ({} records)",
            path.display(),
            df.height()
        );
        Ok(path)
    }

    /// Read one date's observations, or `None` if no table exists for it.
    pub fn try_read(&self, date: NaiveDate) -> Result<Option<Vec<RateObservation>>> {
        let path = self.table_path(date);
        if !path.exists() {
            return Ok(None);
        }
        let df = frame::read_parquet(&path)?;
        Ok(Some(frame::frame_to_observations(&df)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::tempdir;

    fn observation(target: &str, rate: f64) -> RateObservation {
        let observed = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let collected = observed + Duration::minutes(1);
        RateObservation {
            base_currency: "USD".to_string(),
            target_currency: target.to_string(),
            rate,
            observed_at: observed,
            collected_at: collected,
            collection_date: collected.date_naive(),
            pipeline_version: "1.0.0".to_string(),
        }
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let dir = tempdir().unwrap();
        let store = SilverStore::new(dir.path());
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();

        let observations = vec![observation("BRL", 5.50), observation("EUR", 0.9)];
        let mut df = frame::observations_to_frame(&observations).unwrap();
        store.write(&mut df, date).unwrap();

        let back = store.try_read(date).unwrap().unwrap();
        assert_eq!(back, observations);
    }

    #[test]
    fn test_missing_date_reads_none() {
        let dir = tempdir().unwrap();
        let store = SilverStore::new(dir.path());
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();

        assert!(store.try_read(date).unwrap().is_none());
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = tempdir().unwrap();
        let store = SilverStore::new(dir.path());
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();

        let mut df = frame::observations_to_frame(&[observation("BRL", 5.50)]).unwrap();
        store.write(&mut df, date).unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
