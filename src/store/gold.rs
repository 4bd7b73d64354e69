//! Gold layer: analytical tables and the market overview document
//!
//! One gold run emits five files keyed by the processed date. Writes are
//! staged to `.tmp` paths and renamed together only after every artifact has
//! been produced, so a fatal failure never leaves a partial gold set.

use crate::aggregate::DailyMetric;
use crate::error::Result;
use crate::overview::MarketOverview;
use crate::store::frame;
use crate::summary::CurrencySummary;
use crate::trend::TrendPoint;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

/// Everything one gold run produces
#[derive(Debug)]
pub struct GoldArtifacts {
    pub daily_metrics: Vec<DailyMetric>,
    pub trends: Vec<TrendPoint>,
    pub summaries: Vec<CurrencySummary>,
    pub overview: MarketOverview,
}

/// Date-keyed store of gold-layer outputs
#[derive(Debug, Clone)]
pub struct GoldStore {
    path: PathBuf,
}

impl GoldStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn daily_metrics_path(&self, date: NaiveDate) -> PathBuf {
        self.path.join(format!("daily_metrics_{}.parquet", date))
    }

    pub fn trends_path(&self, date: NaiveDate) -> PathBuf {
        self.path.join(format!("historical_trends_{}.parquet", date))
    }

    pub fn summary_path(&self, date: NaiveDate) -> PathBuf {
        self.path.join(format!("currency_summary_{}.parquet", date))
    }

    pub fn consolidated_path(&self, date: NaiveDate) -> PathBuf {
        self.path.join(format!("consolidated_{}.parquet", date))
    }

    pub fn overview_path(&self, date: NaiveDate) -> PathBuf {
        self.path.join(format!("market_overview_{}.json", date))
    }

    /// Write all artifacts for one date, all-or-nothing.
    pub fn write_all(&self, artifacts: &GoldArtifacts, date: NaiveDate) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.path)?;

        let targets = [
            self.daily_metrics_path(date),
            self.trends_path(date),
            self.summary_path(date),
            self.consolidated_path(date),
            self.overview_path(date),
        ];
        let staged: Vec<PathBuf> = targets
            .iter()
            .map(|p| p.with_extension(match p.extension().and_then(|e| e.to_str()) {
                Some("json") => "json.tmp",
                _ => "parquet.tmp",
            }))
            .collect();

        let result = self.stage(artifacts, &staged);
        if let Err(e) = result {
            for tmp in &staged {
                let _ = fs::remove_file(tmp);
            }
            return Err(e);
        }

        for (tmp, target) in staged.iter().zip(targets.iter()) {
            fs::rename(tmp, target)?;
        }

        log::info!(
            "Wrote gold layer for {}: {} files under {}",
            date,
            targets.len(),
            self.path.display()
        );
        Ok(targets.to_vec())
    }

    fn stage(&self, artifacts: &GoldArtifacts, staged: &[PathBuf]) -> Result<()> {
        let mut metrics_df = frame::metrics_to_frame(&artifacts.daily_metrics)?;
        let mut trends_df = frame::trends_to_frame(&artifacts.trends)?;
        let mut summary_df = frame::summaries_to_frame(&artifacts.summaries)?;
        let mut consolidated_df = frame::consolidated_frame(&artifacts.summaries)?;

        frame::write_parquet(&staged[0], &mut metrics_df)?;
        frame::write_parquet(&staged[1], &mut trends_df)?;
        frame::write_parquet(&staged[2], &mut summary_df)?;
        frame::write_parquet(&staged[3], &mut consolidated_df)?;

        let overview_json = serde_json::to_string_pretty(&artifacts.overview)?;
        fs::write(&staged[4], overview_json)?;
        Ok(())
    }
}
