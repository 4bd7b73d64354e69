//! Run orchestration
//!
//! Two batch runners, one per medallion hop. Each processes a single target
//! date synchronously to completion, times itself, and folds any fatal error
//! into an error-status report carrying the category from
//! `PipelineError::kind`. Record-level rejections never fail a run; an empty
//! accepted batch or an empty silver window does.

use crate::aggregate::aggregate_daily;
use crate::error::{PipelineError, Result};
use crate::overview::build_overview;
use crate::quality;
use crate::report::{GoldCounters, GoldReport, SilverCounters, SilverReport};
use crate::snapshot::normalize;
use crate::store::{frame, GoldArtifacts, GoldStore, RawStore, SilverStore, StorePaths};
use crate::summary::summarize;
use crate::trend::compute_trends;
use crate::validate::validate_batch;
use chrono::{Duration, NaiveDate};
use std::time::Instant;

/// Raw -> silver: load, normalize, validate, score, persist
#[derive(Debug)]
pub struct SilverPipeline {
    raw: RawStore,
    silver: SilverStore,
}

impl SilverPipeline {
    pub fn new(paths: &StorePaths) -> Self {
        Self {
            raw: RawStore::new(&paths.raw),
            silver: SilverStore::new(&paths.silver),
        }
    }

    /// Process one date's snapshot into the silver layer.
    pub fn process_date(&self, date: NaiveDate) -> SilverReport {
        let start = Instant::now();
        log::info!("Starting silver run for {}", date);

        match self.run(date) {
            Ok(counters) => {
                let seconds = start.elapsed().as_secs_f64();
                log::info!(
                    "Silver run for {} complete in {:.3}s: {}/{} accepted, quality {:.3}",
                    date,
                    seconds,
                    counters.accepted_records,
                    counters.raw_records,
                    counters.quality_score
                );
                SilverReport::success(date, seconds, counters)
            }
            Err(err) => {
                let seconds = start.elapsed().as_secs_f64();
                log::error!("Silver run for {} failed after {:.3}s: {}", date, seconds, err);
                SilverReport::failure(date, seconds, &err)
            }
        }
    }

    fn run(&self, date: NaiveDate) -> Result<SilverCounters> {
        let snapshot = self.raw.load(date)?;
        let records = normalize(&snapshot);
        let raw_records = records.len();

        let outcome = validate_batch(records);
        if outcome.accepted.is_empty() {
            return Err(PipelineError::EmptyBatch { date });
        }
        let success_rate = outcome.success_rate();

        let mut df = frame::observations_to_frame(&outcome.accepted)?;
        let quality_report = quality::assess(&df)?;
        let output_file = self.silver.write(&mut df, date)?;

        Ok(SilverCounters {
            raw_records,
            accepted_records: outcome.accepted.len(),
            rejected_records: outcome.rejected.len(),
            validation_success_rate: success_rate,
            quality_score: quality_report.overall_score,
            output_file,
        })
    }
}

/// Silver -> gold: window load, aggregate, trend, summarize, persist
#[derive(Debug)]
pub struct GoldPipeline {
    silver: SilverStore,
    gold: GoldStore,
}

impl GoldPipeline {
    pub fn new(paths: &StorePaths) -> Self {
        Self {
            silver: SilverStore::new(&paths.silver),
            gold: GoldStore::new(&paths.gold),
        }
    }

    /// Process the window `[date - days_back + 1, date]` into the gold layer.
    /// Dates without silver data are skipped with a warning; a fully empty
    /// window is fatal.
    pub fn process_date(&self, date: NaiveDate, days_back: u32) -> GoldReport {
        let start = Instant::now();
        log::info!("Starting gold run for {} ({} days back)", date, days_back);

        match self.run(date, days_back) {
            Ok(counters) => {
                let seconds = start.elapsed().as_secs_f64();
                log::info!(
                    "Gold run for {} complete in {:.3}s: {} currencies over {} days",
                    date,
                    seconds,
                    counters.currencies_analyzed,
                    counters.days_included
                );
                GoldReport::success(date, seconds, counters)
            }
            Err(err) => {
                let seconds = start.elapsed().as_secs_f64();
                log::error!("Gold run for {} failed after {:.3}s: {}", date, seconds, err);
                GoldReport::failure(date, seconds, &err)
            }
        }
    }

    fn run(&self, date: NaiveDate, days_back: u32) -> Result<GoldCounters> {
        let days_back = days_back.max(1);
        let start_date = date - Duration::days(i64::from(days_back) - 1);

        let mut observations = Vec::new();
        let mut days_included = 0;
        let mut current = start_date;
        while current <= date {
            match self.silver.try_read(current)? {
                Some(mut day) => {
                    days_included += 1;
                    observations.append(&mut day);
                }
                None => {
                    log::warn!("No silver data for {}, skipping", current);
                }
            }
            current += Duration::days(1);
        }

        if observations.is_empty() {
            return Err(PipelineError::NoDataForPeriod {
                start: start_date,
                end: date,
            });
        }
        let silver_records = observations.len();

        let daily_metrics = aggregate_daily(&observations);
        let trends = compute_trends(&daily_metrics);
        let summaries = summarize(&trends);
        let overview = build_overview(&summaries).ok_or(PipelineError::NoDataForPeriod {
            start: start_date,
            end: date,
        })?;

        let artifacts = GoldArtifacts {
            daily_metrics,
            trends,
            summaries,
            overview,
        };
        let files_created = self.gold.write_all(&artifacts, date)?;

        Ok(GoldCounters {
            period_start: start_date,
            period_end: date,
            days_included,
            silver_records,
            daily_metrics: artifacts.daily_metrics.len(),
            trend_points: artifacts.trends.len(),
            currencies_analyzed: artifacts.summaries.len(),
            files_created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{ApiResponse, PipelineMetadata, RawSnapshot};
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn snapshot(day: u32, rates: &[(&str, f64)]) -> RawSnapshot {
        let collected = Utc.with_ymd_and_hms(2024, 1, day, 12, 1, 0).unwrap();
        RawSnapshot {
            pipeline_metadata: PipelineMetadata {
                collection_timestamp: collected,
                collection_date: collected.date_naive(),
                pipeline_version: "1.0.0".to_string(),
            },
            api_response: ApiResponse {
                result: "success".to_string(),
                base_code: "USD".to_string(),
                time_last_update_unix: Some(collected.timestamp() - 60),
                conversion_rates: rates.iter().map(|(c, r)| (c.to_string(), *r)).collect(),
            },
        }
    }

    #[test]
    fn test_silver_run_missing_snapshot_reports_error() {
        let dir = tempdir().unwrap();
        let paths = StorePaths::under(dir.path());
        let pipeline = SilverPipeline::new(&paths);

        let report = pipeline.process_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert!(!report.is_success());
        assert_eq!(report.error.unwrap().kind, "snapshot_not_found");
    }

    #[test]
    fn test_silver_run_all_rejected_is_empty_batch() {
        let dir = tempdir().unwrap();
        let paths = StorePaths::under(dir.path());
        RawStore::new(&paths.raw)
            .save(&snapshot(15, &[("EUR", -5.0)]))
            .unwrap();

        let pipeline = SilverPipeline::new(&paths);
        let report = pipeline.process_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert!(!report.is_success());
        assert_eq!(report.error.unwrap().kind, "empty_batch");
    }

    #[test]
    fn test_gold_run_empty_window_reports_no_data() {
        let dir = tempdir().unwrap();
        let paths = StorePaths::under(dir.path());
        let pipeline = GoldPipeline::new(&paths);

        let report = pipeline.process_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(), 7);
        assert!(!report.is_success());
        assert_eq!(report.error.unwrap().kind, "no_data_for_period");
    }

    #[test]
    fn test_gold_run_skips_gaps_in_window() {
        let dir = tempdir().unwrap();
        let paths = StorePaths::under(dir.path());

        let silver = SilverPipeline::new(&paths);
        RawStore::new(&paths.raw)
            .save(&snapshot(13, &[("BRL", 5.40), ("EUR", 0.90)]))
            .unwrap();
        RawStore::new(&paths.raw)
            .save(&snapshot(15, &[("BRL", 5.50), ("EUR", 0.91)]))
            .unwrap();
        assert!(silver
            .process_date(NaiveDate::from_ymd_opt(2024, 1, 13).unwrap())
            .is_success());
        assert!(silver
            .process_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
            .is_success());

        let gold = GoldPipeline::new(&paths);
        let report = gold.process_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(), 3);
        assert!(report.is_success());

        let counters = report.counters.unwrap();
        // Jan 14 has no data and is skipped
        assert_eq!(counters.days_included, 2);
        assert_eq!(counters.silver_records, 4);
        assert_eq!(counters.currencies_analyzed, 2);
    }
}
