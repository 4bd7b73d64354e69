//! Typed record <-> DataFrame codecs
//!
//! All polars interop lives here so the rest of the crate works with plain
//! typed records. Calendar dates are stored as the `Date` logical type and
//! instants as millisecond `Datetime`, both losslessly round-trippable.

use crate::aggregate::DailyMetric;
use crate::error::{PipelineError, Result};
use crate::observation::RateObservation;
use crate::summary::CurrencySummary;
use crate::trend::TrendPoint;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Silver-layer column names
pub mod silver {
    pub const BASE_CURRENCY: &str = "base_currency";
    pub const TARGET_CURRENCY: &str = "target_currency";
    pub const RATE: &str = "rate";
    pub const OBSERVED_AT: &str = "observed_at";
    pub const COLLECTED_AT: &str = "collected_at";
    pub const COLLECTION_DATE: &str = "collection_date";
    pub const PIPELINE_VERSION: &str = "pipeline_version";
}

/// Days between 0001-01-01 (CE) and the 1970-01-01 epoch
const EPOCH_CE_DAYS: i32 = 719_163;

fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_CE_DAYS
}

fn days_to_date(days: i32) -> Result<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + EPOCH_CE_DAYS)
        .ok_or_else(|| PipelineError::Storage(format!("date out of range: {} days", days)))
}

fn date_series(name: &str, dates: impl Iterator<Item = NaiveDate>) -> Result<Series> {
    let days: Vec<i32> = dates.map(date_to_days).collect();
    Ok(Series::new(name, days).cast(&DataType::Date)?)
}

fn datetime_series(name: &str, instants: impl Iterator<Item = DateTime<Utc>>) -> Result<Series> {
    let millis: Vec<i64> = instants.map(|dt| dt.timestamp_millis()).collect();
    Ok(Series::new(name, millis).cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?)
}

fn null_error(column: &str) -> PipelineError {
    PipelineError::Storage(format!("unexpected null in column '{}'", column))
}

pub(crate) fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    df.column(name)?
        .f64()?
        .into_iter()
        .map(|v| v.ok_or_else(|| null_error(name)))
        .collect()
}

pub(crate) fn utf8_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    df.column(name)?
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string).ok_or_else(|| null_error(name)))
        .collect()
}

pub(crate) fn date_column(df: &DataFrame, name: &str) -> Result<Vec<NaiveDate>> {
    let physical = df.column(name)?.cast(&DataType::Int32)?;
    physical
        .i32()?
        .into_iter()
        .map(|v| v.ok_or_else(|| null_error(name)).and_then(days_to_date))
        .collect()
}

pub(crate) fn datetime_column(df: &DataFrame, name: &str) -> Result<Vec<DateTime<Utc>>> {
    let physical = df.column(name)?.cast(&DataType::Int64)?;
    physical
        .i64()?
        .into_iter()
        .map(|v| {
            let millis = v.ok_or_else(|| null_error(name))?;
            DateTime::from_timestamp_millis(millis)
                .ok_or_else(|| PipelineError::Storage(format!("instant out of range: {}", millis)))
        })
        .collect()
}

/// Build the fixed-schema silver frame from accepted observations.
pub fn observations_to_frame(observations: &[RateObservation]) -> Result<DataFrame> {
    let columns = vec![
        Series::new(
            silver::BASE_CURRENCY,
            observations
                .iter()
                .map(|o| o.base_currency.as_str())
                .collect::<Vec<_>>(),
        ),
        Series::new(
            silver::TARGET_CURRENCY,
            observations
                .iter()
                .map(|o| o.target_currency.as_str())
                .collect::<Vec<_>>(),
        ),
        Series::new(
            silver::RATE,
            observations.iter().map(|o| o.rate).collect::<Vec<_>>(),
        ),
        datetime_series(silver::OBSERVED_AT, observations.iter().map(|o| o.observed_at))?,
        datetime_series(silver::COLLECTED_AT, observations.iter().map(|o| o.collected_at))?,
        date_series(
            silver::COLLECTION_DATE,
            observations.iter().map(|o| o.collection_date),
        )?,
        Series::new(
            silver::PIPELINE_VERSION,
            observations
                .iter()
                .map(|o| o.pipeline_version.as_str())
                .collect::<Vec<_>>(),
        ),
    ];
    Ok(DataFrame::new(columns)?)
}

/// Rebuild typed observations from a silver frame.
pub fn frame_to_observations(df: &DataFrame) -> Result<Vec<RateObservation>> {
    let base = utf8_column(df, silver::BASE_CURRENCY)?;
    let target = utf8_column(df, silver::TARGET_CURRENCY)?;
    let rate = f64_column(df, silver::RATE)?;
    let observed_at = datetime_column(df, silver::OBSERVED_AT)?;
    let collected_at = datetime_column(df, silver::COLLECTED_AT)?;
    let collection_date = date_column(df, silver::COLLECTION_DATE)?;
    let version = utf8_column(df, silver::PIPELINE_VERSION)?;

    Ok((0..df.height())
        .map(|i| RateObservation {
            base_currency: base[i].clone(),
            target_currency: target[i].clone(),
            rate: rate[i],
            observed_at: observed_at[i],
            collected_at: collected_at[i],
            collection_date: collection_date[i],
            pipeline_version: version[i].clone(),
        })
        .collect())
}

/// Daily-metric table frame.
pub fn metrics_to_frame(metrics: &[DailyMetric]) -> Result<DataFrame> {
    let columns = vec![
        date_series("date", metrics.iter().map(|m| m.date))?,
        Series::new(
            "currency",
            metrics.iter().map(|m| m.currency.as_str()).collect::<Vec<_>>(),
        ),
        Series::new("rate_mean", metrics.iter().map(|m| m.rate_mean).collect::<Vec<_>>()),
        Series::new("rate_std", metrics.iter().map(|m| m.rate_std).collect::<Vec<_>>()),
        Series::new("rate_min", metrics.iter().map(|m| m.rate_min).collect::<Vec<_>>()),
        Series::new("rate_max", metrics.iter().map(|m| m.rate_max).collect::<Vec<_>>()),
        Series::new(
            "observation_count",
            metrics
                .iter()
                .map(|m| m.observation_count as u32)
                .collect::<Vec<_>>(),
        ),
        datetime_series("last_collected_at", metrics.iter().map(|m| m.last_collected_at))?,
        Series::new("rate_range", metrics.iter().map(|m| m.rate_range).collect::<Vec<_>>()),
        Series::new(
            "coefficient_of_variation",
            metrics
                .iter()
                .map(|m| m.coefficient_of_variation)
                .collect::<Vec<_>>(),
        ),
    ];
    Ok(DataFrame::new(columns)?)
}

/// Trend table frame: the metric columns plus the rolling fields.
pub fn trends_to_frame(trends: &[TrendPoint]) -> Result<DataFrame> {
    let mut df = metrics_to_frame(
        &trends.iter().map(|t| t.metric.clone()).collect::<Vec<_>>(),
    )?;

    let extra = [
        ("daily_change_pct", trends.iter().map(|t| t.daily_change_pct).collect::<Vec<_>>()),
        (
            "cumulative_change_pct",
            trends.iter().map(|t| t.cumulative_change_pct).collect::<Vec<_>>(),
        ),
        ("moving_avg_7d", trends.iter().map(|t| t.moving_avg_7d).collect::<Vec<_>>()),
        ("volatility_7d", trends.iter().map(|t| t.volatility_7d).collect::<Vec<_>>()),
        ("max_30d", trends.iter().map(|t| t.max_30d).collect::<Vec<_>>()),
        ("min_30d", trends.iter().map(|t| t.min_30d).collect::<Vec<_>>()),
        (
            "relative_position_pct",
            trends.iter().map(|t| t.relative_position_pct).collect::<Vec<_>>(),
        ),
    ];
    for (name, values) in extra {
        df.with_column(Series::new(name, values))?;
    }
    Ok(df)
}

/// Currency summary table frame.
pub fn summaries_to_frame(summaries: &[CurrencySummary]) -> Result<DataFrame> {
    let columns = vec![
        Series::new(
            "currency",
            summaries.iter().map(|s| s.currency.as_str()).collect::<Vec<_>>(),
        ),
        Series::new(
            "current_rate",
            summaries.iter().map(|s| s.current_rate).collect::<Vec<_>>(),
        ),
        Series::new(
            "last_daily_change",
            summaries.iter().map(|s| s.last_daily_change).collect::<Vec<_>>(),
        ),
        Series::new(
            "total_change_pct",
            summaries.iter().map(|s| s.total_change_pct).collect::<Vec<_>>(),
        ),
        Series::new(
            "moving_avg_7d",
            summaries.iter().map(|s| s.moving_avg_7d).collect::<Vec<_>>(),
        ),
        Series::new(
            "volatility_7d",
            summaries.iter().map(|s| s.volatility_7d).collect::<Vec<_>>(),
        ),
        Series::new(
            "relative_position_pct",
            summaries.iter().map(|s| s.relative_position_pct).collect::<Vec<_>>(),
        ),
        datetime_series(
            "last_collected_at",
            summaries.iter().map(|s| s.last_collected_at),
        )?,
        Series::new(
            "historical_min",
            summaries.iter().map(|s| s.historical_min).collect::<Vec<_>>(),
        ),
        Series::new(
            "historical_max",
            summaries.iter().map(|s| s.historical_max).collect::<Vec<_>>(),
        ),
        Series::new(
            "historical_avg",
            summaries.iter().map(|s| s.historical_avg).collect::<Vec<_>>(),
        ),
        Series::new(
            "avg_volatility_7d",
            summaries.iter().map(|s| s.avg_volatility_7d).collect::<Vec<_>>(),
        ),
        Series::new(
            "daily_change_std",
            summaries.iter().map(|s| s.daily_change_std).collect::<Vec<_>>(),
        ),
        Series::new(
            "max_daily_drop",
            summaries.iter().map(|s| s.max_daily_drop).collect::<Vec<_>>(),
        ),
        Series::new(
            "max_daily_gain",
            summaries.iter().map(|s| s.max_daily_gain).collect::<Vec<_>>(),
        ),
        date_series("first_date", summaries.iter().map(|s| s.first_date))?,
        date_series("last_date", summaries.iter().map(|s| s.last_date))?,
        Series::new(
            "total_observations",
            summaries
                .iter()
                .map(|s| s.total_observations as u32)
                .collect::<Vec<_>>(),
        ),
        Series::new(
            "volatility_class",
            summaries
                .iter()
                .map(|s| s.volatility_class.as_str())
                .collect::<Vec<_>>(),
        ),
        Series::new(
            "trend_class",
            summaries.iter().map(|s| s.trend_class.as_str()).collect::<Vec<_>>(),
        ),
    ];
    Ok(DataFrame::new(columns)?)
}

/// Consolidated digest frame: the columns downstream dashboards read most.
pub fn consolidated_frame(summaries: &[CurrencySummary]) -> Result<DataFrame> {
    let columns = vec![
        Series::new(
            "currency",
            summaries.iter().map(|s| s.currency.as_str()).collect::<Vec<_>>(),
        ),
        Series::new(
            "current_rate",
            summaries.iter().map(|s| s.current_rate).collect::<Vec<_>>(),
        ),
        Series::new(
            "last_daily_change",
            summaries.iter().map(|s| s.last_daily_change).collect::<Vec<_>>(),
        ),
        Series::new(
            "total_change_pct",
            summaries.iter().map(|s| s.total_change_pct).collect::<Vec<_>>(),
        ),
        Series::new(
            "moving_avg_7d",
            summaries.iter().map(|s| s.moving_avg_7d).collect::<Vec<_>>(),
        ),
        Series::new(
            "volatility_7d",
            summaries.iter().map(|s| s.volatility_7d).collect::<Vec<_>>(),
        ),
        Series::new(
            "trend_class",
            summaries.iter().map(|s| s.trend_class.as_str()).collect::<Vec<_>>(),
        ),
        Series::new(
            "volatility_class",
            summaries
                .iter()
                .map(|s| s.volatility_class.as_str())
                .collect::<Vec<_>>(),
        ),
    ];
    Ok(DataFrame::new(columns)?)
}

/// Write a frame as Snappy-compressed parquet.
pub fn write_parquet(path: &Path, df: &mut DataFrame) -> Result<()> {
    let file = File::create(path)?;
    ParquetWriter::new(file)
        .with_compression(ParquetCompression::Snappy)
        .finish(df)?;
    Ok(())
}

/// Read a parquet file into a frame.
pub fn read_parquet(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)?;
    Ok(ParquetReader::new(file).finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

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
    fn test_observation_frame_round_trip() {
        let observations = vec![observation("BRL", 5.50), observation("EUR", 0.9)];
        let df = observations_to_frame(&observations).unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 7);

        let back = frame_to_observations(&df).unwrap();
        assert_eq!(back, observations);
    }

    #[test]
    fn test_rate_column_bit_identical() {
        let rate = 5.123456789;
        let df = observations_to_frame(&[observation("BRL", rate)]).unwrap();
        let back = f64_column(&df, silver::RATE).unwrap();
        assert_eq!(back[0].to_bits(), rate.to_bits());
    }

    #[test]
    fn test_date_round_trip() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(days_to_date(date_to_days(date)).unwrap(), date);

        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(date_to_days(epoch), 0);
    }
}
