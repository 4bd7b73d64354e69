//! Per-currency summarization and classification
//!
//! Reduces each currency's trend series to one current-state row joined with
//! whole-series extremes, then buckets volatility and trend into categorical
//! labels using explicit ordered boundary tables.

use crate::aggregate::{mean, sample_std};
use crate::trend::TrendPoint;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Volatility bucket derived from the series-average 7-day volatility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolatilityClass {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl VolatilityClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            VolatilityClass::Low => "Low",
            VolatilityClass::Moderate => "Moderate",
            VolatilityClass::High => "High",
            VolatilityClass::VeryHigh => "VeryHigh",
        }
    }
}

impl fmt::Display for VolatilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trend bucket derived from the latest daily change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendClass {
    StrongUp,
    Up,
    Stable,
    Down,
    StrongDown,
}

impl TrendClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendClass::StrongUp => "StrongUp",
            TrendClass::Up => "Up",
            TrendClass::Stable => "Stable",
            TrendClass::Down => "Down",
            TrendClass::StrongDown => "StrongDown",
        }
    }
}

impl fmt::Display for TrendClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Upper bound -> label, scanned in order; last bucket is open-ended.
const VOLATILITY_BUCKETS: [(f64, VolatilityClass); 4] = [
    (1.0, VolatilityClass::Low),
    (2.0, VolatilityClass::Moderate),
    (5.0, VolatilityClass::High),
    (f64::INFINITY, VolatilityClass::VeryHigh),
];

/// Bucket an average 7-day volatility: Low [0,1), Moderate [1,2),
/// High [2,5), VeryHigh [5,inf).
pub fn classify_volatility(avg_volatility: f64) -> VolatilityClass {
    for (upper, label) in VOLATILITY_BUCKETS {
        if avg_volatility < upper {
            return label;
        }
    }
    VolatilityClass::VeryHigh
}

/// Bucket the latest daily change: StrongUp (>2), Up (0.5, 2],
/// Stable [-0.5, 0.5], Down [-2, -0.5), StrongDown (<-2).
pub fn classify_trend(last_daily_change: f64) -> TrendClass {
    if last_daily_change > 2.0 {
        TrendClass::StrongUp
    } else if last_daily_change > 0.5 {
        TrendClass::Up
    } else if last_daily_change >= -0.5 {
        TrendClass::Stable
    } else if last_daily_change >= -2.0 {
        TrendClass::Down
    } else {
        TrendClass::StrongDown
    }
}

/// One consolidated row per currency: latest state plus historical extremes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencySummary {
    pub currency: String,
    /// rate_mean of the latest trend point
    pub current_rate: f64,
    pub last_daily_change: f64,
    /// Cumulative change since the first observed point
    pub total_change_pct: f64,
    pub moving_avg_7d: f64,
    pub volatility_7d: f64,
    pub relative_position_pct: f64,
    pub last_collected_at: DateTime<Utc>,
    pub historical_min: f64,
    pub historical_max: f64,
    pub historical_avg: f64,
    /// Mean of volatility_7d over the whole series
    pub avg_volatility_7d: f64,
    /// Sample std of daily changes over the whole series
    pub daily_change_std: f64,
    /// Most negative daily change observed
    pub max_daily_drop: f64,
    /// Most positive daily change observed
    pub max_daily_gain: f64,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    /// Number of daily points in the series
    pub total_observations: usize,
    pub volatility_class: VolatilityClass,
    pub trend_class: TrendClass,
}

/// Reduce a trend table to one summary row per currency, ordered by
/// (total_observations desc, avg_volatility_7d asc) so more-observed,
/// more-stable currencies surface first.
pub fn summarize(trends: &[TrendPoint]) -> Vec<CurrencySummary> {
    let mut by_currency: BTreeMap<&str, Vec<&TrendPoint>> = BTreeMap::new();
    for point in trends {
        by_currency
            .entry(point.metric.currency.as_str())
            .or_default()
            .push(point);
    }

    let mut summaries: Vec<CurrencySummary> = by_currency
        .into_iter()
        .map(|(currency, mut series)| {
            series.sort_by_key(|p| p.metric.date);
            summarize_currency(currency, &series)
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.total_observations
            .cmp(&a.total_observations)
            .then_with(|| {
                a.avg_volatility_7d
                    .partial_cmp(&b.avg_volatility_7d)
                    .unwrap_or(Ordering::Equal)
            })
    });

    log::info!(
        "Currency summary: {} trend points -> {} currencies",
        trends.len(),
        summaries.len()
    );

    summaries
}

fn summarize_currency(currency: &str, series: &[&TrendPoint]) -> CurrencySummary {
    let latest = series[series.len() - 1];

    let rates: Vec<f64> = series.iter().map(|p| p.metric.rate_mean).collect();
    let volatilities: Vec<f64> = series.iter().map(|p| p.volatility_7d).collect();
    let changes: Vec<f64> = series.iter().map(|p| p.daily_change_pct).collect();

    let avg_volatility_7d = mean(&volatilities);
    let last_daily_change = latest.daily_change_pct;

    CurrencySummary {
        currency: currency.to_string(),
        current_rate: latest.metric.rate_mean,
        last_daily_change,
        total_change_pct: latest.cumulative_change_pct,
        moving_avg_7d: latest.moving_avg_7d,
        volatility_7d: latest.volatility_7d,
        relative_position_pct: latest.relative_position_pct,
        last_collected_at: latest.metric.last_collected_at,
        historical_min: rates.iter().copied().fold(f64::INFINITY, f64::min),
        historical_max: rates.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        historical_avg: mean(&rates),
        avg_volatility_7d,
        daily_change_std: sample_std(&changes),
        max_daily_drop: changes.iter().copied().fold(f64::INFINITY, f64::min),
        max_daily_gain: changes.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        first_date: series[0].metric.date,
        last_date: latest.metric.date,
        total_observations: series.len(),
        volatility_class: classify_volatility(avg_volatility_7d),
        trend_class: classify_trend(last_daily_change),
    }
}
