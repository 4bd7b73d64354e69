//! Rolling trend calculation over daily metrics
//!
//! Enriches each currency's chronologically ordered `DailyMetric` series with
//! day-over-day change, cumulative change, and trailing-window statistics.
//! All windows are trailing-inclusive: they end at the current point and use
//! only past data. Each currency's series is independent of every other's,
//! so the per-currency loop runs in parallel.

use crate::aggregate::{mean, sample_std, DailyMetric};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Trailing window length for volatility and moving average
pub const SHORT_WINDOW: usize = 7;

/// Trailing window length for rolling extremes
pub const LONG_WINDOW: usize = 30;

/// A daily metric enriched with trend fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub metric: DailyMetric,
    /// Percent change of rate_mean versus the previous point, 0 for the first
    pub daily_change_pct: f64,
    /// Percent change of rate_mean versus the first point of the series
    pub cumulative_change_pct: f64,
    /// Mean of rate_mean over the trailing <=7-point window
    pub moving_avg_7d: f64,
    /// Sample std of daily_change_pct over the trailing <=7-point window
    pub volatility_7d: f64,
    /// Max of rate_mean over the trailing <=30-point window
    pub max_30d: f64,
    /// Min of rate_mean over the trailing <=30-point window
    pub min_30d: f64,
    /// Position of rate_mean within the 30-point range, 50 when the range is 0
    pub relative_position_pct: f64,
}

/// Fixed-capacity trailing window over a scalar series
#[derive(Debug)]
struct TrailingWindow {
    capacity: usize,
    values: VecDeque<f64>,
}

impl TrailingWindow {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    fn push(&mut self, value: f64) {
        self.values.push_back(value);
        if self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    fn as_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    fn max(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    fn min(&self) -> f64 {
        self.values.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

/// Compute trend points for one currency's date-ordered metric series.
///
/// A single-point series falls out of the same loop as the general case:
/// zero changes, windows equal to the point itself, and a neutral 50%
/// relative position.
pub fn currency_trend(series: &[DailyMetric]) -> Vec<TrendPoint> {
    let mut points = Vec::with_capacity(series.len());
    if series.is_empty() {
        return points;
    }

    let first_rate = series[0].rate_mean;
    let mut changes = TrailingWindow::new(SHORT_WINDOW);
    let mut rates_short = TrailingWindow::new(SHORT_WINDOW);
    let mut rates_long = TrailingWindow::new(LONG_WINDOW);

    for (i, metric) in series.iter().enumerate() {
        let rate = metric.rate_mean;

        let daily_change_pct = if i == 0 {
            0.0
        } else {
            pct_change(rate, series[i - 1].rate_mean)
        };
        let cumulative_change_pct = pct_change(rate, first_rate);

        changes.push(daily_change_pct);
        rates_short.push(rate);
        rates_long.push(rate);

        let volatility_7d = sample_std(&changes.as_vec());
        let moving_avg_7d = mean(&rates_short.as_vec());
        let max_30d = rates_long.max();
        let min_30d = rates_long.min();

        let range = max_30d - min_30d;
        let relative_position_pct = if range > 0.0 {
            (rate - min_30d) / range * 100.0
        } else {
            50.0
        };

        points.push(TrendPoint {
            metric: metric.clone(),
            daily_change_pct,
            cumulative_change_pct,
            moving_avg_7d,
            volatility_7d,
            max_30d,
            min_30d,
            relative_position_pct,
        });
    }

    points
}

fn pct_change(current: f64, reference: f64) -> f64 {
    if reference == 0.0 {
        0.0
    } else {
        (current / reference - 1.0) * 100.0
    }
}

/// Compute trends for the whole metric table.
///
/// Metrics are regrouped per currency and sorted by date within each series;
/// currencies are processed in parallel and emitted in (currency, date) order.
pub fn compute_trends(metrics: &[DailyMetric]) -> Vec<TrendPoint> {
    let mut by_currency: BTreeMap<&str, Vec<DailyMetric>> = BTreeMap::new();
    for metric in metrics {
        by_currency
            .entry(metric.currency.as_str())
            .or_default()
            .push(metric.clone());
    }

    let mut series: Vec<Vec<DailyMetric>> = by_currency.into_values().collect();
    for s in series.iter_mut() {
        s.sort_by_key(|m| m.date);
    }

    let points: Vec<TrendPoint> = series
        .par_iter()
        .map(|s| currency_trend(s))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect();

    log::info!(
        "Trend calculation: {} metrics -> {} trend points across {} currencies",
        metrics.len(),
        points.len(),
        series.len()
    );

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn metric(day: u32, currency: &str, rate_mean: f64) -> DailyMetric {
        let date = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        DailyMetric {
            date,
            currency: currency.to_string(),
            rate_mean,
            rate_std: 0.0,
            rate_min: rate_mean,
            rate_max: rate_mean,
            observation_count: 1,
            last_collected_at: Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
            rate_range: 0.0,
            coefficient_of_variation: 0.0,
        }
    }

    #[test]
    fn test_single_point_defaults() {
        let points = currency_trend(&[metric(15, "BRL", 5.50)]);

        assert_eq!(points.len(), 1);
        let p = &points[0];
        assert_relative_eq!(p.daily_change_pct, 0.0);
        assert_relative_eq!(p.cumulative_change_pct, 0.0);
        assert_relative_eq!(p.volatility_7d, 0.0);
        assert_relative_eq!(p.moving_avg_7d, 5.50);
        assert_relative_eq!(p.max_30d, 5.50);
        assert_relative_eq!(p.min_30d, 5.50);
        assert_relative_eq!(p.relative_position_pct, 50.0);
    }

    #[test]
    fn test_compounding_changes() {
        let series = vec![
            metric(1, "EUR", 1.0),
            metric(2, "EUR", 1.1),
            metric(3, "EUR", 1.21),
        ];
        let points = currency_trend(&series);

        let daily: Vec<f64> = points.iter().map(|p| p.daily_change_pct).collect();
        assert_relative_eq!(daily[0], 0.0);
        assert_relative_eq!(daily[1], 10.0, epsilon = 1e-9);
        assert_relative_eq!(daily[2], 10.0, epsilon = 1e-9);

        let cumulative: Vec<f64> = points.iter().map(|p| p.cumulative_change_pct).collect();
        assert_relative_eq!(cumulative[0], 0.0);
        assert_relative_eq!(cumulative[1], 10.0, epsilon = 1e-9);
        assert_relative_eq!(cumulative[2], 21.0, epsilon = 1e-9);
    }

    #[test]
    fn test_moving_average_window_shrinks_near_start() {
        let series: Vec<DailyMetric> = (1..=10)
            .map(|d| metric(d, "EUR", d as f64))
            .collect();
        let points = currency_trend(&series);

        // Third point: mean of [1, 2, 3]
        assert_relative_eq!(points[2].moving_avg_7d, 2.0);
        // Tenth point: trailing 7 values [4..=10]
        assert_relative_eq!(points[9].moving_avg_7d, 7.0);
    }

    #[test]
    fn test_rolling_extremes_trail_30_points() {
        let mut rates: Vec<f64> = vec![100.0];
        rates.extend((1..35).map(|i| 10.0 + i as f64 * 0.1));
        let series: Vec<DailyMetric> = rates
            .iter()
            .enumerate()
            .map(|(i, &r)| {
                let mut m = metric(1, "EUR", r);
                m.date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64);
                m
            })
            .collect();

        let points = currency_trend(&series);
        // Early on, the initial spike dominates the 30-point max
        assert_relative_eq!(points[10].max_30d, 100.0);
        // After 30 more points the spike has left the window
        assert!(points[34].max_30d < 100.0);
    }

    #[test]
    fn test_relative_position_within_range() {
        let series = vec![
            metric(1, "EUR", 1.0),
            metric(2, "EUR", 2.0),
            metric(3, "EUR", 1.5),
        ];
        let points = currency_trend(&series);

        assert_relative_eq!(points[0].relative_position_pct, 50.0);
        assert_relative_eq!(points[1].relative_position_pct, 100.0);
        assert_relative_eq!(points[2].relative_position_pct, 50.0);
    }

    #[test]
    fn test_volatility_is_sample_std_of_changes() {
        let series = vec![
            metric(1, "EUR", 1.0),
            metric(2, "EUR", 1.1),
            metric(3, "EUR", 1.21),
        ];
        let points = currency_trend(&series);

        // Window at i=1: changes [0, 10]
        assert_relative_eq!(
            points[1].volatility_7d,
            sample_std(&[0.0, 10.0]),
            epsilon = 1e-9
        );
        // Window of size 1 yields zero volatility
        assert_relative_eq!(points[0].volatility_7d, 0.0);
    }

    #[test]
    fn test_currencies_are_independent() {
        let metrics = vec![
            metric(1, "BRL", 5.0),
            metric(1, "EUR", 1.0),
            metric(2, "BRL", 6.0),
            metric(2, "EUR", 1.0),
        ];
        let points = compute_trends(&metrics);

        assert_eq!(points.len(), 4);
        // Output in (currency, date) order
        assert_eq!(points[0].metric.currency, "BRL");
        assert_eq!(points[1].metric.currency, "BRL");
        assert_eq!(points[2].metric.currency, "EUR");
        assert_eq!(points[3].metric.currency, "EUR");

        // BRL's 20% move does not leak into EUR's series
        assert_relative_eq!(points[1].daily_change_pct, 20.0, epsilon = 1e-9);
        assert_relative_eq!(points[3].daily_change_pct, 0.0);
    }

    #[test]
    fn test_unsorted_input_is_ordered_per_currency() {
        let metrics = vec![metric(2, "EUR", 1.1), metric(1, "EUR", 1.0)];
        let points = compute_trends(&metrics);

        assert_eq!(points[0].metric.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_relative_eq!(points[1].daily_change_pct, 10.0, epsilon = 1e-9);
    }
}
