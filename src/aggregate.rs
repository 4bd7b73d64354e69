//! Daily aggregation of validated observations
//!
//! Groups accepted observations by (collection date, target currency) and
//! reduces each group to summary statistics. Standard deviation is the sample
//! convention (ddof = 1), reported as 0.0 for single-observation groups.

use crate::observation::RateObservation;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Distribution};
use std::collections::BTreeMap;

/// Aggregated rate statistics for one (date, currency) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetric {
    pub date: NaiveDate,
    pub currency: String,
    pub rate_mean: f64,
    /// Sample standard deviation (ddof = 1), 0.0 when only one observation
    pub rate_std: f64,
    pub rate_min: f64,
    pub rate_max: f64,
    pub observation_count: usize,
    /// Most recent collection instant in the group
    pub last_collected_at: DateTime<Utc>,
    /// `rate_max - rate_min`
    pub rate_range: f64,
    /// `rate_std / rate_mean`, 0.0 when the mean is zero
    pub coefficient_of_variation: f64,
}

/// Sample mean, 0.0 for an empty slice.
pub(crate) fn mean(values: &[f64]) -> f64 {
    Data::new(values.to_vec()).mean().unwrap_or(0.0)
}

/// Sample standard deviation (ddof = 1), 0.0 when fewer than two values.
pub(crate) fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    Data::new(values.to_vec()).std_dev().unwrap_or(0.0)
}

/// Group observations by (collection_date, target_currency) and compute the
/// per-group statistics. Output is ordered by (date, currency) ascending.
pub fn aggregate_daily(observations: &[RateObservation]) -> Vec<DailyMetric> {
    let mut groups: BTreeMap<(NaiveDate, String), Vec<&RateObservation>> = BTreeMap::new();
    for obs in observations {
        groups
            .entry((obs.collection_date, obs.target_currency.clone()))
            .or_default()
            .push(obs);
    }

    let metrics: Vec<DailyMetric> = groups
        .into_iter()
        .map(|((date, currency), group)| {
            let rates: Vec<f64> = group.iter().map(|o| o.rate).collect();
            let rate_mean = mean(&rates);
            let rate_std = sample_std(&rates);
            let rate_min = rates.iter().copied().fold(f64::INFINITY, f64::min);
            let rate_max = rates.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let last_collected_at = group
                .iter()
                .map(|o| o.collected_at)
                .max()
                .unwrap_or_else(|| group[0].collected_at);
            let coefficient_of_variation = if rate_mean != 0.0 {
                rate_std / rate_mean
            } else {
                0.0
            };

            DailyMetric {
                date,
                currency,
                rate_mean,
                rate_std,
                rate_min,
                rate_max,
                observation_count: rates.len(),
                last_collected_at,
                rate_range: rate_max - rate_min,
                coefficient_of_variation,
            }
        })
        .collect();

    log::info!(
        "Daily aggregation: {} observations -> {} (date, currency) groups",
        observations.len(),
        metrics.len()
    );

    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn observation(date: (i32, u32, u32), currency: &str, rate: f64, hour: u32) -> RateObservation {
        let collected = Utc
            .with_ymd_and_hms(date.0, date.1, date.2, hour, 0, 0)
            .unwrap();
        RateObservation {
            base_currency: "USD".to_string(),
            target_currency: currency.to_string(),
            rate,
            observed_at: collected - Duration::minutes(1),
            collected_at: collected,
            collection_date: collected.date_naive(),
            pipeline_version: "1.0.0".to_string(),
        }
    }

    #[test]
    fn test_single_observation_group() {
        let metrics = aggregate_daily(&[observation((2024, 1, 15), "BRL", 5.50, 12)]);

        assert_eq!(metrics.len(), 1);
        let m = &metrics[0];
        assert_eq!(m.currency, "BRL");
        assert_eq!(m.observation_count, 1);
        assert_relative_eq!(m.rate_mean, 5.50);
        assert_relative_eq!(m.rate_std, 0.0);
        assert_relative_eq!(m.rate_range, 0.0);
        assert_relative_eq!(m.coefficient_of_variation, 0.0);
    }

    #[test]
    fn test_multi_observation_statistics() {
        let metrics = aggregate_daily(&[
            observation((2024, 1, 15), "BRL", 5.40, 9),
            observation((2024, 1, 15), "BRL", 5.60, 15),
        ]);

        let m = &metrics[0];
        assert_eq!(m.observation_count, 2);
        assert_relative_eq!(m.rate_mean, 5.50);
        // sample std of [5.4, 5.6]
        assert_relative_eq!(m.rate_std, 0.2 / std::f64::consts::SQRT_2, epsilon = 1e-12);
        assert_relative_eq!(m.rate_min, 5.40);
        assert_relative_eq!(m.rate_max, 5.60);
        assert_relative_eq!(m.rate_range, 0.2, epsilon = 1e-12);
        assert_relative_eq!(m.coefficient_of_variation, m.rate_std / 5.50);
        assert_eq!(
            m.last_collected_at,
            Utc.with_ymd_and_hms(2024, 1, 15, 15, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_output_ordered_by_date_then_currency() {
        let metrics = aggregate_daily(&[
            observation((2024, 1, 16), "EUR", 0.91, 12),
            observation((2024, 1, 15), "EUR", 0.90, 12),
            observation((2024, 1, 15), "BRL", 5.50, 12),
        ]);

        let keys: Vec<(NaiveDate, &str)> =
            metrics.iter().map(|m| (m.date, m.currency.as_str())).collect();
        assert_eq!(
            keys,
            vec![
                (NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(), "BRL"),
                (NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(), "EUR"),
                (NaiveDate::from_ymd_opt(2024, 1, 16).unwrap(), "EUR"),
            ]
        );
    }

    #[test]
    fn test_currencies_grouped_independently() {
        let metrics = aggregate_daily(&[
            observation((2024, 1, 15), "BRL", 5.50, 12),
            observation((2024, 1, 15), "EUR", 0.90, 12),
        ]);
        assert_eq!(metrics.len(), 2);
        assert!(metrics.iter().all(|m| m.observation_count == 1));
    }
}
