//! Record validator
//!
//! Applies the currency-code, rate-range and timestamp rules to each
//! observation independently, partitioning the batch into accepted and
//! rejected records. Rejection is a normal outcome, never an error: bad
//! records are accumulated with the identifiers of the rules they violated
//! and processing continues. Whether zero accepted records is fatal is the
//! owning pipeline's call.

use crate::currency::{is_distinct_pair, is_valid_code};
use crate::observation::RateObservation;
use chrono::Datelike;
use serde::Serialize;
use std::fmt;

/// Upper bound on a sane exchange rate
pub const MAX_RATE: f64 = 1_000_000.0;

/// Accepted rates are rounded to this many decimal places
pub const RATE_DECIMALS: u32 = 8;

const MIN_TIMESTAMP_YEAR: i32 = 2000;
const MAX_TIMESTAMP_YEAR: i32 = 2030;

/// Identifier of a validation rule a record can violate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleViolation {
    /// A currency code is not 3 alphabetic characters, or base == target
    CurrencyCode,
    /// Rate is non-finite, non-positive, or above the sanity bound
    RateRange,
    /// A timestamp falls outside the accepted year range, or the collection
    /// instant is skewed too far from the provider's update instant
    TimestampRange,
}

impl RuleViolation {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleViolation::CurrencyCode => "currency_code",
            RuleViolation::RateRange => "rate_range",
            RuleViolation::TimestampRange => "timestamp_range",
        }
    }
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A record that failed validation, with the rules it violated
#[derive(Debug, Clone)]
pub struct RejectedRecord {
    /// Index of the record in the input batch
    pub index: usize,
    /// The raw record as it arrived
    pub observation: RateObservation,
    pub violations: Vec<RuleViolation>,
}

/// Result of validating one batch
///
/// Accepted and rejected records together cover the input exactly; no record
/// appears in both.
#[derive(Debug, Default)]
pub struct ValidationOutcome {
    pub accepted: Vec<RateObservation>,
    pub rejected: Vec<RejectedRecord>,
}

impl ValidationOutcome {
    pub fn total(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }

    /// accepted / total, 0 for an empty batch
    pub fn success_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.accepted.len() as f64 / total as f64
        }
    }
}

/// Round a rate to the canonical 8-decimal precision. Idempotent.
pub fn round_rate(rate: f64) -> f64 {
    let factor = 10f64.powi(RATE_DECIMALS as i32);
    (rate * factor).round() / factor
}

fn rate_in_range(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0 && rate <= MAX_RATE
}

fn year_in_range(year: i32) -> bool {
    (MIN_TIMESTAMP_YEAR..=MAX_TIMESTAMP_YEAR).contains(&year)
}

/// Evaluate every rule against one observation, returning all violations.
pub fn check_record(observation: &RateObservation) -> Vec<RuleViolation> {
    let mut violations = Vec::new();

    let codes_valid = is_valid_code(&observation.base_currency)
        && is_valid_code(&observation.target_currency)
        && is_distinct_pair(&observation.base_currency, &observation.target_currency);
    if !codes_valid {
        violations.push(RuleViolation::CurrencyCode);
    }

    if !rate_in_range(observation.rate) {
        violations.push(RuleViolation::RateRange);
    }

    let timestamps_valid = year_in_range(observation.observed_at.year())
        && year_in_range(observation.collected_at.year())
        && observation.timestamps_within_skew()
        && observation.collection_date_coherent();
    if !timestamps_valid {
        violations.push(RuleViolation::TimestampRange);
    }

    violations
}

/// Validate a batch, partitioning it into accepted and rejected records.
/// Accepted records carry the rate rounded to canonical precision.
pub fn validate_batch(records: Vec<RateObservation>) -> ValidationOutcome {
    let total = records.len();
    let mut outcome = ValidationOutcome::default();

    for (index, mut observation) in records.into_iter().enumerate() {
        let violations = check_record(&observation);
        if violations.is_empty() {
            observation.rate = round_rate(observation.rate);
            outcome.accepted.push(observation);
        } else {
            log::warn!(
                "Record {} ({}/{}) rejected: {}",
                index,
                observation.base_currency,
                observation.target_currency,
                violations
                    .iter()
                    .map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            outcome.rejected.push(RejectedRecord {
                index,
                observation,
                violations,
            });
        }
    }

    log::info!(
        "Validation complete: {}/{} accepted ({:.1}% success rate)",
        outcome.accepted.len(),
        total,
        outcome.success_rate() * 100.0
    );

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn observation(base: &str, target: &str, rate: f64) -> RateObservation {
        let observed = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let collected = observed + Duration::minutes(1);
        RateObservation {
            base_currency: base.to_string(),
            target_currency: target.to_string(),
            rate,
            observed_at: observed,
            collected_at: collected,
            collection_date: collected.date_naive(),
            pipeline_version: "1.0.0".to_string(),
        }
    }

    #[test]
    fn test_valid_record_accepted() {
        let outcome = validate_batch(vec![observation("USD", "BRL", 5.50)]);
        assert_eq!(outcome.accepted.len(), 1);
        assert!(outcome.rejected.is_empty());
        assert_relative_eq!(outcome.success_rate(), 1.0);
    }

    #[test]
    fn test_same_pair_rejected() {
        let outcome = validate_batch(vec![observation("USD", "USD", 1.0)]);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(
            outcome.rejected[0].violations,
            vec![RuleViolation::CurrencyCode]
        );
    }

    #[test]
    fn test_bad_rates_rejected() {
        for rate in [0.0, -5.0, f64::NAN, f64::INFINITY, 1_000_000.5] {
            let outcome = validate_batch(vec![observation("USD", "EUR", rate)]);
            assert_eq!(outcome.accepted.len(), 0, "rate {} should be rejected", rate);
            assert!(outcome.rejected[0]
                .violations
                .contains(&RuleViolation::RateRange));
        }
    }

    #[test]
    fn test_timestamp_out_of_year_range_rejected() {
        let mut obs = observation("USD", "EUR", 0.9);
        obs.observed_at = Utc.with_ymd_and_hms(1999, 12, 31, 23, 0, 0).unwrap();

        let outcome = validate_batch(vec![obs]);
        assert!(outcome.rejected[0]
            .violations
            .contains(&RuleViolation::TimestampRange));
    }

    #[test]
    fn test_collection_skew_rejected() {
        let mut obs = observation("USD", "EUR", 0.9);
        obs.collected_at = obs.observed_at - Duration::days(8);
        obs.collection_date = obs.collected_at.date_naive();

        let outcome = validate_batch(vec![obs]);
        assert!(outcome.rejected[0]
            .violations
            .contains(&RuleViolation::TimestampRange));
    }

    #[test]
    fn test_multiple_violations_reported_together() {
        let outcome = validate_batch(vec![observation("X", "EUR", -1.0)]);
        let violations = &outcome.rejected[0].violations;
        assert!(violations.contains(&RuleViolation::CurrencyCode));
        assert!(violations.contains(&RuleViolation::RateRange));
    }

    #[test]
    fn test_partition_covers_input() {
        let batch = vec![
            observation("USD", "BRL", 5.50),
            observation("USD", "EUR", -5.0),
            observation("USD", "GBP", 0.79),
        ];
        let outcome = validate_batch(batch);
        assert_eq!(outcome.total(), 3);
        assert_eq!(outcome.accepted.len(), 2);
        assert_eq!(outcome.rejected[0].index, 1);
        assert_relative_eq!(outcome.success_rate(), 2.0 / 3.0);
    }

    #[test]
    fn test_accepted_rate_rounded_to_8_decimals() {
        let outcome = validate_batch(vec![observation("USD", "BRL", 5.123456789123)]);
        assert_relative_eq!(outcome.accepted[0].rate, 5.12345679, epsilon = 1e-12);
    }

    #[test]
    fn test_rounding_idempotent() {
        let once = round_rate(0.123456785);
        assert_eq!(round_rate(once), once);
    }

    fn collected_for(observed: DateTime<Utc>) -> DateTime<Utc> {
        observed + Duration::minutes(1)
    }

    proptest! {
        #[test]
        fn prop_valid_pairs_in_range_accepted(
            base in "[A-Z]{3}",
            target in "[A-Z]{3}",
            rate in 1e-8..=1_000_000.0f64,
        ) {
            prop_assume!(base != target);
            let observed = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
            let collected = collected_for(observed);
            let obs = RateObservation {
                base_currency: base,
                target_currency: target,
                rate,
                observed_at: observed,
                collected_at: collected,
                collection_date: collected.date_naive(),
                pipeline_version: "1.0.0".to_string(),
            };
            prop_assert!(check_record(&obs).is_empty());
        }

        #[test]
        fn prop_nonpositive_rates_rejected(rate in -1_000_000.0..=0.0f64) {
            let violations = check_record(&observation("USD", "EUR", rate));
            prop_assert!(violations.contains(&RuleViolation::RateRange));
        }

        #[test]
        fn prop_round_rate_idempotent(rate in 0.0..=1_000_000.0f64) {
            let once = round_rate(rate);
            prop_assert_eq!(round_rate(once).to_bits(), once.to_bits());
        }
    }
}
