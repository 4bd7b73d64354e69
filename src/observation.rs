//! Canonical rate observation
//!
//! One `RateObservation` per (base, target) pair per snapshot. Created by the
//! normalizer, immutable once validated; downstream stages derive new records
//! instead of mutating these.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of days the collection instant may precede the provider's
/// last-update instant.
pub const MAX_COLLECTION_LEAD_DAYS: i64 = 7;

/// Maximum number of days the collection instant may trail the provider's
/// last-update instant.
pub const MAX_COLLECTION_LAG_DAYS: i64 = 1;

/// Canonical per-currency-pair rate record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateObservation {
    /// Base currency code (e.g. USD)
    pub base_currency: String,
    /// Target currency code (e.g. BRL)
    pub target_currency: String,
    /// Exchange rate: 1 base = `rate` target
    pub rate: f64,
    /// Provider's last-update instant
    pub observed_at: DateTime<Utc>,
    /// Pipeline collection instant
    pub collected_at: DateTime<Utc>,
    /// Calendar date of collection
    pub collection_date: NaiveDate,
    /// Version of the pipeline that produced this record
    pub pipeline_version: String,
}

impl RateObservation {
    /// Collection date must match the calendar date of the collection instant.
    pub fn collection_date_coherent(&self) -> bool {
        self.collection_date == self.collected_at.date_naive()
    }

    /// Collection must not precede the source update by more than a week,
    /// nor trail it by more than a day.
    pub fn timestamps_within_skew(&self) -> bool {
        let lower = self.observed_at - Duration::days(MAX_COLLECTION_LEAD_DAYS);
        let upper = self.observed_at + Duration::days(MAX_COLLECTION_LAG_DAYS);
        self.collected_at >= lower && self.collected_at <= upper
    }
}
