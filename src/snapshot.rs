//! Raw snapshot model and record normalizer
//!
//! A snapshot is one provider response: a base currency quoted against many
//! target currencies at a point in time, wrapped in pipeline metadata by the
//! collector. Normalization turns it into one `RateObservation` per target
//! currency. No validation happens here; a zero-entry rate map yields an
//! empty batch and it is the validator's caller that decides what that means.

use crate::currency::normalize_code;
use crate::observation::RateObservation;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata stamped onto the snapshot by the collector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineMetadata {
    /// Instant the snapshot was collected
    pub collection_timestamp: DateTime<Utc>,
    /// Calendar date the snapshot is keyed by
    pub collection_date: NaiveDate,
    /// Collector version string
    pub pipeline_version: String,
}

/// Provider response payload
///
/// `conversion_rates` is a `BTreeMap` so normalization order is deterministic
/// regardless of the JSON key order on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Provider status, "success" for usable payloads
    pub result: String,
    /// Base currency code
    pub base_code: String,
    /// Provider's last-update instant as a unix timestamp, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_last_update_unix: Option<i64>,
    /// Target currency code -> rate
    pub conversion_rates: BTreeMap<String, f64>,
}

/// One raw snapshot as persisted in the raw layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSnapshot {
    pub pipeline_metadata: PipelineMetadata,
    pub api_response: ApiResponse,
}

impl RawSnapshot {
    /// Provider's last-update instant, falling back to the collection instant
    /// when the provider omits it.
    pub fn observed_at(&self) -> DateTime<Utc> {
        self.api_response
            .time_last_update_unix
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or(self.pipeline_metadata.collection_timestamp)
    }
}

/// Normalize a raw snapshot into canonical observations, one per target
/// currency, sharing the snapshot's metadata. Codes are uppercased here so
/// every downstream stage sees one canonical spelling.
pub fn normalize(snapshot: &RawSnapshot) -> Vec<RateObservation> {
    let observed_at = snapshot.observed_at();
    let base = normalize_code(&snapshot.api_response.base_code);

    let records: Vec<RateObservation> = snapshot
        .api_response
        .conversion_rates
        .iter()
        .map(|(target, &rate)| RateObservation {
            base_currency: base.clone(),
            target_currency: normalize_code(target),
            rate,
            observed_at,
            collected_at: snapshot.pipeline_metadata.collection_timestamp,
            collection_date: snapshot.pipeline_metadata.collection_date,
            pipeline_version: snapshot.pipeline_metadata.pipeline_version.clone(),
        })
        .collect();

    log::info!(
        "Normalized snapshot for {}: {} records, base {}",
        snapshot.pipeline_metadata.collection_date,
        records.len(),
        base
    );

    records
}
