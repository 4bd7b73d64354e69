//! Data quality scoring
//!
//! Scores a validated batch from three independent checks: completeness
//! (null cells), currency-code consistency, and rate distribution. The
//! scorer is a pure function returning a fresh report per call; it keeps the
//! rate and currency checks even though validation already ran, so it can
//! also be pointed at raw frames.

use crate::currency::is_valid_code;
use crate::error::Result;
use crate::store::frame::{f64_column, silver, utf8_column};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Distribution, OrderStatistics};
use std::collections::BTreeSet;

/// Rates above this are flagged as extreme in the distribution check
pub const EXTREME_RATE_THRESHOLD: f64 = 1_000.0;

/// Rates above this count as invalid in the overall score
const INVALID_RATE_CEILING: f64 = 1_000_000.0;

const MISSING_WEIGHT: f64 = 0.3;
const INVALID_RATE_WEIGHT: f64 = 0.4;
const INVALID_CURRENCY_WEIGHT: f64 = 0.3;

/// Currency-code consistency over the batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConsistency {
    pub unique_base_currencies: usize,
    pub unique_target_currencies: usize,
    pub invalid_codes: Vec<String>,
}

/// Shape of the rate distribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateDistribution {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub zero_count: usize,
    pub negative_count: usize,
    pub extreme_count: usize,
}

/// Quality assessment of one validated batch, read-only after creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub total_records: usize,
    /// 1 - fraction of null cells across all columns
    pub completeness_score: f64,
    pub currency_consistency: CurrencyConsistency,
    pub rate_distribution: RateDistribution,
    pub issues: Vec<String>,
    /// `1 - 0.3*missing - 0.4*invalid_rate - 0.3*invalid_currency`, floored at 0
    pub overall_score: f64,
}

/// Assess a silver-schema frame.
pub fn assess(df: &DataFrame) -> Result<QualityReport> {
    let rows = df.height();
    let mut issues = Vec::new();

    let null_cells: usize = df.get_columns().iter().map(|s| s.null_count()).sum();
    let total_cells = rows * df.width();
    let missing_ratio = if total_cells > 0 {
        null_cells as f64 / total_cells as f64
    } else {
        0.0
    };
    if null_cells > 0 {
        issues.push(format!("{} missing cells found", null_cells));
    }

    let rates = f64_column(df, silver::RATE)?;
    let base_codes = utf8_column(df, silver::BASE_CURRENCY)?;
    let target_codes = utf8_column(df, silver::TARGET_CURRENCY)?;

    let currency_consistency = check_currency_consistency(&base_codes, &target_codes, &mut issues);
    let rate_distribution = check_rate_distribution(&rates, &mut issues);

    let invalid_rates = rates
        .iter()
        .filter(|&&r| r <= 0.0 || r > INVALID_RATE_CEILING)
        .count();
    let invalid_rate_ratio = ratio(invalid_rates, rows);

    let invalid_slots = base_codes
        .iter()
        .chain(target_codes.iter())
        .filter(|code| !is_valid_code(code))
        .count();
    let invalid_currency_ratio = ratio(invalid_slots, rows * 2);

    let overall_score = (1.0
        - MISSING_WEIGHT * missing_ratio
        - INVALID_RATE_WEIGHT * invalid_rate_ratio
        - INVALID_CURRENCY_WEIGHT * invalid_currency_ratio)
        .max(0.0);

    log::info!(
        "Quality assessment: {} records, score {:.3}, {} issues",
        rows,
        overall_score,
        issues.len()
    );

    Ok(QualityReport {
        total_records: rows,
        completeness_score: 1.0 - missing_ratio,
        currency_consistency,
        rate_distribution,
        issues,
        overall_score,
    })
}

fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

fn check_currency_consistency(
    base_codes: &[String],
    target_codes: &[String],
    issues: &mut Vec<String>,
) -> CurrencyConsistency {
    let unique_base: BTreeSet<&String> = base_codes.iter().collect();
    let unique_target: BTreeSet<&String> = target_codes.iter().collect();

    let mut invalid_codes = Vec::new();
    for code in base_codes.iter().chain(target_codes.iter()) {
        if !is_valid_code(code) && !invalid_codes.contains(code) {
            invalid_codes.push(code.clone());
        }
    }

    if !invalid_codes.is_empty() {
        issues.push(format!("Invalid currency codes: {:?}", invalid_codes));
    }

    CurrencyConsistency {
        unique_base_currencies: unique_base.len(),
        unique_target_currencies: unique_target.len(),
        invalid_codes,
    }
}

fn check_rate_distribution(rates: &[f64], issues: &mut Vec<String>) -> RateDistribution {
    let zero_count = rates.iter().filter(|&&r| r == 0.0).count();
    let negative_count = rates.iter().filter(|&&r| r < 0.0).count();
    let extreme_count = rates
        .iter()
        .filter(|&&r| r > EXTREME_RATE_THRESHOLD)
        .count();

    if zero_count > 0 {
        issues.push(format!("Found {} zero rates", zero_count));
    }
    if negative_count > 0 {
        issues.push(format!("Found {} negative rates", negative_count));
    }
    if extreme_count > 0 {
        issues.push(format!(
            "Found {} extreme rates (>{})",
            extreme_count, EXTREME_RATE_THRESHOLD
        ));
    }

    if rates.is_empty() {
        return RateDistribution {
            min: 0.0,
            max: 0.0,
            mean: 0.0,
            median: 0.0,
            std: 0.0,
            zero_count,
            negative_count,
            extreme_count,
        };
    }

    let mut data = Data::new(rates.to_vec());
    let std = if rates.len() < 2 {
        0.0
    } else {
        data.std_dev().unwrap_or(0.0)
    };

    RateDistribution {
        min: rates.iter().copied().fold(f64::INFINITY, f64::min),
        max: rates.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        mean: data.mean().unwrap_or(0.0),
        median: data.median(),
        std,
        zero_count,
        negative_count,
        extreme_count,
    }
}
