//! Market overview document
//!
//! Reduces the currency summary table to one aggregate snapshot: sentiment
//! counts, volatility-class distribution, and the four named extremes. Ties
//! are broken by the summary table's existing sort order (first match wins),
//! so comparisons are strict.

use crate::summary::{CurrencySummary, TrendClass, VolatilityClass};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Daily changes with |x| <= this are counted as stable sentiment
pub const STABLE_SENTIMENT_BAND: f64 = 0.1;

/// How many head-of-table rows go into the major-currency digest
const MAJOR_CURRENCY_COUNT: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSentiment {
    pub currencies_up: usize,
    pub currencies_down: usize,
    pub currencies_stable: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatilityDistribution {
    pub low: usize,
    pub moderate: usize,
    pub high: usize,
    pub very_high: usize,
}

/// A currency achieving a change extreme
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeExtreme {
    pub currency: String,
    pub change_pct: f64,
}

/// A currency achieving a volatility extreme
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatilityExtreme {
    pub currency: String,
    pub volatility: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopPerformers {
    pub biggest_gainer: ChangeExtreme,
    pub biggest_loser: ChangeExtreme,
    pub most_volatile: VolatilityExtreme,
    pub most_stable: VolatilityExtreme,
}

/// Head-of-table digest row for the most significant currencies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MajorCurrency {
    pub currency: String,
    pub current_rate: f64,
    pub last_daily_change: f64,
    pub total_change_pct: f64,
    pub volatility_class: VolatilityClass,
    pub trend_class: TrendClass,
}

/// Aggregate market snapshot persisted as the gold-layer overview document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketOverview {
    pub generated_at: DateTime<Utc>,
    pub total_currencies: usize,
    pub observation_period: ObservationPeriod,
    pub market_sentiment: MarketSentiment,
    pub volatility_distribution: VolatilityDistribution,
    pub top_performers: TopPerformers,
    pub major_currencies: Vec<MajorCurrency>,
}

/// Build the overview from an already-sorted summary table.
/// Returns `None` for an empty table.
pub fn build_overview(summaries: &[CurrencySummary]) -> Option<MarketOverview> {
    let first = summaries.first()?;

    let start = summaries.iter().map(|s| s.first_date).min()?;
    let end = summaries.iter().map(|s| s.last_date).max()?;

    let mut sentiment = MarketSentiment {
        currencies_up: 0,
        currencies_down: 0,
        currencies_stable: 0,
    };
    let mut distribution = VolatilityDistribution {
        low: 0,
        moderate: 0,
        high: 0,
        very_high: 0,
    };

    let mut gainer = first;
    let mut loser = first;
    let mut most_volatile = first;
    let mut most_stable = first;

    for summary in summaries {
        if summary.last_daily_change > 0.0 {
            sentiment.currencies_up += 1;
        }
        if summary.last_daily_change < 0.0 {
            sentiment.currencies_down += 1;
        }
        if summary.last_daily_change.abs() <= STABLE_SENTIMENT_BAND {
            sentiment.currencies_stable += 1;
        }

        match summary.volatility_class {
            VolatilityClass::Low => distribution.low += 1,
            VolatilityClass::Moderate => distribution.moderate += 1,
            VolatilityClass::High => distribution.high += 1,
            VolatilityClass::VeryHigh => distribution.very_high += 1,
        }

        if summary.total_change_pct > gainer.total_change_pct {
            gainer = summary;
        }
        if summary.total_change_pct < loser.total_change_pct {
            loser = summary;
        }
        if summary.avg_volatility_7d > most_volatile.avg_volatility_7d {
            most_volatile = summary;
        }
        if summary.avg_volatility_7d < most_stable.avg_volatility_7d {
            most_stable = summary;
        }
    }

    let overview = MarketOverview {
        generated_at: Utc::now(),
        total_currencies: summaries.len(),
        observation_period: ObservationPeriod {
            start,
            end,
            total_days: (end - start).num_days() + 1,
        },
        market_sentiment: sentiment,
        volatility_distribution: distribution,
        top_performers: TopPerformers {
            biggest_gainer: ChangeExtreme {
                currency: gainer.currency.clone(),
                change_pct: gainer.total_change_pct,
            },
            biggest_loser: ChangeExtreme {
                currency: loser.currency.clone(),
                change_pct: loser.total_change_pct,
            },
            most_volatile: VolatilityExtreme {
                currency: most_volatile.currency.clone(),
                volatility: most_volatile.avg_volatility_7d,
            },
            most_stable: VolatilityExtreme {
                currency: most_stable.currency.clone(),
                volatility: most_stable.avg_volatility_7d,
            },
        },
        major_currencies: summaries
            .iter()
            .take(MAJOR_CURRENCY_COUNT)
            .map(|s| MajorCurrency {
                currency: s.currency.clone(),
                current_rate: s.current_rate,
                last_daily_change: s.last_daily_change,
                total_change_pct: s.total_change_pct,
                volatility_class: s.volatility_class,
                trend_class: s.trend_class,
            })
            .collect(),
    };

    log::info!(
        "Market overview: {} currencies, {} up / {} down / {} stable, gainer {}, loser {}",
        overview.total_currencies,
        overview.market_sentiment.currencies_up,
        overview.market_sentiment.currencies_down,
        overview.market_sentiment.currencies_stable,
        overview.top_performers.biggest_gainer.currency,
        overview.top_performers.biggest_loser.currency
    );

    Some(overview)
}
