//! # fx-lakehouse
//!
//! Batch pipeline that refines daily foreign-exchange rate snapshots through
//! a raw / silver / gold layered store.
//!
//! The raw layer holds one provider JSON snapshot per collection date. The
//! silver run normalizes a snapshot into typed observations, validates them
//! record by record, scores batch quality, and writes a date-keyed parquet
//! table. The gold run loads a trailing window of silver tables and derives
//! daily metrics, rolling trend series, per-currency summaries, and a market
//! overview document.
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use fx_lakehouse::pipeline::{GoldPipeline, SilverPipeline};
//! use fx_lakehouse::store::StorePaths;
//!
//! let paths = StorePaths::under("data");
//! let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
//!
//! let silver = SilverPipeline::new(&paths).process_date(date);
//! if silver.is_success() {
//!     let gold = GoldPipeline::new(&paths).process_date(date, 30);
//!     println!("{}", serde_json::to_string_pretty(&gold).unwrap());
//! }
//! ```

pub mod aggregate;
pub mod currency;
pub mod error;
pub mod observation;
pub mod overview;
pub mod pipeline;
pub mod quality;
pub mod report;
pub mod snapshot;
pub mod store;
pub mod summary;
pub mod trend;
pub mod validate;

pub use error::{PipelineError, Result};

/// Commonly used types for pipeline consumers
pub mod prelude {
    pub use crate::aggregate::DailyMetric;
    pub use crate::error::{PipelineError, Result};
    pub use crate::observation::RateObservation;
    pub use crate::overview::MarketOverview;
    pub use crate::pipeline::{GoldPipeline, SilverPipeline};
    pub use crate::report::{GoldReport, RunStatus, SilverReport};
    pub use crate::snapshot::RawSnapshot;
    pub use crate::store::StorePaths;
    pub use crate::summary::{CurrencySummary, TrendClass, VolatilityClass};
    pub use crate::trend::TrendPoint;
}
