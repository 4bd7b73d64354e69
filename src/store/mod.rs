//! Medallion storage layers
//!
//! raw: date-keyed JSON snapshots as collected.
//! silver: validated observations as Snappy parquet.
//! gold: aggregated analytical tables plus the overview document.

pub mod frame;
pub mod gold;
pub mod raw;
pub mod silver;

pub use gold::{GoldArtifacts, GoldStore};
pub use raw::RawStore;
pub use silver::SilverStore;

use std::path::{Path, PathBuf};

/// Directory layout of the medallion dataset
#[derive(Debug, Clone)]
pub struct StorePaths {
    pub raw: PathBuf,
    pub silver: PathBuf,
    pub gold: PathBuf,
}

impl StorePaths {
    /// Standard layout under one data root: `{root}/raw`, `{root}/silver`,
    /// `{root}/gold`.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            raw: root.join("raw"),
            silver: root.join("silver"),
            gold: root.join("gold"),
        }
    }
}

impl Default for StorePaths {
    fn default() -> Self {
        Self::under("data")
    }
}
