//! Runtime knobs for the analytics run.
//!
//! Defaults match the standard report thresholds; a JSON file can
//! override individual fields.

use crate::error::AnalyticsResult;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// How many months after signup each cohort is tracked.
    pub cohort_window_months: u32,

    /// Minimum feedback score for a "high satisfaction" event.
    pub high_satisfaction_min: i64,

    /// Minimum document count for a "high volume" event.
    pub high_volume_min_docs: i64,

    /// IQR multiplier for statistical outlier detection.
    pub iqr_multiplier: f64,

    /// Reference "today" for future-date findings. When unset, the
    /// maximum timestamp observed in the snapshot is used so that a
    /// rerun over the same data yields the same findings.
    pub reference_date: Option<NaiveDateTime>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            cohort_window_months: 6,
            high_satisfaction_min: 4,
            high_volume_min_docs: 10,
            iqr_multiplier: 1.5,
            reference_date: None,
        }
    }
}

impl AnalyticsConfig {
    /// Load overrides from a JSON file. Missing fields keep defaults.
    pub fn load(path: &Path) -> AnalyticsResult<Self> {
        let file = File::open(path).map_err(|source| crate::error::AnalyticsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AnalyticsConfig = serde_json::from_reader(file)?;
        log::info!("Loaded analytics config from {}", path.display());
        Ok(config)
    }
}
