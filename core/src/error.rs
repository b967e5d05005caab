use std::path::PathBuf;
use thiserror::Error;

/// Structural faults abort the run; value-level anomalies never appear
/// here; they become data-quality findings instead.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Missing required column '{column}' in {}", path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("Unparseable timestamp '{value}' in {}, column '{column}', row {row}", path.display())]
    BadTimestamp {
        path: PathBuf,
        column: String,
        row: usize,
        value: String,
    },

    #[error("Invalid number '{value}' in {}, column '{column}', row {row}", path.display())]
    BadNumber {
        path: PathBuf,
        column: String,
        row: usize,
        value: String,
    },

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
