//! LexMetrics core: usage analytics over a legal-platform data snapshot.
//!
//! Pipeline: loader → dataset (indexed, immutable) → derivation/rollup
//! models → export. Each model is a pure function of the dataset and
//! config; a run over the same snapshot always produces the same tables.

pub mod acquisition;
pub mod classify;
pub mod cohort;
pub mod config;
pub mod dataset;
pub mod engagement;
pub mod error;
pub mod export;
pub mod loader;
pub mod model;
pub mod performance;
pub mod quality;
pub mod types;
