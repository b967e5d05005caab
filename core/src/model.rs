//! The three base entity records, as normalized by the loader.
//!
//! All collections are loaded once per run and never mutated; every
//! derived table is a fresh output.

use crate::types::EntityId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: EntityId,
    pub user_created_date: NaiveDateTime,
    pub user_title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Firm {
    pub firm_id: EntityId,
    pub firm_created_date: NaiveDateTime,
    pub firm_size: i64,
    pub arr_in_thousands: f64,
}

/// A usage event. `event_id` is synthetic: the row position in the
/// source file. References to users/firms are not enforced; dangling
/// ids are a condition to detect, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: u64,
    pub user_id: EntityId,
    pub firm_id: EntityId,
    pub event_type: String,
    pub event_created_at: NaiveDateTime,
    pub num_docs: i64,
    pub feedback_score: Option<i64>,
}
