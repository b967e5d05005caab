//! User acquisition model.
//!
//! The base table has one row per user, including users with zero
//! events, whose activation fields stay absent. This is where orphaned
//! users remain visible. The summary table rolls activation and
//! quick-start rates up by (acquisition month, title).

use crate::classify::{
    activation_category, arr_category, firm_size_category, mean_feedback, satisfaction_category,
    ActivationCategory, ArrCategory, FirmSizeCategory, SatisfactionCategory,
};
use crate::dataset::Dataset;
use crate::types::{round2, EntityId, MonthKey};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Serialize)]
pub struct AcquisitionBaseRow {
    pub user_id: EntityId,
    pub user_title: String,
    pub user_created_date: NaiveDateTime,
    /// From the user's earliest event; absent for users with no events
    /// and for events referencing an unknown firm the raw id is still
    /// carried.
    pub firm_id: Option<EntityId>,
    pub firm_size: Option<i64>,
    pub arr_in_thousands: Option<f64>,
    pub acquisition_month: MonthKey,
    pub first_activity_date: Option<NaiveDateTime>,
    pub days_to_first_activity: Option<i64>,
    pub total_events: u64,
    pub active_days: u64,
    pub avg_satisfaction_score: Option<f64>,
    pub total_documents_processed: i64,
    pub is_activated: u8,
    pub is_quick_start: u8,
    pub is_monthly_activated: u8,
    pub firm_size_category: FirmSizeCategory,
    pub arr_category: ArrCategory,
    pub activation_category: ActivationCategory,
    pub satisfaction_category: SatisfactionCategory,
}

#[derive(Debug, Clone, Serialize)]
pub struct AcquisitionSummaryRow {
    pub acquisition_month: MonthKey,
    pub user_title: String,
    pub users: u64,
    pub activated: u64,
    pub quick_start: u64,
    pub avg_events_per_user: f64,
    pub avg_satisfaction_score: Option<f64>,
    pub activation_rate_pct: f64,
    pub quick_start_rate_pct: f64,
}

/// One row per user, in snapshot user order.
pub fn acquisition_base(data: &Dataset) -> Vec<AcquisitionBaseRow> {
    let mut rows = Vec::new();

    for user in data.users() {
        let events = data.user_events(&user.user_id);

        let first = events.first();
        let first_activity = first.map(|e| e.event_created_at);
        let days_to_first =
            first_activity.map(|ts| (ts - user.user_created_date).num_days());

        let firm_id = first.map(|e| e.firm_id.clone());
        let firm = firm_id.as_deref().and_then(|id| data.firm(id));

        let mut active_dates: BTreeSet<NaiveDate> = BTreeSet::new();
        for event in &events {
            active_dates.insert(event.event_created_at.date());
        }

        let avg_satisfaction = mean_feedback(events.iter().filter_map(|e| e.feedback_score));

        rows.push(AcquisitionBaseRow {
            user_id: user.user_id.clone(),
            user_title: user.user_title.clone(),
            user_created_date: user.user_created_date,
            firm_id,
            firm_size: firm.map(|f| f.firm_size),
            arr_in_thousands: firm.map(|f| f.arr_in_thousands),
            acquisition_month: MonthKey::of(user.user_created_date),
            first_activity_date: first_activity,
            days_to_first_activity: days_to_first,
            total_events: events.len() as u64,
            active_days: active_dates.len() as u64,
            avg_satisfaction_score: avg_satisfaction,
            total_documents_processed: events.iter().map(|e| e.num_docs).sum(),
            is_activated: u8::from(first_activity.is_some()),
            is_quick_start: u8::from(matches!(days_to_first, Some(d) if d <= 7)),
            is_monthly_activated: u8::from(matches!(days_to_first, Some(d) if d <= 30)),
            firm_size_category: firm_size_category(firm.map(|f| f.firm_size)),
            arr_category: arr_category(firm.map(|f| f.arr_in_thousands)),
            activation_category: activation_category(days_to_first),
            satisfaction_category: satisfaction_category(avg_satisfaction),
        });
    }

    log::debug!("acquisition: {} user rows", rows.len());
    rows
}

/// Roll the base table up by (acquisition month, title).
pub fn acquisition_summary(base: &[AcquisitionBaseRow]) -> Vec<AcquisitionSummaryRow> {
    let mut groups: BTreeMap<(MonthKey, &str), Vec<&AcquisitionBaseRow>> = BTreeMap::new();
    for row in base {
        groups
            .entry((row.acquisition_month, row.user_title.as_str()))
            .or_default()
            .push(row);
    }

    groups
        .into_iter()
        .map(|((month, title), members)| {
            let users = members.len() as u64;
            let activated: u64 = members.iter().map(|r| u64::from(r.is_activated)).sum();
            let quick_start: u64 = members.iter().map(|r| u64::from(r.is_quick_start)).sum();
            let n = users as f64;
            // Mean of the per-user averages, over users who left feedback.
            let satisfaction: Vec<f64> = members
                .iter()
                .filter_map(|r| r.avg_satisfaction_score)
                .collect();
            AcquisitionSummaryRow {
                acquisition_month: month,
                user_title: title.to_string(),
                users,
                activated,
                quick_start,
                avg_events_per_user: round2(
                    members.iter().map(|r| r.total_events as f64).sum::<f64>() / n,
                ),
                avg_satisfaction_score: if satisfaction.is_empty() {
                    None
                } else {
                    Some(round2(
                        satisfaction.iter().sum::<f64>() / satisfaction.len() as f64,
                    ))
                },
                activation_rate_pct: round2(activated as f64 / n * 100.0),
                quick_start_rate_pct: round2(quick_start as f64 / n * 100.0),
            }
        })
        .collect()
}
