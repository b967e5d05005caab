//! Cohort retention model.
//!
//! Users are grouped by signup month and tracked for a fixed number of
//! months after signup. Users with zero events never enter the table.

use crate::config::AnalyticsConfig;
use crate::dataset::Dataset;
use crate::types::{round2, EntityId, MonthKey};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Serialize)]
pub struct CohortRow {
    pub user_id: EntityId,
    pub cohort_month: MonthKey,
    pub user_title: String,
    pub months_since_signup: u32,
    pub is_retained: u8,
    pub events_count: u64,
    pub active_days: u64,
}

/// Retention rollup per (cohort month, offset), for the console report.
#[derive(Debug, Clone, Serialize)]
pub struct CohortSummaryRow {
    pub cohort_month: MonthKey,
    pub months_since_signup: u32,
    pub users: u64,
    pub retained: u64,
    pub retention_rate_pct: f64,
    pub avg_events: f64,
    pub avg_active_days: f64,
}

/// One row per (user, offset 0..window) for every user with at least one
/// event, in snapshot user order.
pub fn cohort_base(data: &Dataset, config: &AnalyticsConfig) -> Vec<CohortRow> {
    let mut rows = Vec::new();

    for user in data.users() {
        let events = data.user_events(&user.user_id);
        if events.is_empty() {
            continue;
        }

        let cohort_month = MonthKey::of(user.user_created_date);
        for offset in 0..config.cohort_window_months {
            let target_month = cohort_month.plus(offset);
            let mut events_count = 0u64;
            let mut active_dates: BTreeSet<NaiveDate> = BTreeSet::new();
            for event in &events {
                if MonthKey::of(event.event_created_at) == target_month {
                    events_count += 1;
                    active_dates.insert(event.event_created_at.date());
                }
            }

            rows.push(CohortRow {
                user_id: user.user_id.clone(),
                cohort_month,
                user_title: user.user_title.clone(),
                months_since_signup: offset,
                is_retained: u8::from(events_count > 0),
                events_count,
                active_days: active_dates.len() as u64,
            });
        }
    }

    log::debug!("cohort: {} user-offset rows", rows.len());
    rows
}

/// Roll the base table up to retention rates per (cohort, offset).
pub fn cohort_summary(rows: &[CohortRow]) -> Vec<CohortSummaryRow> {
    let mut groups: BTreeMap<(MonthKey, u32), Vec<&CohortRow>> = BTreeMap::new();
    for row in rows {
        groups
            .entry((row.cohort_month, row.months_since_signup))
            .or_default()
            .push(row);
    }

    groups
        .into_iter()
        .map(|((cohort_month, offset), members)| {
            let users = members.len() as u64;
            let retained: u64 = members.iter().map(|r| u64::from(r.is_retained)).sum();
            let n = users as f64;
            CohortSummaryRow {
                cohort_month,
                months_since_signup: offset,
                users,
                retained,
                retention_rate_pct: round2(retained as f64 / n * 100.0),
                avg_events: round2(members.iter().map(|r| r.events_count as f64).sum::<f64>() / n),
                avg_active_days: round2(
                    members.iter().map(|r| r.active_days as f64).sum::<f64>() / n,
                ),
            }
        })
        .collect()
}
