//! Per-user monthly engagement model.
//!
//! One row per (user, calendar month) with at least one event: query
//! volume, active days, document throughput, average feedback, and the
//! derived engagement tier.

use crate::classify::{engagement_level, mean_feedback, EngagementLevel};
use crate::dataset::Dataset;
use crate::types::{round2, EntityId, MonthKey};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Serialize)]
pub struct EngagementRow {
    pub user_id: EntityId,
    /// From the user's earliest event within the month. Users can work
    /// with multiple firms; one is attributed per month.
    pub firm_id: EntityId,
    /// Absent when the event references an unknown user.
    pub user_title: Option<String>,
    pub month: MonthKey,
    pub query_count: u64,
    pub active_days: u64,
    pub total_documents_processed: i64,
    pub avg_feedback_score: Option<f64>,
    pub engagement_level: EngagementLevel,
}

/// Distribution + per-tier averages, for the console report.
#[derive(Debug, Clone, Serialize)]
pub struct EngagementLevelSummary {
    pub engagement_level: EngagementLevel,
    pub records: u64,
    pub share_pct: f64,
    pub avg_query_count: f64,
    pub avg_active_days: f64,
    pub avg_feedback_score: Option<f64>,
}

struct MonthAccum {
    // (timestamp, event_id) of the earliest event seen, for firm attribution
    first_seen: (chrono::NaiveDateTime, u64),
    firm_id: EntityId,
    query_count: u64,
    active_dates: BTreeSet<NaiveDate>,
    total_docs: i64,
    feedback: Vec<i64>,
}

/// Build the monthly engagement table, ordered by (month, user_id).
pub fn monthly_engagement(data: &Dataset) -> Vec<EngagementRow> {
    let mut groups: BTreeMap<(MonthKey, EntityId), MonthAccum> = BTreeMap::new();

    for event in data.events() {
        let key = (MonthKey::of(event.event_created_at), event.user_id.clone());
        let seen = (event.event_created_at, event.event_id);
        let accum = groups.entry(key).or_insert_with(|| MonthAccum {
            first_seen: seen,
            firm_id: event.firm_id.clone(),
            query_count: 0,
            active_dates: BTreeSet::new(),
            total_docs: 0,
            feedback: Vec::new(),
        });

        if seen < accum.first_seen {
            accum.first_seen = seen;
            accum.firm_id = event.firm_id.clone();
        }
        accum.query_count += 1;
        accum.active_dates.insert(event.event_created_at.date());
        accum.total_docs += event.num_docs;
        if let Some(score) = event.feedback_score {
            accum.feedback.push(score);
        }
    }

    let rows: Vec<EngagementRow> = groups
        .into_iter()
        .map(|((month, user_id), accum)| {
            let active_days = accum.active_dates.len() as u64;
            EngagementRow {
                user_title: data.user(&user_id).map(|u| u.user_title.clone()),
                user_id,
                firm_id: accum.firm_id,
                month,
                query_count: accum.query_count,
                active_days,
                total_documents_processed: accum.total_docs,
                avg_feedback_score: mean_feedback(accum.feedback.iter().copied()),
                engagement_level: engagement_level(accum.query_count, active_days),
            }
        })
        .collect();

    log::debug!("engagement: {} user-month rows", rows.len());
    rows
}

/// Summarize rows per engagement tier, highest tier first.
pub fn engagement_level_distribution(rows: &[EngagementRow]) -> Vec<EngagementLevelSummary> {
    let mut by_level: BTreeMap<EngagementLevel, Vec<&EngagementRow>> = BTreeMap::new();
    for row in rows {
        by_level.entry(row.engagement_level).or_default().push(row);
    }

    let total = rows.len() as f64;
    by_level
        .into_iter()
        .rev()
        .map(|(level, members)| {
            let n = members.len() as f64;
            let feedback: Vec<f64> = members
                .iter()
                .filter_map(|r| r.avg_feedback_score)
                .collect();
            EngagementLevelSummary {
                engagement_level: level,
                records: members.len() as u64,
                share_pct: round2(n / total * 100.0),
                avg_query_count: round2(
                    members.iter().map(|r| r.query_count as f64).sum::<f64>() / n,
                ),
                avg_active_days: round2(
                    members.iter().map(|r| r.active_days as f64).sum::<f64>() / n,
                ),
                avg_feedback_score: if feedback.is_empty() {
                    None
                } else {
                    Some(round2(feedback.iter().sum::<f64>() / feedback.len() as f64))
                },
            }
        })
        .collect()
}
