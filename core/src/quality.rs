//! Data-quality analysis.
//!
//! Surfaces value-level problems without rejecting anything:
//!   1. Completeness: missing/blank fields
//!   2. Consistency: out-of-range feedback, non-positive document
//!      counts, events timestamped before their user's creation
//!   3. Business logic: zero-ARR and zero-headcount firms, future-dated
//!      records
//!   4. Anomalies: orphaned users, dangling event references, IQR
//!      outliers
//!
//! Nothing here is an error; the loader already rejected everything
//! structurally unusable.

use crate::config::AnalyticsConfig;
use crate::dataset::Dataset;
use crate::types::{round2, EntityId};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize)]
pub struct CompletenessFindings {
    pub missing_feedback_scores: u64,
    pub blank_user_titles: u64,
    pub blank_event_types: u64,
}

impl CompletenessFindings {
    pub fn total(&self) -> u64 {
        self.missing_feedback_scores + self.blank_user_titles + self.blank_event_types
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsistencyFindings {
    /// Present feedback scores outside [1, 5].
    pub out_of_range_feedback: u64,
    pub zero_doc_events: u64,
    pub negative_doc_events: u64,
    /// Events timestamped before the referenced user's creation date.
    pub events_before_user_creation: u64,
}

impl ConsistencyFindings {
    pub fn total(&self) -> u64 {
        self.out_of_range_feedback
            + self.zero_doc_events
            + self.negative_doc_events
            + self.events_before_user_creation
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BusinessLogicFindings {
    pub zero_arr_firms: u64,
    pub zero_size_firms: u64,
    pub future_dated_users: u64,
    pub future_dated_firms: u64,
    pub future_dated_events: u64,
}

impl BusinessLogicFindings {
    pub fn total(&self) -> u64 {
        self.zero_arr_firms
            + self.zero_size_firms
            + self.future_dated_users
            + self.future_dated_firms
            + self.future_dated_events
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnomalyFindings {
    /// Users with no events at all, sorted by id.
    pub orphaned_users: Vec<EntityId>,
    /// Events whose user_id matches no user record.
    pub dangling_user_refs: u64,
    /// Events whose firm_id matches no firm record.
    pub dangling_firm_refs: u64,
    /// Feedback scores outside the IQR fence.
    pub feedback_outliers: u64,
    /// Events with num_docs above the IQR upper fence.
    pub extreme_doc_events: u64,
    /// The computed num_docs upper fence, for the report.
    pub extreme_doc_upper_bound: f64,
}

impl AnomalyFindings {
    pub fn total(&self) -> u64 {
        self.orphaned_users.len() as u64
            + self.dangling_user_refs
            + self.dangling_firm_refs
            + self.feedback_outliers
            + self.extreme_doc_events
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventTypeCount {
    pub event_type: String,
    pub events: u64,
    pub share_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub users_total: u64,
    pub firms_total: u64,
    pub events_total: u64,
    /// The "today" used for future-date findings.
    pub reference_date: Option<chrono::NaiveDateTime>,
    pub completeness: CompletenessFindings,
    pub consistency: ConsistencyFindings,
    pub business_logic: BusinessLogicFindings,
    pub anomalies: AnomalyFindings,
    pub event_type_distribution: Vec<EventTypeCount>,
    /// (total records − total findings) / total records × 100.
    pub quality_score_pct: f64,
}

/// Run every check over the snapshot.
pub fn analyze(data: &Dataset, config: &AnalyticsConfig) -> QualityReport {
    let reference_date = config.reference_date.or_else(|| data.max_timestamp());

    let mut completeness = CompletenessFindings::default();
    let mut consistency = ConsistencyFindings::default();
    let mut business_logic = BusinessLogicFindings::default();
    let mut anomalies = AnomalyFindings::default();

    for user in data.users() {
        if user.user_title.trim().is_empty() {
            completeness.blank_user_titles += 1;
        }
        if let Some(today) = reference_date {
            if user.user_created_date > today {
                business_logic.future_dated_users += 1;
            }
        }
        if data.user_events(&user.user_id).is_empty() {
            anomalies.orphaned_users.push(user.user_id.clone());
        }
    }
    anomalies.orphaned_users.sort();

    for firm in data.firms() {
        if firm.arr_in_thousands == 0.0 {
            business_logic.zero_arr_firms += 1;
        }
        if firm.firm_size == 0 {
            business_logic.zero_size_firms += 1;
        }
        if let Some(today) = reference_date {
            if firm.firm_created_date > today {
                business_logic.future_dated_firms += 1;
            }
        }
    }

    let mut type_counts: BTreeMap<&str, u64> = BTreeMap::new();
    for event in data.events() {
        *type_counts.entry(event.event_type.as_str()).or_default() += 1;
        if event.event_type.trim().is_empty() {
            completeness.blank_event_types += 1;
        }
        match event.feedback_score {
            None => completeness.missing_feedback_scores += 1,
            Some(score) if !(1..=5).contains(&score) => {
                consistency.out_of_range_feedback += 1;
            }
            Some(_) => {}
        }
        match event.num_docs {
            0 => consistency.zero_doc_events += 1,
            d if d < 0 => consistency.negative_doc_events += 1,
            _ => {}
        }
        if let Some(today) = reference_date {
            if event.event_created_at > today {
                business_logic.future_dated_events += 1;
            }
        }
        match data.user(&event.user_id) {
            Some(user) => {
                if event.event_created_at < user.user_created_date {
                    consistency.events_before_user_creation += 1;
                }
            }
            None => anomalies.dangling_user_refs += 1,
        }
        if data.firm(&event.firm_id).is_none() {
            anomalies.dangling_firm_refs += 1;
        }
    }

    // IQR fences over present feedback scores and document counts.
    let feedback: Vec<f64> = data
        .events()
        .iter()
        .filter_map(|e| e.feedback_score.map(|s| s as f64))
        .collect();
    if let Some((lower, upper)) = iqr_fences(&feedback, config.iqr_multiplier) {
        anomalies.feedback_outliers = feedback
            .iter()
            .filter(|&&s| s < lower || s > upper)
            .count() as u64;
    }

    let docs: Vec<f64> = data.events().iter().map(|e| e.num_docs as f64).collect();
    if let Some((_, upper)) = iqr_fences(&docs, config.iqr_multiplier) {
        anomalies.extreme_doc_upper_bound = upper;
        anomalies.extreme_doc_events = docs.iter().filter(|&&d| d > upper).count() as u64;
    }

    let events_total = data.events().len() as u64;
    let event_type_distribution = type_counts
        .into_iter()
        .map(|(event_type, events)| EventTypeCount {
            event_type: event_type.to_string(),
            events,
            share_pct: round2(events as f64 / events_total as f64 * 100.0),
        })
        .collect();

    let total_records =
        data.users().len() as u64 + data.firms().len() as u64 + events_total;
    let total_findings = completeness.total()
        + consistency.total()
        + business_logic.total()
        + anomalies.total();
    let quality_score_pct = if total_records == 0 {
        100.0
    } else {
        round2(
            (total_records as f64 - total_findings as f64) / total_records as f64 * 100.0,
        )
    };

    log::info!(
        "quality: {total_findings} findings over {total_records} records (score {quality_score_pct:.1}%)"
    );

    QualityReport {
        users_total: data.users().len() as u64,
        firms_total: data.firms().len() as u64,
        events_total,
        reference_date,
        completeness,
        consistency,
        business_logic,
        anomalies,
        event_type_distribution,
        quality_score_pct,
    }
}

/// (lower, upper) Tukey fences. `None` for an empty sample.
fn iqr_fences(values: &[f64], multiplier: f64) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let q1 = quantile(&sorted, 0.25);
    let q3 = quantile(&sorted, 0.75);
    let iqr = q3 - q1;
    Some((q1 - multiplier * iqr, q3 + multiplier * iqr))
}

/// Linear-interpolation quantile over a sorted, non-empty sample.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = position - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}
