//! Multi-grain event performance aggregator.
//!
//! This module:
//!   1. Joins every event to its user/firm attributes through the
//!      dataset indexes (missing references yield absent attributes)
//!   2. Rolls events up at three grains (daily, weekly by ISO calendar
//!      week, monthly), each with its own grouping dimensions
//!   3. Derives rate/ratio metrics per group, with every division
//!      guarded (zero denominator yields NotApplicable, never infinity)
//!   4. Computes week-over-week growth per (event_type, user_title)
//!      series at the weekly grain
//!   5. Widens the three per-grain schemas into one combined table,
//!      marking columns a grain does not compute as NotApplicable
//!
//! The whole pass is deterministic: groups live in BTreeMaps and the
//! combined table is ordered daily → weekly → monthly, each grain by its
//! grouping key.

use crate::classify::{
    satisfaction_performance, tenure_days, user_segment, volume_performance,
    SatisfactionPerformance, UserSegment, VolumePerformance,
};
use crate::config::AnalyticsConfig;
use crate::dataset::Dataset;
use crate::types::{round2, Grain, Metric, MonthKey, WeekKey};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

// ── Per-grain rows ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct DailyPerformanceRow {
    pub event_date: NaiveDate,
    pub event_type: String,
    pub user_title: Option<String>,
    pub user_segment: Option<UserSegment>,
    pub total_events: u64,
    pub unique_users: u64,
    pub unique_firms: u64,
    pub total_documents_processed: i64,
    pub avg_documents_per_event: f64,
    pub avg_satisfaction_score: Option<f64>,
    pub high_satisfaction_events: u64,
    pub high_volume_events: u64,
    pub satisfaction_rate_pct: f64,
    pub high_volume_rate_pct: f64,
    pub documents_per_user: Metric,
    pub events_per_user: Metric,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyPerformanceRow {
    pub event_week: WeekKey,
    pub event_type: String,
    pub user_title: Option<String>,
    pub total_events: u64,
    pub unique_users: u64,
    pub unique_firms: u64,
    pub total_documents_processed: i64,
    pub avg_documents_per_event: f64,
    pub avg_satisfaction_score: Option<f64>,
    pub high_satisfaction_events: u64,
    pub high_volume_events: u64,
    pub satisfaction_rate_pct: f64,
    pub high_volume_rate_pct: f64,
    /// Absent when the series has no previous observed week, or the
    /// previous count is zero.
    pub week_over_week_growth_pct: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyPerformanceRow {
    pub event_month: MonthKey,
    pub event_type: String,
    pub user_title: Option<String>,
    pub user_segment: Option<UserSegment>,
    pub total_events: u64,
    pub unique_users: u64,
    pub unique_firms: u64,
    pub total_documents_processed: i64,
    pub avg_documents_per_event: f64,
    pub avg_satisfaction_score: Option<f64>,
    pub high_satisfaction_events: u64,
    pub high_volume_events: u64,
    pub satisfaction_rate_pct: f64,
    pub high_volume_rate_pct: f64,
    pub events_per_user: Metric,
    pub documents_per_user: Metric,
    pub satisfaction_performance: SatisfactionPerformance,
    pub volume_performance: VolumePerformance,
}

/// The widened union schema. Numeric columns a grain does not compute
/// carry `Metric::NotApplicable`; `week_over_week_growth_pct` is
/// additionally `None` when the weekly series has no usable previous
/// week. Categorical grain-specific columns (`user_segment`,
/// `satisfaction_performance`, `volume_performance`) are `None` for
/// grains that omit them.
#[derive(Debug, Clone, Serialize)]
pub struct CombinedPerformanceRow {
    pub time_grain: Grain,
    pub time_period: String,
    pub event_type: String,
    pub user_title: Option<String>,
    pub user_segment: Option<UserSegment>,
    pub total_events: u64,
    pub unique_users: u64,
    pub unique_firms: u64,
    pub total_documents_processed: i64,
    pub avg_documents_per_event: f64,
    pub avg_satisfaction_score: Option<f64>,
    pub high_satisfaction_events: u64,
    pub high_volume_events: u64,
    pub satisfaction_rate_pct: f64,
    pub high_volume_rate_pct: f64,
    pub documents_per_user: Metric,
    pub events_per_user: Metric,
    pub week_over_week_growth_pct: Option<Metric>,
    pub satisfaction_performance: Option<SatisfactionPerformance>,
    pub volume_performance: Option<VolumePerformance>,
}

#[derive(Debug)]
pub struct PerformanceTables {
    pub daily: Vec<DailyPerformanceRow>,
    pub weekly: Vec<WeeklyPerformanceRow>,
    pub monthly: Vec<MonthlyPerformanceRow>,
    pub combined: Vec<CombinedPerformanceRow>,
}

// ── Fact building ────────────────────────────────────────────────────────────

struct EventFact<'a> {
    user_id: &'a str,
    firm_id: &'a str,
    event_type: &'a str,
    date: NaiveDate,
    week: WeekKey,
    month: MonthKey,
    num_docs: i64,
    feedback_score: Option<i64>,
    user_title: Option<&'a str>,
    user_segment: Option<UserSegment>,
    high_satisfaction: bool,
    high_volume: bool,
}

fn build_facts<'a>(data: &'a Dataset, config: &AnalyticsConfig) -> Vec<EventFact<'a>> {
    data.events()
        .iter()
        .map(|event| {
            let user = data.user(&event.user_id);
            EventFact {
                user_id: &event.user_id,
                firm_id: &event.firm_id,
                event_type: &event.event_type,
                date: event.event_created_at.date(),
                week: WeekKey::of(event.event_created_at),
                month: MonthKey::of(event.event_created_at),
                num_docs: event.num_docs,
                feedback_score: event.feedback_score,
                user_title: user.map(|u| u.user_title.as_str()),
                user_segment: user.map(|u| {
                    user_segment(tenure_days(event.event_created_at, u.user_created_date))
                }),
                high_satisfaction: event
                    .feedback_score
                    .is_some_and(|s| s >= config.high_satisfaction_min),
                high_volume: event.num_docs >= config.high_volume_min_docs,
            }
        })
        .collect()
}

// ── Group accumulation ───────────────────────────────────────────────────────

struct GroupAccum<'a> {
    total_events: u64,
    users: BTreeSet<&'a str>,
    firms: BTreeSet<&'a str>,
    total_docs: i64,
    feedback_sum: i64,
    feedback_count: u64,
    high_satisfaction: u64,
    high_volume: u64,
}

impl<'a> GroupAccum<'a> {
    fn new(fact: &EventFact<'a>) -> Self {
        let mut accum = Self {
            total_events: 0,
            users: BTreeSet::new(),
            firms: BTreeSet::new(),
            total_docs: 0,
            feedback_sum: 0,
            feedback_count: 0,
            high_satisfaction: 0,
            high_volume: 0,
        };
        accum.push(fact);
        accum
    }

    fn push(&mut self, fact: &EventFact<'a>) {
        self.total_events += 1;
        self.users.insert(fact.user_id);
        self.firms.insert(fact.firm_id);
        self.total_docs += fact.num_docs;
        if let Some(score) = fact.feedback_score {
            self.feedback_sum += score;
            self.feedback_count += 1;
        }
        if fact.high_satisfaction {
            self.high_satisfaction += 1;
        }
        if fact.high_volume {
            self.high_volume += 1;
        }
    }

    fn avg_satisfaction(&self) -> Option<f64> {
        if self.feedback_count == 0 {
            None
        } else {
            Some(round2(self.feedback_sum as f64 / self.feedback_count as f64))
        }
    }

    fn satisfaction_rate_pct(&self) -> f64 {
        round2(self.high_satisfaction as f64 / self.total_events as f64 * 100.0)
    }

    fn high_volume_rate_pct(&self) -> f64 {
        round2(self.high_volume as f64 / self.total_events as f64 * 100.0)
    }

    fn avg_docs_per_event(&self) -> f64 {
        round2(self.total_docs as f64 / self.total_events as f64)
    }

    fn docs_per_user(&self) -> Metric {
        Metric::ratio(self.total_docs as f64, self.users.len() as f64)
    }

    fn events_per_user(&self) -> Metric {
        Metric::ratio(self.total_events as f64, self.users.len() as f64)
    }
}

// ── Rollups ──────────────────────────────────────────────────────────────────

type DailyKey<'a> = (NaiveDate, &'a str, Option<&'a str>, Option<UserSegment>);
type WeeklyKey<'a> = (WeekKey, &'a str, Option<&'a str>);
type MonthlyKey<'a> = (MonthKey, &'a str, Option<&'a str>, Option<UserSegment>);

fn group_by<'a, K: Ord>(
    facts: &[EventFact<'a>],
    key_fn: impl Fn(&EventFact<'a>) -> K,
) -> BTreeMap<K, GroupAccum<'a>> {
    let mut groups: BTreeMap<K, GroupAccum<'a>> = BTreeMap::new();
    for fact in facts {
        match groups.entry(key_fn(fact)) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(GroupAccum::new(fact));
            }
            std::collections::btree_map::Entry::Occupied(mut slot) => {
                slot.get_mut().push(fact);
            }
        }
    }
    groups
}

fn daily_rollup(facts: &[EventFact<'_>]) -> Vec<DailyPerformanceRow> {
    let groups = group_by(facts, |f| -> DailyKey<'_> {
        (f.date, f.event_type, f.user_title, f.user_segment)
    });
    groups
        .into_iter()
        .map(|((date, event_type, title, segment), accum)| DailyPerformanceRow {
            event_date: date,
            event_type: event_type.to_string(),
            user_title: title.map(str::to_string),
            user_segment: segment,
            total_events: accum.total_events,
            unique_users: accum.users.len() as u64,
            unique_firms: accum.firms.len() as u64,
            total_documents_processed: accum.total_docs,
            avg_documents_per_event: accum.avg_docs_per_event(),
            avg_satisfaction_score: accum.avg_satisfaction(),
            high_satisfaction_events: accum.high_satisfaction,
            high_volume_events: accum.high_volume,
            satisfaction_rate_pct: accum.satisfaction_rate_pct(),
            high_volume_rate_pct: accum.high_volume_rate_pct(),
            documents_per_user: accum.docs_per_user(),
            events_per_user: accum.events_per_user(),
        })
        .collect()
}

fn weekly_rollup(facts: &[EventFact<'_>]) -> Vec<WeeklyPerformanceRow> {
    let groups = group_by(facts, |f| -> WeeklyKey<'_> {
        (f.week, f.event_type, f.user_title)
    });

    let mut rows: Vec<WeeklyPerformanceRow> = groups
        .into_iter()
        .map(|((week, event_type, title), accum)| WeeklyPerformanceRow {
            event_week: week,
            event_type: event_type.to_string(),
            user_title: title.map(str::to_string),
            total_events: accum.total_events,
            unique_users: accum.users.len() as u64,
            unique_firms: accum.firms.len() as u64,
            total_documents_processed: accum.total_docs,
            avg_documents_per_event: accum.avg_docs_per_event(),
            avg_satisfaction_score: accum.avg_satisfaction(),
            high_satisfaction_events: accum.high_satisfaction,
            high_volume_events: accum.high_volume,
            satisfaction_rate_pct: accum.satisfaction_rate_pct(),
            high_volume_rate_pct: accum.high_volume_rate_pct(),
            week_over_week_growth_pct: None,
        })
        .collect();

    apply_week_over_week_growth(&mut rows);
    rows
}

/// Growth against the previous *observed* week in each
/// (event_type, user_title) series; gaps are not zero-filled. The first
/// observation, and any observation whose predecessor had zero events,
/// has no growth value.
fn apply_week_over_week_growth(rows: &mut [WeeklyPerformanceRow]) {
    let mut series: BTreeMap<(String, Option<String>), Vec<usize>> = BTreeMap::new();
    for (i, row) in rows.iter().enumerate() {
        series
            .entry((row.event_type.clone(), row.user_title.clone()))
            .or_default()
            .push(i);
    }

    for positions in series.values_mut() {
        positions.sort_by_key(|&i| rows[i].event_week);
        for pair in positions.windows(2) {
            let prev_count = rows[pair[0]].total_events;
            let current = pair[1];
            if prev_count > 0 {
                let growth = (rows[current].total_events as f64 - prev_count as f64) * 100.0
                    / prev_count as f64;
                rows[current].week_over_week_growth_pct = Some(round2(growth));
            }
        }
    }
}

fn monthly_rollup(facts: &[EventFact<'_>]) -> Vec<MonthlyPerformanceRow> {
    let groups = group_by(facts, |f| -> MonthlyKey<'_> {
        (f.month, f.event_type, f.user_title, f.user_segment)
    });
    groups
        .into_iter()
        .map(|((month, event_type, title, segment), accum)| {
            let avg_satisfaction = accum.avg_satisfaction();
            MonthlyPerformanceRow {
                event_month: month,
                event_type: event_type.to_string(),
                user_title: title.map(str::to_string),
                user_segment: segment,
                total_events: accum.total_events,
                unique_users: accum.users.len() as u64,
                unique_firms: accum.firms.len() as u64,
                total_documents_processed: accum.total_docs,
                avg_documents_per_event: accum.avg_docs_per_event(),
                avg_satisfaction_score: avg_satisfaction,
                high_satisfaction_events: accum.high_satisfaction,
                high_volume_events: accum.high_volume,
                satisfaction_rate_pct: accum.satisfaction_rate_pct(),
                high_volume_rate_pct: accum.high_volume_rate_pct(),
                events_per_user: accum.events_per_user(),
                documents_per_user: accum.docs_per_user(),
                satisfaction_performance: satisfaction_performance(avg_satisfaction),
                volume_performance: volume_performance(accum.total_events),
            }
        })
        .collect()
}

// ── Union ────────────────────────────────────────────────────────────────────

fn widen_daily(row: &DailyPerformanceRow) -> CombinedPerformanceRow {
    CombinedPerformanceRow {
        time_grain: Grain::Daily,
        time_period: row.event_date.to_string(),
        event_type: row.event_type.clone(),
        user_title: row.user_title.clone(),
        user_segment: row.user_segment,
        total_events: row.total_events,
        unique_users: row.unique_users,
        unique_firms: row.unique_firms,
        total_documents_processed: row.total_documents_processed,
        avg_documents_per_event: row.avg_documents_per_event,
        avg_satisfaction_score: row.avg_satisfaction_score,
        high_satisfaction_events: row.high_satisfaction_events,
        high_volume_events: row.high_volume_events,
        satisfaction_rate_pct: row.satisfaction_rate_pct,
        high_volume_rate_pct: row.high_volume_rate_pct,
        documents_per_user: row.documents_per_user,
        events_per_user: row.events_per_user,
        week_over_week_growth_pct: Some(Metric::NotApplicable),
        satisfaction_performance: None,
        volume_performance: None,
    }
}

fn widen_weekly(row: &WeeklyPerformanceRow) -> CombinedPerformanceRow {
    CombinedPerformanceRow {
        time_grain: Grain::Weekly,
        time_period: row.event_week.to_string(),
        event_type: row.event_type.clone(),
        user_title: row.user_title.clone(),
        user_segment: None,
        total_events: row.total_events,
        unique_users: row.unique_users,
        unique_firms: row.unique_firms,
        total_documents_processed: row.total_documents_processed,
        avg_documents_per_event: row.avg_documents_per_event,
        avg_satisfaction_score: row.avg_satisfaction_score,
        high_satisfaction_events: row.high_satisfaction_events,
        high_volume_events: row.high_volume_events,
        satisfaction_rate_pct: row.satisfaction_rate_pct,
        high_volume_rate_pct: row.high_volume_rate_pct,
        documents_per_user: Metric::NotApplicable,
        events_per_user: Metric::NotApplicable,
        week_over_week_growth_pct: row.week_over_week_growth_pct.map(Metric::Value),
        satisfaction_performance: None,
        volume_performance: None,
    }
}

fn widen_monthly(row: &MonthlyPerformanceRow) -> CombinedPerformanceRow {
    CombinedPerformanceRow {
        time_grain: Grain::Monthly,
        time_period: row.event_month.to_string(),
        event_type: row.event_type.clone(),
        user_title: row.user_title.clone(),
        user_segment: row.user_segment,
        total_events: row.total_events,
        unique_users: row.unique_users,
        unique_firms: row.unique_firms,
        total_documents_processed: row.total_documents_processed,
        avg_documents_per_event: row.avg_documents_per_event,
        avg_satisfaction_score: row.avg_satisfaction_score,
        high_satisfaction_events: row.high_satisfaction_events,
        high_volume_events: row.high_volume_events,
        satisfaction_rate_pct: row.satisfaction_rate_pct,
        high_volume_rate_pct: row.high_volume_rate_pct,
        documents_per_user: row.documents_per_user,
        events_per_user: row.events_per_user,
        week_over_week_growth_pct: Some(Metric::NotApplicable),
        satisfaction_performance: Some(row.satisfaction_performance),
        volume_performance: Some(row.volume_performance),
    }
}

/// Run the full multi-grain pass. Zero events yields zero rows at every
/// grain and an empty (but well-formed) combined table.
pub fn event_performance(data: &Dataset, config: &AnalyticsConfig) -> PerformanceTables {
    let facts = build_facts(data, config);

    let daily = daily_rollup(&facts);
    let weekly = weekly_rollup(&facts);
    let monthly = monthly_rollup(&facts);

    let mut combined =
        Vec::with_capacity(daily.len() + weekly.len() + monthly.len());
    combined.extend(daily.iter().map(widen_daily));
    combined.extend(weekly.iter().map(widen_weekly));
    combined.extend(monthly.iter().map(widen_monthly));

    log::debug!(
        "performance: {} daily, {} weekly, {} monthly, {} combined rows",
        daily.len(),
        weekly.len(),
        monthly.len(),
        combined.len(),
    );

    PerformanceTables {
        daily,
        weekly,
        monthly,
        combined,
    }
}
