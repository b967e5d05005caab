use chrono::{NaiveDate, NaiveDateTime};
use lexmetrics_core::config::AnalyticsConfig;
use lexmetrics_core::dataset::Dataset;
use lexmetrics_core::model::{Event, Firm, User};
use lexmetrics_core::performance::event_performance;
use lexmetrics_core::types::{Grain, Metric};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn dt(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

fn user(id: &str, created: NaiveDateTime, title: &str) -> User {
    User {
        user_id: id.into(),
        user_created_date: created,
        user_title: title.into(),
    }
}

fn firm(id: &str, size: i64, arr: f64) -> Firm {
    Firm {
        firm_id: id.into(),
        firm_created_date: dt(2024, 1, 1, 0),
        firm_size: size,
        arr_in_thousands: arr,
    }
}

fn event(
    id: u64,
    user_id: &str,
    firm_id: &str,
    event_type: &str,
    at: NaiveDateTime,
    docs: i64,
    feedback: Option<i64>,
) -> Event {
    Event {
        event_id: id,
        user_id: user_id.into(),
        firm_id: firm_id.into(),
        event_type: event_type.into(),
        event_created_at: at,
        num_docs: docs,
        feedback_score: feedback,
    }
}

fn small_dataset() -> Dataset {
    let users = vec![
        user("u1", dt(2025, 1, 1, 0), "Associate"),
        user("u2", dt(2025, 1, 1, 0), "Partner"),
    ];
    let firms = vec![firm("f1", 150, 250.0), firm("f2", 600, 900.0)];
    let events = vec![
        event(0, "u1", "f1", "ASSISTANT", dt(2025, 1, 6, 9), 12, Some(5)),
        event(1, "u1", "f1", "ASSISTANT", dt(2025, 1, 6, 14), 3, Some(3)),
        event(2, "u2", "f2", "VAULT", dt(2025, 1, 6, 10), 8, None),
        event(3, "u1", "f1", "ASSISTANT", dt(2025, 1, 7, 9), 20, Some(4)),
        event(4, "u2", "f2", "VAULT", dt(2025, 2, 3, 9), 1, Some(2)),
    ];
    Dataset::new(users, firms, events)
}

// ── Count preservation ───────────────────────────────────────────────────────

/// Summing per-group event counts across all groups of one grain gives
/// back the total input event count, for every grain.
#[test]
fn per_grain_counts_sum_to_total() {
    let data = small_dataset();
    let perf = event_performance(&data, &AnalyticsConfig::default());
    let total = data.events().len() as u64;

    let daily: u64 = perf.daily.iter().map(|r| r.total_events).sum();
    let weekly: u64 = perf.weekly.iter().map(|r| r.total_events).sum();
    let monthly: u64 = perf.monthly.iter().map(|r| r.total_events).sum();

    assert_eq!(daily, total);
    assert_eq!(weekly, total);
    assert_eq!(monthly, total);
}

// ── Grain column discipline ──────────────────────────────────────────────────

/// Per-user ratios exist for daily and monthly rows; weekly rows carry
/// the explicit not-applicable sentinel instead. The growth column is
/// the weekly grain's alone.
#[test]
fn combined_table_per_grain_columns() {
    let data = small_dataset();
    let perf = event_performance(&data, &AnalyticsConfig::default());
    assert!(!perf.combined.is_empty());

    for row in &perf.combined {
        match row.time_grain {
            Grain::Daily => {
                assert!(row.documents_per_user.value().is_some());
                assert!(row.events_per_user.value().is_some());
                assert_eq!(row.week_over_week_growth_pct, Some(Metric::NotApplicable));
                assert!(row.satisfaction_performance.is_none());
                assert!(row.volume_performance.is_none());
            }
            Grain::Weekly => {
                assert!(row.documents_per_user.is_na());
                assert!(row.events_per_user.is_na());
                assert!(row.user_segment.is_none());
                assert_ne!(row.week_over_week_growth_pct, Some(Metric::NotApplicable));
            }
            Grain::Monthly => {
                assert!(row.documents_per_user.value().is_some());
                assert!(row.events_per_user.value().is_some());
                assert_eq!(row.week_over_week_growth_pct, Some(Metric::NotApplicable));
                assert!(row.satisfaction_performance.is_some());
                assert!(row.volume_performance.is_some());
            }
        }
    }
}

/// Combined rows are ordered daily → weekly → monthly.
#[test]
fn combined_table_grain_order() {
    let data = small_dataset();
    let perf = event_performance(&data, &AnalyticsConfig::default());

    let grains: Vec<Grain> = perf.combined.iter().map(|r| r.time_grain).collect();
    let mut sorted = grains.clone();
    sorted.sort();
    assert_eq!(grains, sorted);
    assert_eq!(
        perf.combined.len(),
        perf.daily.len() + perf.weekly.len() + perf.monthly.len()
    );
}

// ── Week-over-week growth ────────────────────────────────────────────────────

/// 10 events one week, 15 the next: +50%. The first observation of a
/// series has no growth value.
#[test]
fn week_over_week_growth_against_previous_observed_week() {
    let users = vec![user("u1", dt(2025, 1, 1, 0), "Associate")];
    let firms = vec![firm("f1", 150, 250.0)];
    let mut events = Vec::new();
    // ISO week 2025-W02: 10 events.
    for i in 0..10 {
        events.push(event(i, "u1", "f1", "ASSISTANT", dt(2025, 1, 6, i as u32), 1, None));
    }
    // ISO week 2025-W03: 15 events.
    for i in 0..15 {
        events.push(event(10 + i, "u1", "f1", "ASSISTANT", dt(2025, 1, 13, i as u32), 1, None));
    }
    // Gap, then ISO week 2025-W05: 30 events. Growth compares against
    // W03, the previous observed week; gaps are not zero-filled.
    for i in 0..23 {
        events.push(event(25 + i, "u1", "f1", "ASSISTANT", dt(2025, 1, 27, i as u32), 1, None));
    }
    for i in 0..7 {
        events.push(event(48 + i, "u1", "f1", "ASSISTANT", dt(2025, 1, 28, i as u32), 1, None));
    }

    let data = Dataset::new(users, firms, events);
    let perf = event_performance(&data, &AnalyticsConfig::default());

    assert_eq!(perf.weekly.len(), 3);
    assert_eq!(perf.weekly[0].total_events, 10);
    assert_eq!(perf.weekly[0].week_over_week_growth_pct, None);
    assert_eq!(perf.weekly[1].total_events, 15);
    assert_eq!(perf.weekly[1].week_over_week_growth_pct, Some(50.0));
    assert_eq!(perf.weekly[2].total_events, 30);
    assert_eq!(perf.weekly[2].week_over_week_growth_pct, Some(100.0));
}

/// Growth series are keyed by (event_type, user_title); a different
/// event type in between does not feed another series' growth.
#[test]
fn growth_series_are_independent() {
    let users = vec![user("u1", dt(2025, 1, 1, 0), "Associate")];
    let firms = vec![firm("f1", 150, 250.0)];
    let events = vec![
        event(0, "u1", "f1", "ASSISTANT", dt(2025, 1, 6, 9), 1, None),
        event(1, "u1", "f1", "VAULT", dt(2025, 1, 13, 9), 1, None),
        event(2, "u1", "f1", "VAULT", dt(2025, 1, 13, 10), 1, None),
    ];

    let data = Dataset::new(users, firms, events);
    let perf = event_performance(&data, &AnalyticsConfig::default());

    for row in &perf.weekly {
        assert_eq!(
            row.week_over_week_growth_pct, None,
            "single-week series must not have growth: {} {:?}",
            row.event_type, row.event_week
        );
    }
}

// ── Empty input ──────────────────────────────────────────────────────────────

/// Zero events is not an error: zero groups per grain and an empty,
/// well-formed combined table.
#[test]
fn empty_event_set_yields_zero_rows() {
    let data = Dataset::new(
        vec![user("u1", dt(2025, 1, 1, 0), "Associate")],
        vec![firm("f1", 150, 250.0)],
        Vec::new(),
    );
    let perf = event_performance(&data, &AnalyticsConfig::default());

    assert!(perf.daily.is_empty());
    assert!(perf.weekly.is_empty());
    assert!(perf.monthly.is_empty());
    assert!(perf.combined.is_empty());
}

// ── Missing references ───────────────────────────────────────────────────────

/// An event whose user_id matches nothing still aggregates, with
/// absent user attributes, never a fault.
#[test]
fn dangling_user_reference_is_tolerated() {
    let data = Dataset::new(
        vec![user("u1", dt(2025, 1, 1, 0), "Associate")],
        vec![firm("f1", 150, 250.0)],
        vec![
            event(0, "u1", "f1", "ASSISTANT", dt(2025, 1, 6, 9), 5, Some(4)),
            event(1, "ghost", "f9", "ASSISTANT", dt(2025, 1, 6, 9), 5, Some(4)),
        ],
    );
    let perf = event_performance(&data, &AnalyticsConfig::default());

    let total: u64 = perf.daily.iter().map(|r| r.total_events).sum();
    assert_eq!(total, 2);

    let ghost_row = perf
        .daily
        .iter()
        .find(|r| r.user_title.is_none())
        .expect("dangling-user group present");
    assert!(ghost_row.user_segment.is_none());
    assert_eq!(ghost_row.total_events, 1);
}

// ── Aggregate arithmetic ─────────────────────────────────────────────────────

#[test]
fn group_aggregates_and_rates() {
    let data = small_dataset();
    let config = AnalyticsConfig::default();
    let perf = event_performance(&data, &config);

    // Monthly 2025-01 ASSISTANT/Associate/NewUser: events 0, 1, 3.
    let row = perf
        .monthly
        .iter()
        .find(|r| r.event_type == "ASSISTANT" && r.event_month.month == 1)
        .expect("assistant january row");
    assert_eq!(row.total_events, 3);
    assert_eq!(row.unique_users, 1);
    assert_eq!(row.unique_firms, 1);
    assert_eq!(row.total_documents_processed, 35);
    assert_eq!(row.avg_satisfaction_score, Some(4.0));
    // Scores 5 and 4 clear the high-satisfaction bar; 3 does not.
    assert_eq!(row.high_satisfaction_events, 2);
    assert_eq!(row.satisfaction_rate_pct, 66.67);
    // Docs 12 and 20 clear the high-volume bar; 3 does not.
    assert_eq!(row.high_volume_events, 2);
    assert_eq!(row.high_volume_rate_pct, 66.67);
    assert_eq!(row.events_per_user, Metric::Value(3.0));
    assert_eq!(row.documents_per_user, Metric::Value(35.0));
}

/// A group whose only events carry no feedback has an absent average,
/// not zero.
#[test]
fn group_without_feedback_has_absent_average() {
    let data = small_dataset();
    let perf = event_performance(&data, &AnalyticsConfig::default());

    let row = perf
        .monthly
        .iter()
        .find(|r| r.event_type == "VAULT" && r.event_month.month == 1)
        .expect("vault january row");
    assert_eq!(row.avg_satisfaction_score, None);
    assert_eq!(row.high_satisfaction_events, 0);
    assert_eq!(row.satisfaction_rate_pct, 0.0);
}
