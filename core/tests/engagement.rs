use chrono::{NaiveDate, NaiveDateTime};
use lexmetrics_core::classify::EngagementLevel;
use lexmetrics_core::dataset::Dataset;
use lexmetrics_core::engagement::{engagement_level_distribution, monthly_engagement};
use lexmetrics_core::model::{Event, Firm, User};

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

fn event(
    id: u64,
    user_id: &str,
    firm_id: &str,
    at: NaiveDateTime,
    docs: i64,
    feedback: Option<i64>,
) -> Event {
    Event {
        event_id: id,
        user_id: user_id.into(),
        firm_id: firm_id.into(),
        event_type: "ASSISTANT".into(),
        event_created_at: at,
        num_docs: docs,
        feedback_score: feedback,
    }
}

fn dataset(users: Vec<User>, events: Vec<Event>) -> Dataset {
    Dataset::new(users, Vec::<Firm>::new(), events)
}

// ── Grouping ─────────────────────────────────────────────────────────────────

/// One row per (user, month); a user active in two months gets two rows,
/// and a user with no events gets none.
#[test]
fn one_row_per_user_month() {
    let data = dataset(
        vec![
            user("u1", dt(2025, 1, 1, 0), "Associate"),
            user("u2", dt(2025, 1, 1, 0), "Partner"),
            user("idle", dt(2025, 1, 1, 0), "Paralegal"),
        ],
        vec![
            event(0, "u1", "f1", dt(2025, 1, 10, 9), 2, None),
            event(1, "u1", "f1", dt(2025, 2, 10, 9), 2, None),
            event(2, "u2", "f2", dt(2025, 1, 12, 9), 2, None),
        ],
    );

    let rows = monthly_engagement(&data);
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.user_id != "idle"));

    let u1_months: Vec<u32> = rows
        .iter()
        .filter(|r| r.user_id == "u1")
        .map(|r| r.month.month)
        .collect();
    assert_eq!(u1_months, vec![1, 2]);
}

/// Two events on the same calendar day count once toward active days but
/// twice toward the query count.
#[test]
fn active_days_deduplicate_within_a_day() {
    let data = dataset(
        vec![user("u1", dt(2025, 1, 1, 0), "Associate")],
        vec![
            event(0, "u1", "f1", dt(2025, 1, 10, 9), 3, Some(4)),
            event(1, "u1", "f1", dt(2025, 1, 10, 17), 5, Some(5)),
            event(2, "u1", "f1", dt(2025, 1, 11, 9), 1, None),
        ],
    );

    let rows = monthly_engagement(&data);
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.query_count, 3);
    assert_eq!(row.active_days, 2);
    assert_eq!(row.total_documents_processed, 9);
    // Mean of the two present scores; the missing one is not a zero.
    assert_eq!(row.avg_feedback_score, Some(4.5));
    assert_eq!(row.engagement_level, EngagementLevel::OccasionalUser);
}

// ── Firm attribution ─────────────────────────────────────────────────────────

/// The month's firm comes from the earliest event, independent of input
/// order, tie-broken by event id.
#[test]
fn firm_attribution_is_earliest_event() {
    let data = dataset(
        vec![user("u1", dt(2025, 1, 1, 0), "Associate")],
        vec![
            // Deliberately out of chronological order.
            event(5, "u1", "late-firm", dt(2025, 1, 20, 9), 1, None),
            event(3, "u1", "early-firm", dt(2025, 1, 2, 9), 1, None),
            event(4, "u1", "mid-firm", dt(2025, 1, 10, 9), 1, None),
        ],
    );

    let rows = monthly_engagement(&data);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].firm_id, "early-firm");
}

#[test]
fn firm_attribution_tie_breaks_on_event_id() {
    let same_instant = dt(2025, 1, 2, 9);
    let data = dataset(
        vec![user("u1", dt(2025, 1, 1, 0), "Associate")],
        vec![
            event(9, "u1", "firm-b", same_instant, 1, None),
            event(2, "u1", "firm-a", same_instant, 1, None),
        ],
    );

    let rows = monthly_engagement(&data);
    assert_eq!(rows[0].firm_id, "firm-a");
}

/// Events referencing an unknown user still produce a row; only the
/// title lookup comes up empty.
#[test]
fn unknown_user_reference_keeps_the_row() {
    let data = dataset(
        Vec::new(),
        vec![event(0, "ghost", "f1", dt(2025, 1, 10, 9), 1, None)],
    );

    let rows = monthly_engagement(&data);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, "ghost");
    assert_eq!(rows[0].user_title, None);
}

// ── Tier distribution ────────────────────────────────────────────────────────

#[test]
fn distribution_orders_highest_tier_first() {
    let mut events = Vec::new();
    // u1: 60 queries over 15 days in January, a PowerUser.
    for day in 1..=15 {
        for hour in 9..13 {
            events.push(event(
                events.len() as u64,
                "u1",
                "f1",
                dt(2025, 1, day, hour),
                1,
                Some(5),
            ));
        }
    }
    // u2: a single event, an OccasionalUser.
    events.push(event(100, "u2", "f1", dt(2025, 1, 5, 9), 1, None));

    let data = dataset(
        vec![
            user("u1", dt(2024, 1, 1, 0), "Associate"),
            user("u2", dt(2024, 1, 1, 0), "Partner"),
        ],
        events,
    );

    let rows = monthly_engagement(&data);
    let distribution = engagement_level_distribution(&rows);

    assert_eq!(distribution.len(), 2);
    assert_eq!(distribution[0].engagement_level, EngagementLevel::PowerUser);
    assert_eq!(distribution[0].records, 1);
    assert_eq!(distribution[0].share_pct, 50.0);
    assert_eq!(distribution[0].avg_query_count, 60.0);
    assert_eq!(
        distribution[1].engagement_level,
        EngagementLevel::OccasionalUser
    );
    assert_eq!(distribution[1].avg_feedback_score, None);
}

#[test]
fn distribution_of_nothing_is_empty() {
    assert!(engagement_level_distribution(&[]).is_empty());
}
