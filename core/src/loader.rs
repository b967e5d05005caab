//! Data access layer: reads the three CSV snapshots, renames the raw
//! export headers to canonical names, and parses timestamps.
//!
//! RULE: only the loader touches files on the input side. Everything
//! downstream works against the in-memory `Dataset`.
//!
//! Structural problems (missing file, missing column, unparseable
//! timestamp) abort the load with a diagnostic naming the file, column,
//! and row. Value-level oddities (out-of-range feedback, negative doc
//! counts) pass through untouched; surfacing those is the quality
//! module's job.

use crate::dataset::Dataset;
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::model::{Event, Firm, User};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::path::Path;

pub const USERS_FILE: &str = "users.csv";
pub const FIRMS_FILE: &str = "firms.csv";
pub const EVENTS_FILE: &str = "events.csv";

/// Load all three tables from `data_dir` and build the indexed dataset.
pub fn load_dataset(data_dir: &Path) -> AnalyticsResult<Dataset> {
    let users = load_users(&data_dir.join(USERS_FILE))?;
    let firms = load_firms(&data_dir.join(FIRMS_FILE))?;
    let events = load_events(&data_dir.join(EVENTS_FILE))?;

    log::info!(
        "Loaded snapshot: {} users, {} firms, {} events",
        users.len(),
        firms.len(),
        events.len(),
    );

    Ok(Dataset::new(users, firms, events))
}

pub fn load_users(path: &Path) -> AnalyticsResult<Vec<User>> {
    let mut reader = open(path)?;
    let headers = headers(&mut reader, path)?;
    let id = column(&headers, "ID", path)?;
    let created = column(&headers, "CREATED", path)?;
    let title = column(&headers, "TITLE", path)?;

    let mut users = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|source| AnalyticsError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let row = i + 2; // 1-based, after the header line
        users.push(User {
            user_id: field(&record, id).to_string(),
            user_created_date: parse_timestamp(field(&record, created), path, "CREATED", row)?,
            user_title: field(&record, title).to_string(),
        });
    }
    Ok(users)
}

pub fn load_firms(path: &Path) -> AnalyticsResult<Vec<Firm>> {
    let mut reader = open(path)?;
    let headers = headers(&mut reader, path)?;
    let id = column(&headers, "ID", path)?;
    let created = column(&headers, "CREATED", path)?;
    let size = column(&headers, "FIRM_SIZE", path)?;
    let arr = column(&headers, "ARR_IN_THOUSANDS", path)?;

    let mut firms = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|source| AnalyticsError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let row = i + 2;
        firms.push(Firm {
            firm_id: field(&record, id).to_string(),
            firm_created_date: parse_timestamp(field(&record, created), path, "CREATED", row)?,
            firm_size: parse_i64(field(&record, size), path, "FIRM_SIZE", row)?,
            arr_in_thousands: parse_f64(field(&record, arr), path, "ARR_IN_THOUSANDS", row)?,
        });
    }
    Ok(firms)
}

pub fn load_events(path: &Path) -> AnalyticsResult<Vec<Event>> {
    let mut reader = open(path)?;
    let headers = headers(&mut reader, path)?;
    let created = column(&headers, "CREATED", path)?;
    let firm_id = column(&headers, "FIRM_ID", path)?;
    let user_id = column(&headers, "USER_ID", path)?;
    let event_type = column(&headers, "EVENT_TYPE", path)?;
    let num_docs = column(&headers, "NUM_DOCS", path)?;
    let feedback = column(&headers, "FEEDBACK_SCORE", path)?;

    let mut events = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|source| AnalyticsError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let row = i + 2;
        events.push(Event {
            // The snapshot carries no event id; row position is the id.
            event_id: i as u64,
            user_id: field(&record, user_id).to_string(),
            firm_id: field(&record, firm_id).to_string(),
            event_type: field(&record, event_type).to_string(),
            event_created_at: parse_timestamp(field(&record, created), path, "CREATED", row)?,
            num_docs: parse_i64(field(&record, num_docs), path, "NUM_DOCS", row)?,
            feedback_score: parse_optional_i64(field(&record, feedback), path, "FEEDBACK_SCORE", row)?,
        });
    }
    Ok(events)
}

// ── CSV plumbing ─────────────────────────────────────────────────────────────

fn open(path: &Path) -> AnalyticsResult<csv::Reader<std::fs::File>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| AnalyticsError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

fn headers(
    reader: &mut csv::Reader<std::fs::File>,
    path: &Path,
) -> AnalyticsResult<csv::StringRecord> {
    reader
        .headers()
        .map(Clone::clone)
        .map_err(|source| AnalyticsError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

fn column(headers: &csv::StringRecord, name: &str, path: &Path) -> AnalyticsResult<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| AnalyticsError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
}

fn field<'r>(record: &'r csv::StringRecord, index: usize) -> &'r str {
    record.get(index).unwrap_or("")
}

// ── Field parsing ────────────────────────────────────────────────────────────

/// Accepts the timestamp forms seen in the raw exports: date-time with a
/// space or a `T`, or a bare date (midnight).
fn parse_timestamp(
    value: &str,
    path: &Path,
    column: &str,
    row: usize,
) -> AnalyticsResult<NaiveDateTime> {
    if let Ok(ts) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(ts);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(ts);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%m/%d/%Y") {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    Err(AnalyticsError::BadTimestamp {
        path: path.to_path_buf(),
        column: column.to_string(),
        row,
        value: value.to_string(),
    })
}

fn parse_i64(value: &str, path: &Path, column: &str, row: usize) -> AnalyticsResult<i64> {
    if let Ok(v) = value.parse::<i64>() {
        return Ok(v);
    }
    // Some exports carry integers as "12.0".
    if let Ok(v) = value.parse::<f64>() {
        if v.fract() == 0.0 {
            return Ok(v as i64);
        }
    }
    Err(AnalyticsError::BadNumber {
        path: path.to_path_buf(),
        column: column.to_string(),
        row,
        value: value.to_string(),
    })
}

fn parse_f64(value: &str, path: &Path, column: &str, row: usize) -> AnalyticsResult<f64> {
    value
        .parse::<f64>()
        .map_err(|_| AnalyticsError::BadNumber {
            path: path.to_path_buf(),
            column: column.to_string(),
            row,
            value: value.to_string(),
        })
}

/// Empty cells (and spreadsheet NaN spellings) are missing feedback, a
/// counted condition, not an error.
fn parse_optional_i64(
    value: &str,
    path: &Path,
    column: &str,
    row: usize,
) -> AnalyticsResult<Option<i64>> {
    if value.is_empty() || value.eq_ignore_ascii_case("nan") || value.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    parse_i64(value, path, column, row).map(Some)
}
