//! Flat-file export of the derived tables.
//!
//! Headers are written explicitly so an empty table still produces a
//! well-formed, header-only file.

use crate::acquisition::{AcquisitionBaseRow, AcquisitionSummaryRow};
use crate::cohort::CohortRow;
use crate::engagement::EngagementRow;
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::performance::CombinedPerformanceRow;
use crate::quality::QualityReport;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

pub const ENGAGEMENT_CSV: &str = "user_engagement_model.csv";
pub const COHORT_CSV: &str = "cohort_analysis_base_model.csv";
pub const ACQUISITION_BASE_CSV: &str = "user_acquisition_base_model.csv";
pub const ACQUISITION_SUMMARY_CSV: &str = "user_acquisition_metrics_summary.csv";
pub const PERFORMANCE_CSV: &str = "event_performance_metrics_combined.csv";
pub const QUALITY_JSON: &str = "data_quality_report.json";

pub fn write_engagement(out_dir: &Path, rows: &[EngagementRow]) -> AnalyticsResult<()> {
    write_table(
        &out_dir.join(ENGAGEMENT_CSV),
        &[
            "user_id",
            "firm_id",
            "user_title",
            "month",
            "query_count",
            "active_days",
            "total_documents_processed",
            "avg_feedback_score",
            "engagement_level",
        ],
        rows,
    )
}

pub fn write_cohort(out_dir: &Path, rows: &[CohortRow]) -> AnalyticsResult<()> {
    write_table(
        &out_dir.join(COHORT_CSV),
        &[
            "user_id",
            "cohort_month",
            "user_title",
            "months_since_signup",
            "is_retained",
            "events_count",
            "active_days",
        ],
        rows,
    )
}

pub fn write_acquisition_base(out_dir: &Path, rows: &[AcquisitionBaseRow]) -> AnalyticsResult<()> {
    write_table(
        &out_dir.join(ACQUISITION_BASE_CSV),
        &[
            "user_id",
            "user_title",
            "user_created_date",
            "firm_id",
            "firm_size",
            "arr_in_thousands",
            "acquisition_month",
            "first_activity_date",
            "days_to_first_activity",
            "total_events",
            "active_days",
            "avg_satisfaction_score",
            "total_documents_processed",
            "is_activated",
            "is_quick_start",
            "is_monthly_activated",
            "firm_size_category",
            "arr_category",
            "activation_category",
            "satisfaction_category",
        ],
        rows,
    )
}

pub fn write_acquisition_summary(
    out_dir: &Path,
    rows: &[AcquisitionSummaryRow],
) -> AnalyticsResult<()> {
    write_table(
        &out_dir.join(ACQUISITION_SUMMARY_CSV),
        &[
            "acquisition_month",
            "user_title",
            "users",
            "activated",
            "quick_start",
            "avg_events_per_user",
            "avg_satisfaction_score",
            "activation_rate_pct",
            "quick_start_rate_pct",
        ],
        rows,
    )
}

pub fn write_performance(out_dir: &Path, rows: &[CombinedPerformanceRow]) -> AnalyticsResult<()> {
    write_table(
        &out_dir.join(PERFORMANCE_CSV),
        &[
            "time_grain",
            "time_period",
            "event_type",
            "user_title",
            "user_segment",
            "total_events",
            "unique_users",
            "unique_firms",
            "total_documents_processed",
            "avg_documents_per_event",
            "avg_satisfaction_score",
            "high_satisfaction_events",
            "high_volume_events",
            "satisfaction_rate_pct",
            "high_volume_rate_pct",
            "documents_per_user",
            "events_per_user",
            "week_over_week_growth_pct",
            "satisfaction_performance",
            "volume_performance",
        ],
        rows,
    )
}

pub fn write_quality(out_dir: &Path, report: &QualityReport) -> AnalyticsResult<()> {
    let path = out_dir.join(QUALITY_JSON);
    let file = File::create(&path).map_err(|source| AnalyticsError::Io {
        path: path.clone(),
        source,
    })?;
    serde_json::to_writer_pretty(file, report)?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

fn write_table<T: Serialize>(path: &Path, headers: &[&str], rows: &[T]) -> AnalyticsResult<()> {
    let csv_err = |source: csv::Error| AnalyticsError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_err)?;

    writer.write_record(headers).map_err(csv_err)?;
    for row in rows {
        writer.serialize(row).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| AnalyticsError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    log::info!("Wrote {} ({} rows)", path.display(), rows.len());
    Ok(())
}
