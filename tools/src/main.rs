//! report-runner: headless analytics runner for LexMetrics.
//!
//! Usage:
//!   report-runner --data-dir ./data --out-dir ./reports
//!   report-runner --data-dir ./data --config analytics.json --skip-export

use anyhow::Result;
use lexmetrics_core::{
    acquisition, cohort, config::AnalyticsConfig, engagement, export, loader, performance,
    quality,
};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let data_dir = parse_path(&args, "--data-dir", "./data");
    let out_dir = parse_path(&args, "--out-dir", "./reports");
    let config_path = args
        .windows(2)
        .find(|w| w[0] == "--config")
        .map(|w| PathBuf::from(&w[1]));
    let skip_export = args.iter().any(|a| a == "--skip-export");

    const KNOWN_FLAGS: [&str; 4] = ["--data-dir", "--out-dir", "--config", "--skip-export"];
    for arg in args.iter().skip(1) {
        if arg.starts_with("--") && !KNOWN_FLAGS.contains(&arg.as_str()) {
            log::warn!("Unknown flag: {arg}");
        }
    }

    let config = match &config_path {
        Some(path) => AnalyticsConfig::load(path)?,
        None => AnalyticsConfig::default(),
    };

    println!("LexMetrics report-runner");
    println!("  data_dir: {}", data_dir.display());
    println!("  out_dir:  {}", out_dir.display());
    println!();

    let data = loader::load_dataset(&data_dir)?;
    println!("Loaded snapshot:");
    println!("  users:  {}", data.users().len());
    println!("  firms:  {}", data.firms().len());
    println!("  events: {}", data.events().len());

    // Run every model over the immutable snapshot.
    let engagement_rows = engagement::monthly_engagement(&data);
    let cohort_rows = cohort::cohort_base(&data, &config);
    let cohort_rollup = cohort::cohort_summary(&cohort_rows);
    let acquisition_rows = acquisition::acquisition_base(&data);
    let acquisition_rollup = acquisition::acquisition_summary(&acquisition_rows);
    let perf = performance::event_performance(&data, &config);
    let quality_report = quality::analyze(&data, &config);

    print_engagement(&engagement_rows);
    print_cohorts(&cohort_rollup);
    print_acquisition(&acquisition_rollup, &acquisition_rows);
    print_performance(&perf);
    print_quality(&quality_report);

    if !skip_export {
        std::fs::create_dir_all(&out_dir)?;
        export::write_engagement(&out_dir, &engagement_rows)?;
        export::write_cohort(&out_dir, &cohort_rows)?;
        export::write_acquisition_base(&out_dir, &acquisition_rows)?;
        export::write_acquisition_summary(&out_dir, &acquisition_rollup)?;
        export::write_performance(&out_dir, &perf.combined)?;
        export::write_quality(&out_dir, &quality_report)?;
        println!();
        println!("Reports written to {}", out_dir.display());
    }

    Ok(())
}

fn print_engagement(rows: &[engagement::EngagementRow]) {
    println!();
    println!("=== USER ENGAGEMENT ===");
    println!("  user-month records: {}", rows.len());

    for summary in engagement::engagement_level_distribution(rows) {
        println!(
            "  {:<16} {:>5} ({:>5.1}%) | avg queries {:>6.1} | avg active days {:>4.1}",
            summary.engagement_level.to_string(),
            summary.records,
            summary.share_pct,
            summary.avg_query_count,
            summary.avg_active_days,
        );
    }
}

fn print_cohorts(rollup: &[cohort::CohortSummaryRow]) {
    println!();
    println!("=== COHORT RETENTION ===");
    let mut current_cohort = None;
    for row in rollup {
        if current_cohort != Some(row.cohort_month) {
            current_cohort = Some(row.cohort_month);
            println!("  cohort {}", row.cohort_month);
        }
        println!(
            "    month {}: {:>5.1}% retained ({}/{} users)",
            row.months_since_signup, row.retention_rate_pct, row.retained, row.users,
        );
    }
}

fn print_acquisition(
    rollup: &[acquisition::AcquisitionSummaryRow],
    base: &[acquisition::AcquisitionBaseRow],
) {
    println!();
    println!("=== USER ACQUISITION ===");
    for row in rollup {
        println!(
            "  {} {:<24} {:>5.1}% activated, {:>5.1}% quick start ({} users)",
            row.acquisition_month,
            row.user_title,
            row.activation_rate_pct,
            row.quick_start_rate_pct,
            row.users,
        );
    }

    let mut activation: BTreeMap<&str, u64> = BTreeMap::new();
    let mut satisfaction: BTreeMap<&str, u64> = BTreeMap::new();
    for row in base {
        *activation.entry(row.activation_category.as_str()).or_default() += 1;
        *satisfaction
            .entry(row.satisfaction_category.as_str())
            .or_default() += 1;
    }

    let total = base.len().max(1) as f64;
    println!();
    println!("  Activation categories:");
    for (category, count) in &activation {
        println!(
            "    {:<22} {:>5} ({:>5.1}%)",
            category,
            count,
            *count as f64 / total * 100.0,
        );
    }
    println!("  Satisfaction categories:");
    for (category, count) in &satisfaction {
        println!(
            "    {:<22} {:>5} ({:>5.1}%)",
            category,
            count,
            *count as f64 / total * 100.0,
        );
    }
}

fn print_performance(perf: &performance::PerformanceTables) {
    println!();
    println!("=== EVENT PERFORMANCE ===");
    println!("  daily rows:    {}", perf.daily.len());
    println!("  weekly rows:   {}", perf.weekly.len());
    println!("  monthly rows:  {}", perf.monthly.len());
    println!("  combined rows: {}", perf.combined.len());

    // Top 5 days by event volume.
    let mut by_day: BTreeMap<chrono::NaiveDate, u64> = BTreeMap::new();
    for row in &perf.daily {
        *by_day.entry(row.event_date).or_default() += row.total_events;
    }
    let mut days: Vec<(chrono::NaiveDate, u64)> = by_day.into_iter().collect();
    days.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    if !days.is_empty() {
        println!("  Top days by volume:");
        for (date, events) in days.iter().take(5) {
            println!("    {date}: {events} events");
        }
    }
}

fn print_quality(report: &quality::QualityReport) {
    println!();
    println!("=== DATA QUALITY ===");
    println!("  Completeness:");
    println!(
        "    missing feedback:   {}",
        report.completeness.missing_feedback_scores
    );
    println!(
        "    blank user titles:  {}",
        report.completeness.blank_user_titles
    );
    println!("  Consistency:");
    println!(
        "    out-of-range feedback: {}",
        report.consistency.out_of_range_feedback
    );
    println!(
        "    zero/negative docs:    {}",
        report.consistency.zero_doc_events + report.consistency.negative_doc_events
    );
    println!(
        "    events before signup:  {}",
        report.consistency.events_before_user_creation
    );
    println!("  Business logic:");
    println!("    zero-ARR firms:  {}", report.business_logic.zero_arr_firms);
    println!("    zero-size firms: {}", report.business_logic.zero_size_firms);
    println!(
        "    future-dated:    {} users, {} firms, {} events",
        report.business_logic.future_dated_users,
        report.business_logic.future_dated_firms,
        report.business_logic.future_dated_events,
    );
    println!("  Anomalies:");
    println!(
        "    orphaned users:     {}",
        report.anomalies.orphaned_users.len()
    );
    println!(
        "    dangling refs:      {} users, {} firms",
        report.anomalies.dangling_user_refs, report.anomalies.dangling_firm_refs,
    );
    println!(
        "    extreme doc counts: {} (> {:.0})",
        report.anomalies.extreme_doc_events, report.anomalies.extreme_doc_upper_bound,
    );
    println!();
    println!("  Overall quality score: {:.1}%", report.quality_score_pct);
}

fn parse_path(args: &[String], flag: &str, default: &str) -> PathBuf {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| PathBuf::from(&w[1]))
        .unwrap_or_else(|| Path::new(default).to_path_buf())
}
