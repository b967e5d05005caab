//! Derivation engine: pure threshold classifications.
//!
//! Every function here is total over its domain and stateless. Boundary
//! comparisons are closed on the lower bound (`>=` / `<=` exactly as
//! listed), which matters at the boundaries: a firm of size 100 is
//! Medium, not Small.

use crate::types::round2;
use serde::{Deserialize, Serialize};
use std::fmt;

// ── User segment (tenure at event time) ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UserSegment {
    #[serde(rename = "New User")]
    NewUser,
    #[serde(rename = "Recent User")]
    RecentUser,
    #[serde(rename = "Established User")]
    EstablishedUser,
    #[serde(rename = "Long-term User")]
    LongTermUser,
}

impl UserSegment {
    pub fn as_str(self) -> &'static str {
        match self {
            UserSegment::NewUser => "New User",
            UserSegment::RecentUser => "Recent User",
            UserSegment::EstablishedUser => "Established User",
            UserSegment::LongTermUser => "Long-term User",
        }
    }
}

impl fmt::Display for UserSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Days between an event and the user's creation. Negative values are
/// valid outputs here (event before signup); the quality analysis counts
/// them separately.
pub fn tenure_days(event_at: chrono::NaiveDateTime, user_created: chrono::NaiveDateTime) -> i64 {
    (event_at - user_created).num_days()
}

/// Tenure ladder at 7/30/90 days. Negative tenure intentionally falls
/// through the same ladder and thus lands in NewUser; it is not
/// special-cased here.
pub fn user_segment(tenure_days: i64) -> UserSegment {
    if tenure_days <= 7 {
        UserSegment::NewUser
    } else if tenure_days <= 30 {
        UserSegment::RecentUser
    } else if tenure_days <= 90 {
        UserSegment::EstablishedUser
    } else {
        UserSegment::LongTermUser
    }
}

// ── Activation ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationCategory {
    #[serde(rename = "Not Activated")]
    NotActivated,
    #[serde(rename = "Immediate Activation")]
    ImmediateActivation,
    #[serde(rename = "Quick Activation")]
    QuickActivation,
    #[serde(rename = "Standard Activation")]
    StandardActivation,
    #[serde(rename = "Delayed Activation")]
    DelayedActivation,
}

impl ActivationCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivationCategory::NotActivated => "Not Activated",
            ActivationCategory::ImmediateActivation => "Immediate Activation",
            ActivationCategory::QuickActivation => "Quick Activation",
            ActivationCategory::StandardActivation => "Standard Activation",
            ActivationCategory::DelayedActivation => "Delayed Activation",
        }
    }
}

impl fmt::Display for ActivationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latency ladder at 1/7/30 days; absent latency means the user never
/// produced an event.
pub fn activation_category(days_to_first_activity: Option<i64>) -> ActivationCategory {
    match days_to_first_activity {
        None => ActivationCategory::NotActivated,
        Some(days) if days <= 1 => ActivationCategory::ImmediateActivation,
        Some(days) if days <= 7 => ActivationCategory::QuickActivation,
        Some(days) if days <= 30 => ActivationCategory::StandardActivation,
        Some(_) => ActivationCategory::DelayedActivation,
    }
}

// ── Satisfaction ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SatisfactionCategory {
    #[serde(rename = "No Feedback")]
    NoFeedback,
    #[serde(rename = "Low Satisfaction")]
    LowSatisfaction,
    #[serde(rename = "Fair Satisfaction")]
    FairSatisfaction,
    #[serde(rename = "Good Satisfaction")]
    GoodSatisfaction,
    #[serde(rename = "High Satisfaction")]
    HighSatisfaction,
}

impl SatisfactionCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            SatisfactionCategory::NoFeedback => "No Feedback",
            SatisfactionCategory::LowSatisfaction => "Low Satisfaction",
            SatisfactionCategory::FairSatisfaction => "Fair Satisfaction",
            SatisfactionCategory::GoodSatisfaction => "Good Satisfaction",
            SatisfactionCategory::HighSatisfaction => "High Satisfaction",
        }
    }
}

impl fmt::Display for SatisfactionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn satisfaction_category(avg_feedback: Option<f64>) -> SatisfactionCategory {
    match avg_feedback {
        None => SatisfactionCategory::NoFeedback,
        Some(avg) if avg >= 4.5 => SatisfactionCategory::HighSatisfaction,
        Some(avg) if avg >= 4.0 => SatisfactionCategory::GoodSatisfaction,
        Some(avg) if avg >= 3.5 => SatisfactionCategory::FairSatisfaction,
        Some(_) => SatisfactionCategory::LowSatisfaction,
    }
}

// ── Firm size / ARR ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FirmSizeCategory {
    Unknown,
    Small,
    Medium,
    Large,
    Enterprise,
}

impl FirmSizeCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            FirmSizeCategory::Unknown => "Unknown",
            FirmSizeCategory::Small => "Small",
            FirmSizeCategory::Medium => "Medium",
            FirmSizeCategory::Large => "Large",
            FirmSizeCategory::Enterprise => "Enterprise",
        }
    }
}

impl fmt::Display for FirmSizeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Headcount ladder at 100/200/500; absent when the firm reference is
/// unresolved.
pub fn firm_size_category(firm_size: Option<i64>) -> FirmSizeCategory {
    match firm_size {
        None => FirmSizeCategory::Unknown,
        Some(size) if size >= 500 => FirmSizeCategory::Enterprise,
        Some(size) if size >= 200 => FirmSizeCategory::Large,
        Some(size) if size >= 100 => FirmSizeCategory::Medium,
        Some(_) => FirmSizeCategory::Small,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArrCategory {
    Unknown,
    #[serde(rename = "Minimal Value")]
    MinimalValue,
    #[serde(rename = "Low Value")]
    LowValue,
    #[serde(rename = "Medium Value")]
    MediumValue,
    #[serde(rename = "High Value")]
    HighValue,
}

impl ArrCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ArrCategory::Unknown => "Unknown",
            ArrCategory::MinimalValue => "Minimal Value",
            ArrCategory::LowValue => "Low Value",
            ArrCategory::MediumValue => "Medium Value",
            ArrCategory::HighValue => "High Value",
        }
    }
}

impl fmt::Display for ArrCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ARR ladder at 100/200/500 (thousands).
pub fn arr_category(arr_in_thousands: Option<f64>) -> ArrCategory {
    match arr_in_thousands {
        None => ArrCategory::Unknown,
        Some(arr) if arr >= 500.0 => ArrCategory::HighValue,
        Some(arr) if arr >= 200.0 => ArrCategory::MediumValue,
        Some(arr) if arr >= 100.0 => ArrCategory::LowValue,
        Some(_) => ArrCategory::MinimalValue,
    }
}

// ── Engagement ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EngagementLevel {
    Inactive,
    #[serde(rename = "Occasional User")]
    OccasionalUser,
    #[serde(rename = "Regular User")]
    RegularUser,
    #[serde(rename = "Active User")]
    ActiveUser,
    #[serde(rename = "Power User")]
    PowerUser,
}

impl EngagementLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            EngagementLevel::Inactive => "Inactive",
            EngagementLevel::OccasionalUser => "Occasional User",
            EngagementLevel::RegularUser => "Regular User",
            EngagementLevel::ActiveUser => "Active User",
            EngagementLevel::PowerUser => "Power User",
        }
    }
}

impl fmt::Display for EngagementLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tiered by monthly query count AND distinct active days; the first
/// tier (checked highest-first) whose both conditions hold wins.
pub fn engagement_level(query_count: u64, active_days: u64) -> EngagementLevel {
    if query_count >= 50 && active_days >= 15 {
        EngagementLevel::PowerUser
    } else if query_count >= 20 && active_days >= 8 {
        EngagementLevel::ActiveUser
    } else if query_count >= 5 && active_days >= 3 {
        EngagementLevel::RegularUser
    } else if query_count >= 1 {
        EngagementLevel::OccasionalUser
    } else {
        EngagementLevel::Inactive
    }
}

// ── Monthly performance labels ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SatisfactionPerformance {
    Excellent,
    Good,
    Fair,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

impl SatisfactionPerformance {
    pub fn as_str(self) -> &'static str {
        match self {
            SatisfactionPerformance::Excellent => "Excellent",
            SatisfactionPerformance::Good => "Good",
            SatisfactionPerformance::Fair => "Fair",
            SatisfactionPerformance::NeedsImprovement => "Needs Improvement",
        }
    }
}

impl fmt::Display for SatisfactionPerformance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Average-satisfaction ladder for monthly rollups. A group with no
/// feedback at all lands in NeedsImprovement, not in a separate bucket.
pub fn satisfaction_performance(avg_satisfaction: Option<f64>) -> SatisfactionPerformance {
    match avg_satisfaction {
        Some(avg) if avg >= 4.5 => SatisfactionPerformance::Excellent,
        Some(avg) if avg >= 4.0 => SatisfactionPerformance::Good,
        Some(avg) if avg >= 3.5 => SatisfactionPerformance::Fair,
        _ => SatisfactionPerformance::NeedsImprovement,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolumePerformance {
    #[serde(rename = "High Volume")]
    HighVolume,
    #[serde(rename = "Medium Volume")]
    MediumVolume,
    #[serde(rename = "Low Volume")]
    LowVolume,
    #[serde(rename = "Minimal Volume")]
    MinimalVolume,
}

impl VolumePerformance {
    pub fn as_str(self) -> &'static str {
        match self {
            VolumePerformance::HighVolume => "High Volume",
            VolumePerformance::MediumVolume => "Medium Volume",
            VolumePerformance::LowVolume => "Low Volume",
            VolumePerformance::MinimalVolume => "Minimal Volume",
        }
    }
}

impl fmt::Display for VolumePerformance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event-count ladder at 100/500/1000 for monthly rollups.
pub fn volume_performance(total_events: u64) -> VolumePerformance {
    if total_events >= 1000 {
        VolumePerformance::HighVolume
    } else if total_events >= 500 {
        VolumePerformance::MediumVolume
    } else if total_events >= 100 {
        VolumePerformance::LowVolume
    } else {
        VolumePerformance::MinimalVolume
    }
}

/// Mean of the present feedback scores, rounded to report precision.
/// `None` when no score is present, never zero.
pub fn mean_feedback<I: IntoIterator<Item = i64>>(scores: I) -> Option<f64> {
    let mut sum = 0i64;
    let mut n = 0u64;
    for score in scores {
        sum += score;
        n += 1;
    }
    if n == 0 {
        None
    } else {
        Some(round2(sum as f64 / n as f64))
    }
}
