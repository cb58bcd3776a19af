//! Row and aggregate types for the probe log
//!
//! Two persisted tables back the store:
//!
//! - `targets` - registered endpoints, unique by URL, tagged with a group
//!   and an optional country label
//! - `probe_results` - append-only log of probe outcomes, one row per
//!   completed probe
//!
//! Everything else in this module is a derived view: aggregates are
//! recomputed per query over a trailing time window and never persisted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label used wherever a target has no country code.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// A registered endpoint under monitoring
///
/// Targets are created or updated through the registry upsert and are
/// read-only to the rest of the core; they are never deleted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Row id, assigned at insert
    pub id: i64,

    /// Endpoint URL (globally unique)
    pub url: String,

    /// Group label for hierarchical reporting
    pub group_name: String,

    /// Optional country label
    pub country_code: Option<String>,

    /// When the target was first registered (UTC)
    pub created_at: DateTime<Utc>,
}

/// One completed probe attempt
///
/// Exactly one of `status_code` / `error_message` is set: a transport-level
/// failure carries a classification text and no status, a completed HTTP
/// exchange carries a status and no error text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Monotonic row id, assigned at insert
    pub id: i64,

    /// Target this result belongs to
    pub target_id: i64,

    /// HTTP status code, if a response was received
    pub status_code: Option<u16>,

    /// Wall time of the probe in milliseconds (measured even on failure)
    pub response_time_ms: f64,

    /// Error classification, present iff `status_code` is absent
    pub error_message: Option<String>,

    /// When the result was recorded (UTC, assigned at insert)
    pub timestamp: DateTime<Utc>,
}

impl ProbeResult {
    /// A result is successful iff a status code is present and in [200, 300).
    pub fn is_success(&self) -> bool {
        matches!(self.status_code, Some(code) if (200..300).contains(&code))
    }
}

/// Latest known state of one target, as returned by the status tree query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetStatus {
    pub target_id: i64,
    pub url: String,
    pub status_code: Option<u16>,
    pub response_time_ms: f64,
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl TargetStatus {
    pub fn is_success(&self) -> bool {
        matches!(self.status_code, Some(code) if (200..300).contains(&code))
    }
}

/// Latest status per target, grouped by group label and then country label
///
/// Targets without a country label are bucketed under [`UNKNOWN_COUNTRY`].
pub type StatusTree = BTreeMap<String, BTreeMap<String, Vec<TargetStatus>>>;

/// Overall health over a trailing window
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OverallStats {
    pub total_targets: u64,
    pub total_probes: u64,
    pub successful_probes: u64,
    pub failed_probes: u64,

    /// Successful probes as a percentage of all probes, 0 when the window
    /// is empty
    pub success_rate: f64,
}

/// Per-group aggregate over a trailing window
///
/// Groups with registered targets but no in-window probes still get a row,
/// with zero counts and rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub group_name: String,
    pub total_targets: u64,
    pub total_countries: u64,
    pub total_probes: u64,
    pub successful_probes: u64,
    pub failed_probes: u64,
    pub success_rate: f64,
    pub failure_rate: f64,
    pub avg_response_time_ms: f64,
}

/// Per-country aggregate within one group over a trailing window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryStats {
    pub country_code: String,
    pub total_targets: u64,
    pub total_probes: u64,
    pub successful_probes: u64,
    pub failed_probes: u64,
    pub success_rate: f64,
    pub failure_rate: f64,
    pub avg_response_time_ms: f64,
}

/// A probe result joined with its target info, for request listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub url: String,
    pub group_name: String,
    pub country_code: Option<String>,
    pub status_code: Option<u16>,
    pub response_time_ms: f64,
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl RequestRecord {
    pub fn is_success(&self) -> bool {
        matches!(self.status_code, Some(code) if (200..300).contains(&code))
    }
}

/// Round a value to one decimal place (dashboard display convention).
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Rate in percent, rounded to one decimal; 0 when the denominator is 0.
pub fn rate_percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        round1(part as f64 / total as f64 * 100.0)
    }
}
