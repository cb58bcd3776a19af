//! Round reporting for the CI layer
//!
//! Failure criticality is policy belonging to the reporting surface, not to
//! the store or dispatcher: neither consults this module. The default
//! policy treats 4xx responses as non-critical (a content problem, not an
//! availability problem) and everything else - 5xx, timeouts, connection
//! and TLS errors - as critical.

use serde::{Deserialize, Serialize};

use crate::probe::{ProbeOutcome, RoundSummary};

/// Configurable classification of failed probes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalityPolicy {
    /// Inclusive status ranges whose failures are non-critical
    pub non_critical_ranges: Vec<(u16, u16)>,
}

impl Default for CriticalityPolicy {
    fn default() -> Self {
        Self {
            non_critical_ranges: vec![(400, 499)],
        }
    }
}

impl CriticalityPolicy {
    /// Treat every failure as critical, including 4xx responses.
    pub fn strict() -> Self {
        Self {
            non_critical_ranges: Vec::new(),
        }
    }

    /// Whether a failed outcome is critical under this policy
    ///
    /// Successful outcomes are never critical. Failures without a status
    /// code (timeouts, connection and TLS errors) are always critical.
    pub fn is_critical(&self, outcome: &ProbeOutcome) -> bool {
        if outcome.is_success() {
            return false;
        }
        match outcome.status_code() {
            Some(code) => !self
                .non_critical_ranges
                .iter()
                .any(|(lo, hi)| (*lo..=*hi).contains(&code)),
            None => true,
        }
    }
}

/// One round's outcomes split by criticality, plus the summary
#[derive(Debug, Clone, Serialize)]
pub struct RoundReport {
    pub summary: RoundSummary,
    pub critical_failures: Vec<ProbeOutcome>,
    pub non_critical_failures: Vec<ProbeOutcome>,
}

impl RoundReport {
    pub fn new(outcomes: Vec<ProbeOutcome>, policy: &CriticalityPolicy) -> Self {
        let summary = RoundSummary::from_outcomes(&outcomes);

        let (critical_failures, non_critical_failures) = outcomes
            .into_iter()
            .filter(|o| !o.is_success())
            .partition(|o| policy.is_critical(o));

        Self {
            summary,
            critical_failures,
            non_critical_failures,
        }
    }

    /// Process exit code for CI runs: 1 iff any critical failure
    pub fn exit_code(&self) -> i32 {
        if self.critical_failures.is_empty() {
            0
        } else {
            1
        }
    }
}
