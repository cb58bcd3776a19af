//! Probe dispatcher - concurrent round fan-out
//!
//! One round probes every registered target against a bounded worker pool.
//! Each result is persisted as soon as its probe completes, not batched at
//! round end, so a crash mid-round loses only the not-yet-completed probes.
//! The round itself waits for all probes before returning, which makes the
//! "all workers joined" contract explicit.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use reqwest::header;
use serde::Serialize;
use tracing::{debug, error, info, instrument, trace};

use crate::storage::ProbeStore;
use crate::storage::schema::{Target, round1};

use super::outcome::{OutcomeKind, ProbeOutcome};

/// Default per-probe timeout
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default worker pool width for a round
pub const DEFAULT_CONCURRENCY: usize = 5;

const USER_AGENT: &str = concat!(
    "URL-Monitor/",
    env!("CARGO_PKG_VERSION"),
    " (Monitoring Service)"
);

/// Executes probe rounds and persists each outcome via the store
pub struct Dispatcher {
    /// HTTP client (reused across requests for efficiency)
    client: reqwest::Client,

    store: Arc<dyn ProbeStore>,

    /// Worker pool width for `run_round`
    concurrency: usize,
}

impl Dispatcher {
    /// Create a dispatcher with a fixed per-probe timeout and pool width
    ///
    /// The client verifies TLS certificates and follows redirects.
    pub fn new(store: Arc<dyn ProbeStore>, timeout: Duration, concurrency: usize) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .user_agent(USER_AGENT)
                .redirect(reqwest::redirect::Policy::limited(10))
                .build()
                .expect("Failed to build HTTP client"),
            store,
            concurrency: concurrency.max(1),
        }
    }

    /// Probe one target and classify the outcome
    ///
    /// Never fails: transport errors come back as classified variants, and
    /// elapsed wall time is measured regardless of outcome. A timed-out
    /// probe consumes its full timeout before being classified.
    #[instrument(skip_all, fields(url = %target.url))]
    pub async fn probe(&self, target: &Target) -> ProbeOutcome {
        let start = Instant::now();

        let mut request = self.client.get(&target.url);
        if let Some(country) = &target.country_code {
            // Simulated country cookie, used by downstream services to
            // serve region-specific content for testing.
            request = request.header(
                header::COOKIE,
                format!("countryCode=countryCode-{country}"),
            );
        }

        let response = request.send().await;
        let response_time_ms = round1(start.elapsed().as_secs_f64() * 1000.0);

        let kind = match response {
            Ok(response) => OutcomeKind::Success {
                status_code: response.status().as_u16(),
            },
            Err(e) => OutcomeKind::classify(&e),
        };

        match &kind {
            OutcomeKind::Success { status_code } => {
                trace!("{}: status {status_code}, {response_time_ms}ms", target.url);
            }
            other => {
                debug!(
                    "{}: {} after {response_time_ms}ms",
                    target.url,
                    other.error_message().unwrap_or_default()
                );
            }
        }

        ProbeOutcome {
            target_id: target.id,
            url: target.url.clone(),
            kind,
            response_time_ms,
        }
    }

    /// Run one concurrent round over the given targets
    ///
    /// Probes fan out over a pool of `concurrency` workers; no ordering is
    /// guaranteed between probes, and persisted id order reflects
    /// completion order. A store failure for one probe is logged and does
    /// not abort the round.
    #[instrument(skip_all, fields(targets = targets.len()))]
    pub async fn run_round(&self, targets: &[Target]) -> Vec<ProbeOutcome> {
        if targets.is_empty() {
            debug!("no targets registered, skipping round");
            return Vec::new();
        }

        info!("starting probe round for {} targets", targets.len());

        // Each worker future owns its target; borrowing `&Target` across
        // the buffered stream trips rust-lang/rust#89976 when the round is
        // spawned as a task.
        futures::stream::iter(targets.iter().cloned())
            .map(|target| async move {
                let outcome = self.probe(&target).await;

                // Persist as soon as the probe completes.
                if let Err(e) = self
                    .store
                    .record_result(
                        outcome.target_id,
                        outcome.status_code(),
                        outcome.response_time_ms,
                        outcome.error_message(),
                    )
                    .await
                {
                    error!("failed to persist probe result for {}: {e}", outcome.url);
                }

                outcome
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await
    }
}

/// Summary of one probe round
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoundSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,

    /// Successful probes as a percentage of the round, one decimal
    pub success_rate: f64,

    /// Average response time over successful probes only
    pub avg_response_time_ms: f64,
}

impl RoundSummary {
    pub fn from_outcomes(outcomes: &[ProbeOutcome]) -> Self {
        if outcomes.is_empty() {
            return Self::default();
        }

        let total = outcomes.len();
        let successful = outcomes.iter().filter(|o| o.is_success()).count();
        let failed = total - successful;

        let success_times: Vec<f64> = outcomes
            .iter()
            .filter(|o| o.is_success())
            .map(|o| o.response_time_ms)
            .collect();
        let avg_response_time_ms = if success_times.is_empty() {
            0.0
        } else {
            round1(success_times.iter().sum::<f64>() / success_times.len() as f64)
        };

        Self {
            total,
            successful,
            failed,
            success_rate: round1(successful as f64 / total as f64 * 100.0),
            avg_response_time_ms,
        }
    }
}
