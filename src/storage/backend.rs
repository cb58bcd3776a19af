//! Storage trait definition
//!
//! This module defines the `ProbeStore` trait that storage implementations
//! must implement. The store is the only owner of persisted state: targets
//! are upserted through it, probe results are appended through it, and all
//! windowed aggregates are computed by it.

use async_trait::async_trait;

use super::error::StorageResult;
use super::schema::{
    CountryStats, GroupStats, OverallStats, RequestRecord, StatusTree, Target,
};

/// Trait for the probe time-series store
///
/// ## Windowing
///
/// All query methods take an `hours_back` parameter and consider only rows
/// with `timestamp >= now - hours_back hours`, where `now` is evaluated once
/// per call so a single query is internally consistent.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync`; `record_result` in particular is
/// called concurrently by every probe worker in a round and must never lose
/// or corrupt a row.
#[async_trait]
pub trait ProbeStore: Send + Sync {
    /// Insert or update a target by URL (idempotent upsert)
    ///
    /// Re-registering an existing URL updates its group and country labels
    /// in place and returns the existing id; a duplicate row is never
    /// created.
    async fn register_target(
        &self,
        url: &str,
        group_name: &str,
        country_code: Option<&str>,
    ) -> StorageResult<i64>;

    /// List all registered targets
    async fn list_targets(&self) -> StorageResult<Vec<Target>>;

    /// Append one probe result and return its id
    ///
    /// Fails with `StorageError::UnknownTarget` if `target_id` does not
    /// exist. Transient write conflicts are retried internally with
    /// backoff.
    async fn record_result(
        &self,
        target_id: i64,
        status_code: Option<u16>,
        response_time_ms: f64,
        error_message: Option<String>,
    ) -> StorageResult<i64>;

    /// Latest in-window result per target, grouped by group then country
    ///
    /// "Latest" means the greatest result **id** within the window - id,
    /// not timestamp, is the tie-break, since two results can share a
    /// timestamp at the store's time resolution. Targets with no in-window
    /// results are omitted.
    async fn latest_status_per_target(&self, hours_back: u32) -> StorageResult<StatusTree>;

    /// Overall probe statistics over the window
    async fn overall_stats(&self, hours_back: u32) -> StorageResult<OverallStats>;

    /// Per-group statistics over the window
    ///
    /// Returns one row per distinct group, including groups with zero
    /// in-window probes (rates and averages reported as 0).
    async fn group_stats(&self, hours_back: u32) -> StorageResult<Vec<GroupStats>>;

    /// Per-country statistics within one group over the window
    ///
    /// A NULL country label is reported as `"Unknown"`.
    async fn country_stats(
        &self,
        group_name: &str,
        hours_back: u32,
    ) -> StorageResult<Vec<CountryStats>>;

    /// All failed in-window results with target info, newest first
    ///
    /// Failed means the status code is absent or outside [200, 300).
    async fn failed_results(&self, hours_back: u32) -> StorageResult<Vec<RequestRecord>>;

    /// All in-window results (successes and failures) for one group and
    /// country, newest first
    ///
    /// Querying for country `"Unknown"` matches targets with no country
    /// label.
    async fn all_requests_for(
        &self,
        group_name: &str,
        country_code: &str,
        hours_back: u32,
    ) -> StorageResult<Vec<RequestRecord>>;

    /// Close the store and release resources
    async fn close(&self) -> StorageResult<()>;
}
