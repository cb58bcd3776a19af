//! SQLite implementation of the probe store
//!
//! ## Concurrency
//!
//! Every probe worker in a round calls `record_result` concurrently against
//! this store. Physical writes are serialized by SQLite itself; we configure
//! the connection for that workload:
//!
//! - **WAL mode**: readers are not blocked by the single writer
//! - **Busy timeout**: writers wait for the lock instead of failing fast
//! - **Bounded retry**: a write that still reports busy/locked is retried
//!   with backoff before the error is surfaced
//!
//! ## Windowed queries
//!
//! "Now" is evaluated once per query call, so all rows of a single query are
//! filtered against the same cutoff. Latest-per-target uses partitioned
//! ranking over the result id, which makes the tie-break explicit: two rows
//! can share a timestamp at millisecond resolution, ids never collide.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info, instrument, warn};

use super::backend::ProbeStore;
use super::error::{StorageError, StorageResult, is_busy};
use super::schema::{
    CountryStats, GroupStats, OverallStats, RequestRecord, StatusTree, Target, TargetStatus,
    UNKNOWN_COUNTRY, rate_percent, round1,
};

/// Attempts for a write that keeps reporting busy/locked
const WRITE_RETRIES: u32 = 3;

/// Base backoff between write retries (multiplied by the attempt number)
const WRITE_RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// SQLite-backed probe store
///
/// Stores targets and the append-only probe log in a local database file.
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (or create) the database file and run migrations
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let db_path = db_path.as_ref();

        info!("initializing SQLite store at: {}", db_path.display());

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal) // WAL mode for better concurrency
            .synchronous(SqliteSynchronous::Normal) // Balance safety and performance
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(30)); // Retry on lock contention

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        debug!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    fn timestamp_to_millis(dt: &DateTime<Utc>) -> i64 {
        dt.timestamp_millis()
    }

    fn millis_to_timestamp(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
    }

    /// Window cutoff in Unix milliseconds, evaluated once per query call.
    fn window_start(hours_back: u32) -> i64 {
        let now = Utc::now();
        Self::timestamp_to_millis(&(now - chrono::Duration::hours(hours_back as i64)))
    }

    /// Insert one probe result at an explicit timestamp.
    ///
    /// Busy/locked conflicts are retried with backoff; the conflict never
    /// reaches the caller unless the retry budget is exhausted.
    async fn insert_result(
        &self,
        target_id: i64,
        status_code: Option<u16>,
        response_time_ms: f64,
        error_message: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> StorageResult<i64> {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM targets WHERE id = ?")
            .bind(target_id)
            .fetch_one(&self.pool)
            .await?;
        if exists == 0 {
            return Err(StorageError::UnknownTarget(target_id));
        }

        let millis = Self::timestamp_to_millis(&timestamp);
        let status = status_code.map(|c| c as i64);

        let mut attempt = 0;
        loop {
            let result = sqlx::query(
                r#"
                INSERT INTO probe_results (target_id, status_code, response_time_ms, error_message, timestamp)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(target_id)
            .bind(status)
            .bind(response_time_ms)
            .bind(&error_message)
            .bind(millis)
            .execute(&self.pool)
            .await;

            match result {
                Ok(res) => return Ok(res.last_insert_rowid()),
                Err(e) if is_busy(&e) && attempt < WRITE_RETRIES => {
                    attempt += 1;
                    warn!(
                        "write conflict recording result for target {target_id}, retry {attempt}/{WRITE_RETRIES}"
                    );
                    tokio::time::sleep(WRITE_RETRY_BACKOFF * attempt).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> RequestRecord {
        RequestRecord {
            url: row.get("url"),
            group_name: row.get("group_name"),
            country_code: row.get("country_code"),
            status_code: row.get::<Option<i64>, _>("status_code").map(|c| c as u16),
            response_time_ms: row.get("response_time_ms"),
            error_message: row.get("error_message"),
            timestamp: Self::millis_to_timestamp(row.get("timestamp")),
        }
    }
}

#[async_trait]
impl ProbeStore for SqliteStore {
    #[instrument(skip(self), fields(url = %url))]
    async fn register_target(
        &self,
        url: &str,
        group_name: &str,
        country_code: Option<&str>,
    ) -> StorageResult<i64> {
        let created_at = Self::timestamp_to_millis(&Utc::now());

        // Last-write-wins upsert: re-registering an URL updates its labels
        // in place and keeps its id.
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO targets (url, group_name, country_code, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (url) DO UPDATE SET
                group_name = excluded.group_name,
                country_code = excluded.country_code
            RETURNING id
            "#,
        )
        .bind(url)
        .bind(group_name)
        .bind(country_code)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        debug!("registered target {url} as id {id}");
        Ok(id)
    }

    async fn list_targets(&self) -> StorageResult<Vec<Target>> {
        let rows = sqlx::query(
            "SELECT id, url, group_name, country_code, created_at FROM targets ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Target {
                id: row.get("id"),
                url: row.get("url"),
                group_name: row.get("group_name"),
                country_code: row.get("country_code"),
                created_at: Self::millis_to_timestamp(row.get("created_at")),
            })
            .collect())
    }

    #[instrument(skip(self, error_message), fields(target_id = target_id))]
    async fn record_result(
        &self,
        target_id: i64,
        status_code: Option<u16>,
        response_time_ms: f64,
        error_message: Option<String>,
    ) -> StorageResult<i64> {
        self.insert_result(
            target_id,
            status_code,
            response_time_ms,
            error_message,
            Utc::now(),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn latest_status_per_target(&self, hours_back: u32) -> StorageResult<StatusTree> {
        let cutoff = Self::window_start(hours_back);

        // Partitioned ranking by id, descending: rank 1 is the latest
        // in-window result of each target, ids breaking timestamp ties.
        let rows = sqlx::query(
            r#"
            SELECT target_id, url, group_name, country_code,
                   status_code, response_time_ms, error_message, timestamp
            FROM (
                SELECT r.target_id, t.url, t.group_name, t.country_code,
                       r.status_code, r.response_time_ms, r.error_message, r.timestamp,
                       ROW_NUMBER() OVER (PARTITION BY r.target_id ORDER BY r.id DESC) AS rn
                FROM probe_results r
                JOIN targets t ON r.target_id = t.id
                WHERE r.timestamp >= ?
            )
            WHERE rn = 1
            ORDER BY group_name, country_code, url
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        let mut tree: StatusTree = BTreeMap::new();
        for row in rows {
            let group: String = row.get("group_name");
            let country = row
                .get::<Option<String>, _>("country_code")
                .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string());

            tree.entry(group)
                .or_default()
                .entry(country)
                .or_default()
                .push(TargetStatus {
                    target_id: row.get("target_id"),
                    url: row.get("url"),
                    status_code: row.get::<Option<i64>, _>("status_code").map(|c| c as u16),
                    response_time_ms: row.get("response_time_ms"),
                    error_message: row.get("error_message"),
                    timestamp: Self::millis_to_timestamp(row.get("timestamp")),
                });
        }

        Ok(tree)
    }

    #[instrument(skip(self))]
    async fn overall_stats(&self, hours_back: u32) -> StorageResult<OverallStats> {
        let cutoff = Self::window_start(hours_back);

        let total_targets: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM targets")
            .fetch_one(&self.pool)
            .await?;

        let (total_probes, successful_probes): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(CASE WHEN status_code >= 200 AND status_code < 300 THEN 1 ELSE 0 END), 0)
            FROM probe_results
            WHERE timestamp >= ?
            "#,
        )
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await?;

        let total_probes = total_probes as u64;
        let successful_probes = successful_probes as u64;

        Ok(OverallStats {
            total_targets: total_targets as u64,
            total_probes,
            successful_probes,
            failed_probes: total_probes - successful_probes,
            success_rate: rate_percent(successful_probes, total_probes),
        })
    }

    #[instrument(skip(self))]
    async fn group_stats(&self, hours_back: u32) -> StorageResult<Vec<GroupStats>> {
        let cutoff = Self::window_start(hours_back);

        // LEFT JOIN with the window condition in the join clause, so groups
        // with zero in-window probes still produce a row.
        let rows = sqlx::query(
            r#"
            SELECT t.group_name,
                   COUNT(DISTINCT t.id) AS total_targets,
                   COUNT(DISTINCT t.country_code) AS total_countries,
                   COUNT(r.id) AS total_probes,
                   COALESCE(SUM(CASE WHEN r.status_code >= 200 AND r.status_code < 300 THEN 1 ELSE 0 END), 0) AS successful_probes,
                   AVG(r.response_time_ms) AS avg_response_time_ms
            FROM targets t
            LEFT JOIN probe_results r ON t.id = r.target_id AND r.timestamp >= ?
            GROUP BY t.group_name
            ORDER BY t.group_name
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let total_probes = row.get::<i64, _>("total_probes") as u64;
                let successful_probes = row.get::<i64, _>("successful_probes") as u64;
                let failed_probes = total_probes - successful_probes;

                GroupStats {
                    group_name: row.get("group_name"),
                    total_targets: row.get::<i64, _>("total_targets") as u64,
                    total_countries: row.get::<i64, _>("total_countries") as u64,
                    total_probes,
                    successful_probes,
                    failed_probes,
                    success_rate: rate_percent(successful_probes, total_probes),
                    failure_rate: rate_percent(failed_probes, total_probes),
                    avg_response_time_ms: row
                        .get::<Option<f64>, _>("avg_response_time_ms")
                        .map(round1)
                        .unwrap_or(0.0),
                }
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn country_stats(
        &self,
        group_name: &str,
        hours_back: u32,
    ) -> StorageResult<Vec<CountryStats>> {
        let cutoff = Self::window_start(hours_back);

        let rows = sqlx::query(
            r#"
            SELECT t.country_code,
                   COUNT(DISTINCT t.id) AS total_targets,
                   COUNT(r.id) AS total_probes,
                   COALESCE(SUM(CASE WHEN r.status_code >= 200 AND r.status_code < 300 THEN 1 ELSE 0 END), 0) AS successful_probes,
                   AVG(r.response_time_ms) AS avg_response_time_ms
            FROM targets t
            LEFT JOIN probe_results r ON t.id = r.target_id AND r.timestamp >= ?
            WHERE t.group_name = ?
            GROUP BY t.country_code
            ORDER BY t.country_code
            "#,
        )
        .bind(cutoff)
        .bind(group_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let total_probes = row.get::<i64, _>("total_probes") as u64;
                let successful_probes = row.get::<i64, _>("successful_probes") as u64;
                let failed_probes = total_probes - successful_probes;

                CountryStats {
                    country_code: row
                        .get::<Option<String>, _>("country_code")
                        .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string()),
                    total_targets: row.get::<i64, _>("total_targets") as u64,
                    total_probes,
                    successful_probes,
                    failed_probes,
                    success_rate: rate_percent(successful_probes, total_probes),
                    failure_rate: rate_percent(failed_probes, total_probes),
                    avg_response_time_ms: row
                        .get::<Option<f64>, _>("avg_response_time_ms")
                        .map(round1)
                        .unwrap_or(0.0),
                }
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn failed_results(&self, hours_back: u32) -> StorageResult<Vec<RequestRecord>> {
        let cutoff = Self::window_start(hours_back);

        let rows = sqlx::query(
            r#"
            SELECT t.url, t.group_name, t.country_code,
                   r.status_code, r.response_time_ms, r.error_message, r.timestamp
            FROM probe_results r
            JOIN targets t ON r.target_id = t.id
            WHERE r.timestamp >= ?
              AND (r.status_code IS NULL OR r.status_code < 200 OR r.status_code >= 300)
            ORDER BY r.timestamp DESC, r.id DESC
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::record_from_row).collect())
    }

    #[instrument(skip(self))]
    async fn all_requests_for(
        &self,
        group_name: &str,
        country_code: &str,
        hours_back: u32,
    ) -> StorageResult<Vec<RequestRecord>> {
        let cutoff = Self::window_start(hours_back);

        // Querying for "Unknown" matches targets without a country label.
        let rows = sqlx::query(
            r#"
            SELECT t.url, t.group_name, t.country_code,
                   r.status_code, r.response_time_ms, r.error_message, r.timestamp
            FROM probe_results r
            JOIN targets t ON r.target_id = t.id
            WHERE t.group_name = ?
              AND (t.country_code = ? OR (t.country_code IS NULL AND ? = ?))
              AND r.timestamp >= ?
            ORDER BY r.timestamp DESC, r.id DESC
            "#,
        )
        .bind(group_name)
        .bind(country_code)
        .bind(country_code)
        .bind(UNKNOWN_COUNTRY)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::record_from_row).collect())
    }

    async fn close(&self) -> StorageResult<()> {
        info!("closing SQLite store");
        self.pool.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::Arc;

    async fn test_store() -> (SqliteStore, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let store = SqliteStore::new(&db_path).await.unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_register_target_upsert_is_idempotent() {
        let (store, _dir) = test_store().await;

        let first = store
            .register_target("https://example.com", "Shops", Some("DE"))
            .await
            .unwrap();
        let second = store
            .register_target("https://example.com", "Stores", Some("FR"))
            .await
            .unwrap();

        assert_eq!(first, second);

        let targets = store.list_targets().await.unwrap();
        assert_eq!(targets.len(), 1);
        // Last write wins for the labels
        assert_eq!(targets[0].group_name, "Stores");
        assert_eq!(targets[0].country_code.as_deref(), Some("FR"));
    }

    #[tokio::test]
    async fn test_record_result_unknown_target() {
        let (store, _dir) = test_store().await;

        let result = store.record_result(42, Some(200), 10.0, None).await;
        assert_matches!(result, Err(StorageError::UnknownTarget(42)));
    }

    #[tokio::test]
    async fn test_record_result_ids_are_monotonic() {
        let (store, _dir) = test_store().await;
        let target = store
            .register_target("https://example.com", "Shops", None)
            .await
            .unwrap();

        let first = store
            .record_result(target, Some(200), 12.0, None)
            .await
            .unwrap();
        let second = store
            .record_result(target, None, 30000.0, Some("Request timeout".to_string()))
            .await
            .unwrap();

        assert!(second > first);
    }

    #[tokio::test]
    async fn test_latest_status_tie_break_is_id_not_timestamp() {
        let (store, _dir) = test_store().await;
        let target = store
            .register_target("https://example.com", "Shops", Some("DE"))
            .await
            .unwrap();

        // Two results sharing a timestamp: the one with the greater id wins.
        let ts = Utc::now();
        store
            .insert_result(target, Some(500), 80.0, None, ts)
            .await
            .unwrap();
        store
            .insert_result(target, Some(200), 42.0, None, ts)
            .await
            .unwrap();

        let tree = store.latest_status_per_target(1).await.unwrap();
        let statuses = &tree["Shops"]["DE"];
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].status_code, Some(200));
        assert_eq!(statuses[0].response_time_ms, 42.0);
    }

    #[tokio::test]
    async fn test_latest_status_omits_targets_outside_window() {
        let (store, _dir) = test_store().await;
        let target = store
            .register_target("https://example.com", "Shops", None)
            .await
            .unwrap();

        let old = Utc::now() - chrono::Duration::hours(3);
        store
            .insert_result(target, Some(200), 10.0, None, old)
            .await
            .unwrap();

        let tree = store.latest_status_per_target(1).await.unwrap();
        assert!(tree.is_empty());

        // A wider window picks it back up
        let tree = store.latest_status_per_target(24).await.unwrap();
        assert_eq!(tree["Shops"][UNKNOWN_COUNTRY].len(), 1);
    }

    #[tokio::test]
    async fn test_overall_stats_empty_window_is_zero() {
        let (store, _dir) = test_store().await;
        store
            .register_target("https://example.com", "Shops", None)
            .await
            .unwrap();

        let stats = store.overall_stats(1).await.unwrap();
        assert_eq!(stats.total_targets, 1);
        assert_eq!(stats.total_probes, 0);
        assert_eq!(stats.success_rate, 0.0);
    }

    #[tokio::test]
    async fn test_overall_stats_counts_and_rate() {
        let (store, _dir) = test_store().await;
        let target = store
            .register_target("https://example.com", "Shops", None)
            .await
            .unwrap();

        store
            .record_result(target, Some(200), 10.0, None)
            .await
            .unwrap();
        store
            .record_result(target, Some(204), 12.0, None)
            .await
            .unwrap();
        store
            .record_result(target, None, 10000.0, Some("Request timeout".to_string()))
            .await
            .unwrap();

        let stats = store.overall_stats(1).await.unwrap();
        assert_eq!(stats.total_probes, 3);
        assert_eq!(stats.successful_probes, 2);
        assert_eq!(stats.failed_probes, 1);
        assert_eq!(stats.success_rate, 66.7);
    }

    #[tokio::test]
    async fn test_group_stats_includes_zero_probe_group() {
        let (store, _dir) = test_store().await;
        let active = store
            .register_target("https://a.example.com", "Active", Some("DE"))
            .await
            .unwrap();
        store
            .register_target("https://b.example.com", "Idle", Some("FR"))
            .await
            .unwrap();

        store
            .record_result(active, Some(200), 20.0, None)
            .await
            .unwrap();
        store
            .record_result(active, Some(503), 40.0, None)
            .await
            .unwrap();

        let stats = store.group_stats(1).await.unwrap();
        assert_eq!(stats.len(), 2);

        let active_stats = stats.iter().find(|s| s.group_name == "Active").unwrap();
        assert_eq!(active_stats.total_probes, 2);
        assert_eq!(active_stats.successful_probes, 1);
        assert_eq!(active_stats.failed_probes, 1);
        assert_eq!(active_stats.success_rate, 50.0);
        assert_eq!(active_stats.failure_rate, 50.0);
        assert_eq!(active_stats.avg_response_time_ms, 30.0);

        let idle_stats = stats.iter().find(|s| s.group_name == "Idle").unwrap();
        assert_eq!(idle_stats.total_targets, 1);
        assert_eq!(idle_stats.total_probes, 0);
        assert_eq!(idle_stats.success_rate, 0.0);
        assert_eq!(idle_stats.avg_response_time_ms, 0.0);
    }

    #[tokio::test]
    async fn test_country_stats_null_country_is_unknown() {
        let (store, _dir) = test_store().await;
        let tagged = store
            .register_target("https://de.example.com", "Shops", Some("DE"))
            .await
            .unwrap();
        let untagged = store
            .register_target("https://x.example.com", "Shops", None)
            .await
            .unwrap();

        store
            .record_result(tagged, Some(200), 15.0, None)
            .await
            .unwrap();
        store
            .record_result(untagged, Some(404), 25.0, None)
            .await
            .unwrap();

        let stats = store.country_stats("Shops", 1).await.unwrap();
        assert_eq!(stats.len(), 2);

        let unknown = stats
            .iter()
            .find(|s| s.country_code == UNKNOWN_COUNTRY)
            .unwrap();
        assert_eq!(unknown.total_probes, 1);
        assert_eq!(unknown.failed_probes, 1);
        assert_eq!(unknown.failure_rate, 100.0);
    }

    #[tokio::test]
    async fn test_failed_results_newest_first() {
        let (store, _dir) = test_store().await;
        let target = store
            .register_target("https://example.com", "Shops", None)
            .await
            .unwrap();

        let base = Utc::now() - chrono::Duration::minutes(10);
        store
            .insert_result(target, Some(500), 10.0, None, base)
            .await
            .unwrap();
        store
            .insert_result(target, Some(200), 12.0, None, base + chrono::Duration::minutes(1))
            .await
            .unwrap();
        store
            .insert_result(
                target,
                None,
                10000.0,
                Some("Connection error".to_string()),
                base + chrono::Duration::minutes(2),
            )
            .await
            .unwrap();

        let failed = store.failed_results(1).await.unwrap();
        assert_eq!(failed.len(), 2);
        assert_eq!(
            failed[0].error_message.as_deref(),
            Some("Connection error")
        );
        assert_eq!(failed[1].status_code, Some(500));
    }

    #[tokio::test]
    async fn test_all_requests_for_unknown_country_matches_null() {
        let (store, _dir) = test_store().await;
        let untagged = store
            .register_target("https://x.example.com", "Shops", None)
            .await
            .unwrap();
        let tagged = store
            .register_target("https://de.example.com", "Shops", Some("DE"))
            .await
            .unwrap();

        store
            .record_result(untagged, Some(200), 10.0, None)
            .await
            .unwrap();
        store
            .record_result(untagged, Some(500), 11.0, None)
            .await
            .unwrap();
        store
            .record_result(tagged, Some(200), 12.0, None)
            .await
            .unwrap();

        let requests = store.all_requests_for("Shops", UNKNOWN_COUNTRY, 1).await.unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.url == "https://x.example.com"));
        // Both successes and failures are listed
        assert!(requests.iter().any(|r| r.is_success()));
        assert!(requests.iter().any(|r| !r.is_success()));

        let requests = store.all_requests_for("Shops", "DE", 1).await.unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_record_results_lose_no_rows() {
        let (store, _dir) = test_store().await;
        let store = Arc::new(store);
        let target = store
            .register_target("https://example.com", "Shops", None)
            .await
            .unwrap();

        let mut tasks = vec![];
        for i in 0..25u16 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store
                    .record_result(target, Some(200 + i % 3), 5.0, None)
                    .await
            }));
        }

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stats = store.overall_stats(1).await.unwrap();
        assert_eq!(stats.total_probes, 25);
    }
}
