//! Integration tests for scheduler behavior
//!
//! These tests verify the tick-independent guarantees: the immediate first
//! round on start, the single-round-in-flight guard, and that stopping
//! never cancels an in-flight round. Tick cadence itself is minute-grained
//! and exercised only through the state machine.

use std::sync::Arc;
use std::time::Duration;

use url_monitoring::probe::Dispatcher;
use url_monitoring::scheduler::{SchedulerHandle, SchedulerState};
use url_monitoring::storage::{ProbeStore, sqlite::SqliteStore};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn test_setup(
    probe_timeout: Duration,
) -> (SchedulerHandle, Arc<dyn ProbeStore>, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn ProbeStore> = Arc::new(
        SqliteStore::new(temp_dir.path().join("test.db"))
            .await
            .unwrap(),
    );
    let dispatcher = Arc::new(Dispatcher::new(store.clone(), probe_timeout, 5));
    let handle = SchedulerHandle::spawn(dispatcher, store.clone());
    (handle, store, temp_dir)
}

#[tokio::test]
async fn test_start_triggers_immediate_round() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let (handle, store, _dir) = test_setup(Duration::from_secs(5)).await;
    store
        .register_target(&format!("{}/health", mock_server.uri()), "Shops", None)
        .await
        .unwrap();

    // 30-minute interval: any persisted probe within the next second must
    // come from the immediate round, not a tick.
    handle.start(30).await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    let stats = store.overall_stats(1).await.unwrap();
    assert_eq!(stats.total_probes, 1);

    let status = handle.status().await.unwrap();
    assert_eq!(status.state, SchedulerState::Running);
    assert_eq!(status.interval_minutes, 30);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_second_start_replaces_timer_instead_of_duplicating() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let (handle, store, _dir) = test_setup(Duration::from_secs(5)).await;
    store
        .register_target(&format!("{}/health", mock_server.uri()), "Shops", None)
        .await
        .unwrap();

    handle.start(30).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    handle.start(45).await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    let status = handle.status().await.unwrap();
    assert_eq!(status.state, SchedulerState::Running);
    assert_eq!(status.interval_minutes, 45);

    // One immediate round per start call, nothing more - a duplicated
    // timer would keep producing rounds.
    let stats = store.overall_stats(1).await.unwrap();
    assert_eq!(stats.total_probes, 2);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_manual_trigger_during_round_is_collapsed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(800)))
        .mount(&mock_server)
        .await;

    let (handle, store, _dir) = test_setup(Duration::from_secs(5)).await;
    for i in 0..2 {
        store
            .register_target(
                &format!("{}/slow?t={i}", mock_server.uri()),
                "Shops",
                None,
            )
            .await
            .unwrap();
    }

    // The immediate round from start holds the gate for ~800ms
    handle.start(60).await.unwrap();
    let started = handle.run_manual().await.unwrap();
    assert!(!started, "manual trigger during a round must be skipped");

    tokio::time::sleep(Duration::from_secs(2)).await;

    // Exactly one round's worth of probes for the period
    let stats = store.overall_stats(1).await.unwrap();
    assert_eq!(stats.total_probes, 2);

    // Once the round is done, a manual trigger goes through
    let started = handle.run_manual().await.unwrap();
    assert!(started);
    tokio::time::sleep(Duration::from_secs(2)).await;

    let stats = store.overall_stats(1).await.unwrap();
    assert_eq!(stats.total_probes, 4);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_stop_does_not_cancel_inflight_round() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;

    let (handle, store, _dir) = test_setup(Duration::from_secs(5)).await;
    store
        .register_target(&format!("{}/slow", mock_server.uri()), "Shops", None)
        .await
        .unwrap();

    handle.start(30).await.unwrap();
    handle.stop().await.unwrap();

    let status = handle.status().await.unwrap();
    assert_eq!(status.state, SchedulerState::Stopped);

    // The round dispatched before stop still completes and persists
    tokio::time::sleep(Duration::from_secs(2)).await;
    let stats = store.overall_stats(1).await.unwrap();
    assert_eq!(stats.total_probes, 1);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_round_failure_keeps_scheduler_running() {
    // No HTTP server at all - every probe fails with a connection error,
    // which must not knock the scheduler out of Running.
    let (handle, store, _dir) = test_setup(Duration::from_secs(1)).await;
    store
        .register_target("http://127.0.0.1:1/", "Dead", None)
        .await
        .unwrap();

    handle.start(30).await.unwrap();
    tokio::time::sleep(Duration::from_millis(800)).await;

    let status = handle.status().await.unwrap();
    assert_eq!(status.state, SchedulerState::Running);

    // The failed probe was still recorded
    let stats = store.overall_stats(1).await.unwrap();
    assert_eq!(stats.total_probes, 1);
    assert_eq!(stats.failed_probes, 1);

    handle.shutdown().await;
}
