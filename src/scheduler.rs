//! Monitoring scheduler - periodic round triggering
//!
//! The scheduler is an actor owned by the process's composition root and
//! controlled through a cloneable [`SchedulerHandle`]; there is no global
//! instance. It drives the state machine `Stopped -> Running <-> Paused`
//! and triggers probe rounds on an interval.
//!
//! ## Overlap guard
//!
//! At most one round is in flight at any time. Rounds run in a spawned task
//! that must win a `try_lock` on the round gate; a tick or manual trigger
//! that arrives while a round is executing is skipped, not queued. Pausing
//! or stopping suppresses future ticks but never cancels an in-flight
//! round.
//!
//! ## Failure semantics
//!
//! Errors inside a round (store unavailable, probe persistence failures)
//! are caught and logged; the scheduler stays Running and the next tick
//! proceeds normally.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use crate::probe::{Dispatcher, RoundSummary};
use crate::storage::ProbeStore;

/// Default interval between rounds, in minutes
pub const DEFAULT_INTERVAL_MINUTES: u64 = 30;

/// Scheduler state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Stopped,
    Running,
    Paused,
}

/// Snapshot of the scheduler's current state
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub state: SchedulerState,

    /// When the next scheduled round is due (None unless Running)
    pub next_run: Option<DateTime<Utc>>,

    pub interval_minutes: u64,
}

/// Commands that can be sent to the scheduler actor
#[derive(Debug)]
pub enum SchedulerCommand {
    /// Transition to Running and trigger an immediate round
    ///
    /// Calling Start while already Running replaces the timer period; it
    /// never creates a second timer.
    Start { interval_minutes: u64 },

    /// Suppress future ticks without cancelling an in-flight round
    Pause,

    /// Resume ticking after a pause
    Resume,

    /// Transition to Stopped (best-effort, in-flight round keeps running)
    Stop,

    /// Trigger one round now, subject to the overlap guard
    ///
    /// Responds with `true` if a round was started, `false` if one was
    /// already in flight and the trigger was skipped.
    RunNow { respond_to: oneshot::Sender<bool> },

    /// Replace the timer period, effective from the next tick
    UpdateInterval { interval_minutes: u64 },

    /// Query the current state
    Status {
        respond_to: oneshot::Sender<SchedulerStatus>,
    },

    /// Shut down the actor
    Shutdown,
}

/// Actor driving the round timer and state machine
pub struct SchedulerActor {
    dispatcher: Arc<Dispatcher>,
    store: Arc<dyn ProbeStore>,
    command_rx: mpsc::Receiver<SchedulerCommand>,
    state: SchedulerState,
    interval_minutes: u64,
    next_run: Option<DateTime<Utc>>,

    /// Held by the round task for its whole duration; `try_lock` failing
    /// means a round is in flight
    round_gate: Arc<Mutex<()>>,
}

impl SchedulerActor {
    fn new(
        dispatcher: Arc<Dispatcher>,
        store: Arc<dyn ProbeStore>,
        command_rx: mpsc::Receiver<SchedulerCommand>,
    ) -> Self {
        Self {
            dispatcher,
            store,
            command_rx,
            state: SchedulerState::Stopped,
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            next_run: None,
            round_gate: Arc::new(Mutex::new(())),
        }
    }

    fn period(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }

    /// Run the actor's main loop
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting scheduler actor");

        // The ticker always exists; its branch is gated on Running. It is
        // recreated whenever the period changes, with the first tick one
        // full period away (Start triggers its round outside the timer).
        let mut ticker = time::interval_at(Instant::now() + self.period(), self.period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick(), if self.state == SchedulerState::Running => {
                    self.next_run = Some(Utc::now() + chrono::Duration::minutes(self.interval_minutes as i64));
                    self.spawn_round();
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        SchedulerCommand::Start { interval_minutes } => {
                            let interval_minutes = interval_minutes.max(1);
                            info!("starting monitoring with {interval_minutes}-minute interval");

                            self.interval_minutes = interval_minutes;
                            self.state = SchedulerState::Running;
                            ticker = time::interval_at(Instant::now() + self.period(), self.period());
                            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                            self.next_run = Some(Utc::now() + chrono::Duration::minutes(interval_minutes as i64));

                            // First round immediately, without waiting for
                            // the first interval to elapse.
                            self.spawn_round();
                        }

                        SchedulerCommand::Pause => {
                            if self.state == SchedulerState::Running {
                                info!("monitoring paused");
                                self.state = SchedulerState::Paused;
                                self.next_run = None;
                            }
                        }

                        SchedulerCommand::Resume => {
                            if self.state == SchedulerState::Paused {
                                info!("monitoring resumed");
                                self.state = SchedulerState::Running;
                                ticker = time::interval_at(Instant::now() + self.period(), self.period());
                                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                                self.next_run = Some(Utc::now() + chrono::Duration::minutes(self.interval_minutes as i64));
                            }
                        }

                        SchedulerCommand::Stop => {
                            info!("monitoring stopped");
                            self.state = SchedulerState::Stopped;
                            self.next_run = None;
                        }

                        SchedulerCommand::RunNow { respond_to } => {
                            debug!("manual round requested");
                            let started = self.spawn_round();
                            let _ = respond_to.send(started);
                        }

                        SchedulerCommand::UpdateInterval { interval_minutes } => {
                            let interval_minutes = interval_minutes.max(1);
                            info!("probe interval updated to {interval_minutes} minutes");
                            self.interval_minutes = interval_minutes;
                            ticker = time::interval_at(Instant::now() + self.period(), self.period());
                            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                            if self.state == SchedulerState::Running {
                                self.next_run = Some(Utc::now() + chrono::Duration::minutes(interval_minutes as i64));
                            }
                        }

                        SchedulerCommand::Status { respond_to } => {
                            let _ = respond_to.send(SchedulerStatus {
                                state: self.state,
                                next_run: self.next_run,
                                interval_minutes: self.interval_minutes,
                            });
                        }

                        SchedulerCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        debug!("scheduler actor stopped");
    }

    /// Spawn a round task if none is in flight
    ///
    /// Returns whether a round was started. The gate guard moves into the
    /// task and is released when the round finishes, so every trigger in
    /// between is collapsed into a no-op.
    fn spawn_round(&self) -> bool {
        let Ok(guard) = self.round_gate.clone().try_lock_owned() else {
            debug!("probe round already in flight, skipping trigger");
            return false;
        };

        let dispatcher = self.dispatcher.clone();
        let store = self.store.clone();

        tokio::spawn(async move {
            let _guard = guard;
            let started = std::time::Instant::now();

            // A store failure here is fatal to this round only; the
            // scheduler keeps ticking.
            let targets = match store.list_targets().await {
                Ok(targets) => targets,
                Err(e) => {
                    error!("failed to load targets for round: {e}");
                    return;
                }
            };

            let outcomes = dispatcher.run_round(&targets).await;
            let summary = RoundSummary::from_outcomes(&outcomes);

            info!(
                "probe round completed in {:.2}s: {}/{} successful ({}% success rate)",
                started.elapsed().as_secs_f64(),
                summary.successful,
                summary.total,
                summary.success_rate,
            );
            if summary.successful > 0 {
                info!("average response time: {}ms", summary.avg_response_time_ms);
            }
        });

        true
    }
}

/// Handle for controlling the scheduler actor
#[derive(Clone)]
pub struct SchedulerHandle {
    sender: mpsc::Sender<SchedulerCommand>,
}

impl SchedulerHandle {
    /// Spawn the scheduler actor in Stopped state
    pub fn spawn(dispatcher: Arc<Dispatcher>, store: Arc<dyn ProbeStore>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let actor = SchedulerActor::new(dispatcher, store, cmd_rx);

        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Start (or restart with a new interval) periodic monitoring
    pub async fn start(&self, interval_minutes: u64) -> anyhow::Result<()> {
        self.sender
            .send(SchedulerCommand::Start { interval_minutes })
            .await?;
        Ok(())
    }

    pub async fn pause(&self) -> anyhow::Result<()> {
        self.sender.send(SchedulerCommand::Pause).await?;
        Ok(())
    }

    pub async fn resume(&self) -> anyhow::Result<()> {
        self.sender.send(SchedulerCommand::Resume).await?;
        Ok(())
    }

    pub async fn stop(&self) -> anyhow::Result<()> {
        self.sender.send(SchedulerCommand::Stop).await?;
        Ok(())
    }

    /// Trigger one round immediately
    ///
    /// Returns `true` if a round was started, `false` if one was already in
    /// flight and the trigger was skipped.
    pub async fn run_manual(&self) -> anyhow::Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SchedulerCommand::RunNow { respond_to: tx })
            .await?;
        Ok(rx.await?)
    }

    /// Replace the timer period, effective from the next tick
    pub async fn update_interval(&self, interval_minutes: u64) -> anyhow::Result<()> {
        self.sender
            .send(SchedulerCommand::UpdateInterval { interval_minutes })
            .await?;
        Ok(())
    }

    pub async fn status(&self) -> anyhow::Result<SchedulerStatus> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SchedulerCommand::Status { respond_to: tx })
            .await?;
        Ok(rx.await?)
    }

    /// Shut down the scheduler actor
    pub async fn shutdown(self) {
        let _ = self.sender.send(SchedulerCommand::Shutdown).await;
    }
}
