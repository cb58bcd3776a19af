//! HTTP probing - outcome classification and concurrent round dispatch

pub mod dispatcher;
pub mod outcome;

pub use dispatcher::{DEFAULT_CONCURRENCY, DEFAULT_PROBE_TIMEOUT, Dispatcher, RoundSummary};
pub use outcome::{OutcomeKind, ProbeOutcome};
