//! Time-series storage for probe results
//!
//! ## Design
//!
//! - **Trait-based**: `ProbeStore` allows swapping implementations and
//!   mocking the seam in tests
//! - **Async**: all operations are async for compatibility with Tokio
//! - **Append-only**: probe results are inserted as each probe completes
//!   and never mutated or deleted by the core
//!
//! ## Usage
//!
//! ```no_run
//! use url_monitoring::storage::{ProbeStore, sqlite::SqliteStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = SqliteStore::new("./monitoring.db").await?;
//!     let id = store.register_target("https://example.com", "Shops", Some("DE")).await?;
//!     store.record_result(id, Some(200), 42.0, None).await?;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod schema;
pub mod sqlite;

pub use backend::ProbeStore;
pub use error::{StorageError, StorageResult};
pub use schema::{
    CountryStats, GroupStats, OverallStats, ProbeResult, RequestRecord, StatusTree, Target,
    TargetStatus, UNKNOWN_COUNTRY,
};
