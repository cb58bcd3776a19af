use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{debug, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};
use url_monitoring::{
    config::{Config, read_config_file},
    probe::Dispatcher,
    registry,
    scheduler::SchedulerHandle,
    storage::{ProbeStore, sqlite::SqliteStore},
};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: Option<String>,

    /// CSV file to import targets from before starting (overrides config)
    #[arg(long)]
    import: Option<PathBuf>,

    /// Interval between probe rounds in minutes (overrides config)
    #[arg(long)]
    interval: Option<u64>,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("url_monitoring", LevelFilter::TRACE),
        ("hub", LevelFilter::TRACE),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = match &args.file {
        Some(path) => read_config_file(path)?,
        None => Config::default(),
    };

    let store: Arc<dyn ProbeStore> = Arc::new(SqliteStore::new(&config.db_path).await?);

    if let Some(csv_path) = args.import.as_ref().or(config.csv_path.as_ref()) {
        let imported = registry::import_csv(store.as_ref(), csv_path).await?;
        info!("imported {} targets from {}", imported.len(), csv_path.display());
    }

    let dispatcher = Arc::new(Dispatcher::new(
        store.clone(),
        Duration::from_secs(config.probe_timeout_secs),
        config.max_concurrent_probes,
    ));

    let scheduler = SchedulerHandle::spawn(dispatcher, store.clone());
    let interval = args.interval.unwrap_or(config.interval_minutes);
    scheduler.start(interval).await?;

    tokio::signal::ctrl_c().await?;
    debug!("received ctrl-c, shutting down");

    scheduler.stop().await?;
    scheduler.shutdown().await;
    store.close().await?;

    Ok(())
}
