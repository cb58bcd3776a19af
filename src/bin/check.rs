//! One-shot CI round: probe everything once, report, and exit with a code
//! reflecting critical failures.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};
use url_monitoring::{
    config::{Config, read_config_file},
    probe::Dispatcher,
    registry,
    report::{CriticalityPolicy, RoundReport},
    storage::{ProbeStore, sqlite::SqliteStore},
};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: Option<String>,

    /// CSV file to import targets from before the round
    #[arg(long)]
    import: Option<PathBuf>,

    /// Webhook URL receiving the JSON round report (overrides config)
    #[arg(long)]
    webhook: Option<String>,

    /// Treat every failure as critical, including 4xx responses
    #[arg(long)]
    strict: bool,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("url_monitoring", LevelFilter::DEBUG),
        ("check", LevelFilter::DEBUG),
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
        info!("imported {} targets", imported.len());
    }

    let dispatcher = Dispatcher::new(
        store.clone(),
        Duration::from_secs(config.probe_timeout_secs),
        config.max_concurrent_probes,
    );

    let targets = store.list_targets().await?;
    let outcomes = dispatcher.run_round(&targets).await;

    let policy = if args.strict {
        CriticalityPolicy::strict()
    } else {
        CriticalityPolicy::default()
    };
    let report = RoundReport::new(outcomes, &policy);

    info!(
        "round complete: {}/{} successful ({}% success rate)",
        report.summary.successful, report.summary.total, report.summary.success_rate,
    );
    for failure in &report.non_critical_failures {
        warn!(
            "{}: {}",
            failure.url,
            failure
                .error_message()
                .unwrap_or_else(|| format!("status {}", failure.status_code().unwrap_or_default()))
        );
    }
    for failure in &report.critical_failures {
        error!(
            "{}: {}",
            failure.url,
            failure
                .error_message()
                .unwrap_or_else(|| format!("status {}", failure.status_code().unwrap_or_default()))
        );
    }

    if let Some(webhook_url) = args.webhook.as_ref().or(config.webhook_url.as_ref()) {
        // A broken webhook must not flip the exit code.
        let client = reqwest::Client::new();
        match client.post(webhook_url).json(&report).send().await {
            Ok(response) => info!("webhook notified ({})", response.status()),
            Err(e) => warn!("failed to notify webhook: {e}"),
        }
    }

    store.close().await?;

    let code = report.exit_code();
    if code != 0 {
        error!(
            "{} critical failures, exiting with error code",
            report.critical_failures.len()
        );
        std::process::exit(code);
    }

    Ok(())
}
