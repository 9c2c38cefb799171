mod cli;

use crate::cli::{Cli, LogFormat};
use clap::Parser;
use snaplink_storage::PgLinkStore;
use snaplink_sweeper::{Sweeper, SweeperSettings};
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match format {
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::try_parse()?;
    init_tracing(config.log_format);

    info!(
        interval_secs = config.interval_secs,
        batch_size = config.batch_size,
        retention_hours = config.retention_hours,
        "starting snaplink sweeper worker"
    );

    let store = PgLinkStore::connect(&config.database_url).await?;

    let settings = SweeperSettings::builder()
        .interval(Duration::from_secs(config.interval_secs))
        .batch_size(config.batch_size)
        .cycle_timeout(Duration::from_secs(config.cycle_timeout_secs))
        .retention(Duration::from_secs(config.retention_hours * 60 * 60))
        .build();
    let sweeper = Sweeper::new(store, settings);

    let (stop_tx, stop_rx) = watch::channel(false);
    let worker = tokio::spawn(async move { sweeper.run(stop_rx).await });

    tokio::signal::ctrl_c().await?;
    info!("shutting down sweeper worker");

    let _ = stop_tx.send(true);
    worker.await?;

    info!("sweeper worker exited");
    Ok(())
}
