mod cli;

use crate::cli::{Cli, LogFormat};
use clap::Parser;
use snaplink_cache::{MokaLinkCache, RedisLinkCache};
use snaplink_gateway::{App, AppState};
use snaplink_service::{LinkEngine, LinkService, RandomCodeGenerator};
use snaplink_storage::PgLinkStore;
use std::sync::Arc;
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

    let store = PgLinkStore::connect(&config.database_url).await?;
    store.migrate().await?;

    let engine: Arc<dyn LinkEngine> = match &config.redis_url {
        Some(redis_url) => {
            info!("using redis cache");
            let cache = RedisLinkCache::connect(redis_url).await?;
            Arc::new(LinkService::new(store, cache, RandomCodeGenerator))
        }
        None => {
            info!("using in-process cache");
            Arc::new(LinkService::new(store, MokaLinkCache::new(), RandomCodeGenerator))
        }
    };

    let state = AppState::new(engine, config.public_base_url);
    let app = App::router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "starting gateway server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("gateway server exited");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
