//! TinyTunes API server - aggregated YouTube video data for the kids'
//! music channel page
//!
//! Serves `GET /api/videos?channelId=<id>` from a per-channel on-disk
//! snapshot cache, refreshing from the YouTube Data API when the snapshot
//! is older than an hour and falling back to the stale snapshot when the
//! refresh fails.

use clap::Parser;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use tinytunes_server::cache::SnapshotCache;
use tinytunes_server::cli::{Cli, ServerConfig, API_KEY_ENV};
use tinytunes_server::data::YouTubeClient;
use tinytunes_server::server::{router, AppState};

fn init_logging() {
    let filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let cli = Cli::parse();
    let config = ServerConfig::from_cli(&cli)?;

    if config.api_key.is_empty() {
        warn!(
            "no API key configured (--api-key or ${}); refreshes will fail and only cached data can be served",
            API_KEY_ENV
        );
    }

    let state = AppState {
        client: YouTubeClient::new(config.api_key.clone()),
        cache: SnapshotCache::with_dir(config.cache_dir.clone()),
    };

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, cache_dir = %config.cache_dir.display(), "API server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    // Failure here only affects graceful shutdown; the process still
    // terminates when Ctrl+C fires.
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "failed to install Ctrl+C handler");
    }
}
