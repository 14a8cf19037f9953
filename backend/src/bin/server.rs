//! showring HTTP server binary.
//!
//! Loads configuration, restores the follow set, performs an initial feed
//! refresh, starts the poller, and serves the REST API.
//!
//! # Usage
//!
//! ```bash
//! SHOWRING_SCHEDULE_URL=https://feeds.example/schedule.json \
//! SHOWRING_TRIPS_URL=https://feeds.example/trips.json \
//!   cargo run --bin showring-server
//! ```
//!
//! # Environment Variables
//!
//! - `SHOWRING_SCHEDULE_URL`, `SHOWRING_TRIPS_URL`: feed sources (URL or path)
//! - `SHOWRING_REFRESH_SECS`: poll interval (default: 480)
//! - `REPOSITORY_TYPE`: `local` or `file`
//! - `SHOWRING_STATE_PATH`: follow-set file for the file repository
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use showring::config::AppConfig;
use showring::db::RepositoryFactory;
use showring::http::{create_router, AppState};
use showring::services::{refresh_once, FeedClient, FeedPoller, ShowBoard};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting showring server");

    let config = AppConfig::load()?;

    let repository = RepositoryFactory::from_settings(&config.repository)?;
    let board = Arc::new(ShowBoard::new(&config.engine, Arc::clone(&repository)));
    board.restore_follow_set().await;

    let feeds = if config.feeds.is_configured() {
        Some(Arc::new(FeedClient::new(&config.feeds)?))
    } else {
        warn!("No feed sources configured; serving an empty board");
        None
    };

    let poller = match &feeds {
        Some(client) => {
            if let Err(e) = refresh_once(&board, client).await {
                warn!("Initial feed refresh failed: {}", e);
            }
            let poller = FeedPoller::new(
                Arc::clone(&board),
                Arc::clone(client),
                config.feeds.refresh_interval(),
            );
            Some(poller.spawn())
        }
        None => None,
    };

    let state = AppState::new(board, repository, feeds);
    let app = create_router(state);

    let addr: SocketAddr = config.server.bind_address().parse()?;
    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    if let Some(handle) = poller {
        handle.abort();
    }
    Ok(())
}
