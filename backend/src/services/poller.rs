//! Periodic feed polling.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::board::{RefreshOutcome, ShowBoard};
use super::feed_client::{FeedClient, FeedError};

/// Fetch both feeds and apply them. On failure the board keeps its current
/// snapshot and the error is recorded and returned.
pub async fn refresh_once(board: &ShowBoard, client: &FeedClient) -> Result<RefreshOutcome, FeedError> {
    match client.fetch_pair().await {
        Ok(pair) => Ok(board.apply_feeds(pair).await),
        Err(e) => {
            board.record_failure(&e);
            Err(e)
        }
    }
}

/// Drives [`refresh_once`] on a fixed interval.
pub struct FeedPoller {
    board: Arc<ShowBoard>,
    client: Arc<FeedClient>,
    interval: Duration,
}

impl FeedPoller {
    pub fn new(board: Arc<ShowBoard>, client: Arc<FeedClient>, interval: Duration) -> Self {
        Self {
            board,
            client,
            interval,
        }
    }

    /// Run until the task is aborted. The first refresh happens one interval
    /// from now. Refresh errors are logged and never end the loop.
    pub async fn run(self) {
        let start = tokio::time::Instant::now() + self.interval;
        let mut ticker = tokio::time::interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Polling feeds every {}s", self.interval.as_secs());

        loop {
            ticker.tick().await;
            match refresh_once(&self.board, &self.client).await {
                Ok(RefreshOutcome::Applied { generation, trips, .. }) => {
                    info!("Applied feed generation {} ({} trips)", generation, trips)
                }
                Ok(RefreshOutcome::Unchanged { .. }) => {}
                Err(e) => warn!("Scheduled refresh failed: {}", e),
            }
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
