//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FollowSetRepository;
use crate::services::board::ShowBoard;
use crate::services::feed_client::FeedClient;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub board: Arc<ShowBoard>,
    /// Follow-set storage, probed by `/health`.
    pub repository: Arc<dyn FollowSetRepository>,
    /// `None` when no feed sources are configured; `/v1/refresh` then fails.
    pub feeds: Option<Arc<FeedClient>>,
}

impl AppState {
    pub fn new(
        board: Arc<ShowBoard>,
        repository: Arc<dyn FollowSetRepository>,
        feeds: Option<Arc<FeedClient>>,
    ) -> Self {
        Self {
            board,
            repository,
            feeds,
        }
    }
}
