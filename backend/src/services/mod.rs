//! Service layer: the live board and the machinery that keeps it fed.

pub mod board;
pub mod feed_client;
pub mod poller;
pub mod refresh_log;

pub use board::{
    BoardState, BoardView, Diagnostics, FeedSnapshot, FollowToggle, PeakToggle, RefreshOutcome,
    ShowBoard, ViewRequest,
};
pub use feed_client::{FeedClient, FeedError, FeedPair, FeedSource, RawFeed};
pub use poller::{refresh_once, FeedPoller};
pub use refresh_log::{RefreshEntry, RefreshLog, RefreshStatus};
