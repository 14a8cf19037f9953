//! Repository trait for follow-set persistence.

use async_trait::async_trait;

pub mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

use crate::engine::follow::FollowSetSnapshot;

/// Storage for the user's follow set.
///
/// The in-memory [`FollowSet`](crate::engine::follow::FollowSet) is always
/// authoritative. Implementations only mirror it so a restart picks up the
/// same curation.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait FollowSetRepository: Send + Sync {
    /// Check if the backing store is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if healthy
    /// - `Ok(false)` if unhealthy but no error occurred
    /// - `Err(RepositoryError)` if the check itself failed
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Load the stored follow set.
    ///
    /// # Returns
    /// * `Ok(None)` - Nothing has been stored yet
    /// * `Ok(Some(snapshot))` - The last saved snapshot
    /// * `Err(RepositoryError)` - The store exists but could not be read
    async fn load_follow_set(&self) -> RepositoryResult<Option<FollowSetSnapshot>>;

    /// Replace the stored follow set.
    async fn save_follow_set(&self, snapshot: &FollowSetSnapshot) -> RepositoryResult<()>;
}
