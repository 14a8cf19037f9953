//! In-memory local repository implementation.
//!
//! Keeps the follow-set snapshot in memory. Used for unit tests and for
//! deployments that do not need curation to survive a restart.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::db::repository::{ErrorContext, FollowSetRepository, RepositoryError, RepositoryResult};
use crate::engine::follow::FollowSetSnapshot;

/// In-memory local repository.
///
/// # Example
/// ```ignore
/// use showring::db::repositories::LocalRepository;
/// use showring::db::FollowSetRepository;
///
/// #[tokio::test]
/// async fn test_follow_set_storage() {
///     let repo = LocalRepository::new();
///     assert!(repo.load_follow_set().await.unwrap().is_none());
/// }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    follow_set: Option<FollowSetSnapshot>,
    saves: usize,
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            follow_set: None,
            saves: 0,
            is_healthy: true,
        }
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Create a repository pre-populated with a snapshot.
    pub fn with_snapshot(snapshot: FollowSetSnapshot) -> Self {
        let repo = Self::new();
        repo.data.write().follow_set = Some(snapshot);
        repo
    }

    /// Set the health status for testing storage failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Number of successful saves since creation.
    pub fn save_count(&self) -> usize {
        self.data.read().saves
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        data.follow_set = None;
        data.saves = 0;
    }

    fn check_health(&self, operation: &str) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::storage_with_context(
                "Local repository is not healthy",
                ErrorContext::new(operation).with_entity("follow_set"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl FollowSetRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn load_follow_set(&self) -> RepositoryResult<Option<FollowSetSnapshot>> {
        self.check_health("load_follow_set")?;
        Ok(self.data.read().follow_set.clone())
    }

    async fn save_follow_set(&self, snapshot: &FollowSetSnapshot) -> RepositoryResult<()> {
        self.check_health("save_follow_set")?;
        let mut data = self.data.write();
        data.follow_set = Some(snapshot.clone());
        data.saves += 1;
        Ok(())
    }
}
