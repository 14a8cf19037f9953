//! JSON file repository.
//!
//! Stores the follow-set snapshot as pretty-printed JSON. Writes go to a
//! temporary sibling first and are renamed into place, so a crash never
//! leaves a half-written file behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;

use crate::db::repository::{ErrorContext, FollowSetRepository, RepositoryError, RepositoryResult};
use crate::engine::follow::FollowSetSnapshot;

#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "follow_set.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn context(&self, operation: &str) -> ErrorContext {
        ErrorContext::new(operation)
            .with_entity("follow_set")
            .with_entity_id(self.path.display())
    }
}

#[async_trait]
impl FollowSetRepository for JsonFileRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => return Ok(true),
        };
        match tokio::fs::metadata(dir).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(RepositoryError::from(err).with_operation("health_check")),
        }
    }

    async fn load_follow_set(&self) -> RepositoryResult<Option<FollowSetSnapshot>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("No follow set stored at {}", self.path.display());
                return Ok(None);
            }
            Err(err) => {
                return Err(RepositoryError::storage_with_context(
                    err.to_string(),
                    self.context("load_follow_set"),
                ))
            }
        };

        serde_json::from_slice(&bytes).map(Some).map_err(|err| {
            RepositoryError::validation_with_context(
                format!("Invalid follow set file: {}", err),
                self.context("load_follow_set"),
            )
        })
    }

    async fn save_follow_set(&self, snapshot: &FollowSetSnapshot) -> RepositoryResult<()> {
        let body = serde_json::to_vec_pretty(snapshot)
            .map_err(|err| RepositoryError::from(err).with_operation("save_follow_set"))?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await.map_err(|err| {
                RepositoryError::storage_with_context(err.to_string(), self.context("save_follow_set"))
            })?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, &body).await.map_err(|err| {
            RepositoryError::storage_with_context(err.to_string(), self.context("save_follow_set"))
        })?;
        tokio::fs::rename(&temp, &self.path).await.map_err(|err| {
            RepositoryError::storage_with_context(err.to_string(), self.context("save_follow_set"))
        })?;

        debug!(
            "Saved follow set ({} members) to {}",
            snapshot.members.len(),
            self.path.display()
        );
        Ok(())
    }
}
