//! Repository factory for dependency injection.
//!
//! Creates follow-set repositories from runtime configuration.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use log::info;

use super::repositories::{JsonFileRepository, LocalRepository};
use super::repository::{FollowSetRepository, RepositoryError, RepositoryResult};
use crate::config::RepositorySettings;

/// Default location of the JSON follow-set file.
pub const DEFAULT_STATE_PATH: &str = "data/follow_set.json";

/// Repository type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepositoryType {
    /// In-memory local repository
    #[default]
    Local,
    /// JSON file on disk
    File,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Parse repository type from string ("local", "file").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "memory" => Ok(Self::Local),
            "file" | "json" => Ok(Self::File),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// Get repository type from environment variable.
    ///
    /// Reads `REPOSITORY_TYPE`. Defaults to `File` when `SHOWRING_STATE_PATH`
    /// is set, otherwise `Local`.
    pub fn from_env() -> Self {
        if let Ok(val) = std::env::var("REPOSITORY_TYPE") {
            return val.parse().unwrap_or(Self::Local);
        }

        if std::env::var("SHOWRING_STATE_PATH").is_ok() {
            Self::File
        } else {
            Self::Local
        }
    }
}

/// Repository factory for creating repository instances.
///
/// # Example
/// ```ignore
/// use showring::db::{RepositoryFactory, RepositoryType};
///
/// let repo = RepositoryFactory::create(RepositoryType::File, Some("data/follow.json".as_ref()))?;
/// let local = RepositoryFactory::create_local();
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository instance based on type.
    ///
    /// `path` is used by the file repository; [`DEFAULT_STATE_PATH`] applies
    /// when it is `None`.
    pub fn create(
        repo_type: RepositoryType,
        path: Option<&Path>,
    ) -> RepositoryResult<Arc<dyn FollowSetRepository>> {
        match repo_type {
            RepositoryType::Local => Ok(Self::create_local()),
            RepositoryType::File => {
                let path = path
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH));
                if path.as_os_str().is_empty() {
                    return Err(RepositoryError::configuration(
                        "File repository requires a non-empty path",
                    ));
                }
                Ok(Self::create_file(path))
            }
        }
    }

    /// Create an in-memory local repository.
    pub fn create_local() -> Arc<dyn FollowSetRepository> {
        Arc::new(LocalRepository::new())
    }

    /// Create a JSON file repository.
    pub fn create_file(path: impl Into<PathBuf>) -> Arc<dyn FollowSetRepository> {
        Arc::new(JsonFileRepository::new(path))
    }

    /// Create repository from environment configuration.
    ///
    /// Reads `REPOSITORY_TYPE` and `SHOWRING_STATE_PATH`.
    pub fn from_env() -> RepositoryResult<Arc<dyn FollowSetRepository>> {
        let repo_type = RepositoryType::from_env();
        let path = std::env::var("SHOWRING_STATE_PATH").ok().map(PathBuf::from);
        Self::create(repo_type, path.as_deref())
    }

    /// Create repository from the `[repository]` configuration section.
    pub fn from_settings(
        settings: &RepositorySettings,
    ) -> RepositoryResult<Arc<dyn FollowSetRepository>> {
        let repo_type = settings.repository_type().map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })?;
        info!("Using {:?} follow-set repository", repo_type);
        Self::create(repo_type, settings.path.as_deref())
    }
}
