//! Follow-set persistence.
//!
//! The engine keeps the follow set in memory. This module mirrors it to a
//! repository so curation survives restarts:
//!
//! - `repository`: the [`FollowSetRepository`] trait and its error type
//! - `repositories::local`: in-memory implementation
//! - `repositories::file`: JSON file implementation
//! - `factory`: builds a repository from configuration or the environment
//! - `checksum`: SHA-256 fingerprints for feed bodies

pub mod checksum;
pub mod factory;
pub mod repositories;
pub mod repository;

pub use checksum::calculate_checksum;
pub use factory::{RepositoryFactory, RepositoryType, DEFAULT_STATE_PATH};
pub use repositories::{JsonFileRepository, LocalRepository};
pub use repository::{ErrorContext, FollowSetRepository, RepositoryError, RepositoryResult};
