//! Repository implementations module.
//!
//! - `local`: in-memory implementation for unit testing and ephemeral runs
//! - `file`: JSON file implementation that survives restarts

pub mod file;
pub mod local;

pub use file::JsonFileRepository;
pub use local::LocalRepository;
