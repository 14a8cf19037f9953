//! Bounded history of feed refresh attempts.
//!
//! Every poll or on-demand refresh leaves one entry here so the diagnostics
//! view can show when data last changed and why a refresh was skipped.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshStatus {
    /// A new pair was swapped in.
    Applied,
    /// Both feeds carried the markers already applied.
    Unchanged,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshEntry {
    pub timestamp: DateTime<Utc>,
    pub status: RefreshStatus,
    pub message: String,
}

/// In-memory refresh log, newest entry last.
#[derive(Clone)]
pub struct RefreshLog {
    entries: Arc<RwLock<VecDeque<RefreshEntry>>>,
    capacity: usize,
}

impl Default for RefreshLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RefreshLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&self, status: RefreshStatus, message: impl Into<String>) {
        let mut entries = self.entries.write();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(RefreshEntry {
            timestamp: Utc::now(),
            status,
            message: message.into(),
        });
    }

    pub fn entries(&self) -> Vec<RefreshEntry> {
        self.entries.read().iter().cloned().collect()
    }

    pub fn last(&self) -> Option<RefreshEntry> {
        self.entries.read().back().cloned()
    }

    pub fn last_with(&self, status: RefreshStatus) -> Option<RefreshEntry> {
        self.entries
            .read()
            .iter()
            .rev()
            .find(|e| e.status == status)
            .cloned()
    }
}
