//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use showring::config::EngineSettings;
use showring::db::{FollowSetRepository, LocalRepository};
use showring::services::{FeedPair, RawFeed, ShowBoard};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

// =============================================================================
// Feed fixtures
// =============================================================================

/// One trip row in the upstream trips-feed shape.
pub fn trip(class_id: &str, ring: u32, horse: &str, rider: &str, go: &str, oog: u32) -> Value {
    json!({
        "class_id": class_id,
        "ring_number": ring,
        "horseName": horse,
        "riderName": rider,
        "latestGO": go,
        "lastOOG": oog,
    })
}

/// Ring 1 holds group g1 (c1 underway at 8:00, c2 completed at 7:30).
/// Ring 2 holds group g2 (c3 with no scheduled time).
pub fn schedule_rows() -> Vec<Value> {
    vec![
        json!({"ring_number": 1, "ring_name": "Grand Prix Ring", "class_group_id": "g1", "group_name": "Hunters",
               "class_id": "c1", "class_number": 101, "class_name": "Hunter O/F", "latestStart": "8:00 AM", "status": "Underway"}),
        json!({"ring_number": 1, "ring_name": "Grand Prix Ring", "class_group_id": "g1", "group_name": "Hunters",
               "class_id": "c2", "class_number": 100, "class_name": "Hunter U/S", "latestStart": "7:30 AM", "status": "Completed"}),
        json!({"ring_number": 2, "class_group_id": "g2", "group_name": "Jumpers",
               "class_id": "c3", "class_number": 200, "class_name": "1.10m Jumper"}),
    ]
}

/// Cassius rides three times across two classes.
pub fn trip_rows() -> Vec<Value> {
    vec![
        trip("c1", 1, "Cassius", "Ann", "9:00 AM", 2),
        trip("c1", 1, "Cassius", "Ann", "9:00 AM", 1),
        trip("c1", 1, "Dandy", "Bob", "9:05 AM", 3),
        trip("c2", 1, "Cassius", "Ann", "7:40 AM", 1),
        trip("c3", 2, "Echo", "Cal", "9:15 AM", 2),
        trip("c3", 2, "Echo", "Cal", "9:05 AM", 1),
    ]
}

pub fn document(generated_at: Option<&str>, rows: Vec<Value>) -> Value {
    let mut meta = json!({"dt": "2024-05-01", "sid": 4411});
    if let Some(at) = generated_at {
        meta["generated_at"] = json!(at);
    }
    json!({"meta": meta, "records": rows})
}

pub fn raw(name: &str, doc: &Value) -> RawFeed {
    RawFeed::from_bytes(name, doc.to_string().as_bytes()).expect("fixture feed decodes")
}

pub fn feed_pair(generated_at: Option<&str>, trips: Vec<Value>) -> FeedPair {
    FeedPair {
        schedule: raw("schedule", &document(generated_at, schedule_rows())),
        trips: raw("trips", &document(generated_at, trips)),
    }
}

pub fn local_board() -> (Arc<ShowBoard>, LocalRepository) {
    let repo = LocalRepository::new();
    let board = ShowBoard::new(
        &EngineSettings::default(),
        Arc::new(repo.clone()) as Arc<dyn FollowSetRepository>,
    );
    (Arc::new(board), repo)
}
