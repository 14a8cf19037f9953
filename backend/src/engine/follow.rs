//! Follow-set manager.
//!
//! The set starts `Unseeded`. The first truth-feed load that observes any
//! participants seeds it with all of them; after that, loads only prune names
//! that disappeared upstream. Names the user removed are never re-added.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current on-disk layout of [`FollowSetSnapshot`].
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedState {
    Unseeded,
    Seeded,
}

/// Persisted form of the follow set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowSetSnapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub seeded: bool,
    #[serde(default)]
    pub members: BTreeSet<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

/// What a load did to the set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ObserveOutcome {
    /// Still unseeded: the load carried no participants.
    Waiting,
    Seeded { count: usize },
    Pruned { removed: Vec<String> },
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowSet {
    state: SeedState,
    members: BTreeSet<String>,
    dirty: bool,
}

impl Default for FollowSet {
    fn default() -> Self {
        Self::new()
    }
}

impl FollowSet {
    pub fn new() -> Self {
        Self {
            state: SeedState::Unseeded,
            members: BTreeSet::new(),
            dirty: false,
        }
    }

    /// Restore from storage. A stored non-empty set counts as seeded even if
    /// the flag is missing.
    pub fn from_snapshot(snapshot: FollowSetSnapshot) -> Self {
        let state = if snapshot.seeded || !snapshot.members.is_empty() {
            SeedState::Seeded
        } else {
            SeedState::Unseeded
        };
        Self {
            state,
            members: snapshot.members,
            dirty: false,
        }
    }

    pub fn snapshot(&self) -> FollowSetSnapshot {
        FollowSetSnapshot {
            version: SNAPSHOT_VERSION,
            seeded: self.is_seeded(),
            members: self.members.clone(),
            updated_at: Some(Utc::now()),
        }
    }

    pub fn state(&self) -> SeedState {
        self.state
    }

    pub fn is_seeded(&self) -> bool {
        self.state == SeedState::Seeded
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Flag the set for another save, e.g. after a failed write.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn members(&self) -> &BTreeSet<String> {
        &self.members
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains(name)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Apply the participants observed in a successful truth-feed load.
    pub fn observe<'n, I>(&mut self, observed: I) -> ObserveOutcome
    where
        I: IntoIterator<Item = &'n str>,
    {
        let observed: BTreeSet<&str> = observed
            .into_iter()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect();

        match self.state {
            SeedState::Unseeded if observed.is_empty() => ObserveOutcome::Waiting,
            SeedState::Unseeded => {
                self.members = observed.iter().map(|name| name.to_string()).collect();
                self.state = SeedState::Seeded;
                self.dirty = true;
                ObserveOutcome::Seeded {
                    count: self.members.len(),
                }
            }
            SeedState::Seeded => {
                let removed: Vec<String> = self
                    .members
                    .iter()
                    .filter(|name| !observed.contains(name.as_str()))
                    .cloned()
                    .collect();
                if removed.is_empty() {
                    return ObserveOutcome::Unchanged;
                }
                for name in &removed {
                    self.members.remove(name);
                }
                self.dirty = true;
                ObserveOutcome::Pruned { removed }
            }
        }
    }

    /// Flip membership. Returns whether the name is now followed. An explicit
    /// toggle counts as curation, so the set is treated as seeded from here on.
    pub fn toggle(&mut self, name: &str) -> bool {
        let name = name.trim();
        let followed = if self.members.remove(name) {
            false
        } else {
            self.members.insert(name.to_string());
            true
        };
        self.state = SeedState::Seeded;
        self.dirty = true;
        followed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_once_then_prune() {
        let mut follow = FollowSet::new();
        assert_eq!(
            follow.observe(["X", "Y", "Z"]),
            ObserveOutcome::Seeded { count: 3 }
        );
        let expected: BTreeSet<String> = ["X", "Y", "Z"].iter().map(|s| s.to_string()).collect();
        assert_eq!(follow.members(), &expected);

        assert!(!follow.toggle("Y"));
        assert_eq!(
            follow.observe(["X", "Y"]),
            ObserveOutcome::Pruned {
                removed: vec!["Z".to_string()]
            }
        );
        let expected: BTreeSet<String> = ["X".to_string()].into();
        assert_eq!(follow.members(), &expected);
    }

    #[test]
    fn test_empty_first_load_waits() {
        let mut follow = FollowSet::new();
        assert_eq!(follow.observe(Vec::<&str>::new()), ObserveOutcome::Waiting);
        assert!(!follow.is_seeded());
        assert_eq!(follow.observe(["A"]), ObserveOutcome::Seeded { count: 1 });
    }

    #[test]
    fn test_unfollowing_everyone_does_not_reseed() {
        let mut follow = FollowSet::new();
        follow.observe(["A"]);
        follow.toggle("A");
        assert!(follow.is_empty());
        assert_eq!(follow.observe(["A", "B"]), ObserveOutcome::Unchanged);
        assert!(follow.is_empty());
    }

    #[test]
    fn test_toggle_marks_dirty() {
        let mut follow = FollowSet::new();
        assert!(!follow.is_dirty());
        assert!(follow.toggle(" Cassius "));
        assert!(follow.contains("Cassius"));
        assert!(follow.is_dirty());
        follow.mark_clean();
        assert!(!follow.is_dirty());
    }

    #[test]
    fn test_snapshot_round_trip_keeps_seed_flag() {
        let mut follow = FollowSet::new();
        follow.observe(["A", "B"]);
        let restored = FollowSet::from_snapshot(follow.snapshot());
        assert!(restored.is_seeded());
        assert_eq!(restored.members(), follow.members());

        let legacy: FollowSetSnapshot = serde_json::from_str(r#"{"members":["A"]}"#).unwrap();
        assert_eq!(legacy.version, SNAPSHOT_VERSION);
        assert!(FollowSet::from_snapshot(legacy).is_seeded());
    }
}
