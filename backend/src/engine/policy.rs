//! Inclusion policy: which trips count.
//!
//! Two independent gates. Scope restricts trips to followed participants;
//! status drops trips in completed classes. The predicate is evaluated fresh
//! on every pass and never cached on a record.

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::hierarchy::HierarchyIndex;
use crate::models::keys::ClassKey;
use crate::models::records::{FollowField, TripRecord};

/// Participant scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum ScopeMode {
    /// Only followed participants.
    Active,
    #[default]
    Full,
}

/// Class status gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum StatusMode {
    /// Hide completed classes.
    Live,
    #[default]
    All,
}

impl ScopeMode {
    /// Unknown input resolves to the least restrictive mode.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Self::Active,
            "FULL" => Self::Full,
            other => {
                log::warn!("Unknown scope mode {:?}, using FULL", other);
                Self::Full
            }
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Full,
            Self::Full => Self::Active,
        }
    }
}

impl StatusMode {
    /// Unknown input resolves to the least restrictive mode.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "LIVE" => Self::Live,
            "ALL" => Self::All,
            other => {
                log::warn!("Unknown status mode {:?}, using ALL", other);
                Self::All
            }
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Live => Self::All,
            Self::All => Self::Live,
        }
    }
}

impl From<String> for ScopeMode {
    fn from(s: String) -> Self {
        Self::parse_lenient(&s)
    }
}

impl From<String> for StatusMode {
    fn from(s: String) -> Self {
        Self::parse_lenient(&s)
    }
}

impl fmt::Display for ScopeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Active => "ACTIVE",
            Self::Full => "FULL",
        })
    }
}

impl fmt::Display for StatusMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Live => "LIVE",
            Self::All => "ALL",
        })
    }
}

/// Both gates together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InclusionPolicy {
    #[serde(rename = "scopeMode", alias = "scope")]
    pub scope: ScopeMode,
    #[serde(rename = "statusMode", alias = "status")]
    pub status: StatusMode,
}

impl InclusionPolicy {
    pub fn new(scope: ScopeMode, status: StatusMode) -> Self {
        Self { scope, status }
    }
}

/// Status labels that mark a class as finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRule {
    pub statuses: Vec<String>,
}

impl Default for CompletionRule {
    fn default() -> Self {
        Self {
            statuses: vec!["Completed".to_string()],
        }
    }
}

impl CompletionRule {
    pub fn is_completed(&self, status: Option<&str>) -> bool {
        status
            .map(str::trim)
            .is_some_and(|s| self.statuses.iter().any(|c| c == s))
    }
}

/// Source of per-class status.
pub trait ClassStatusLookup {
    fn class_status(&self, class_id: &ClassKey) -> Option<&str>;
}

impl ClassStatusLookup for HierarchyIndex<'_> {
    fn class_status(&self, class_id: &ClassKey) -> Option<&str> {
        HierarchyIndex::class_status(self, class_id)
    }
}

impl ClassStatusLookup for HashMap<ClassKey, String> {
    fn class_status(&self, class_id: &ClassKey) -> Option<&str> {
        self.get(class_id).map(String::as_str)
    }
}

/// Whether a trip counts under `policy`.
pub fn included(
    trip: &TripRecord,
    policy: InclusionPolicy,
    follow_set: &BTreeSet<String>,
    follow_field: FollowField,
    statuses: &dyn ClassStatusLookup,
    completion: &CompletionRule,
) -> bool {
    let in_scope = match policy.scope {
        ScopeMode::Full => true,
        ScopeMode::Active => trip
            .identity(follow_field)
            .is_some_and(|name| follow_set.contains(name)),
    };
    if !in_scope {
        return false;
    }

    match policy.status {
        StatusMode::All => true,
        StatusMode::Live => !is_class_completed(trip.class_id.as_ref(), statuses, completion),
    }
}

fn is_class_completed(
    class_id: Option<&ClassKey>,
    statuses: &dyn ClassStatusLookup,
    completion: &CompletionRule,
) -> bool {
    class_id.is_some_and(|id| completion.is_completed(statuses.class_status(id)))
}

/// [`included`] with its collaborators bound once per pass.
pub struct Inclusion<'a> {
    pub policy: InclusionPolicy,
    pub follow_set: &'a BTreeSet<String>,
    pub follow_field: FollowField,
    pub statuses: &'a dyn ClassStatusLookup,
    pub completion: &'a CompletionRule,
}

impl Inclusion<'_> {
    pub fn includes(&self, trip: &TripRecord) -> bool {
        included(
            trip,
            self.policy,
            self.follow_set,
            self.follow_field,
            self.statuses,
            self.completion,
        )
    }

    /// Whether a class is hidden by the status gate.
    pub fn hides_class(&self, class_id: &ClassKey) -> bool {
        self.policy.status == StatusMode::Live
            && is_class_completed(Some(class_id), self.statuses, self.completion)
    }
}
