//! Peak filter: a per-screen pinned subset of nodes.
//!
//! Pinning narrows which nodes a caller iterates. It never changes counts.
//! Selections belong to a screen and are cleared when the user navigates
//! away from that screen.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Top-level screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    /// Follow-set management.
    Horses,
    #[default]
    Rings,
    /// Groups of classes.
    Classes,
    Riders,
    Summary,
}

impl Screen {
    pub const ALL: [Screen; 5] = [
        Screen::Horses,
        Screen::Rings,
        Screen::Classes,
        Screen::Riders,
        Screen::Summary,
    ];

    /// Screens whose nodes can be pinned.
    pub fn supports_peak(self) -> bool {
        matches!(self, Screen::Rings | Screen::Classes | Screen::Riders)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Screen::Horses => "horses",
            Screen::Rings => "rings",
            Screen::Classes => "classes",
            Screen::Riders => "riders",
            Screen::Summary => "summary",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Screen {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "horses" | "state" => Ok(Screen::Horses),
            "rings" => Ok(Screen::Rings),
            "classes" | "groups" => Ok(Screen::Classes),
            "riders" => Ok(Screen::Riders),
            "summary" => Ok(Screen::Summary),
            _ => Err(format!("Unknown screen: {}", s)),
        }
    }
}

/// Pinned node keys for one screen. Empty means nothing is pinned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeakSelection(BTreeSet<String>);

impl PeakSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    /// Add the key if absent, remove it if present. Returns whether it is now pinned.
    pub fn toggle(&mut self, key: impl Into<String>) -> bool {
        let key = key.into();
        if self.0.remove(&key) {
            false
        } else {
            self.0.insert(key);
            true
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Whether a node passes: pinned nodes always pass; with nothing pinned,
    /// `passes_inclusion` decides.
    pub fn admits(&self, key: &str, passes_inclusion: bool) -> bool {
        if self.is_empty() {
            passes_inclusion
        } else {
            self.contains(key)
        }
    }
}

impl<S: Into<String>> FromIterator<S> for PeakSelection {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Keep the nodes of `nodes` whose key is selected. With nothing selected,
/// keep the nodes that pass inclusion. Order is preserved.
pub fn visible<T, K, P>(nodes: Vec<T>, selection: &PeakSelection, key: K, passes_inclusion: P) -> Vec<T>
where
    K: Fn(&T) -> &str,
    P: Fn(&T) -> bool,
{
    nodes
        .into_iter()
        .filter(|node| selection.admits(key(node), passes_inclusion(node)))
        .collect()
}

/// Current screen and each screen's selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakState {
    current: Screen,
    selections: BTreeMap<Screen, PeakSelection>,
}

impl PeakState {
    pub fn new(current: Screen) -> Self {
        Self {
            current,
            selections: BTreeMap::new(),
        }
    }

    pub fn current(&self) -> Screen {
        self.current
    }

    pub fn selection(&self, screen: Screen) -> PeakSelection {
        self.selections.get(&screen).cloned().unwrap_or_default()
    }

    /// Toggle a pin on `screen`. Screens without pinning ignore the call.
    pub fn toggle(&mut self, screen: Screen, key: impl Into<String>) -> bool {
        if !screen.supports_peak() {
            return false;
        }
        let selection = self.selections.entry(screen).or_default();
        let pinned = selection.toggle(key);
        if selection.is_empty() {
            self.selections.remove(&screen);
        }
        pinned
    }

    /// Switch screens. Leaving a screen clears its selection.
    pub fn navigate(&mut self, screen: Screen) {
        if screen != self.current {
            self.selections.remove(&self.current);
            self.current = screen;
        }
    }
}
