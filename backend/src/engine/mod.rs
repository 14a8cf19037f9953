//! The reconciliation engine.
//!
//! Leaf-first: [`hierarchy`] folds normalized records into a tree and
//! lookups, [`policy`] decides which trips count, [`aggregate`] and
//! [`representative`] derive counts and summary trips, [`peak`] narrows what
//! is displayed, [`follow`] owns the follow set, and [`view`] composes them.

pub mod aggregate;
pub mod follow;
pub mod hierarchy;
pub mod peak;
pub mod policy;
pub mod representative;
pub mod view;

pub use aggregate::{count_included, distinct_included, Aggregates};
pub use follow::{FollowSet, FollowSetSnapshot, ObserveOutcome, SeedState};
pub use hierarchy::{ClassNode, GroupNode, HierarchyIndex, HierarchyStats, RingNode};
pub use peak::{visible, PeakSelection, PeakState, Screen};
pub use policy::{
    included, ClassStatusLookup, CompletionRule, Inclusion, InclusionPolicy, ScopeMode, StatusMode,
};
pub use representative::{best_per_participant, pick_first};
pub use view::{
    ClassEntriesView, ClassView, EntryDetailView, GroupView, HorseView, RiderView, RingView,
    ShowView, ViewInput,
};
