//! Included-trip counts and distinct-participant counts.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::hierarchy::HierarchyIndex;
use super::policy::Inclusion;
use crate::models::records::TripRecord;

/// Number of records that pass the inclusion policy.
pub fn count_included<'t, I>(records: I, inclusion: &Inclusion<'_>) -> usize
where
    I: IntoIterator<Item = &'t TripRecord>,
{
    records
        .into_iter()
        .filter(|trip| inclusion.includes(trip))
        .count()
}

/// Cardinality of a field across included records. Records where the field
/// is absent do not count.
pub fn distinct_included<'t, I, F, K>(records: I, inclusion: &Inclusion<'_>, field: F) -> usize
where
    I: IntoIterator<Item = &'t TripRecord>,
    F: Fn(&'t TripRecord) -> Option<K>,
    K: Ord,
{
    records
        .into_iter()
        .filter(|trip| inclusion.includes(trip))
        .filter_map(field)
        .collect::<BTreeSet<K>>()
        .len()
}

/// Header counts for one view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregates {
    /// Distinct participants (horses) with an included trip.
    pub horses: usize,
    /// Rings with an included trip.
    pub rings: usize,
    /// Distinct classes with an included trip.
    pub classes: usize,
    /// Distinct handlers (riders) with an included trip.
    pub riders: usize,
    /// Groups with an included trip.
    pub groups: usize,
    /// Included trips.
    pub trips: usize,
}

impl Aggregates {
    pub fn compute(index: &HierarchyIndex<'_>, inclusion: &Inclusion<'_>) -> Self {
        let rings = index
            .ring_keys()
            .filter(|ring| count_included(index.trips_for_ring(ring), inclusion) > 0)
            .count();
        let groups = index
            .group_keys()
            .filter(|(ring, group)| count_included(index.trips_for_group(ring, group), inclusion) > 0)
            .count();

        Self {
            horses: distinct_included(index.indexed_trips(), inclusion, |t| {
                t.participant_name.as_deref()
            }),
            rings,
            classes: distinct_included(index.indexed_trips(), inclusion, |t| t.class_id.as_ref()),
            riders: distinct_included(index.indexed_trips(), inclusion, |t| {
                t.handler_name.as_deref()
            }),
            groups,
            trips: count_included(index.indexed_trips(), inclusion),
        }
    }
}
