//! Read-side view builders.
//!
//! Every call rebuilds the hierarchy from the current record sets, applies
//! the inclusion policy fresh, computes counts, and only then applies the
//! peak filter. Nothing here mutates its input.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::aggregate::{count_included, Aggregates};
use super::hierarchy::{ClassNode, GroupNode, HierarchyIndex, HierarchyStats, RingNode};
use super::peak::{visible, PeakSelection, Screen};
use super::policy::{CompletionRule, Inclusion, InclusionPolicy, ScopeMode};
use super::representative::{best_per_participant, cmp_go_order, pick_first};
use crate::models::keys::{ClassKey, GroupKey, RingKey};
use crate::models::records::{FlexNumber, FollowField, ScheduleRecord, TripRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassView {
    pub class_id: ClassKey,
    pub number: Option<FlexNumber>,
    pub label: String,
    pub resolved_time: Option<String>,
    pub resolved_minutes: Option<u32>,
    pub status: Option<String>,
    pub included_count: usize,
    pub total_count: usize,
    pub representative_trip: Option<TripRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupView {
    pub group_id: GroupKey,
    pub label: String,
    pub resolved_time: Option<String>,
    pub resolved_minutes: Option<u32>,
    pub included_count: usize,
    pub classes: Vec<ClassView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingView {
    pub ring_id: RingKey,
    pub label: String,
    pub included_count: usize,
    pub groups: Vec<GroupView>,
}

/// The reconciled hierarchy for one policy and peak selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowView {
    pub policy: InclusionPolicy,
    pub screen: Screen,
    pub rings: Vec<RingView>,
    pub aggregates: Aggregates,
    pub hierarchy: HierarchyStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiderView {
    pub rider: String,
    pub included_count: usize,
    pub horses: Vec<String>,
    pub next_trip: Option<TripRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorseView {
    pub horse: String,
    pub followed: bool,
    pub total_count: usize,
    pub included_count: usize,
    pub riders: Vec<String>,
    pub next_trip: Option<TripRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassEntriesView {
    pub class_id: ClassKey,
    pub label: Option<String>,
    pub ring_id: Option<RingKey>,
    pub resolved_time: Option<String>,
    pub status: Option<String>,
    /// One row per participant: that participant's earliest included trip.
    pub entries: Vec<TripRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDetailView {
    pub class_id: ClassKey,
    pub participant: String,
    pub followed: bool,
    /// Every trip for the pair, by order of go.
    pub trips: Vec<TripRecord>,
}

/// One line of the trainer report: an included trip under its class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerRow {
    /// The class's resolved time.
    pub time: Option<String>,
    pub horse: Option<String>,
    pub rider: Option<String>,
    pub class_id: ClassKey,
    pub class_label: String,
    pub order_of_go: Option<FlexNumber>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerGroup {
    pub group_id: GroupKey,
    pub label: String,
    pub rows: Vec<TrainerRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerRing {
    pub ring_id: RingKey,
    pub label: String,
    pub groups: Vec<TrainerGroup>,
}

/// Minutes since midnight spanned by a timeline, padded around the go-times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineWindow {
    pub start_minutes: u32,
    pub end_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineRing {
    pub ring_id: RingKey,
    pub label: String,
    /// Included trips by go-time, then order of go.
    pub trips: Vec<TripRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineView {
    pub window: Option<TimelineWindow>,
    pub rings: Vec<TimelineRing>,
}

const TIMELINE_LEAD_MINUTES: u32 = 30;
const TIMELINE_TRAIL_MINUTES: u32 = 45;
const MINUTES_PER_DAY: u32 = 24 * 60;

/// Borrowed inputs shared by every view builder.
#[derive(Clone, Copy)]
pub struct ViewInput<'a> {
    pub schedule: &'a [ScheduleRecord],
    pub trips: &'a [TripRecord],
    pub follow_set: &'a BTreeSet<String>,
    pub follow_field: FollowField,
    pub completion: &'a CompletionRule,
}

impl<'a> ViewInput<'a> {
    fn inclusion<'i>(&'i self, policy: InclusionPolicy, index: &'i HierarchyIndex<'a>) -> Inclusion<'i> {
        Inclusion {
            policy,
            follow_set: self.follow_set,
            follow_field: self.follow_field,
            statuses: index,
            completion: self.completion,
        }
    }

    /// The ring/group/class view with header counts.
    ///
    /// `peak` pins rings on [`Screen::Rings`] and groups on
    /// [`Screen::Classes`]; other screens ignore it. Counts never depend on it.
    pub fn get_view(&self, policy: InclusionPolicy, screen: Screen, peak: &PeakSelection) -> ShowView {
        let index = HierarchyIndex::build(self.schedule, self.trips);
        let inclusion = self.inclusion(policy, &index);
        let aggregates = Aggregates::compute(&index, &inclusion);

        let no_pins = PeakSelection::new();
        let (ring_peak, group_peak) = match screen {
            Screen::Rings => (peak, &no_pins),
            Screen::Classes => (&no_pins, peak),
            _ => (&no_pins, &no_pins),
        };

        let rings: Vec<RingView> = index
            .tree
            .iter()
            .map(|ring| ring_view(ring, &index, &inclusion, group_peak))
            .collect();
        let rings = visible(rings, ring_peak, |r| r.ring_id.as_str(), |r| !r.groups.is_empty());

        ShowView {
            policy,
            screen,
            rings,
            aggregates,
            hierarchy: index.stats.clone(),
        }
    }

    /// Riders with an included trip (or pinned), by name.
    pub fn riders(&self, policy: InclusionPolicy, peak: &PeakSelection) -> Vec<RiderView> {
        let index = HierarchyIndex::build(self.schedule, self.trips);
        let inclusion = self.inclusion(policy, &index);

        let riders: Vec<RiderView> = index
            .riders()
            .map(|rider| {
                let included: Vec<&TripRecord> = index
                    .trips_for_rider(rider)
                    .filter(|t| inclusion.includes(t))
                    .collect();
                let horses: BTreeSet<&str> = included
                    .iter()
                    .filter_map(|t| t.participant_name.as_deref())
                    .collect();
                RiderView {
                    rider: rider.to_string(),
                    included_count: included.len(),
                    horses: horses.into_iter().map(str::to_string).collect(),
                    next_trip: included.iter().copied().min_by(|a, b| cmp_go_order(a, b)).cloned(),
                }
            })
            .collect();
        visible(riders, peak, |r| r.rider.as_str(), |r| r.included_count > 0)
    }

    /// Ring → group → rows of included trips, in schedule order. Within a
    /// group, rows follow class order and then go order. Groups and rings
    /// without rows are left out.
    pub fn trainer_report(&self, policy: InclusionPolicy) -> Vec<TrainerRing> {
        let index = HierarchyIndex::build(self.schedule, self.trips);
        let inclusion = self.inclusion(policy, &index);

        index
            .tree
            .iter()
            .filter_map(|ring| {
                let groups: Vec<TrainerGroup> = ring
                    .children
                    .iter()
                    .filter_map(|group| {
                        let rows: Vec<TrainerRow> = group
                            .children
                            .iter()
                            .flat_map(|class| trainer_rows(class, &index, &inclusion))
                            .collect();
                        (!rows.is_empty()).then(|| TrainerGroup {
                            group_id: group.group_id.clone(),
                            label: group.label.clone(),
                            rows,
                        })
                    })
                    .collect();
                (!groups.is_empty()).then(|| TrainerRing {
                    ring_id: ring.ring_id.clone(),
                    label: ring.label.clone(),
                    groups,
                })
            })
            .collect()
    }

    /// Included trips per ring, by go-time, with the padded time window
    /// they span. Rings come from the trips themselves, so a ring missing
    /// from the schedule still appears (labelled `Ring {id}`).
    pub fn timeline(&self, policy: InclusionPolicy) -> TimelineView {
        let index = HierarchyIndex::build(self.schedule, self.trips);
        let inclusion = self.inclusion(policy, &index);

        let mut ring_ids: Vec<&RingKey> = index.ring_keys().collect();
        ring_ids.sort_by(|a, b| a.display_cmp(b));

        let rings: Vec<TimelineRing> = ring_ids
            .into_iter()
            .filter_map(|ring_id| {
                let mut trips: Vec<TripRecord> = index
                    .trips_for_ring(ring_id)
                    .filter(|t| inclusion.includes(t))
                    .cloned()
                    .collect();
                if trips.is_empty() {
                    return None;
                }
                trips.sort_by(cmp_go_order);
                let label = index
                    .tree
                    .iter()
                    .find(|ring| &ring.ring_id == ring_id)
                    .map(|ring| ring.label.clone())
                    .unwrap_or_else(|| format!("Ring {}", ring_id));
                Some(TimelineRing {
                    ring_id: ring_id.clone(),
                    label,
                    trips,
                })
            })
            .collect();

        let go_minutes = || rings.iter().flat_map(|r| r.trips.iter()).filter_map(|t| t.go_minutes);
        let window = go_minutes().min().zip(go_minutes().max()).map(|(first, last)| TimelineWindow {
            start_minutes: first.saturating_sub(TIMELINE_LEAD_MINUTES),
            end_minutes: (last + TIMELINE_TRAIL_MINUTES).min(MINUTES_PER_DAY),
        });

        TimelineView { window, rings }
    }

    /// Every observed participant, optionally narrowed by a case-insensitive
    /// substring search.
    pub fn horses(&self, policy: InclusionPolicy, search: Option<&str>) -> Vec<HorseView> {
        let index = HierarchyIndex::build(self.schedule, self.trips);
        let inclusion = self.inclusion(policy, &index);
        let needle = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        index
            .horses()
            .filter(|horse| {
                needle
                    .as_ref()
                    .map_or(true, |n| horse.to_lowercase().contains(n.as_str()))
            })
            .map(|horse| {
                let all: Vec<&TripRecord> = index.trips_for_horse(horse).collect();
                let included: Vec<&TripRecord> =
                    all.iter().copied().filter(|t| inclusion.includes(t)).collect();
                let riders: BTreeSet<&str> = all
                    .iter()
                    .filter_map(|t| t.handler_name.as_deref())
                    .collect();
                HorseView {
                    horse: horse.to_string(),
                    followed: self.follow_set.contains(horse),
                    total_count: all.len(),
                    included_count: included.len(),
                    riders: riders.into_iter().map(str::to_string).collect(),
                    next_trip: included.iter().copied().min_by(|a, b| cmp_go_order(a, b)).cloned(),
                }
            })
            .collect()
    }

    /// Per-participant entries for one class. `None` when the class is
    /// neither scheduled nor present in the truth feed.
    pub fn class_entries(&self, policy: InclusionPolicy, class_id: &ClassKey) -> Option<ClassEntriesView> {
        let index = HierarchyIndex::build(self.schedule, self.trips);
        let inclusion = self.inclusion(policy, &index);
        let node = index.find_class(class_id);
        let trips: Vec<&TripRecord> = index.trips_for_class(class_id).collect();
        if node.is_none() && trips.is_empty() {
            return None;
        }

        let entries = best_per_participant(trips.iter().copied().filter(|t| inclusion.includes(t)))
            .into_iter()
            .cloned()
            .collect();

        Some(ClassEntriesView {
            class_id: class_id.clone(),
            label: node
                .map(|n| n.label.clone())
                .or_else(|| trips.iter().find_map(|t| t.class_label.clone())),
            ring_id: node
                .map(|n| n.ring_id.clone())
                .or_else(|| trips.iter().find_map(|t| t.ring_id.clone())),
            resolved_time: node.and_then(|n| n.resolved_time.display.clone()),
            status: index.class_status(class_id).map(str::to_string),
            entries,
        })
    }

    /// All trips for one participant in one class, by order of go then go-time.
    pub fn entry_detail(&self, class_id: &ClassKey, participant: &str) -> Option<EntryDetailView> {
        let index = HierarchyIndex::build(self.schedule, self.trips);
        let mut trips: Vec<TripRecord> = index.trips_for_entry(class_id, participant).cloned().collect();
        if trips.is_empty() {
            return None;
        }
        trips.sort_by(|a, b| {
            let oog = |t: &TripRecord| t.order_of_go_value().unwrap_or(f64::INFINITY);
            oog(a).total_cmp(&oog(b)).then_with(|| cmp_go_order(a, b))
        });
        Some(EntryDetailView {
            class_id: class_id.clone(),
            participant: participant.to_string(),
            followed: self.follow_set.contains(participant),
            trips,
        })
    }
}

fn class_view(class: &ClassNode, index: &HierarchyIndex<'_>, inclusion: &Inclusion<'_>) -> Option<ClassView> {
    if inclusion.hides_class(&class.class_id) {
        return None;
    }
    let included: Vec<&TripRecord> = index
        .trips_for_class(&class.class_id)
        .filter(|t| inclusion.includes(t))
        .collect();
    if inclusion.policy.scope == ScopeMode::Active && included.is_empty() {
        return None;
    }

    Some(ClassView {
        class_id: class.class_id.clone(),
        number: class.number.clone(),
        label: class.label.clone(),
        resolved_time: class.resolved_time.display.clone(),
        resolved_minutes: class.resolved_time.minutes,
        status: class.status.clone(),
        included_count: included.len(),
        total_count: index.trips_for_class(&class.class_id).count(),
        representative_trip: pick_first(included.iter().copied()).cloned(),
    })
}

fn trainer_rows(class: &ClassNode, index: &HierarchyIndex<'_>, inclusion: &Inclusion<'_>) -> Vec<TrainerRow> {
    let mut trips: Vec<&TripRecord> = index
        .trips_for_class(&class.class_id)
        .filter(|t| inclusion.includes(t))
        .collect();
    trips.sort_by(|a, b| cmp_go_order(a, b));
    trips
        .into_iter()
        .map(|trip| TrainerRow {
            time: class.resolved_time.display.clone(),
            horse: trip.participant_name.clone(),
            rider: trip.handler_name.clone(),
            class_id: class.class_id.clone(),
            class_label: class.label.clone(),
            order_of_go: trip.order_of_go.clone(),
        })
        .collect()
}

fn group_view(group: &GroupNode, index: &HierarchyIndex<'_>, inclusion: &Inclusion<'_>) -> GroupView {
    let classes: Vec<ClassView> = group
        .children
        .iter()
        .filter_map(|class| class_view(class, index, inclusion))
        .collect();
    let included_count = count_included(index.trips_for_group(&group.ring_id, &group.group_id), inclusion);

    GroupView {
        group_id: group.group_id.clone(),
        label: group.label.clone(),
        resolved_time: group.resolved_time.display.clone(),
        resolved_minutes: group.resolved_time.minutes,
        included_count,
        classes,
    }
}

fn ring_view(
    ring: &RingNode,
    index: &HierarchyIndex<'_>,
    inclusion: &Inclusion<'_>,
    group_peak: &PeakSelection,
) -> RingView {
    let groups: Vec<GroupView> = ring
        .children
        .iter()
        .map(|group| group_view(group, index, inclusion))
        .collect();
    let groups = visible(groups, group_peak, |g| g.group_id.as_str(), |g| !g.classes.is_empty());

    RingView {
        ring_id: ring.ring_id.clone(),
        label: ring.label.clone(),
        included_count: count_included(index.trips_for_ring(&ring.ring_id), inclusion),
        groups,
    }
}

#[cfg(test)]
#[path = "view_tests.rs"]
mod view_tests;
