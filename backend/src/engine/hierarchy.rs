//! Ring → Group → Class tree plus flat trip lookups.
//!
//! The tree comes from schedule rows only. Trip lookups are built from the
//! full, unfiltered trip set so every consumer can apply its own inclusion
//! policy to the same build.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::models::keys::{ClassKey, GroupKey, RingKey};
use crate::models::records::{cmp_nulls_last, FlexNumber, ScheduleRecord, TripRecord};
use crate::models::time::{parse_clock, resolve_with_minutes, ResolvedTime};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassNode {
    pub class_id: ClassKey,
    pub ring_id: RingKey,
    pub group_id: GroupKey,
    pub number: Option<FlexNumber>,
    pub label: String,
    pub sequence: Option<FlexNumber>,
    pub scheduled_time: Option<String>,
    pub resolved_time: ResolvedTime,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupNode {
    pub group_id: GroupKey,
    pub ring_id: RingKey,
    pub label: String,
    pub resolved_time: ResolvedTime,
    /// Lowest declared sequence among the group's classes.
    pub sequence: Option<FlexNumber>,
    /// Lowest class number among the group's classes.
    pub number: Option<FlexNumber>,
    pub children: Vec<ClassNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingNode {
    pub ring_id: RingKey,
    pub label: String,
    pub children: Vec<GroupNode>,
}

/// Rows the builder could not place, and disagreements it resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyStats {
    pub schedule_rows: usize,
    pub schedule_dropped: usize,
    pub duplicate_classes: usize,
    pub class_conflicts: usize,
    pub trips: usize,
    pub trips_dropped: usize,
    pub trips_backfilled: usize,
    pub ring_disagreements: usize,
    pub orphan_trip_classes: usize,
}

fn min_flex(a: Option<FlexNumber>, b: Option<&FlexNumber>) -> Option<FlexNumber> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if b.display_cmp(&a) == Ordering::Less { b.clone() } else { a }),
        (None, Some(b)) => Some(b.clone()),
        (a, None) => a,
    }
}

fn cmp_flex(a: Option<&FlexNumber>, b: Option<&FlexNumber>) -> Ordering {
    cmp_nulls_last(a, b, |a, b| a.display_cmp(b))
}

fn cmp_time(a: &ResolvedTime, b: &ResolvedTime) -> Ordering {
    cmp_nulls_last(a.minutes.as_ref(), b.minutes.as_ref(), |a, b| a.cmp(b))
}

/// Class order: resolved time, declared sequence, class number, label.
pub fn cmp_classes(a: &ClassNode, b: &ClassNode) -> Ordering {
    cmp_time(&a.resolved_time, &b.resolved_time)
        .then_with(|| cmp_flex(a.sequence.as_ref(), b.sequence.as_ref()))
        .then_with(|| cmp_flex(a.number.as_ref(), b.number.as_ref()))
        .then_with(|| a.label.cmp(&b.label))
}

/// Group order: the class cascade applied with group-level values.
pub fn cmp_groups(a: &GroupNode, b: &GroupNode) -> Ordering {
    cmp_time(&a.resolved_time, &b.resolved_time)
        .then_with(|| cmp_flex(a.sequence.as_ref(), b.sequence.as_ref()))
        .then_with(|| cmp_flex(a.number.as_ref(), b.number.as_ref()))
        .then_with(|| a.label.cmp(&b.label))
}

struct GroupAcc {
    label: String,
    classes: Vec<ScheduleRecord>,
}

struct RingAcc {
    label: String,
    groups: BTreeMap<GroupKey, GroupAcc>,
}

/// The built tree and lookups over one trip set.
#[derive(Debug, Clone)]
pub struct HierarchyIndex<'a> {
    trips: &'a [TripRecord],
    pub tree: Vec<RingNode>,
    pub stats: HierarchyStats,
    by_ring: BTreeMap<RingKey, Vec<usize>>,
    by_group: BTreeMap<(RingKey, GroupKey), Vec<usize>>,
    by_class: BTreeMap<ClassKey, Vec<usize>>,
    by_rider: BTreeMap<String, Vec<usize>>,
    by_horse: BTreeMap<String, Vec<usize>>,
    by_entry: BTreeMap<(ClassKey, String), Vec<usize>>,
    class_status: HashMap<ClassKey, String>,
    warnings: Vec<String>,
}

impl<'a> HierarchyIndex<'a> {
    /// Build the tree and lookups. Never fails: unplaceable rows are dropped
    /// and counted in [`HierarchyStats`].
    pub fn build(schedule: &[ScheduleRecord], trips: &'a [TripRecord]) -> Self {
        let mut stats = HierarchyStats {
            schedule_rows: schedule.len(),
            trips: trips.len(),
            ..Default::default()
        };
        let mut warnings = Vec::new();

        // Class placement from the schedule; the first placement of a class wins.
        let mut placement: HashMap<&ClassKey, (&RingKey, &GroupKey)> = HashMap::new();
        let mut rings: BTreeMap<RingKey, RingAcc> = BTreeMap::new();
        let mut class_status: HashMap<ClassKey, String> = HashMap::new();

        for row in schedule {
            let (Some(ring_id), Some(group_id), Some(class_id)) =
                (row.ring_id.as_ref(), row.group_id.as_ref(), row.class_id.as_ref())
            else {
                stats.schedule_dropped += 1;
                continue;
            };

            if let Some((ring, group)) = placement.get(class_id) {
                if *ring == ring_id && *group == group_id {
                    stats.duplicate_classes += 1;
                } else {
                    stats.class_conflicts += 1;
                    warnings.push(format!(
                        "class {} placed in ring {} group {} and again in ring {} group {}; keeping the first",
                        class_id, ring, group, ring_id, group_id
                    ));
                }
                continue;
            }
            placement.insert(class_id, (ring_id, group_id));

            if let Some(status) = &row.status {
                class_status.insert(class_id.clone(), status.clone());
            }

            let ring = rings.entry(ring_id.clone()).or_insert_with(|| RingAcc {
                label: row.ring_label.clone(),
                groups: BTreeMap::new(),
            });
            ring.groups
                .entry(group_id.clone())
                .or_insert_with(|| GroupAcc {
                    label: row.group_label.clone(),
                    classes: Vec::new(),
                })
                .classes
                .push(row.clone());
        }

        let mut index = Self {
            trips,
            tree: Vec::new(),
            stats,
            by_ring: BTreeMap::new(),
            by_group: BTreeMap::new(),
            by_class: BTreeMap::new(),
            by_rider: BTreeMap::new(),
            by_horse: BTreeMap::new(),
            by_entry: BTreeMap::new(),
            class_status,
            warnings,
        };

        for (i, trip) in trips.iter().enumerate() {
            let Some(class_id) = trip.class_id.as_ref() else {
                index.stats.trips_dropped += 1;
                continue;
            };
            let placed = placement.get(class_id);

            let ring_id = match (trip.ring_id.as_ref(), placed) {
                (Some(own), Some((scheduled, _))) => {
                    if own != *scheduled {
                        index.stats.ring_disagreements += 1;
                    }
                    Some(own)
                }
                (Some(own), None) => Some(own),
                (None, Some((scheduled, _))) => {
                    index.stats.trips_backfilled += 1;
                    Some(*scheduled)
                }
                (None, None) => None,
            };
            let group_id = trip
                .group_id
                .as_ref()
                .or_else(|| placed.map(|(_, group)| *group));

            if let Some(ring_id) = ring_id {
                index.by_ring.entry(ring_id.clone()).or_default().push(i);
            }
            // Group ids repeat across rings, so groups are bucketed per ring.
            if let (Some(ring_id), Some(group_id)) = (ring_id, group_id) {
                index
                    .by_group
                    .entry((ring_id.clone(), group_id.clone()))
                    .or_default()
                    .push(i);
            }
            index.by_class.entry(class_id.clone()).or_default().push(i);
            if let Some(rider) = &trip.handler_name {
                index.by_rider.entry(rider.clone()).or_default().push(i);
            }
            if let Some(horse) = &trip.participant_name {
                index.by_horse.entry(horse.clone()).or_default().push(i);
                index
                    .by_entry
                    .entry((class_id.clone(), horse.clone()))
                    .or_default()
                    .push(i);
            }
            if let Some(status) = &trip.status {
                index
                    .class_status
                    .entry(class_id.clone())
                    .or_insert_with(|| status.clone());
            }
        }

        index.stats.orphan_trip_classes = index
            .by_class
            .keys()
            .filter(|class_id| !placement.contains_key(class_id))
            .count();

        index.tree = index.fold_tree(rings);
        index
    }

    fn go_minutes(&self, class_id: &ClassKey) -> impl Iterator<Item = u32> + '_ {
        self.trips_for_class(class_id).filter_map(|t| t.go_minutes)
    }

    fn fold_tree(&self, rings: BTreeMap<RingKey, RingAcc>) -> Vec<RingNode> {
        let mut tree: Vec<RingNode> = rings
            .into_iter()
            .map(|(ring_id, ring)| {
                let mut groups: Vec<GroupNode> = ring
                    .groups
                    .into_iter()
                    .map(|(group_id, group)| self.fold_group(&ring_id, group_id, group))
                    .collect();
                groups.sort_by(cmp_groups);
                RingNode {
                    ring_id,
                    label: ring.label,
                    children: groups,
                }
            })
            .collect();
        tree.sort_by(|a, b| a.ring_id.display_cmp(&b.ring_id));
        tree
    }

    fn fold_group(&self, ring_id: &RingKey, group_id: GroupKey, group: GroupAcc) -> GroupNode {
        let mut children: Vec<ClassNode> = group
            .classes
            .into_iter()
            .filter_map(|row| {
                let class_id = row.class_id?;
                let resolved_time =
                    resolve_with_minutes(row.scheduled_time.as_deref(), self.go_minutes(&class_id));
                Some(ClassNode {
                    status: self.class_status.get(&class_id).cloned(),
                    ring_id: ring_id.clone(),
                    group_id: group_id.clone(),
                    number: row.class_number,
                    label: row.class_label,
                    sequence: row.sequence,
                    scheduled_time: row.scheduled_time,
                    resolved_time,
                    class_id,
                })
            })
            .collect();
        children.sort_by(cmp_classes);

        // Earliest explicit schedule time among the classes, else earliest go-time.
        let explicit = children
            .iter()
            .filter(|c| c.scheduled_time.as_deref().and_then(parse_clock).is_some())
            .min_by(|a, b| cmp_time(&a.resolved_time, &b.resolved_time))
            .and_then(|c| c.scheduled_time.clone());
        let candidates: Vec<u32> = children
            .iter()
            .flat_map(|c| self.go_minutes(&c.class_id))
            .collect();
        let resolved_time = resolve_with_minutes(explicit.as_deref(), candidates);

        let sequence = children
            .iter()
            .fold(None, |acc, c| min_flex(acc, c.sequence.as_ref()));
        let number = children
            .iter()
            .fold(None, |acc, c| min_flex(acc, c.number.as_ref()));

        GroupNode {
            group_id,
            ring_id: ring_id.clone(),
            label: group.label,
            resolved_time,
            sequence,
            number,
            children,
        }
    }

    fn collect<'s>(&'s self, ids: Option<&'s Vec<usize>>) -> impl Iterator<Item = &'a TripRecord> + 's {
        let trips = self.trips;
        ids.into_iter().flatten().map(move |&i| &trips[i])
    }

    pub fn trips(&self) -> &'a [TripRecord] {
        self.trips
    }

    /// Trips that belong to some class.
    pub fn indexed_trips(&self) -> impl Iterator<Item = &'a TripRecord> + '_ {
        let trips = self.trips;
        self.by_class.values().flatten().map(move |&i| &trips[i])
    }

    pub fn trips_for_ring(&self, ring_id: &RingKey) -> impl Iterator<Item = &'a TripRecord> + '_ {
        self.collect(self.by_ring.get(ring_id))
    }

    pub fn trips_for_group(
        &self,
        ring_id: &RingKey,
        group_id: &GroupKey,
    ) -> impl Iterator<Item = &'a TripRecord> + '_ {
        self.collect(self.by_group.get(&(ring_id.clone(), group_id.clone())))
    }

    pub fn trips_for_class(&self, class_id: &ClassKey) -> impl Iterator<Item = &'a TripRecord> + '_ {
        self.collect(self.by_class.get(class_id))
    }

    pub fn trips_for_rider(&self, rider: &str) -> impl Iterator<Item = &'a TripRecord> + '_ {
        self.collect(self.by_rider.get(rider))
    }

    pub fn trips_for_horse(&self, horse: &str) -> impl Iterator<Item = &'a TripRecord> + '_ {
        self.collect(self.by_horse.get(horse))
    }

    pub fn trips_for_entry(&self, class_id: &ClassKey, horse: &str) -> impl Iterator<Item = &'a TripRecord> + '_ {
        self.collect(self.by_entry.get(&(class_id.clone(), horse.to_string())))
    }

    /// Ring keys that have at least one trip bucketed under them.
    pub fn ring_keys(&self) -> impl Iterator<Item = &RingKey> + '_ {
        self.by_ring.keys()
    }

    /// `(ring, group)` pairs that have at least one trip bucketed under them.
    pub fn group_keys(&self) -> impl Iterator<Item = &(RingKey, GroupKey)> + '_ {
        self.by_group.keys()
    }

    pub fn riders(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_rider.keys().map(String::as_str)
    }

    pub fn horses(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_horse.keys().map(String::as_str)
    }

    /// Status of a class: the schedule's, else the first trip that carries one.
    pub fn class_status(&self, class_id: &ClassKey) -> Option<&str> {
        self.class_status.get(class_id).map(String::as_str)
    }

    pub fn find_class(&self, class_id: &ClassKey) -> Option<&ClassNode> {
        self.tree
            .iter()
            .flat_map(|ring| ring.children.iter())
            .flat_map(|group| group.children.iter())
            .find(|class| &class.class_id == class_id)
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

#[cfg(test)]
#[path = "hierarchy_tests.rs"]
mod hierarchy_tests;
