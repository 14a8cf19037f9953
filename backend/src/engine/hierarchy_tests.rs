use super::*;
use crate::models::time::parse_clock;

fn class_row(ring: &str, group: &str, class: &str, time: Option<&str>) -> ScheduleRecord {
    ScheduleRecord {
        ring_id: Some(RingKey::from(ring)),
        ring_label: format!("Ring {}", ring),
        group_id: Some(GroupKey::from(group)),
        group_label: format!("Group {}", group),
        class_id: Some(ClassKey::from(class)),
        class_label: format!("Class {}", class),
        scheduled_minutes: time.and_then(parse_clock),
        scheduled_time: time.map(str::to_string),
        ..Default::default()
    }
}

fn trip(class: &str, horse: &str, rider: &str, go: Option<&str>) -> TripRecord {
    TripRecord {
        class_id: Some(ClassKey::from(class)),
        participant_name: Some(horse.to_string()),
        handler_name: Some(rider.to_string()),
        go_time: go.map(str::to_string),
        go_minutes: go.and_then(parse_clock),
        ..Default::default()
    }
}

fn class_ids(group: &GroupNode) -> Vec<&str> {
    group.children.iter().map(|c| c.class_id.as_str()).collect()
}

#[test]
fn test_class_time_falls_back_to_earliest_go_time() {
    let schedule = vec![class_row("1", "g1", "c1", None)];
    let trips = vec![
        trip("c1", "A", "R1", Some("9:15 AM")),
        trip("c1", "B", "R2", Some("9:05 AM")),
    ];
    let index = HierarchyIndex::build(&schedule, &trips);
    let class = &index.tree[0].children[0].children[0];
    assert_eq!(class.resolved_time.minutes, Some(545));
    assert_eq!(class.resolved_time.display.as_deref(), Some("09:05"));
    // The group inherits the same fallback.
    assert_eq!(index.tree[0].children[0].resolved_time.minutes, Some(545));
}

#[test]
fn test_group_prefers_explicit_class_time() {
    let schedule = vec![
        class_row("1", "g1", "c1", None),
        class_row("1", "g1", "c2", Some("10:00 AM")),
    ];
    let trips = vec![trip("c1", "A", "R1", Some("8:00 AM"))];
    let index = HierarchyIndex::build(&schedule, &trips);
    let group = &index.tree[0].children[0];
    assert_eq!(group.resolved_time.minutes, Some(600));
    assert_eq!(group.resolved_time.display.as_deref(), Some("10:00 AM"));
    // Class order still uses each class's own resolved time.
    assert_eq!(class_ids(group), vec!["c1", "c2"]);
}

#[test]
fn test_class_order_cascade_each_level() {
    let mut by_time_later = class_row("1", "g1", "late", Some("10:00 AM"));
    by_time_later.sequence = Some(FlexNumber::Number(1.0));

    let mut seq_two = class_row("1", "g1", "seq2", Some("9:00 AM"));
    seq_two.sequence = Some(FlexNumber::Number(2.0));
    let mut seq_one = class_row("1", "g1", "seq1", Some("9:00 AM"));
    seq_one.sequence = Some(FlexNumber::Number(1.0));
    seq_one.class_number = Some(FlexNumber::Number(99.0));

    let mut num_low = class_row("1", "g1", "num5", Some("9:00 AM"));
    num_low.sequence = Some(FlexNumber::Number(3.0));
    num_low.class_number = Some(FlexNumber::Number(5.0));
    let mut num_high = class_row("1", "g1", "num50", Some("9:00 AM"));
    num_high.sequence = Some(FlexNumber::Number(3.0));
    num_high.class_number = Some(FlexNumber::Number(50.0));

    let mut label_b = class_row("1", "g1", "lb", Some("9:00 AM"));
    label_b.sequence = Some(FlexNumber::Number(4.0));
    label_b.class_number = Some(FlexNumber::Number(7.0));
    label_b.class_label = "Bravo".into();
    let mut label_a = class_row("1", "g1", "la", Some("9:00 AM"));
    label_a.sequence = Some(FlexNumber::Number(4.0));
    label_a.class_number = Some(FlexNumber::Number(7.0));
    label_a.class_label = "Alpha".into();

    let untimed = class_row("1", "g1", "untimed", None);

    let schedule = vec![
        untimed, by_time_later, label_b, num_high, seq_two, label_a, num_low, seq_one,
    ];
    let index = HierarchyIndex::build(&schedule, &[]);
    assert_eq!(
        class_ids(&index.tree[0].children[0]),
        vec!["seq1", "seq2", "num5", "num50", "la", "lb", "late", "untimed"]
    );
}

#[test]
fn test_groups_sort_by_group_time() {
    let schedule = vec![
        class_row("1", "afternoon", "c1", Some("1:00 PM")),
        class_row("1", "morning", "c2", Some("8:00 AM")),
        class_row("1", "unknown", "c3", None),
    ];
    let index = HierarchyIndex::build(&schedule, &[]);
    let groups: Vec<&str> = index.tree[0].children.iter().map(|g| g.group_id.as_str()).collect();
    assert_eq!(groups, vec!["morning", "afternoon", "unknown"]);
}

#[test]
fn test_rings_sort_numerically_then_by_name() {
    let schedule = vec![
        class_row("10", "g1", "c1", None),
        class_row("Derby Field", "g2", "c2", None),
        class_row("2", "g3", "c3", None),
    ];
    let index = HierarchyIndex::build(&schedule, &[]);
    let rings: Vec<&str> = index.tree.iter().map(|r| r.ring_id.as_str()).collect();
    assert_eq!(rings, vec!["2", "10", "Derby Field"]);
}

#[test]
fn test_build_is_idempotent() {
    let schedule = vec![
        class_row("2", "g2", "c3", None),
        class_row("1", "g1", "c1", Some("9:00 AM")),
        class_row("1", "g1", "c2", Some("9:00 AM")),
    ];
    let trips = vec![
        trip("c3", "A", "R1", Some("7:30 AM")),
        trip("c1", "B", "R2", Some("9:10 AM")),
    ];
    let first = HierarchyIndex::build(&schedule, &trips);
    let second = HierarchyIndex::build(&schedule, &trips);
    assert_eq!(first.tree, second.tree);
    assert_eq!(first.stats, second.stats);
}

#[test]
fn test_rows_missing_ids_are_dropped_and_counted() {
    let mut no_ring = class_row("1", "g1", "c9", None);
    no_ring.ring_id = None;
    let mut no_group = class_row("1", "g1", "c8", None);
    no_group.group_id = None;
    let schedule = vec![class_row("1", "g1", "c1", None), no_ring, no_group];

    let mut classless = trip("c1", "A", "R1", None);
    classless.class_id = None;
    let trips = vec![trip("c1", "B", "R2", None), classless];

    let index = HierarchyIndex::build(&schedule, &trips);
    assert_eq!(index.stats.schedule_dropped, 2);
    assert_eq!(index.stats.trips_dropped, 1);
    assert_eq!(class_ids(&index.tree[0].children[0]), vec!["c1"]);
    assert_eq!(index.indexed_trips().count(), 1);
    assert_eq!(index.trips().len(), 2);
}

#[test]
fn test_class_keeps_first_ring() {
    let schedule = vec![
        class_row("1", "g1", "c1", None),
        class_row("2", "g7", "c1", None),
        class_row("1", "g1", "c1", None),
    ];
    let index = HierarchyIndex::build(&schedule, &[]);
    assert_eq!(index.tree.len(), 1);
    assert_eq!(index.tree[0].ring_id.as_str(), "1");
    assert_eq!(index.stats.class_conflicts, 1);
    assert_eq!(index.stats.duplicate_classes, 1);
    assert_eq!(index.warnings().len(), 1);
}

#[test]
fn test_lookups_cover_every_key_unfiltered() {
    let schedule = vec![
        class_row("1", "g1", "c1", None),
        class_row("2", "g2", "c2", None),
    ];
    let mut truth_ring = trip("c2", "A", "R1", Some("9:00 AM"));
    truth_ring.ring_id = Some(RingKey::from("3"));
    let trips = vec![
        trip("c1", "A", "R1", Some("8:00 AM")),
        trip("c1", "A", "R1", Some("8:30 AM")),
        truth_ring,
        trip("orphan", "B", "R2", None),
    ];
    let index = HierarchyIndex::build(&schedule, &trips);

    assert_eq!(index.trips_for_horse("A").count(), 3);
    assert_eq!(index.trips_for_rider("R2").count(), 1);
    assert_eq!(index.trips_for_class(&ClassKey::from("c1")).count(), 2);
    assert_eq!(index.trips_for_entry(&ClassKey::from("c1"), "A").count(), 2);
    // Ring and group are filled in from the schedule when the trip omits them.
    assert_eq!(index.trips_for_ring(&RingKey::from("1")).count(), 2);
    assert_eq!(index.trips_for_group(&RingKey::from("1"), &GroupKey::from("g1")).count(), 2);
    assert_eq!(index.stats.trips_backfilled, 2);
    // The trip's own ring wins over the schedule's.
    assert_eq!(index.trips_for_ring(&RingKey::from("3")).count(), 1);
    assert_eq!(index.trips_for_ring(&RingKey::from("2")).count(), 0);
    assert_eq!(index.stats.ring_disagreements, 1);
    assert_eq!(index.stats.orphan_trip_classes, 1);
    assert_eq!(index.horses().collect::<Vec<_>>(), vec!["A", "B"]);
}

#[test]
fn test_class_status_prefers_schedule() {
    let mut done = class_row("1", "g1", "c1", None);
    done.status = Some("Completed".into());
    let schedule = vec![done, class_row("1", "g1", "c2", None)];
    let mut live = trip("c2", "A", "R1", None);
    live.status = Some("Underway".into());
    let mut stale = trip("c1", "A", "R1", None);
    stale.status = Some("Underway".into());
    let trips = vec![live, stale];

    let index = HierarchyIndex::build(&schedule, &trips);
    assert_eq!(index.class_status(&ClassKey::from("c1")), Some("Completed"));
    assert_eq!(index.class_status(&ClassKey::from("c2")), Some("Underway"));
    assert_eq!(index.class_status(&ClassKey::from("missing")), None);
    assert_eq!(
        index.find_class(&ClassKey::from("c1")).and_then(|c| c.status.as_deref()),
        Some("Completed")
    );
}
