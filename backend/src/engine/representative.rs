//! First-relevant trip selection.
//!
//! Selection runs in two stages: each participant is first collapsed to its
//! own earliest trip, then the earliest of those survivors is picked. A
//! participant with several re-rides therefore competes with exactly one trip.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::records::TripRecord;

/// `(go_time, order_of_go)` ascending; missing values sort last.
pub fn cmp_go_order(a: &TripRecord, b: &TripRecord) -> Ordering {
    let go = |t: &TripRecord| t.go_minutes.map(f64::from).unwrap_or(f64::INFINITY);
    let oog = |t: &TripRecord| t.order_of_go_value().unwrap_or(f64::INFINITY);
    go(a).total_cmp(&go(b)).then_with(|| oog(a).total_cmp(&oog(b)))
}

/// Stage one: each participant's earliest trip, ordered by
/// [`cmp_go_order`]. Ties between participants keep name order. Trips
/// without a participant name stand alone.
pub fn best_per_participant<'t, I>(trips: I) -> Vec<&'t TripRecord>
where
    I: IntoIterator<Item = &'t TripRecord>,
{
    let mut best: BTreeMap<&'t str, &'t TripRecord> = BTreeMap::new();
    let mut unnamed: Vec<&'t TripRecord> = Vec::new();

    for trip in trips {
        match trip.participant_name.as_deref() {
            Some(name) => {
                best.entry(name)
                    .and_modify(|current| {
                        if cmp_go_order(trip, *current) == Ordering::Less {
                            *current = trip;
                        }
                    })
                    .or_insert(trip);
            }
            None => unnamed.push(trip),
        }
    }

    let mut survivors: Vec<&'t TripRecord> = best.into_values().chain(unnamed).collect();
    survivors.sort_by(|a, b| cmp_go_order(a, b));
    survivors
}

/// The representative trip for one class, or `None` for an empty input.
pub fn pick_first<'t, I>(trips_for_one_class: I) -> Option<&'t TripRecord>
where
    I: IntoIterator<Item = &'t TripRecord>,
{
    best_per_participant(trips_for_one_class).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::records::FlexNumber;
    use crate::models::time::parse_clock;
    use proptest::prelude::*;

    fn trip(horse: &str, go: &str, oog: Option<f64>) -> TripRecord {
        TripRecord {
            participant_name: Some(horse.to_string()),
            go_time: Some(go.to_string()),
            go_minutes: parse_clock(go),
            order_of_go: oog.map(FlexNumber::Number),
            ..Default::default()
        }
    }

    #[test]
    fn test_two_stage_selection() {
        let trips = vec![
            trip("A", "9:00 AM", Some(2.0)),
            trip("A", "9:00 AM", Some(1.0)),
            trip("B", "9:05 AM", Some(1.0)),
        ];
        let survivors = best_per_participant(&trips);
        assert_eq!(survivors.len(), 2);
        assert_eq!(survivors[0].order_of_go_value(), Some(1.0));
        assert_eq!(survivors[0].participant_name.as_deref(), Some("A"));

        let first = pick_first(&trips).unwrap();
        assert_eq!(first.participant_name.as_deref(), Some("A"));
        assert_eq!(first.order_of_go_value(), Some(1.0));
    }

    #[test]
    fn test_go_time_beats_order_of_go() {
        let trips = vec![trip("A", "9:30 AM", Some(1.0)), trip("B", "9:10 AM", Some(9.0))];
        assert_eq!(pick_first(&trips).unwrap().participant_name.as_deref(), Some("B"));
    }

    #[test]
    fn test_missing_values_sort_last() {
        let mut unknown_time = trip("A", "TBD", Some(1.0));
        unknown_time.go_minutes = None;
        let no_oog = trip("B", "9:00 AM", None);
        let both = trip("C", "9:00 AM", Some(4.0));
        let mut text_oog = trip("D", "9:00 AM", None);
        text_oog.order_of_go = Some(FlexNumber::Text("scratch".into()));

        let trips = vec![unknown_time, no_oog, both, text_oog];
        let order: Vec<&str> = best_per_participant(&trips)
            .iter()
            .filter_map(|t| t.participant_name.as_deref())
            .collect();
        assert_eq!(order, vec!["C", "B", "D", "A"]);
    }

    #[test]
    fn test_empty_class_has_no_representative() {
        let trips: Vec<TripRecord> = Vec::new();
        assert!(pick_first(&trips).is_none());
    }

    proptest! {
        #[test]
        fn prop_one_survivor_per_participant(
            rows in prop::collection::vec((0usize..4, 0u32..1440, prop::option::of(1u32..40)), 0..30)
        ) {
            let names = ["A", "B", "C", "D"];
            let trips: Vec<TripRecord> = rows
                .iter()
                .map(|(h, go, oog)| TripRecord {
                    participant_name: Some(names[*h].to_string()),
                    go_minutes: Some(*go),
                    order_of_go: oog.map(|o| FlexNumber::Number(o as f64)),
                    ..Default::default()
                })
                .collect();

            let survivors = best_per_participant(&trips);
            let mut seen: Vec<&str> = survivors.iter().filter_map(|t| t.participant_name.as_deref()).collect();
            let total = seen.len();
            seen.sort();
            seen.dedup();
            prop_assert_eq!(total, seen.len());

            if let Some(first) = pick_first(&trips) {
                for t in &trips {
                    prop_assert_ne!(cmp_go_order(t, first), Ordering::Less);
                }
            } else {
                prop_assert!(trips.is_empty());
            }
        }
    }
}
