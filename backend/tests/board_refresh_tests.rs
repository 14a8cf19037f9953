//! End-to-end behavior of the live board: refresh, follow set, modes, peak.

mod support;

use showring::config::{EngineSettings, FeedSettings};
use showring::db::LocalRepository;
use showring::engine::{ObserveOutcome, Screen, ScopeMode, StatusMode};
use showring::services::{
    refresh_once, BoardView, FeedClient, FeedError, RefreshOutcome, ShowBoard, ViewRequest,
};
use std::sync::Arc;
use support::{document, feed_pair, local_board, schedule_rows, trip, trip_rows};

fn class_ids(view: &BoardView, ring: usize) -> Vec<String> {
    view.view.rings[ring]
        .groups
        .iter()
        .flat_map(|g| g.classes.iter())
        .map(|c| c.class_id.to_string())
        .collect()
}

#[tokio::test]
async fn unchanged_generated_at_is_a_noop() {
    let (board, _) = local_board();
    let first = board.apply_feeds(feed_pair(Some("2024-05-01T08:00:00"), trip_rows())).await;
    assert!(matches!(first, RefreshOutcome::Applied { generation: 1, trips: 6, .. }));

    let mut extra = trip_rows();
    extra.push(trip("c3", 2, "Foxtrot", "Dee", "9:30 AM", 3));
    let second = board.apply_feeds(feed_pair(Some("2024-05-01T08:00:00"), extra)).await;

    assert_eq!(second, RefreshOutcome::Unchanged { generation: 1 });
    assert_eq!(board.snapshot().trips.len(), 6);
}

#[tokio::test]
async fn body_checksum_stands_in_for_missing_generated_at() {
    let (board, _) = local_board();
    board.apply_feeds(feed_pair(None, trip_rows())).await;
    assert_eq!(
        board.apply_feeds(feed_pair(None, trip_rows())).await,
        RefreshOutcome::Unchanged { generation: 1 }
    );

    let mut changed = trip_rows();
    changed.pop();
    let outcome = board.apply_feeds(feed_pair(None, changed)).await;
    assert!(matches!(outcome, RefreshOutcome::Applied { generation: 2, trips: 5, .. }));
}

#[tokio::test]
async fn seed_once_then_prune_across_loads() {
    let (board, _) = local_board();
    let outcome = board.apply_feeds(feed_pair(Some("t1"), trip_rows())).await;
    match outcome {
        RefreshOutcome::Applied { follow, .. } => {
            assert_eq!(follow, ObserveOutcome::Seeded { count: 3 })
        }
        other => panic!("expected applied, got {:?}", other),
    }
    assert_eq!(board.state().follow_set, vec!["Cassius", "Dandy", "Echo"]);

    let toggle = board.toggle_follow("Dandy").await.unwrap();
    assert!(!toggle.followed);

    // Echo is gone upstream; Dandy still rides.
    let second_load: Vec<_> = trip_rows()
        .into_iter()
        .filter(|t| t["horseName"] != "Echo")
        .collect();
    board.apply_feeds(feed_pair(Some("t2"), second_load)).await;

    assert_eq!(board.state().follow_set, vec!["Cassius"]);
}

#[tokio::test]
async fn empty_first_load_does_not_seed() {
    let (board, _) = local_board();
    board.apply_feeds(feed_pair(Some("t0"), Vec::new())).await;
    assert!(!board.state().seeded);

    board.apply_feeds(feed_pair(Some("t1"), trip_rows())).await;
    let state = board.state();
    assert!(state.seeded);
    assert_eq!(state.follow_set.len(), 3);
}

#[tokio::test]
async fn followed_horse_counts_once() {
    let (board, _) = local_board();
    board.apply_feeds(feed_pair(Some("t1"), trip_rows())).await;
    board.toggle_follow("Dandy").await;
    board.toggle_follow("Echo").await;
    board.set_scope_mode("ACTIVE");

    let view = board.get_view(ViewRequest::default());
    assert_eq!(view.view.aggregates.horses, 1);
    assert_eq!(view.view.aggregates.trips, 3);
    assert_eq!(view.view.aggregates.classes, 2);
    assert_eq!(view.follow_count, 1);
}

#[tokio::test]
async fn status_mode_leaves_follow_set_alone() {
    let (board, _) = local_board();
    board.apply_feeds(feed_pair(Some("t1"), trip_rows())).await;
    let before = board.state().follow_set;

    board.set_status_mode("LIVE");
    assert_eq!(board.state().follow_set, before);
    assert_eq!(class_ids(&board.get_view(ViewRequest::default()), 0), vec!["c1"]);

    board.set_status_mode("ALL");
    assert_eq!(board.state().follow_set, before);
}

#[tokio::test]
async fn scope_mode_leaves_completed_flags_alone() {
    let (board, _) = local_board();
    board.apply_feeds(feed_pair(Some("t1"), trip_rows())).await;
    board.toggle_follow("Dandy").await;

    let completed = |scope| {
        let view = board.get_view(ViewRequest {
            scope: Some(scope),
            ..Default::default()
        });
        view.view
            .rings
            .iter()
            .flat_map(|r| r.groups.iter())
            .flat_map(|g| g.classes.iter())
            .filter(|c| c.status.as_deref() == Some("Completed"))
            .map(|c| c.class_id.to_string())
            .collect::<Vec<_>>()
    };
    assert_eq!(completed(ScopeMode::Full), vec!["c2"]);
    assert_eq!(completed(ScopeMode::Active), vec!["c2"]);
}

#[tokio::test]
async fn view_orders_and_resolves_times() {
    let (board, _) = local_board();
    board.apply_feeds(feed_pair(Some("t1"), trip_rows())).await;
    let view = board.get_view(ViewRequest::default());

    let rings: Vec<&str> = view.view.rings.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(rings, vec!["Grand Prix Ring", "Ring 2"]);
    assert_eq!(class_ids(&view, 0), vec!["c2", "c1"]);

    let c3 = &view.view.rings[1].groups[0].classes[0];
    assert_eq!(c3.resolved_minutes, Some(545));

    let c1 = &view.view.rings[0].groups[0].classes[1];
    let rep = c1.representative_trip.as_ref().unwrap();
    assert_eq!(rep.participant_name.as_deref(), Some("Cassius"));
    assert_eq!(rep.order_of_go_value(), Some(1.0));

    assert_eq!(view.meta.sid.as_deref(), Some("4411"));
}

#[tokio::test]
async fn ring_peak_does_not_change_counts() {
    let (board, _) = local_board();
    board.apply_feeds(feed_pair(Some("t1"), trip_rows())).await;
    let unpinned = board.get_view(ViewRequest::default());

    board.toggle_peak(Screen::Rings, "2");
    let pinned = board.get_view(ViewRequest::default());

    assert_eq!(pinned.view.rings.len(), 1);
    assert_eq!(pinned.view.rings[0].included_count, unpinned.view.rings[1].included_count);
    assert_eq!(pinned.view.aggregates, unpinned.view.aggregates);

    board.navigate(Screen::Classes);
    board.navigate(Screen::Rings);
    assert_eq!(board.get_view(ViewRequest::default()).view.rings.len(), 2);
}

#[tokio::test]
async fn failed_trips_fetch_keeps_previous_pair() {
    let dir = tempfile::tempdir().unwrap();
    let schedule_path = dir.path().join("schedule.json");
    let trips_path = dir.path().join("trips.json");
    std::fs::write(&schedule_path, document(Some("t1"), schedule_rows()).to_string()).unwrap();
    std::fs::write(&trips_path, document(Some("t1"), trip_rows()).to_string()).unwrap();

    let client = FeedClient::new(&FeedSettings {
        schedule: schedule_path.display().to_string(),
        trips: trips_path.display().to_string(),
        ..Default::default()
    })
    .unwrap();
    let board = ShowBoard::new(&EngineSettings::default(), Arc::new(LocalRepository::new()));
    refresh_once(&board, &client).await.unwrap();

    // New schedule, broken trips: the pair must not be torn.
    std::fs::write(&schedule_path, document(Some("t2"), Vec::new()).to_string()).unwrap();
    std::fs::write(&trips_path, "{\"records\": [").unwrap();
    let err = refresh_once(&board, &client).await.unwrap_err();
    assert!(matches!(err, FeedError::Decode { .. }));

    let snapshot = board.snapshot();
    assert_eq!(snapshot.generation, 1);
    assert_eq!(snapshot.schedule.len(), 3);
    assert_eq!(snapshot.trips.len(), 6);
    assert_eq!(board.state().policy.status, StatusMode::All);
}
