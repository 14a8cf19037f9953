//! Follow-set persistence across restarts, repository factory, configuration.

mod support;

use std::sync::Arc;

use showring::config::AppConfig;
use showring::db::{
    FollowSetRepository, JsonFileRepository, RepositoryFactory, RepositoryType,
};
use showring::engine::{FollowSet, ScopeMode};
use showring::services::ShowBoard;
use support::{feed_pair, trip_rows, with_scoped_env};

#[tokio::test]
async fn curated_follow_set_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("follow.json");
    let config = AppConfig::default();

    {
        let repo: Arc<dyn FollowSetRepository> = Arc::new(JsonFileRepository::new(&path));
        let board = ShowBoard::new(&config.engine, repo);
        assert!(!board.restore_follow_set().await);
        board.apply_feeds(feed_pair(Some("t1"), trip_rows())).await;
        board.toggle_follow("Echo").await;
    }

    let repo: Arc<dyn FollowSetRepository> = Arc::new(JsonFileRepository::new(&path));
    let board = ShowBoard::new(&config.engine, repo);
    assert!(board.restore_follow_set().await);
    assert_eq!(board.state().follow_set, vec!["Cassius", "Dandy"]);

    // A restored set is already seeded: the next load only prunes.
    board.apply_feeds(feed_pair(Some("t1"), trip_rows())).await;
    assert_eq!(board.state().follow_set, vec!["Cassius", "Dandy"]);
}

#[tokio::test]
async fn corrupt_state_file_starts_unseeded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("follow.json");
    std::fs::write(&path, "not json").unwrap();

    let board = ShowBoard::new(
        &AppConfig::default().engine,
        Arc::new(JsonFileRepository::new(&path)),
    );
    assert!(!board.restore_follow_set().await);
    board.apply_feeds(feed_pair(Some("t1"), trip_rows())).await;
    assert_eq!(board.state().follow_set.len(), 3);

    // The seeded set overwrote the corrupt file.
    let stored = JsonFileRepository::new(&path).load_follow_set().await.unwrap().unwrap();
    assert_eq!(FollowSet::from_snapshot(stored).len(), 3);
}

#[test]
fn repository_type_from_env() {
    with_scoped_env(
        &[("REPOSITORY_TYPE", Some("file")), ("SHOWRING_STATE_PATH", None)],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::File),
    );
    with_scoped_env(
        &[("REPOSITORY_TYPE", None), ("SHOWRING_STATE_PATH", Some("/tmp/f.json"))],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::File),
    );
    with_scoped_env(
        &[("REPOSITORY_TYPE", None), ("SHOWRING_STATE_PATH", None)],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Local),
    );
    with_scoped_env(&[("REPOSITORY_TYPE", Some("bogus"))], || {
        assert_eq!(RepositoryType::from_env(), RepositoryType::Local)
    });
}

#[tokio::test]
async fn factory_builds_file_repository_from_env() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("follow.json");
    let path_str = path.display().to_string();

    let repo = with_scoped_env(
        &[("REPOSITORY_TYPE", None), ("SHOWRING_STATE_PATH", Some(path_str.as_str()))],
        RepositoryFactory::from_env,
    )
    .unwrap();

    let mut follow = FollowSet::new();
    follow.toggle("Cassius");
    repo.save_follow_set(&follow.snapshot()).await.unwrap();
    assert!(path.exists());
}

#[test]
fn config_file_then_env_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("showring.toml");
    std::fs::write(
        &path,
        r#"
        [feeds]
        schedule = "feeds/schedule.json"
        trips = "feeds/trips.json"

        [engine]
        default_scope = "ACTIVE"

        [server]
        port = 3000
        "#,
    )
    .unwrap();

    let mut config = AppConfig::from_file(&path).unwrap();
    with_scoped_env(
        &[
            ("SHOWRING_TRIPS_URL", Some("https://feeds.test/trips.json")),
            ("SHOWRING_REFRESH_SECS", Some("120")),
            ("PORT", None),
            ("HOST", None),
            ("SHOWRING_SCHEDULE_URL", None),
            ("SHOWRING_STATE_PATH", None),
            ("REPOSITORY_TYPE", None),
        ],
        || config.apply_env(),
    );

    assert_eq!(config.feeds.schedule, "feeds/schedule.json");
    assert_eq!(config.feeds.trips, "https://feeds.test/trips.json");
    assert_eq!(config.feeds.refresh_secs, 120);
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.engine.default_policy().scope, ScopeMode::Active);
    assert!(config.validate().is_ok());
}

#[test]
fn malformed_config_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("showring.toml");
    std::fs::write(&path, "[feeds\nschedule = ").unwrap();
    let err = AppConfig::from_file(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse"));
}
