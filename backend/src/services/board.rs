//! The live show board.
//!
//! Owns the current feed snapshot, the follow set, and the UI modes. Reads
//! clone an `Arc` to the snapshot and never block a refresh; a refresh builds
//! the next snapshot off to the side and swaps it in with one write.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use super::feed_client::{FeedError, FeedPair};
use super::refresh_log::{RefreshEntry, RefreshLog, RefreshStatus};
use crate::config::EngineSettings;
use crate::db::repository::FollowSetRepository;
use crate::engine::follow::{FollowSet, ObserveOutcome};
use crate::engine::hierarchy::{HierarchyIndex, HierarchyStats};
use crate::engine::peak::{PeakSelection, PeakState, Screen};
use crate::engine::policy::{CompletionRule, InclusionPolicy, ScopeMode, StatusMode};
use crate::engine::view::{
    ClassEntriesView, EntryDetailView, HorseView, RiderView, ShowView, TimelineView, TrainerRing, ViewInput,
};
use crate::ingest::normalizer::{NormalizationReport, Normalizer};
use crate::models::feed::FeedMeta;
use crate::models::keys::ClassKey;
use crate::models::records::{FollowField, ScheduleRecord, TripRecord};

/// One applied schedule/trips pair.
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    pub schedule: Vec<ScheduleRecord>,
    pub trips: Vec<TripRecord>,
    pub meta: FeedMeta,
    pub report: NormalizationReport,
    pub schedule_fingerprint: Option<String>,
    pub trips_fingerprint: Option<String>,
    pub applied_at: Option<DateTime<Utc>>,
    /// Increments on every applied pair; 0 before the first.
    pub generation: u64,
}

impl FeedSnapshot {
    fn matches(&self, schedule_fingerprint: &str, trips_fingerprint: &str) -> bool {
        self.schedule_fingerprint.as_deref() == Some(schedule_fingerprint)
            && self.trips_fingerprint.as_deref() == Some(trips_fingerprint)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    Applied {
        generation: u64,
        schedule_records: usize,
        trips: usize,
        follow: ObserveOutcome,
    },
    /// Both feeds carried the markers of the current snapshot.
    Unchanged { generation: u64 },
}

/// Per-call overrides for reads. `None` falls back to the stored state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewRequest {
    pub scope: Option<ScopeMode>,
    pub status: Option<StatusMode>,
    pub screen: Option<Screen>,
}

/// The reconciled view plus snapshot metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardView {
    #[serde(flatten)]
    pub view: ShowView,
    pub meta: FeedMeta,
    pub generation: u64,
    pub applied_at: Option<DateTime<Utc>>,
    pub follow_count: usize,
    pub seeded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowToggle {
    pub participant: String,
    pub followed: bool,
    pub follow_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakToggle {
    pub screen: Screen,
    pub key: String,
    pub pinned: bool,
    pub selection: PeakSelection,
}

/// Mutable UI state, returned by `GET /v1/state`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardState {
    pub policy: InclusionPolicy,
    pub screen: Screen,
    pub peak: PeakSelection,
    pub follow_field: FollowField,
    pub follow_set: Vec<String>,
    pub seeded: bool,
    pub meta: FeedMeta,
    pub generation: u64,
    pub applied_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub meta: FeedMeta,
    pub generation: u64,
    pub applied_at: Option<DateTime<Utc>>,
    pub schedule_fingerprint: Option<String>,
    pub trips_fingerprint: Option<String>,
    pub normalization: NormalizationReport,
    pub hierarchy: HierarchyStats,
    pub hierarchy_warnings: Vec<String>,
    pub refreshes: Vec<RefreshEntry>,
}

#[derive(Debug, Clone, Default)]
struct UiState {
    policy: InclusionPolicy,
    peak: PeakState,
}

pub struct ShowBoard {
    snapshot: RwLock<Arc<FeedSnapshot>>,
    ui: RwLock<UiState>,
    follow: Mutex<FollowSet>,
    repository: Arc<dyn FollowSetRepository>,
    normalizer: Normalizer,
    follow_field: FollowField,
    completion: CompletionRule,
    refresh_log: RefreshLog,
    refresh_lock: tokio::sync::Mutex<()>,
    persist_lock: tokio::sync::Mutex<()>,
}

impl ShowBoard {
    pub fn new(settings: &EngineSettings, repository: Arc<dyn FollowSetRepository>) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(FeedSnapshot::default())),
            ui: RwLock::new(UiState {
                policy: settings.default_policy(),
                peak: PeakState::default(),
            }),
            follow: Mutex::new(FollowSet::new()),
            repository,
            normalizer: Normalizer::new(settings.label_rules()),
            follow_field: settings.follow_field,
            completion: settings.completion_rule(),
            refresh_log: RefreshLog::default(),
            refresh_lock: tokio::sync::Mutex::new(()),
            persist_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// The snapshot currently served to readers.
    pub fn snapshot(&self) -> Arc<FeedSnapshot> {
        Arc::clone(&self.snapshot.read())
    }

    pub fn refresh_log(&self) -> &RefreshLog {
        &self.refresh_log
    }

    // =========================================================================
    // Follow-set persistence
    // =========================================================================

    /// Load the stored follow set. Returns whether one was found. Storage
    /// failures are logged and leave the set unseeded.
    pub async fn restore_follow_set(&self) -> bool {
        match self.repository.load_follow_set().await {
            Ok(Some(snapshot)) => {
                let restored = FollowSet::from_snapshot(snapshot);
                info!(
                    "Restored follow set with {} members (seeded={})",
                    restored.len(),
                    restored.is_seeded()
                );
                *self.follow.lock() = restored;
                true
            }
            Ok(None) => {
                info!("No stored follow set; it will be seeded from the first trips load");
                false
            }
            Err(e) => {
                warn!("Failed to load follow set, starting unseeded: {}", e);
                false
            }
        }
    }

    /// Save the follow set if it changed since the last save.
    async fn persist_follow_set(&self) {
        let _guard = self.persist_lock.lock().await;
        let snapshot = {
            let mut follow = self.follow.lock();
            if !follow.is_dirty() {
                return;
            }
            follow.mark_clean();
            follow.snapshot()
        };

        if let Err(e) = self.repository.save_follow_set(&snapshot).await {
            warn!("Failed to persist follow set: {}", e);
            self.follow.lock().mark_dirty();
        }
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Apply a fetched pair. A pair whose markers match the current snapshot
    /// is a no-op.
    pub async fn apply_feeds(&self, pair: FeedPair) -> RefreshOutcome {
        let outcome = {
            let _guard = self.refresh_lock.lock().await;
            self.apply_pair(pair)
        };
        if matches!(outcome, RefreshOutcome::Applied { .. }) {
            self.persist_follow_set().await;
        }
        outcome
    }

    fn apply_pair(&self, pair: FeedPair) -> RefreshOutcome {
        let schedule_fp = pair.schedule.fingerprint();
        let trips_fp = pair.trips.fingerprint();

        {
            let current = self.snapshot.read();
            if current.matches(&schedule_fp, &trips_fp) {
                info!(
                    "Feed refresh: unchanged (generated_at={})",
                    current.meta.generated_at.as_deref().unwrap_or("-")
                );
                self.refresh_log
                    .record(RefreshStatus::Unchanged, format!("generation {}", current.generation));
                return RefreshOutcome::Unchanged {
                    generation: current.generation,
                };
            }
        }

        let normalized = self
            .normalizer
            .normalize(&pair.schedule.document, &pair.trips.document);
        let report = &normalized.report;
        info!(
            "Normalized {} schedule rows and {} trips",
            report.schedule.total_records, report.trips.total_records
        );
        for warning in &report.warnings {
            warn!("Feed normalization: {}", warning);
        }

        let follow = {
            let field = self.follow_field;
            let mut set = self.follow.lock();
            set.observe(normalized.trips.iter().filter_map(|t| t.identity(field)))
        };
        match &follow {
            ObserveOutcome::Seeded { count } => info!("Seeded follow set with {} participants", count),
            ObserveOutcome::Pruned { removed } => {
                info!("Pruned {} participants no longer in the feed", removed.len())
            }
            ObserveOutcome::Waiting => debug!("Follow set still waiting for participants"),
            ObserveOutcome::Unchanged => {}
        }

        let schedule_records = normalized.schedule.len();
        let trips = normalized.trips.len();
        let generation = {
            let mut slot = self.snapshot.write();
            let generation = slot.generation + 1;
            *slot = Arc::new(FeedSnapshot {
                schedule: normalized.schedule,
                trips: normalized.trips,
                meta: normalized.meta,
                report: normalized.report,
                schedule_fingerprint: Some(schedule_fp),
                trips_fingerprint: Some(trips_fp),
                applied_at: Some(Utc::now()),
                generation,
            });
            generation
        };

        self.refresh_log.record(
            RefreshStatus::Applied,
            format!(
                "generation {}: {} schedule rows, {} trips",
                generation, schedule_records, trips
            ),
        );
        RefreshOutcome::Applied {
            generation,
            schedule_records,
            trips,
            follow,
        }
    }

    /// Note a failed fetch. The current snapshot stays in service.
    pub fn record_failure(&self, error: &FeedError) {
        warn!("Feed refresh failed, keeping previous data: {}", error);
        self.refresh_log.record(RefreshStatus::Failed, error.to_string());
    }

    // =========================================================================
    // Reads
    // =========================================================================

    fn policy_for(&self, request: &ViewRequest) -> InclusionPolicy {
        let stored = self.ui.read().policy;
        InclusionPolicy::new(
            request.scope.unwrap_or(stored.scope),
            request.status.unwrap_or(stored.status),
        )
    }

    fn with_input<R>(&self, f: impl FnOnce(&FeedSnapshot, ViewInput<'_>) -> R) -> R {
        let snapshot = self.snapshot();
        let members = self.follow.lock().members().clone();
        let input = ViewInput {
            schedule: &snapshot.schedule,
            trips: &snapshot.trips,
            follow_set: &members,
            follow_field: self.follow_field,
            completion: &self.completion,
        };
        f(&snapshot, input)
    }

    /// The ring/group/class view for the requested (or current) screen.
    pub fn get_view(&self, request: ViewRequest) -> BoardView {
        let policy = self.policy_for(&request);
        let (screen, peak) = {
            let ui = self.ui.read();
            let screen = request.screen.unwrap_or_else(|| ui.peak.current());
            (screen, ui.peak.selection(screen))
        };
        let (follow_count, seeded) = {
            let follow = self.follow.lock();
            (follow.len(), follow.is_seeded())
        };

        self.with_input(|snapshot, input| BoardView {
            view: input.get_view(policy, screen, &peak),
            meta: snapshot.meta.clone(),
            generation: snapshot.generation,
            applied_at: snapshot.applied_at,
            follow_count,
            seeded,
        })
    }

    pub fn riders(&self, request: ViewRequest) -> Vec<RiderView> {
        let policy = self.policy_for(&request);
        let peak = self.ui.read().peak.selection(Screen::Riders);
        self.with_input(|_, input| input.riders(policy, &peak))
    }

    pub fn trainer_report(&self, request: ViewRequest) -> (FeedMeta, Vec<TrainerRing>) {
        let policy = self.policy_for(&request);
        self.with_input(|snapshot, input| (snapshot.meta.clone(), input.trainer_report(policy)))
    }

    pub fn timeline(&self, request: ViewRequest) -> TimelineView {
        let policy = self.policy_for(&request);
        self.with_input(|_, input| input.timeline(policy))
    }

    pub fn horses(&self, request: ViewRequest, search: Option<&str>) -> Vec<HorseView> {
        let policy = self.policy_for(&request);
        self.with_input(|_, input| input.horses(policy, search))
    }

    pub fn class_entries(&self, request: ViewRequest, class_id: &ClassKey) -> Option<ClassEntriesView> {
        let policy = self.policy_for(&request);
        self.with_input(|_, input| input.class_entries(policy, class_id))
    }

    pub fn entry_detail(&self, class_id: &ClassKey, participant: &str) -> Option<EntryDetailView> {
        self.with_input(|_, input| input.entry_detail(class_id, participant))
    }

    pub fn state(&self) -> BoardState {
        let snapshot = self.snapshot();
        let ui = self.ui.read().clone();
        let follow = self.follow.lock();
        let screen = ui.peak.current();
        BoardState {
            policy: ui.policy,
            screen,
            peak: ui.peak.selection(screen),
            follow_field: self.follow_field,
            follow_set: follow.members().iter().cloned().collect(),
            seeded: follow.is_seeded(),
            meta: snapshot.meta.clone(),
            generation: snapshot.generation,
            applied_at: snapshot.applied_at,
        }
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let snapshot = self.snapshot();
        let index = HierarchyIndex::build(&snapshot.schedule, &snapshot.trips);
        Diagnostics {
            meta: snapshot.meta.clone(),
            generation: snapshot.generation,
            applied_at: snapshot.applied_at,
            schedule_fingerprint: snapshot.schedule_fingerprint.clone(),
            trips_fingerprint: snapshot.trips_fingerprint.clone(),
            normalization: snapshot.report.clone(),
            hierarchy: index.stats.clone(),
            hierarchy_warnings: index.warnings().to_vec(),
            refreshes: self.refresh_log.entries(),
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Flip follow membership for `participant`. `None` for a blank name.
    pub async fn toggle_follow(&self, participant: &str) -> Option<FollowToggle> {
        let participant = participant.trim();
        if participant.is_empty() {
            return None;
        }
        let toggle = {
            let mut follow = self.follow.lock();
            let followed = follow.toggle(participant);
            FollowToggle {
                participant: participant.to_string(),
                followed,
                follow_count: follow.len(),
            }
        };
        debug!(
            "Toggled follow for {:?}: followed={}",
            toggle.participant, toggle.followed
        );
        self.persist_follow_set().await;
        Some(toggle)
    }

    /// Set the scope mode. Unknown values resolve to `FULL`.
    pub fn set_scope_mode(&self, raw: &str) -> InclusionPolicy {
        let mut ui = self.ui.write();
        ui.policy.scope = ScopeMode::parse_lenient(raw);
        ui.policy
    }

    /// Set the status mode. Unknown values resolve to `ALL`.
    pub fn set_status_mode(&self, raw: &str) -> InclusionPolicy {
        let mut ui = self.ui.write();
        ui.policy.status = StatusMode::parse_lenient(raw);
        ui.policy
    }

    pub fn toggle_peak(&self, screen: Screen, key: &str) -> PeakToggle {
        let mut ui = self.ui.write();
        let pinned = ui.peak.toggle(screen, key.trim());
        PeakToggle {
            screen,
            key: key.trim().to_string(),
            pinned,
            selection: ui.peak.selection(screen),
        }
    }

    /// Switch screens, clearing the selection of the screen being left.
    pub fn navigate(&self, screen: Screen) -> Screen {
        let mut ui = self.ui.write();
        ui.peak.navigate(screen);
        ui.peak.current()
    }
}
