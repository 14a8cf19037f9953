//! HTTP handlers for the REST API.
//!
//! Each handler is a thin shim over [`ShowBoard`](crate::services::board::ShowBoard).

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::dto::{
    BoardState, BoardView, ClassEntriesView, Diagnostics, EntryDetailView, FollowToggle,
    HealthResponse, HorseListResponse, ModeRequest, ModeResponse, PeakToggle, RefreshOutcome,
    RiderListResponse, ScreenResponse, TimelineView, TrainerReportResponse, ViewQuery,
};
use super::error::AppError;
use super::state::AppState;
use crate::engine::peak::Screen;
use crate::models::keys::ClassKey;
use crate::services::poller::refresh_once;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

fn parse_screen(raw: &str) -> Result<Screen, AppError> {
    raw.parse::<Screen>().map_err(AppError::BadRequest)
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let storage = match state.repository.health_check().await {
        Ok(true) => "ok".to_string(),
        Ok(false) => "unavailable".to_string(),
        Err(e) => format!("error: {}", e),
    };
    let snapshot = state.board.snapshot();

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        storage,
        generation: snapshot.generation,
        applied_at: snapshot.applied_at,
    }))
}

// =============================================================================
// Views
// =============================================================================

/// GET /v1/view
///
/// The ring/group/class hierarchy with header counts.
pub async fn get_view(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> HandlerResult<BoardView> {
    Ok(Json(state.board.get_view(query.to_request()?)))
}

/// GET /v1/riders
pub async fn get_riders(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> HandlerResult<RiderListResponse> {
    let riders = state.board.riders(query.to_request()?);
    Ok(Json(RiderListResponse {
        total: riders.len(),
        riders,
    }))
}

/// GET /v1/horses
pub async fn get_horses(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> HandlerResult<HorseListResponse> {
    let horses = state
        .board
        .horses(query.to_request()?, query.search.as_deref());
    Ok(Json(HorseListResponse {
        total: horses.len(),
        horses,
    }))
}

/// GET /v1/trainer-report
///
/// Included trips grouped by ring and group, in schedule order.
pub async fn get_trainer_report(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> HandlerResult<TrainerReportResponse> {
    let (meta, rings) = state.board.trainer_report(query.to_request()?);
    Ok(Json(TrainerReportResponse { meta, rings }))
}

/// GET /v1/timeline
pub async fn get_timeline(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> HandlerResult<TimelineView> {
    Ok(Json(state.board.timeline(query.to_request()?)))
}

/// GET /v1/classes/{class_id}/entries
pub async fn get_class_entries(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
    Query(query): Query<ViewQuery>,
) -> HandlerResult<ClassEntriesView> {
    let class_key = ClassKey::from(class_id.trim());
    state
        .board
        .class_entries(query.to_request()?, &class_key)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Class {} not found", class_id)))
}

/// GET /v1/classes/{class_id}/entries/{participant}
pub async fn get_entry_detail(
    State(state): State<AppState>,
    Path((class_id, participant)): Path<(String, String)>,
) -> HandlerResult<EntryDetailView> {
    let class_key = ClassKey::from(class_id.trim());
    state
        .board
        .entry_detail(&class_key, participant.trim())
        .map(Json)
        .ok_or_else(|| {
            AppError::NotFound(format!("No trips for {} in class {}", participant, class_id))
        })
}

/// GET /v1/diagnostics
pub async fn get_diagnostics(State(state): State<AppState>) -> HandlerResult<Diagnostics> {
    Ok(Json(state.board.diagnostics()))
}

/// GET /v1/state
pub async fn get_state(State(state): State<AppState>) -> HandlerResult<BoardState> {
    Ok(Json(state.board.state()))
}

// =============================================================================
// Mutations
// =============================================================================

/// POST /v1/follow/{participant}
pub async fn toggle_follow(
    State(state): State<AppState>,
    Path(participant): Path<String>,
) -> HandlerResult<FollowToggle> {
    state
        .board
        .toggle_follow(&participant)
        .await
        .map(Json)
        .ok_or_else(|| AppError::BadRequest("Participant name must not be blank".to_string()))
}

/// PUT /v1/modes/scope
pub async fn set_scope_mode(
    State(state): State<AppState>,
    Json(body): Json<ModeRequest>,
) -> HandlerResult<ModeResponse> {
    Ok(Json(ModeResponse {
        policy: state.board.set_scope_mode(&body.mode),
    }))
}

/// PUT /v1/modes/status
pub async fn set_status_mode(
    State(state): State<AppState>,
    Json(body): Json<ModeRequest>,
) -> HandlerResult<ModeResponse> {
    Ok(Json(ModeResponse {
        policy: state.board.set_status_mode(&body.mode),
    }))
}

/// POST /v1/peak/{screen}/{key}
pub async fn toggle_peak(
    State(state): State<AppState>,
    Path((screen, key)): Path<(String, String)>,
) -> HandlerResult<PeakToggle> {
    let screen = parse_screen(&screen)?;
    if !screen.supports_peak() {
        return Err(AppError::BadRequest(format!(
            "Screen {} does not support pinning",
            screen
        )));
    }
    Ok(Json(state.board.toggle_peak(screen, &key)))
}

/// POST /v1/screen/{screen}
pub async fn navigate(
    State(state): State<AppState>,
    Path(screen): Path<String>,
) -> HandlerResult<ScreenResponse> {
    let screen = parse_screen(&screen)?;
    Ok(Json(ScreenResponse {
        screen: state.board.navigate(screen),
    }))
}

/// POST /v1/refresh
///
/// Fetch both feeds now. A failed fetch leaves the current data in place.
pub async fn refresh(State(state): State<AppState>) -> HandlerResult<RefreshOutcome> {
    let feeds = state
        .feeds
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("Feed sources are not configured".to_string()))?;
    let outcome = refresh_once(&state.board, feeds).await?;
    Ok(Json(outcome))
}
