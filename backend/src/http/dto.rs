//! Data Transfer Objects for the HTTP API.
//!
//! View payloads are the engine and board types themselves; only requests
//! and small envelopes live here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::AppError;
use crate::engine::peak::Screen;
use crate::engine::policy::{InclusionPolicy, ScopeMode, StatusMode};
use crate::engine::view::{HorseView, RiderView, TrainerRing};
use crate::models::feed::FeedMeta;
use crate::services::board::ViewRequest;

pub use crate::services::board::{
    BoardState, BoardView, Diagnostics, FollowToggle, PeakToggle, RefreshOutcome,
};
pub use crate::engine::view::{ClassEntriesView, EntryDetailView, TimelineView};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Follow-set storage status
    pub storage: String,
    pub generation: u64,
    pub applied_at: Option<DateTime<Utc>>,
}

/// Query parameters accepted by read endpoints.
///
/// `scope` and `status` override the stored modes for this call only and
/// parse leniently. An unknown `screen` is rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewQuery {
    pub scope: Option<String>,
    pub status: Option<String>,
    pub screen: Option<String>,
    /// Substring filter for `/v1/horses`
    pub search: Option<String>,
}

impl ViewQuery {
    pub fn to_request(&self) -> Result<ViewRequest, AppError> {
        let screen = self
            .screen
            .as_deref()
            .map(|s| s.parse::<Screen>().map_err(AppError::BadRequest))
            .transpose()?;
        Ok(ViewRequest {
            scope: self.scope.as_deref().map(ScopeMode::parse_lenient),
            status: self.status.as_deref().map(StatusMode::parse_lenient),
            screen,
        })
    }
}

/// Body for `PUT /v1/modes/*`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeRequest {
    #[serde(alias = "value")]
    pub mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeResponse {
    pub policy: InclusionPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenResponse {
    pub screen: Screen,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiderListResponse {
    pub riders: Vec<RiderView>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorseListResponse {
    pub horses: Vec<HorseView>,
    pub total: usize,
}

/// Printable per-ring report, stamped with the show it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerReportResponse {
    pub meta: FeedMeta,
    pub rings: Vec<TrainerRing>,
}
