//! Router configuration for the HTTP API.
//!
//! Sets up all routes and middleware (CORS, compression, tracing).

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Reads
        .route("/view", get(handlers::get_view))
        .route("/riders", get(handlers::get_riders))
        .route("/horses", get(handlers::get_horses))
        .route("/trainer-report", get(handlers::get_trainer_report))
        .route("/timeline", get(handlers::get_timeline))
        .route("/classes/{class_id}/entries", get(handlers::get_class_entries))
        .route(
            "/classes/{class_id}/entries/{participant}",
            get(handlers::get_entry_detail),
        )
        .route("/diagnostics", get(handlers::get_diagnostics))
        .route("/state", get(handlers::get_state))
        // Mutations
        .route("/follow/{participant}", post(handlers::toggle_follow))
        .route("/modes/scope", put(handlers::set_scope_mode))
        .route("/modes/status", put(handlers::set_status_mode))
        .route("/peak/{screen}/{key}", post(handlers::toggle_peak))
        .route("/screen/{screen}", post(handlers::navigate))
        .route("/refresh", post(handlers::refresh));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::EngineSettings;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::FollowSetRepository;
    use crate::services::board::ShowBoard;

    #[test]
    fn test_router_creation() {
        let repo = Arc::new(LocalRepository::new()) as Arc<dyn FollowSetRepository>;
        let board = Arc::new(ShowBoard::new(&EngineSettings::default(), repo.clone()));
        let _router = create_router(AppState::new(board, repo, None));
    }
}
