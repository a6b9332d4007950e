pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::scoring::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Scores API
        .route("/api/v1/scores", post(handlers::handle_create_score))
        .route("/api/v1/scores/batch", post(handlers::handle_batch_scores))
        .route("/api/v1/scores/:id", get(handlers::handle_get_score))
        .route(
            "/api/v1/scores/job/:job_id",
            get(handlers::handle_scores_for_job),
        )
        .route(
            "/api/v1/scores/candidate/:candidate_id",
            get(handlers::handle_scores_for_candidate),
        )
        // Document analysis
        .route(
            "/api/v1/jobs/:job_id/analyze",
            post(analysis::handle_analyze_job),
        )
        .route(
            "/api/v1/candidates/:candidate_id/analyze",
            post(analysis::handle_analyze_candidate),
        )
        .with_state(state)
}
