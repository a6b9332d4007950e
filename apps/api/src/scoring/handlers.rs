//! Axum route handlers for the Scores API.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::score::ScoreRow;
use crate::scoring::batch::{run_batch, BatchSummary, ScoredCandidate};
use crate::scoring::orchestrator::{MatchRequest, ScoringOrchestrator};
use crate::scoring::store::{
    get_score, list_scores_for_candidate, list_scores_for_job, resolve_candidate_text,
    resolve_job_text, save_score,
};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateScoreRequest {
    pub job_id: Uuid,
    pub candidate_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct BatchScoreRequest {
    pub job_id: Uuid,
    pub candidate_ids: Vec<Uuid>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/scores
///
/// Runs the two-step scoring pipeline for one job/candidate pair and stores
/// the result. A degraded run is still stored and returned with 200.
pub async fn handle_create_score(
    State(state): State<AppState>,
    Json(request): Json<CreateScoreRequest>,
) -> Result<Json<ScoreRow>, AppError> {
    let job_description = require_job_text(&state.db, request.job_id).await?;
    let candidate_resume = require_candidate_text(&state.db, request.candidate_id).await?;

    let match_request = MatchRequest {
        job_id: request.job_id,
        candidate_id: request.candidate_id,
        job_description,
        candidate_resume,
    };

    let record = state.orchestrator.run(&match_request).await;
    let row = save_score(&state.db, &record).await?;

    info!(
        "Saved score {} for job {}, candidate {}. Final score: {}",
        row.id, row.job_id, row.candidate_id, row.overall_score
    );
    Ok(Json(row))
}

/// GET /api/v1/scores/:id
pub async fn handle_get_score(
    State(state): State<AppState>,
    Path(score_id): Path<Uuid>,
) -> Result<Json<ScoreRow>, AppError> {
    let row = get_score(&state.db, score_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Score {score_id} not found")))?;
    Ok(Json(row))
}

/// GET /api/v1/scores/job/:job_id
pub async fn handle_scores_for_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Vec<ScoreRow>>, AppError> {
    Ok(Json(list_scores_for_job(&state.db, job_id).await?))
}

/// GET /api/v1/scores/candidate/:candidate_id
pub async fn handle_scores_for_candidate(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<Vec<ScoreRow>>, AppError> {
    Ok(Json(list_scores_for_candidate(&state.db, candidate_id).await?))
}

/// POST /api/v1/scores/batch
///
/// Scores one job against many candidates concurrently. Per-candidate
/// failures are reported in the summary; only a missing job fails the request.
pub async fn handle_batch_scores(
    State(state): State<AppState>,
    Json(request): Json<BatchScoreRequest>,
) -> Result<Json<BatchSummary>, AppError> {
    if request.candidate_ids.is_empty() {
        return Err(AppError::Validation(
            "candidate_ids cannot be empty".to_string(),
        ));
    }

    let job_id = request.job_id;
    let job_description: Arc<str> = require_job_text(&state.db, job_id).await?.into();
    let pool = state.db.clone();
    let orchestrator = state.orchestrator.clone();

    let summary = run_batch(
        job_id,
        request.candidate_ids,
        state.config.batch_concurrency,
        move |candidate_id| {
            let pool = pool.clone();
            let orchestrator = orchestrator.clone();
            let job_description = job_description.clone();
            async move {
                score_candidate(&pool, &orchestrator, job_id, &job_description, candidate_id).await
            }
        },
    )
    .await;

    Ok(Json(summary))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn score_candidate(
    pool: &PgPool,
    orchestrator: &ScoringOrchestrator,
    job_id: Uuid,
    job_description: &str,
    candidate_id: Uuid,
) -> Result<ScoredCandidate, AppError> {
    let candidate_resume = require_candidate_text(pool, candidate_id).await?;
    let match_request = MatchRequest {
        job_id,
        candidate_id,
        job_description: job_description.to_string(),
        candidate_resume,
    };

    let record = orchestrator.run(&match_request).await;
    let row = save_score(pool, &record).await?;

    Ok(ScoredCandidate {
        score_id: row.id,
        overall_score: row.overall_score,
        degraded: record.is_degraded(),
    })
}

async fn require_job_text(pool: &PgPool, job_id: Uuid) -> Result<String, AppError> {
    let text = resolve_job_text(pool, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    if text.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "Job {job_id} has no description text"
        )));
    }
    Ok(text)
}

async fn require_candidate_text(pool: &PgPool, candidate_id: Uuid) -> Result<String, AppError> {
    let text = resolve_candidate_text(pool, candidate_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {candidate_id} not found")))?;
    if text.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "Candidate {candidate_id} has no resume text"
        )));
    }
    Ok(text)
}
