//! Axum route handlers for document analysis.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::models::{CandidateAnalysis, JobAnalysis};
use crate::analysis::store::{
    load_candidate_source, load_job_source, save_candidate_analysis, save_job_analysis,
};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeParams {
    /// Re-run the model even when a stored analysis exists.
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub struct JobAnalysisResponse {
    pub job_id: Uuid,
    pub cached: bool,
    pub analysis: JobAnalysis,
}

#[derive(Debug, Serialize)]
pub struct CandidateAnalysisResponse {
    pub candidate_id: Uuid,
    pub cached: bool,
    pub analysis: CandidateAnalysis,
}

/// POST /api/v1/jobs/:job_id/analyze?force=true
///
/// Returns the stored analysis when one exists; otherwise asks the model,
/// stores the result and returns it.
pub async fn handle_analyze_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(params): Query<AnalyzeParams>,
) -> Result<Json<JobAnalysisResponse>, AppError> {
    let source = load_job_source(&state.db, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    if let Some(analysis) = cached::<JobAnalysis>(source.analysis, params.force) {
        return Ok(Json(JobAnalysisResponse {
            job_id,
            cached: true,
            analysis,
        }));
    }

    if source.text.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "Job {job_id} has no description text"
        )));
    }

    let analysis = state
        .analyzer
        .analyze_job(&source.text)
        .await
        .map_err(AppError::AnalysisFailed)?;

    if !save_job_analysis(&state.db, job_id, &analysis).await? {
        return Err(AppError::NotFound(format!("Job {job_id} not found")));
    }
    info!(
        "Stored analysis for job {} ({} required skills)",
        job_id,
        analysis.required_skills.len()
    );

    Ok(Json(JobAnalysisResponse {
        job_id,
        cached: false,
        analysis,
    }))
}

/// POST /api/v1/candidates/:candidate_id/analyze?force=true
pub async fn handle_analyze_candidate(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
    Query(params): Query<AnalyzeParams>,
) -> Result<Json<CandidateAnalysisResponse>, AppError> {
    let source = load_candidate_source(&state.db, candidate_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {candidate_id} not found")))?;

    if let Some(analysis) = cached::<CandidateAnalysis>(source.analysis, params.force) {
        return Ok(Json(CandidateAnalysisResponse {
            candidate_id,
            cached: true,
            analysis,
        }));
    }

    if source.text.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "Candidate {candidate_id} has no resume text"
        )));
    }

    let analysis = state
        .analyzer
        .analyze_candidate(&source.text)
        .await
        .map_err(AppError::AnalysisFailed)?;

    if !save_candidate_analysis(&state.db, candidate_id, &analysis).await? {
        return Err(AppError::NotFound(format!(
            "Candidate {candidate_id} not found"
        )));
    }
    info!(
        "Stored analysis for candidate {} ({} skills)",
        candidate_id,
        analysis.skills.len()
    );

    Ok(Json(CandidateAnalysisResponse {
        candidate_id,
        cached: false,
        analysis,
    }))
}

/// A stored analysis that no longer fits the current shape is re-generated.
fn cached<T: DeserializeOwned>(stored: Option<Value>, force: bool) -> Option<T> {
    if force {
        return None;
    }
    match serde_json::from_value(stored?) {
        Ok(analysis) => Some(analysis),
        Err(e) => {
            warn!("Ignoring stored analysis that no longer parses: {e}");
            None
        }
    }
}
