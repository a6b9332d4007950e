//! Reads a document with its stored analysis, and writes analyses back to the
//! nullable `analysis` JSONB column of `jobs` / `candidates`.

use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::analysis::models::{CandidateAnalysis, JobAnalysis};

/// Raw document text plus whatever analysis was stored for it last.
#[derive(Debug, Clone, FromRow)]
pub struct AnalysisSource {
    pub text: String,
    pub analysis: Option<Value>,
}

pub async fn load_job_source(
    pool: &PgPool,
    job_id: Uuid,
) -> Result<Option<AnalysisSource>, sqlx::Error> {
    sqlx::query_as::<_, AnalysisSource>(
        "SELECT description_raw AS text, analysis FROM jobs WHERE id = $1",
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await
}

pub async fn load_candidate_source(
    pool: &PgPool,
    candidate_id: Uuid,
) -> Result<Option<AnalysisSource>, sqlx::Error> {
    sqlx::query_as::<_, AnalysisSource>(
        "SELECT resume_raw AS text, analysis FROM candidates WHERE id = $1",
    )
    .bind(candidate_id)
    .fetch_optional(pool)
    .await
}

/// Returns false when the job no longer exists.
pub async fn save_job_analysis(
    pool: &PgPool,
    job_id: Uuid,
    analysis: &JobAnalysis,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE jobs SET analysis = $2 WHERE id = $1")
        .bind(job_id)
        .bind(Json(analysis))
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Returns false when the candidate no longer exists.
pub async fn save_candidate_analysis(
    pool: &PgPool,
    candidate_id: Uuid,
    analysis: &CandidateAnalysis,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE candidates SET analysis = $2 WHERE id = $1")
        .bind(candidate_id)
        .bind(Json(analysis))
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
