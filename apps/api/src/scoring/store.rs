//! PostgreSQL persistence for score records, and lookup of the raw document
//! text that feeds a scoring run.
//!
//! Records are insert-only: a re-score writes a new row, never an UPDATE.

use sqlx::types::Json;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::models::score::ScoreRow;
use crate::scoring::orchestrator::MatchScoreRecord;

/// Inserts the record and returns the stored row (including its new id).
pub async fn save_score(pool: &PgPool, record: &MatchScoreRecord) -> Result<ScoreRow, sqlx::Error> {
    let row = sqlx::query_as::<_, ScoreRow>(
        r#"
        INSERT INTO scores (id, job_id, candidate_id, overall_score, explanation, details)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(record.job_id())
    .bind(record.candidate_id())
    .bind(record.score())
    .bind(record.explanation())
    .bind(Json(record.details()))
    .fetch_one(pool)
    .await?;

    debug!(
        "Saved score {} for job {}, candidate {}",
        row.id, row.job_id, row.candidate_id
    );
    Ok(row)
}

pub async fn get_score(pool: &PgPool, score_id: Uuid) -> Result<Option<ScoreRow>, sqlx::Error> {
    sqlx::query_as::<_, ScoreRow>("SELECT * FROM scores WHERE id = $1")
        .bind(score_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_scores_for_job(
    pool: &PgPool,
    job_id: Uuid,
) -> Result<Vec<ScoreRow>, sqlx::Error> {
    sqlx::query_as::<_, ScoreRow>(
        "SELECT * FROM scores WHERE job_id = $1 ORDER BY created_at DESC",
    )
    .bind(job_id)
    .fetch_all(pool)
    .await
}

pub async fn list_scores_for_candidate(
    pool: &PgPool,
    candidate_id: Uuid,
) -> Result<Vec<ScoreRow>, sqlx::Error> {
    sqlx::query_as::<_, ScoreRow>(
        "SELECT * FROM scores WHERE candidate_id = $1 ORDER BY created_at DESC",
    )
    .bind(candidate_id)
    .fetch_all(pool)
    .await
}

/// Raw job description text, already extracted from the uploaded file.
pub async fn resolve_job_text(pool: &PgPool, job_id: Uuid) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT description_raw FROM jobs WHERE id = $1")
        .bind(job_id)
        .fetch_optional(pool)
        .await
}

/// Raw résumé text, already extracted from the uploaded file.
pub async fn resolve_candidate_text(
    pool: &PgPool,
    candidate_id: Uuid,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT resume_raw FROM candidates WHERE id = $1")
        .bind(candidate_id)
        .fetch_optional(pool)
        .await
}
