use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A stored match score. `details` holds the serialized `ScoreDetails`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScoreRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub overall_score: f64,
    pub explanation: String,
    pub details: Value,
    pub created_at: DateTime<Utc>,
}
