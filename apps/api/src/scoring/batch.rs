//! Batch scoring: one job against many candidates.
//!
//! Each candidate is an independent orchestration run in its own task. A
//! semaphore caps how many runs are in flight, since every run makes two
//! rate-limited model calls.

use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;

/// What a single candidate's run produced once stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub score_id: Uuid,
    pub overall_score: f64,
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CandidateOutcome {
    /// A record was produced and stored, degraded or not.
    Success(ScoredCandidate),
    Error { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub job_id: Uuid,
    pub results: BTreeMap<Uuid, CandidateOutcome>,
    pub total_processed: usize,
    pub successful: usize,
}

/// Runs `score_one` for every distinct candidate id, at most `concurrency` at
/// a time. Failures are reported per candidate and never abort the batch.
pub async fn run_batch<F, Fut>(
    job_id: Uuid,
    candidate_ids: Vec<Uuid>,
    concurrency: usize,
    score_one: F,
) -> BatchSummary
where
    F: Fn(Uuid) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ScoredCandidate, AppError>> + Send + 'static,
{
    let mut seen = HashSet::new();
    let candidate_ids: Vec<Uuid> = candidate_ids
        .into_iter()
        .filter(|id| seen.insert(*id))
        .collect();

    info!(
        "Batch scoring job {} against {} candidates (concurrency {})",
        job_id,
        candidate_ids.len(),
        concurrency
    );

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let score_one = Arc::new(score_one);

    // Spawn everything up front; the semaphore does the pacing.
    let handles: Vec<_> = candidate_ids
        .iter()
        .map(|&candidate_id| {
            let semaphore = semaphore.clone();
            let score_one = score_one.clone();
            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                score_one(candidate_id).await
            });
            (candidate_id, handle)
        })
        .collect();

    let mut results = BTreeMap::new();
    let mut successful = 0;

    for (candidate_id, handle) in handles {
        let outcome = match handle.await {
            Ok(Ok(scored)) => {
                successful += 1;
                CandidateOutcome::Success(scored)
            }
            Ok(Err(e)) => {
                warn!(
                    "Batch scoring for job {}, candidate {} failed: {}",
                    job_id, candidate_id, e
                );
                CandidateOutcome::Error {
                    message: e.public_message(),
                }
            }
            Err(join_error) => {
                error!(
                    "Batch task for job {}, candidate {} aborted: {}",
                    job_id, candidate_id, join_error
                );
                CandidateOutcome::Error {
                    message: "Scoring task aborted unexpectedly".to_string(),
                }
            }
        };
        results.insert(candidate_id, outcome);
    }

    info!(
        "Batch scoring job {} finished: {}/{} successful",
        job_id,
        successful,
        candidate_ids.len()
    );

    BatchSummary {
        job_id,
        results,
        total_processed: candidate_ids.len(),
        successful,
    }
}
