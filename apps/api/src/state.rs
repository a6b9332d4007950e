use std::sync::Arc;

use sqlx::PgPool;

use crate::analysis::analyzer::DocumentAnalyzer;
use crate::config::Config;
use crate::scoring::orchestrator::ScoringOrchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Stateless between runs, so one instance serves every request.
    pub orchestrator: Arc<ScoringOrchestrator>,
    pub analyzer: Arc<DocumentAnalyzer>,
    pub config: Config,
}
