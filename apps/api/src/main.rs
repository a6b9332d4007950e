mod analysis;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod routes;
mod scoring;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::analysis::analyzer::DocumentAnalyzer;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::{GeminiClient, RetryingGenerator, RoundRobinKeys, TextGenerator};
use crate::routes::build_router;
use crate::scoring::orchestrator::ScoringOrchestrator;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting RecruitX API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url, config.db_max_connections).await?;

    // Initialize LLM client: rotating keys, one request per call, retries on top
    let keys = RoundRobinKeys::new(config.gemini_api_keys.clone());
    anyhow::ensure!(!keys.is_empty(), "No Gemini API keys available");
    info!("Loaded {} Gemini API key(s)", keys.len());

    let gemini = GeminiClient::new(&config.gemini_base_url, &config.gemini_model, Arc::new(keys));
    let llm = RetryingGenerator::new(gemini, config.retry_policy());
    info!("LLM client initialized (model: {})", llm.inner().model());
    let llm: Arc<dyn TextGenerator> = Arc::new(llm);

    let orchestrator = Arc::new(ScoringOrchestrator::new(
        llm.clone(),
        config.scoring_options(),
    ));
    let analyzer = Arc::new(DocumentAnalyzer::new(llm, config.llm_call_timeout));

    // Build app state
    let state = AppState {
        db,
        orchestrator,
        analyzer,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
