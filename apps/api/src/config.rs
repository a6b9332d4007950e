use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::llm_client::{RetryPolicy, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::scoring::orchestrator::ScoringOptions;

/// Numbered key variables read when `GEMINI_API_KEYS` is not set.
const MAX_NUMBERED_KEYS: usize = 10;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub gemini_api_keys: Vec<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub llm_call_timeout: Duration,
    pub llm_max_attempts: u32,
    pub llm_initial_backoff: Duration,
    pub llm_max_backoff: Duration,
    pub stage_delay: Duration,
    pub batch_concurrency: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so parsing is testable without
    /// touching the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let gemini_api_keys = collect_api_keys(&lookup);
        if gemini_api_keys.is_empty() {
            bail!(
                "No Gemini API keys configured: set GEMINI_API_KEYS or \
                 GEMINI_API_KEY_1..GEMINI_API_KEY_{MAX_NUMBERED_KEYS}"
            );
        }

        Ok(Config {
            database_url: require(&lookup, "DATABASE_URL")?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            gemini_api_keys,
            gemini_model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: lookup("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            llm_call_timeout: Duration::from_secs(parse_or(&lookup, "LLM_CALL_TIMEOUT_SECS", 120)?),
            llm_max_attempts: parse_or(&lookup, "LLM_MAX_ATTEMPTS", 5)?,
            llm_initial_backoff: Duration::from_millis(parse_or(
                &lookup,
                "LLM_INITIAL_BACKOFF_MS",
                1_000,
            )?),
            llm_max_backoff: Duration::from_millis(parse_or(
                &lookup,
                "LLM_MAX_BACKOFF_MS",
                60_000,
            )?),
            stage_delay: Duration::from_millis(parse_or(&lookup, "SCORE_STAGE_DELAY_MS", 1_000)?),
            batch_concurrency: parse_or(&lookup, "BATCH_CONCURRENCY", 4)?,
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.llm_max_attempts,
            initial_backoff: self.llm_initial_backoff,
            max_backoff: self.llm_max_backoff,
        }
    }

    pub fn scoring_options(&self) -> ScoringOptions {
        ScoringOptions {
            call_timeout: self.llm_call_timeout,
            stage_delay: self.stage_delay,
        }
    }
}

/// `GEMINI_API_KEYS` (comma-separated) wins; otherwise the numbered
/// `GEMINI_API_KEY_n` variables are collected in order.
fn collect_api_keys(lookup: &impl Fn(&str) -> Option<String>) -> Vec<String> {
    if let Some(list) = lookup("GEMINI_API_KEYS") {
        let keys: Vec<String> = list
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from)
            .collect();
        if !keys.is_empty() {
            return keys;
        }
    }

    (1..=MAX_NUMBERED_KEYS)
        .filter_map(|i| lookup(&format!("GEMINI_API_KEY_{i}")))
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect()
}

fn require(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
