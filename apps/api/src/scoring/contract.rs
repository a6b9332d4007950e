//! Shared plumbing for the two scoring exchanges: prompt filling, the
//! timeout-bounded model call, and strict JSON-contract parsing.
//!
//! Every failure a stage can hit is folded into `StageError` here, so the
//! stages themselves never return anything but a typed result.

use std::fmt;
use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::llm_client::{strip_json_fences, TextGenerator};

/// How much of a bad model response is kept for diagnostics.
pub const RAW_FRAGMENT_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    SkillExtraction,
    ScoreSynthesis,
    JobAnalysis,
    CandidateAnalysis,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::SkillExtraction => f.write_str("skill extraction"),
            Stage::ScoreSynthesis => f.write_str("score synthesis"),
            Stage::JobAnalysis => f.write_str("job analysis"),
            Stage::CandidateAnalysis => f.write_str("candidate analysis"),
        }
    }
}

/// Error marker for a stage that could not produce its payload.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageError {
    /// The model call failed after the retry policy gave up.
    #[error("model call failed: {message}")]
    Call { message: String },

    #[error("model call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The model answered, but not with the JSON object the stage asked for.
    #[error("{message}")]
    Parse { message: String, raw: String },
}

impl StageError {
    fn parse(message: impl Into<String>, raw_text: &str) -> Self {
        StageError::Parse {
            message: message.into(),
            raw: raw_fragment(raw_text),
        }
    }
}

/// First `RAW_FRAGMENT_CHARS` characters of `text`.
pub fn raw_fragment(text: &str) -> String {
    text.chars().take(RAW_FRAGMENT_CHARS).collect()
}

/// Trims every name and drops blank ones. Order and duplicates are kept.
pub fn trim_names(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Substitutes `{name}` placeholders in one left-to-right pass. Substituted
/// values are never rescanned, and braces that do not open a known
/// placeholder are copied through untouched.
pub fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let values_len: usize = vars.iter().map(|(_, v)| v.len()).sum();
    let mut out = String::with_capacity(template.len() + values_len);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let matched = vars.iter().find_map(|(name, value)| {
            let placeholder_len = name.len() + 2;
            let is_match = tail.len() >= placeholder_len
                && tail[1..].starts_with(name)
                && tail[1 + name.len()..].starts_with('}');
            is_match.then_some((placeholder_len, *value))
        });
        match matched {
            Some((len, value)) => {
                out.push_str(value);
                rest = &tail[len..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Calls the model once through `llm` (which may retry internally), bounded
/// by `timeout`. Transport failures and timeouts become stage errors.
pub async fn invoke_model(
    llm: &dyn TextGenerator,
    prompt: &str,
    timeout: Duration,
    stage: Stage,
) -> Result<String, StageError> {
    match tokio::time::timeout(timeout, llm.generate(prompt)).await {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => {
            warn!("Model call for {} failed: {}", stage, e);
            Err(StageError::Call {
                message: e.to_string(),
            })
        }
        Err(_) => {
            warn!(
                "Model call for {} timed out after {}ms",
                stage,
                timeout.as_millis()
            );
            Err(StageError::Timeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })
        }
    }
}

/// Parses model output against a typed schema.
///
/// Accepts a bare JSON object, optionally wrapped in code fences. Anything
/// else (prose, arrays, scalars, missing or mistyped keys) is a parse error.
/// Unknown keys are ignored.
pub fn parse_json_object<T: DeserializeOwned>(text: &str) -> Result<T, StageError> {
    let body = strip_json_fences(text);

    let value: Value = serde_json::from_str(body)
        .map_err(|e| StageError::parse(format!("response is not valid JSON: {e}"), text))?;

    if !value.is_object() {
        return Err(StageError::parse("response is not a JSON object", text));
    }

    serde_json::from_value(value).map_err(|e| {
        StageError::parse(
            format!("response does not match the expected schema: {e}"),
            text,
        )
    })
}
