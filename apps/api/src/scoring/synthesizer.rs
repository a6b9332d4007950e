//! Score Synthesizer: second scoring stage. Combines both documents and the
//! extracted skill lists into a 0-100 match score with an explanation.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm_client::prompts::{DOCUMENT_RULE, JSON_ONLY_INSTRUCTION};
use crate::llm_client::TextGenerator;
use crate::scoring::contract::{
    fill_template, invoke_model, parse_json_object, raw_fragment, Stage, StageError,
};
use crate::scoring::prompts::SCORE_SYNTHESIS_PROMPT_TEMPLATE;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizedScore {
    /// Always within `MIN_SCORE..=MAX_SCORE`.
    pub overall_score: f64,
    pub explanation: String,
    /// Coercion and clamping notes. The score is still usable when present.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

pub type ScoreSynthesisResult = Result<SynthesizedScore, StageError>;

/// `overall_score` was present but could not be read as a number.
/// Handled inside this module by defaulting to 0.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    #[error("overall_score {0} is not numeric")]
    NotNumeric(String),

    #[error("overall_score {0} is not a finite number")]
    NonFinite(String),
}

/// Wire shape. `overall_score` stays untyped so a bad value degrades to 0
/// instead of failing the stage; `explanation` must be a real string.
#[derive(Debug, Deserialize)]
struct RawSynthesis {
    overall_score: Value,
    explanation: String,
}

pub struct ScoreSynthesizer {
    llm: Arc<dyn TextGenerator>,
    call_timeout: Duration,
}

impl ScoreSynthesizer {
    pub fn new(llm: Arc<dyn TextGenerator>, call_timeout: Duration) -> Self {
        Self { llm, call_timeout }
    }

    pub async fn synthesize(
        &self,
        job_description: &str,
        candidate_resume: &str,
        job_skills: &[String],
        candidate_skills: &[String],
    ) -> ScoreSynthesisResult {
        let prompt =
            build_synthesis_prompt(job_description, candidate_resume, job_skills, candidate_skills);
        let text = invoke_model(
            self.llm.as_ref(),
            &prompt,
            self.call_timeout,
            Stage::ScoreSynthesis,
        )
        .await?;

        debug!("Score synthesis raw response: {}...", raw_fragment(&text));

        parse_score_synthesis(&text).map_err(|e| {
            warn!("Score synthesis response rejected: {}", e);
            e
        })
    }
}

pub fn build_synthesis_prompt(
    job_description: &str,
    candidate_resume: &str,
    job_skills: &[String],
    candidate_skills: &[String],
) -> String {
    let job_skills = json!(job_skills).to_string();
    let candidate_skills = json!(candidate_skills).to_string();
    fill_template(
        SCORE_SYNTHESIS_PROMPT_TEMPLATE,
        &[
            ("job_description", job_description),
            ("candidate_resume", candidate_resume),
            ("job_skills", &job_skills),
            ("candidate_skills", &candidate_skills),
            ("rule", DOCUMENT_RULE),
            ("json_only", JSON_ONLY_INSTRUCTION),
        ],
    )
}

/// Strict parse of `{"overall_score": <number|numeric string>, "explanation": "<text>"}`.
pub fn parse_score_synthesis(text: &str) -> ScoreSynthesisResult {
    let raw: RawSynthesis = parse_json_object(text)?;
    let mut warnings = Vec::new();

    let score = match coerce_score(&raw.overall_score) {
        Ok(score) => score,
        Err(e) => {
            warn!("{}. Defaulting to 0.0", e);
            warnings.push(format!("{e}; defaulted to 0"));
            MIN_SCORE
        }
    };

    let clamped = score.clamp(MIN_SCORE, MAX_SCORE);
    if clamped != score {
        warn!("overall_score {} outside 0-100, clamped to {}", score, clamped);
        warnings.push(format!(
            "overall_score {score} outside 0-100, clamped to {clamped}"
        ));
    }

    Ok(SynthesizedScore {
        overall_score: clamped,
        explanation: raw.explanation,
        warnings,
    })
}

/// Numbers pass through; strings are trimmed (a trailing `%` is tolerated)
/// and parsed. A numeric string too large for `f64` comes back as an infinity
/// and is left for the caller to clamp. NaN, spelled-out infinities and
/// anything that is not a number or string are rejected.
///
/// A bare JSON number too large for `f64` never reaches this function:
/// serde_json rejects the whole response, so the stage fails to parse.
pub fn coerce_score(value: &Value) -> Result<f64, CoercionError> {
    let (score, overflowed) = match value {
        Value::Number(n) => {
            let score = n
                .as_f64()
                .ok_or_else(|| CoercionError::NotNumeric(value.to_string()))?;
            (score, false)
        }
        Value::String(s) => {
            let trimmed = s.trim();
            let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
            let score = trimmed
                .parse::<f64>()
                .map_err(|_| CoercionError::NotNumeric(value.to_string()))?;
            (score, trimmed.bytes().any(|b| b.is_ascii_digit()))
        }
        _ => return Err(CoercionError::NotNumeric(value.to_string())),
    };

    if score.is_finite() || (score.is_infinite() && overflowed) {
        Ok(score)
    } else {
        Err(CoercionError::NonFinite(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::mock::ScriptedGenerator;

    fn skills(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_prompt_serializes_skill_lists_as_json_arrays() {
        let prompt = build_synthesis_prompt(
            "Need Python",
            "Knows Python",
            &skills(&["Python", "AWS"]),
            &skills(&[]),
        );
        assert!(prompt.contains("EXTRACTED JOB SKILLS:\n[\"Python\",\"AWS\"]"));
        assert!(prompt.contains("EXTRACTED CANDIDATE SKILLS:\n[]"));
        assert!(prompt.contains("Need Python"));
        assert!(prompt.contains("\"overall_score\""));
    }

    #[test]
    fn test_numeric_and_string_scores_coerce_equally() {
        let from_number =
            parse_score_synthesis(r#"{"overall_score":73,"explanation":"ok"}"#).unwrap();
        let from_string =
            parse_score_synthesis(r#"{"overall_score":"73","explanation":"ok"}"#).unwrap();
        assert_eq!(from_number.overall_score, 73.0);
        assert_eq!(from_string.overall_score, 73.0);
        assert!(from_number.warnings.is_empty());
        assert!(from_string.warnings.is_empty());
    }

    #[test]
    fn test_non_numeric_score_defaults_to_zero_and_keeps_explanation() {
        let result = parse_score_synthesis(
            r#"{"overall_score":"not a number","explanation":"Partial overlap."}"#,
        )
        .unwrap();
        assert_eq!(result.overall_score, 0.0);
        assert_eq!(result.explanation, "Partial overlap.");
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("not numeric"));
    }

    #[test]
    fn test_null_score_defaults_to_zero() {
        let result =
            parse_score_synthesis(r#"{"overall_score":null,"explanation":"n/a"}"#).unwrap();
        assert_eq!(result.overall_score, 0.0);
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn test_out_of_range_scores_are_clamped_with_warning() {
        let high = parse_score_synthesis(r#"{"overall_score":150,"explanation":"x"}"#).unwrap();
        let low = parse_score_synthesis(r#"{"overall_score":"-5","explanation":"x"}"#).unwrap();
        assert_eq!(high.overall_score, 100.0);
        assert_eq!(low.overall_score, 0.0);
        assert_eq!(
            high.warnings,
            vec!["overall_score 150 outside 0-100, clamped to 100".to_string()]
        );
        assert_eq!(low.warnings.len(), 1);
    }

    #[test]
    fn test_missing_keys_are_errors() {
        let no_score = parse_score_synthesis(r#"{"explanation":"x"}"#).unwrap_err();
        let no_explanation = parse_score_synthesis(r#"{"overall_score":50}"#).unwrap_err();
        assert!(no_score.to_string().contains("overall_score"), "{no_score}");
        assert!(
            no_explanation.to_string().contains("explanation"),
            "{no_explanation}"
        );
    }

    #[test]
    fn test_null_explanation_is_error() {
        let err =
            parse_score_synthesis(r#"{"overall_score":50,"explanation":null}"#).unwrap_err();
        assert!(matches!(err, StageError::Parse { .. }));
    }

    #[test]
    fn test_coerce_score_variants() {
        assert_eq!(coerce_score(&json!(88.5)), Ok(88.5));
        assert_eq!(coerce_score(&json!(" 64 ")), Ok(64.0));
        assert_eq!(coerce_score(&json!("81%")), Ok(81.0));
        assert!(matches!(
            coerce_score(&json!(true)),
            Err(CoercionError::NotNumeric(_))
        ));
        assert!(matches!(
            coerce_score(&json!([1])),
            Err(CoercionError::NotNumeric(_))
        ));
        assert!(matches!(
            coerce_score(&json!("NaN")),
            Err(CoercionError::NonFinite(_))
        ));
    }

    #[test]
    fn test_overflowing_numeric_string_is_clamped() {
        let high =
            parse_score_synthesis(r#"{"overall_score":"1e400","explanation":"Great fit."}"#)
                .unwrap();
        assert_eq!(high.overall_score, 100.0);
        assert_eq!(high.explanation, "Great fit.");
        assert_eq!(high.warnings.len(), 1);
        assert!(high.warnings[0].contains("clamped to 100"), "{:?}", high.warnings);

        let low = parse_score_synthesis(r#"{"overall_score":"-1e400","explanation":"x"}"#)
            .unwrap();
        assert_eq!(low.overall_score, 0.0);
        assert!(low.warnings[0].contains("clamped to 0"), "{:?}", low.warnings);
    }

    #[test]
    fn test_spelled_out_infinity_is_not_a_score() {
        assert!(matches!(
            coerce_score(&json!("inf")),
            Err(CoercionError::NonFinite(_))
        ));
        let result =
            parse_score_synthesis(r#"{"overall_score":"Infinity","explanation":"x"}"#).unwrap();
        assert_eq!(result.overall_score, 0.0);
        assert!(result.warnings[0].contains("not a finite number"));
    }

    #[test]
    fn test_overflowing_bare_number_fails_the_parse() {
        let err = parse_score_synthesis(r#"{"overall_score":1e400,"explanation":"Great fit."}"#)
            .unwrap_err();
        match err {
            StageError::Parse { message, raw } => {
                assert!(message.contains("not valid JSON"), "{message}");
                assert!(raw.contains("1e400"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_scores_always_within_bounds() {
        for raw in ["-1000", "0", "42.5", "100", "1e9", "\"250\"", "\"abc\"", "\"1e400\""] {
            let text = format!(r#"{{"overall_score":{raw},"explanation":"x"}}"#);
            let result = parse_score_synthesis(&text).unwrap();
            assert!(
                (MIN_SCORE..=MAX_SCORE).contains(&result.overall_score),
                "{raw} produced {}",
                result.overall_score
            );
        }
    }

    #[test]
    fn test_parse_is_idempotent() {
        let text = r#"{"overall_score":"67","explanation":"Good match."}"#;
        assert_eq!(parse_score_synthesis(text), parse_score_synthesis(text));
    }

    #[tokio::test]
    async fn test_synthesize_calls_model_once() {
        let mock = Arc::new(ScriptedGenerator::new());
        mock.push_text(r#"{"overall_score":92,"explanation":"Strong skill overlap."}"#);

        let synthesizer = ScoreSynthesizer::new(mock.clone(), Duration::from_secs(5));
        let result = synthesizer
            .synthesize("job", "resume", &skills(&["Python"]), &skills(&["Python"]))
            .await
            .unwrap();

        assert_eq!(result.overall_score, 92.0);
        assert_eq!(result.explanation, "Strong skill overlap.");
        assert_eq!(mock.call_count(), 1);
    }
}
