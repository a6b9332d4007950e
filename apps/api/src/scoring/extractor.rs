//! Skill Extractor: first scoring stage. Turns a job description and a résumé
//! into two skill-name lists.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::llm_client::prompts::{DOCUMENT_RULE, JSON_ONLY_INSTRUCTION};
use crate::llm_client::TextGenerator;
use crate::scoring::contract::{
    fill_template, invoke_model, parse_json_object, raw_fragment, trim_names, Stage, StageError,
};
use crate::scoring::prompts::SKILL_EXTRACTION_PROMPT_TEMPLATE;

/// Both lists are always present on success, possibly empty, in model order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSkills {
    pub job_skills: Vec<String>,
    pub candidate_skills: Vec<String>,
}

pub type SkillExtractionResult = Result<ExtractedSkills, StageError>;

pub struct SkillExtractor {
    llm: Arc<dyn TextGenerator>,
    call_timeout: Duration,
}

impl SkillExtractor {
    pub fn new(llm: Arc<dyn TextGenerator>, call_timeout: Duration) -> Self {
        Self { llm, call_timeout }
    }

    /// Never fails loudly: every problem comes back as a `StageError`.
    pub async fn extract(
        &self,
        job_description: &str,
        candidate_resume: &str,
    ) -> SkillExtractionResult {
        let prompt = build_extraction_prompt(job_description, candidate_resume);
        let text = invoke_model(
            self.llm.as_ref(),
            &prompt,
            self.call_timeout,
            Stage::SkillExtraction,
        )
        .await?;

        debug!("Skill extraction raw response: {}...", raw_fragment(&text));

        parse_skill_extraction(&text).map_err(|e| {
            warn!("Skill extraction response rejected: {}", e);
            e
        })
    }
}

pub fn build_extraction_prompt(job_description: &str, candidate_resume: &str) -> String {
    fill_template(
        SKILL_EXTRACTION_PROMPT_TEMPLATE,
        &[
            ("job_description", job_description),
            ("candidate_resume", candidate_resume),
            ("rule", DOCUMENT_RULE),
            ("json_only", JSON_ONLY_INSTRUCTION),
        ],
    )
}

/// Strict parse of `{"job_skills": [..], "candidate_skills": [..]}`.
/// Names are trimmed and blank entries dropped; order and duplicates are kept.
pub fn parse_skill_extraction(text: &str) -> SkillExtractionResult {
    let parsed: ExtractedSkills = parse_json_object(text)?;
    Ok(ExtractedSkills {
        job_skills: trim_names(parsed.job_skills),
        candidate_skills: trim_names(parsed.candidate_skills),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::mock::ScriptedGenerator;

    #[test]
    fn test_prompt_embeds_both_documents_verbatim() {
        let prompt = build_extraction_prompt(
            "Looking for a Python developer with AWS experience.",
            "5 years Python, AWS certified.",
        );
        assert!(prompt
            .contains("JOB DESCRIPTION:\n--------------------\nLooking for a Python developer"));
        assert!(prompt
            .contains("CANDIDATE RESUME:\n--------------------\n5 years Python, AWS certified."));
        assert!(prompt.contains("\"job_skills\""));
        assert!(prompt.contains("Return your response ONLY as a valid JSON object"));
        assert!(!prompt.contains("{rule}"));
    }

    #[test]
    fn test_parse_valid_response() {
        let result = parse_skill_extraction(
            r#"{"job_skills":["Python","AWS"],"candidate_skills":["Python","AWS"]}"#,
        )
        .unwrap();
        assert_eq!(result.job_skills, vec!["Python", "AWS"]);
        assert_eq!(result.candidate_skills, vec!["Python", "AWS"]);
    }

    #[test]
    fn test_parse_trims_and_drops_blank_names() {
        let result = parse_skill_extraction(
            r#"{"job_skills":["  Rust ", "", "SQL"],"candidate_skills":["   "]}"#,
        )
        .unwrap();
        assert_eq!(result.job_skills, vec!["Rust", "SQL"]);
        assert!(result.candidate_skills.is_empty());
    }

    #[test]
    fn test_parse_empty_lists_is_valid() {
        let result = parse_skill_extraction(r#"{"job_skills":[],"candidate_skills":[]}"#).unwrap();
        assert!(result.job_skills.is_empty());
        assert!(result.candidate_skills.is_empty());
    }

    #[test]
    fn test_parse_missing_key_is_error() {
        let err = parse_skill_extraction(r#"{"job_skills":["Python"]}"#).unwrap_err();
        assert!(err.to_string().contains("candidate_skills"), "{err}");
    }

    #[test]
    fn test_parse_wrong_type_is_error() {
        let err =
            parse_skill_extraction(r#"{"job_skills":"Python, AWS","candidate_skills":[]}"#)
                .unwrap_err();
        assert!(matches!(err, StageError::Parse { .. }));
    }

    #[test]
    fn test_parse_non_json_keeps_raw_fragment() {
        match parse_skill_extraction("not json").unwrap_err() {
            StageError::Parse { raw, .. } => assert_eq!(raw, "not json"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_is_idempotent() {
        let text = r#"{"job_skills":["Go","Kubernetes"],"candidate_skills":["Go"],"notes":"x"}"#;
        assert_eq!(parse_skill_extraction(text), parse_skill_extraction(text));
    }

    #[tokio::test]
    async fn test_extract_calls_model_once() {
        let mock = Arc::new(ScriptedGenerator::new());
        mock.push_text(r#"{"job_skills":["Figma"],"candidate_skills":["Sketch"]}"#);

        let extractor = SkillExtractor::new(mock.clone(), Duration::from_secs(5));
        let skills = extractor
            .extract("UX designer wanted", "Designer with Sketch")
            .await
            .unwrap();

        assert_eq!(skills.job_skills, vec!["Figma"]);
        assert_eq!(mock.call_count(), 1);
        assert!(mock.prompts()[0].contains("UX designer wanted"));
    }
}
