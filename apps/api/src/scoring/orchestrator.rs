//! Scoring Orchestrator: sequences skill extraction and score synthesis into
//! one match-scoring run.
//!
//! Flow: extract skills → (on success) synthesize score → MatchScoreRecord.
//!
//! A run always ends in a record. Stage failures produce a *degraded* record
//! (score 0.0, short reason, full diagnostics in `details`) instead of an error.
//! Synthesis is never called when extraction failed.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::llm_client::TextGenerator;
use crate::scoring::contract::{Stage, StageError};
use crate::scoring::extractor::{ExtractedSkills, SkillExtractor};
use crate::scoring::synthesizer::{ScoreSynthesizer, SynthesizedScore};

pub const EXTRACTION_FAILED_EXPLANATION: &str = "Scoring failed during skill extraction.";
pub const SYNTHESIS_FAILED_EXPLANATION: &str = "Scoring failed during score synthesis.";
pub const DEGRADED_SCORE: f64 = 0.0;

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringOptions {
    /// Upper bound on each stage's model exchange, retries included.
    pub call_timeout: Duration,
    /// Pause between the two stages. Spaces out calls on rate-limited tiers.
    pub stage_delay: Duration,
}

impl Default for ScoringOptions {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
            stage_delay: Duration::ZERO,
        }
    }
}

/// Input to one scoring run. Texts are already resolved from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRequest {
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub job_description: String,
    pub candidate_resume: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Complete,
    Degraded,
}

/// Serializes as `{"ok": payload}` or `{"error": {"kind": ..}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageReport<T> {
    Ok(T),
    Error(StageError),
}

/// Diagnostic payload stored alongside every score for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreDetails {
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<Stage>,
    pub extraction: StageReport<ExtractedSkills>,
    /// Absent when extraction failed and synthesis never ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis: Option<StageReport<SynthesizedScore>>,
}

/// The result of one run, built exactly once and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchScoreRecord {
    job_id: Uuid,
    candidate_id: Uuid,
    score: f64,
    explanation: String,
    details: ScoreDetails,
}

impl MatchScoreRecord {
    fn complete(
        request: &MatchRequest,
        skills: ExtractedSkills,
        synthesis: SynthesizedScore,
    ) -> Self {
        Self {
            job_id: request.job_id,
            candidate_id: request.candidate_id,
            score: synthesis.overall_score,
            explanation: synthesis.explanation.clone(),
            details: ScoreDetails {
                outcome: Outcome::Complete,
                failed_stage: None,
                extraction: StageReport::Ok(skills),
                synthesis: Some(StageReport::Ok(synthesis)),
            },
        }
    }

    fn extraction_failed(request: &MatchRequest, error: StageError) -> Self {
        Self {
            job_id: request.job_id,
            candidate_id: request.candidate_id,
            score: DEGRADED_SCORE,
            explanation: EXTRACTION_FAILED_EXPLANATION.to_string(),
            details: ScoreDetails {
                outcome: Outcome::Degraded,
                failed_stage: Some(Stage::SkillExtraction),
                extraction: StageReport::Error(error),
                synthesis: None,
            },
        }
    }

    fn synthesis_failed(
        request: &MatchRequest,
        skills: ExtractedSkills,
        error: StageError,
    ) -> Self {
        Self {
            job_id: request.job_id,
            candidate_id: request.candidate_id,
            score: DEGRADED_SCORE,
            explanation: SYNTHESIS_FAILED_EXPLANATION.to_string(),
            details: ScoreDetails {
                outcome: Outcome::Degraded,
                failed_stage: Some(Stage::ScoreSynthesis),
                extraction: StageReport::Ok(skills),
                synthesis: Some(StageReport::Error(error)),
            },
        }
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn candidate_id(&self) -> Uuid {
        self.candidate_id
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn details(&self) -> &ScoreDetails {
        &self.details
    }

    pub fn is_degraded(&self) -> bool {
        self.details.outcome == Outcome::Degraded
    }
}

/// Stateless between runs; share it as `Arc<ScoringOrchestrator>`.
pub struct ScoringOrchestrator {
    extractor: SkillExtractor,
    synthesizer: ScoreSynthesizer,
    options: ScoringOptions,
}

impl ScoringOrchestrator {
    /// Both stages talk to the same model.
    pub fn new(llm: Arc<dyn TextGenerator>, options: ScoringOptions) -> Self {
        Self {
            extractor: SkillExtractor::new(llm.clone(), options.call_timeout),
            synthesizer: ScoreSynthesizer::new(llm, options.call_timeout),
            options,
        }
    }

    #[cfg(test)]
    pub fn with_stages(
        extractor: SkillExtractor,
        synthesizer: ScoreSynthesizer,
        options: ScoringOptions,
    ) -> Self {
        Self {
            extractor,
            synthesizer,
            options,
        }
    }

    pub async fn run(&self, request: &MatchRequest) -> MatchScoreRecord {
        let (job_id, candidate_id) = (request.job_id, request.candidate_id);
        info!(
            "Starting two-step score generation for job {}, candidate {}",
            job_id, candidate_id
        );

        // Step 1: skill extraction
        let skills = match self
            .extractor
            .extract(&request.job_description, &request.candidate_resume)
            .await
        {
            Ok(skills) => skills,
            Err(e) => {
                error!(
                    "Skill extraction failed for job {}, candidate {}: {}",
                    job_id, candidate_id, e
                );
                return MatchScoreRecord::extraction_failed(request, e);
            }
        };
        info!(
            "Step 1 successful. Job skills: {}, candidate skills: {}",
            skills.job_skills.len(),
            skills.candidate_skills.len()
        );

        if !self.options.stage_delay.is_zero() {
            tokio::time::sleep(self.options.stage_delay).await;
        }

        // Step 2: score synthesis (empty skill lists are still valid input)
        let synthesis = self
            .synthesizer
            .synthesize(
                &request.job_description,
                &request.candidate_resume,
                &skills.job_skills,
                &skills.candidate_skills,
            )
            .await;

        match synthesis {
            Ok(score) => {
                info!(
                    "Step 2 successful. Score {} for job {}, candidate {}",
                    score.overall_score, job_id, candidate_id
                );
                MatchScoreRecord::complete(request, skills, score)
            }
            Err(e) => {
                error!(
                    "Score synthesis failed for job {}, candidate {}: {}",
                    job_id, candidate_id, e
                );
                MatchScoreRecord::synthesis_failed(request, skills, e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::llm_client::mock::ScriptedGenerator;
    use crate::llm_client::LlmError;

    const JOB: &str = "Looking for a Python developer with AWS experience.";
    const RESUME: &str = "5 years Python, AWS certified.";

    fn request() -> MatchRequest {
        MatchRequest {
            job_id: Uuid::new_v4(),
            candidate_id: Uuid::new_v4(),
            job_description: JOB.to_string(),
            candidate_resume: RESUME.to_string(),
        }
    }

    /// Separate mocks per stage so call counts can be asserted independently.
    fn orchestrator_with(
        extraction: &Arc<ScriptedGenerator>,
        synthesis: &Arc<ScriptedGenerator>,
    ) -> ScoringOrchestrator {
        let timeout = Duration::from_secs(5);
        ScoringOrchestrator::with_stages(
            SkillExtractor::new(extraction.clone(), timeout),
            ScoreSynthesizer::new(synthesis.clone(), timeout),
            ScoringOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_successful_run_takes_score_from_synthesis() {
        let extraction = Arc::new(ScriptedGenerator::new());
        let synthesis = Arc::new(ScriptedGenerator::new());
        extraction
            .push_text(r#"{"job_skills":["Python","AWS"],"candidate_skills":["Python","AWS"]}"#);
        synthesis.push_text(r#"{"overall_score":92,"explanation":"Strong skill overlap."}"#);

        let request = request();
        let record = orchestrator_with(&extraction, &synthesis).run(&request).await;

        assert_eq!(record.score(), 92.0);
        assert_eq!(record.explanation(), "Strong skill overlap.");
        assert_eq!(record.job_id(), request.job_id);
        assert_eq!(record.candidate_id(), request.candidate_id);
        assert!(!record.is_degraded());
        assert_eq!(record.details().failed_stage, None);
        assert!(synthesis.prompts()[0].contains("[\"Python\",\"AWS\"]"));
    }

    #[tokio::test]
    async fn test_malformed_extraction_short_circuits() {
        let extraction = Arc::new(ScriptedGenerator::new());
        let synthesis = Arc::new(ScriptedGenerator::new());
        extraction.push_text("not json");
        synthesis.push_text(r#"{"overall_score":50,"explanation":"unused"}"#);

        let record = orchestrator_with(&extraction, &synthesis).run(&request()).await;

        assert_eq!(record.score(), 0.0);
        assert!(record.explanation().contains("skill extraction"));
        assert!(record.is_degraded());
        assert_eq!(record.details().failed_stage, Some(Stage::SkillExtraction));
        assert!(record.details().synthesis.is_none());
        assert_eq!(extraction.call_count(), 1);
        assert_eq!(synthesis.call_count(), 0);
    }

    #[tokio::test]
    async fn test_extraction_call_failure_short_circuits() {
        let extraction = Arc::new(ScriptedGenerator::new());
        let synthesis = Arc::new(ScriptedGenerator::new());
        extraction.push_error(LlmError::Api {
            status: 429,
            message: "Resource has been exhausted".to_string(),
        });

        let record = orchestrator_with(&extraction, &synthesis).run(&request()).await;

        assert_eq!(record.score(), 0.0);
        assert!(matches!(
            record.details().extraction,
            StageReport::Error(StageError::Call { .. })
        ));
        assert_eq!(synthesis.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_skill_lists_still_synthesize() {
        let extraction = Arc::new(ScriptedGenerator::new());
        let synthesis = Arc::new(ScriptedGenerator::new());
        extraction.push_text(r#"{"job_skills":[],"candidate_skills":[]}"#);
        synthesis.push_text(r#"{"overall_score":12,"explanation":"Nothing to match."}"#);

        let record = orchestrator_with(&extraction, &synthesis).run(&request()).await;

        assert_eq!(synthesis.call_count(), 1);
        assert_eq!(record.score(), 12.0);
        assert_eq!(record.explanation(), "Nothing to match.");
        assert!(!record.is_degraded());
    }

    #[tokio::test]
    async fn test_non_numeric_score_falls_back_to_zero() {
        let extraction = Arc::new(ScriptedGenerator::new());
        let synthesis = Arc::new(ScriptedGenerator::new());
        extraction.push_text(r#"{"job_skills":["Go"],"candidate_skills":["Go"]}"#);
        synthesis
            .push_text(r#"{"overall_score":"not a number","explanation":"Good Go background."}"#);

        let record = orchestrator_with(&extraction, &synthesis).run(&request()).await;

        assert_eq!(record.score(), 0.0);
        assert_eq!(record.explanation(), "Good Go background.");
        assert!(!record.is_degraded());
        match &record.details().synthesis {
            Some(StageReport::Ok(score)) => assert_eq!(score.warnings.len(), 1),
            other => panic!("expected synthesis payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_synthesis_failure_keeps_extraction_for_traceability() {
        let extraction = Arc::new(ScriptedGenerator::new());
        let synthesis = Arc::new(ScriptedGenerator::new());
        extraction.push_text(r#"{"job_skills":["Rust"],"candidate_skills":["C++"]}"#);
        synthesis.push_text(r#"{"explanation":"score forgotten"}"#);

        let record = orchestrator_with(&extraction, &synthesis).run(&request()).await;

        assert_eq!(record.score(), 0.0);
        assert_eq!(record.explanation(), SYNTHESIS_FAILED_EXPLANATION);
        assert_eq!(record.details().failed_stage, Some(Stage::ScoreSynthesis));
        assert_eq!(
            record.details().extraction,
            StageReport::Ok(ExtractedSkills {
                job_skills: vec!["Rust".to_string()],
                candidate_skills: vec!["C++".to_string()],
            })
        );
        assert!(matches!(
            record.details().synthesis,
            Some(StageReport::Error(StageError::Parse { .. }))
        ));
    }

    #[tokio::test]
    async fn test_out_of_range_score_is_clamped() {
        let extraction = Arc::new(ScriptedGenerator::new());
        let synthesis = Arc::new(ScriptedGenerator::new());
        extraction.push_text(r#"{"job_skills":["SQL"],"candidate_skills":["SQL"]}"#);
        synthesis.push_text(r#"{"overall_score":150,"explanation":"Perfect."}"#);

        let record = orchestrator_with(&extraction, &synthesis).run(&request()).await;

        assert_eq!(record.score(), 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stage_timeout_produces_degraded_record() {
        let extraction = Arc::new(ScriptedGenerator::with_delay(Duration::from_secs(600)));
        extraction.push_text(r#"{"job_skills":[],"candidate_skills":[]}"#);

        let options = ScoringOptions {
            call_timeout: Duration::from_secs(10),
            stage_delay: Duration::ZERO,
        };
        let orchestrator = ScoringOrchestrator::new(extraction.clone(), options);
        let record = orchestrator.run(&request()).await;

        assert!(record.is_degraded());
        assert_eq!(
            record.details().extraction,
            StageReport::Error(StageError::Timeout { timeout_ms: 10_000 })
        );
        assert_eq!(extraction.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_model_with_stage_delay() {
        let llm = Arc::new(ScriptedGenerator::new());
        llm.push_text(r#"{"job_skills":["Figma"],"candidate_skills":["SQL"]}"#);
        llm.push_text(r#"{"overall_score":"45","explanation":"Different fields."}"#);

        let options = ScoringOptions {
            stage_delay: Duration::from_secs(1),
            ..ScoringOptions::default()
        };
        let started = tokio::time::Instant::now();
        let record = ScoringOrchestrator::new(llm.clone(), options)
            .run(&request())
            .await;

        assert_eq!(record.score(), 45.0);
        assert_eq!(llm.call_count(), 2);
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert!(llm.prompts()[0].contains("identify and extract the key skills"));
        assert!(llm.prompts()[1].contains("EXTRACTED CANDIDATE SKILLS:\n[\"SQL\"]"));
    }

    #[tokio::test]
    async fn test_garbage_responses_always_yield_a_record() {
        for garbage in ["", "null", "[]", "42", "{", "```", "{\"job_skills\": 7}"] {
            let extraction = Arc::new(ScriptedGenerator::new());
            let synthesis = Arc::new(ScriptedGenerator::new());
            extraction.push_text(garbage);

            let record = orchestrator_with(&extraction, &synthesis).run(&request()).await;

            assert_eq!(record.score(), 0.0, "input {garbage:?}");
            assert!(record.is_degraded());
            assert_eq!(synthesis.call_count(), 0);
        }
    }

    #[test]
    fn test_details_serialization_shape() {
        let request = request();
        let record = MatchScoreRecord::extraction_failed(
            &request,
            StageError::Parse {
                message: "response is not valid JSON".to_string(),
                raw: "not json".to_string(),
            },
        );

        let value = serde_json::to_value(record.details()).unwrap();
        assert_eq!(
            value,
            json!({
                "outcome": "degraded",
                "failed_stage": "skill_extraction",
                "extraction": {
                    "error": {
                        "kind": "parse",
                        "message": "response is not valid JSON",
                        "raw": "not json"
                    }
                }
            })
        );

        let recovered: ScoreDetails = serde_json::from_value(value).unwrap();
        assert_eq!(&recovered, record.details());
    }

    #[test]
    fn test_complete_details_carry_both_stages() {
        let record = MatchScoreRecord::complete(
            &request(),
            ExtractedSkills {
                job_skills: vec!["AWS".to_string()],
                candidate_skills: vec!["AWS".to_string()],
            },
            SynthesizedScore {
                overall_score: 80.0,
                explanation: "Good.".to_string(),
                warnings: vec![],
            },
        );

        let value = serde_json::to_value(record.details()).unwrap();
        assert_eq!(value["outcome"], "complete");
        assert!(value.get("failed_stage").is_none());
        assert_eq!(value["extraction"]["ok"]["job_skills"], json!(["AWS"]));
        assert_eq!(value["synthesis"]["ok"]["overall_score"], json!(80.0));
    }
}
