//! Document Analyzer: one model exchange per document, turning a job
//! description or a résumé into a typed structured analysis.
//!
//! Independent of match scoring. Uses the same strict JSON contract, so a
//! malformed answer is a `StageError`, never a half-filled struct.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::analysis::models::{CandidateAnalysis, JobAnalysis, SkillDemand};
use crate::analysis::prompts::{CANDIDATE_ANALYSIS_PROMPT_TEMPLATE, JOB_ANALYSIS_PROMPT_TEMPLATE};
use crate::llm_client::prompts::{DOCUMENT_RULE, JSON_ONLY_INSTRUCTION};
use crate::llm_client::TextGenerator;
use crate::scoring::contract::{
    fill_template, invoke_model, parse_json_object, raw_fragment, trim_names, Stage, StageError,
};

pub struct DocumentAnalyzer {
    llm: Arc<dyn TextGenerator>,
    call_timeout: Duration,
}

impl DocumentAnalyzer {
    pub fn new(llm: Arc<dyn TextGenerator>, call_timeout: Duration) -> Self {
        Self { llm, call_timeout }
    }

    pub async fn analyze_job(&self, job_description: &str) -> Result<JobAnalysis, StageError> {
        let prompt = build_job_analysis_prompt(job_description);
        let text = self.call(&prompt, Stage::JobAnalysis).await?;
        parse_job_analysis(&text).map_err(|e| {
            warn!("Job analysis response rejected: {}", e);
            e
        })
    }

    pub async fn analyze_candidate(
        &self,
        candidate_resume: &str,
    ) -> Result<CandidateAnalysis, StageError> {
        let prompt = build_candidate_analysis_prompt(candidate_resume);
        let text = self.call(&prompt, Stage::CandidateAnalysis).await?;
        parse_candidate_analysis(&text).map_err(|e| {
            warn!("Candidate analysis response rejected: {}", e);
            e
        })
    }

    async fn call(&self, prompt: &str, stage: Stage) -> Result<String, StageError> {
        let text = invoke_model(self.llm.as_ref(), prompt, self.call_timeout, stage).await?;
        debug!("{} raw response: {}...", stage, raw_fragment(&text));
        Ok(text)
    }
}

pub fn build_job_analysis_prompt(job_description: &str) -> String {
    fill_template(
        JOB_ANALYSIS_PROMPT_TEMPLATE,
        &[
            ("job_description", job_description),
            ("rule", DOCUMENT_RULE),
            ("json_only", JSON_ONLY_INSTRUCTION),
        ],
    )
}

pub fn build_candidate_analysis_prompt(candidate_resume: &str) -> String {
    fill_template(
        CANDIDATE_ANALYSIS_PROMPT_TEMPLATE,
        &[
            ("candidate_resume", candidate_resume),
            ("rule", DOCUMENT_RULE),
            ("json_only", JSON_ONLY_INSTRUCTION),
        ],
    )
}

/// Strict parse; every name list is trimmed and cleared of blanks.
pub fn parse_job_analysis(text: &str) -> Result<JobAnalysis, StageError> {
    let parsed: JobAnalysis = parse_json_object(text)?;
    let market_insights = parsed.market_insights.map(|mut insights| {
        insights.skill_demand = insights.skill_demand.map(|demand| SkillDemand {
            high_demand_skills: trim_names(demand.high_demand_skills),
            trending_skills: trim_names(demand.trending_skills),
        });
        insights
    });

    Ok(JobAnalysis {
        required_skills: trim_names(parsed.required_skills),
        preferred_skills: trim_names(parsed.preferred_skills),
        responsibilities: trim_names(parsed.responsibilities),
        benefits: trim_names(parsed.benefits),
        market_insights,
        ..parsed
    })
}

pub fn parse_candidate_analysis(text: &str) -> Result<CandidateAnalysis, StageError> {
    let parsed: CandidateAnalysis = parse_json_object(text)?;
    Ok(CandidateAnalysis {
        skills: trim_names(parsed.skills),
        certifications: trim_names(parsed.certifications),
        languages: trim_names(parsed.languages),
        ..parsed
    })
}
