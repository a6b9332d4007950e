// Prompt templates for the two scoring exchanges.
// Placeholders are filled by `contract::fill_template` in a single pass, so
// document text containing `{...}` is never re-substituted.

/// Step 1. Placeholders: {job_description}, {candidate_resume}, {rule}, {json_only}
pub const SKILL_EXTRACTION_PROMPT_TEMPLATE: &str = r#"You are an AI assistant analyzing recruitment documents.
Review the job description and candidate resume below.

JOB DESCRIPTION:
{rule}
{job_description}
{rule}

CANDIDATE RESUME:
{rule}
{candidate_resume}
{rule}

Your task is to identify and extract the key skills mentioned in both texts.
Focus on technical skills, software, methodologies, and relevant soft skills.

Return a JSON object with this EXACT schema:
{
    "job_skills": ["skill1", "skill2"],
    "candidate_skills": ["skillA", "skillB"]
}

{json_only}"#;

/// Step 2. Placeholders: {job_description}, {candidate_resume}, {job_skills},
/// {candidate_skills}, {rule}, {json_only}
pub const SCORE_SYNTHESIS_PROMPT_TEMPLATE: &str = r#"You are an AI-powered recruitment assistant evaluating a candidate's fit for a job.
You have the original job description and candidate resume, along with pre-extracted lists of key skills for both.

JOB DESCRIPTION:
{rule}
{job_description}
{rule}

CANDIDATE RESUME:
{rule}
{candidate_resume}
{rule}

EXTRACTED JOB SKILLS:
{job_skills}

EXTRACTED CANDIDATE SKILLS:
{candidate_skills}

Based on ALL the provided information (especially comparing the skill lists and considering experience/education context from the full texts), provide a comprehensive evaluation.

Calculate an overall match score (0-100) reflecting the candidate's suitability.
Provide a concise explanation justifying the score, highlighting key strengths and weaknesses based on skill overlap, experience relevance, and other factors from the texts.

Return a JSON object with this EXACT schema:
{
    "overall_score": 75,
    "explanation": "Concise explanation for the score"
}

{json_only}"#;
