// Prompt templates for standalone document analysis.
// Filled by `scoring::contract::fill_template`.

/// Placeholders: {job_description}, {rule}, {json_only}
pub const JOB_ANALYSIS_PROMPT_TEMPLATE: &str = r#"You are a job description analysis assistant for a recruitment system.
Extract structured information from the job description below.

JOB DESCRIPTION:
{rule}
{job_description}
{rule}

Distinguish mandatory requirements from preferred ("nice to have") qualifications.
Infer the seniority level from the responsibilities and requirements.
If a piece of information is genuinely missing, use null (or an empty list) instead of guessing.

Return a JSON object with this EXACT schema:
{
    "required_skills": ["skill1", "skill2"],
    "preferred_skills": ["skill3"],
    "minimum_experience": "3+ years",
    "education": "Bachelor's degree in Computer Science",
    "responsibilities": ["responsibility1"],
    "job_type": "full-time",
    "salary_range": null,
    "company_culture": "Short description",
    "benefits": ["benefit1"],
    "industry": "Software",
    "seniority_level": "mid",
    "market_insights": {
        "skill_demand": {
            "high_demand_skills": ["skill1"],
            "trending_skills": ["skill4"]
        },
        "salary_insights": null,
        "industry_outlook": "Short outlook"
    },
    "reasoning": "How the key points were derived"
}

{json_only}"#;

/// Placeholders: {candidate_resume}, {rule}, {json_only}
pub const CANDIDATE_ANALYSIS_PROMPT_TEMPLATE: &str = r#"You are an expert CV analyzer for a recruitment system.
Extract structured information from the resume below: skills, work experience, education, certifications and other relevant details.

CANDIDATE RESUME:
{rule}
{candidate_resume}
{rule}

If a piece of information is genuinely missing, use null (or an empty list) instead of guessing.

Return a JSON object with this EXACT schema:
{
    "contact_info": {"name": "Full Name", "email": null, "phone": null, "location": "City"},
    "summary": "Brief professional summary",
    "skills": ["skill1", "skill2"],
    "work_experience": [
        {"company": "Company", "title": "Role", "dates": "2019 - 2023", "responsibilities": ["responsibility1"]}
    ],
    "education": [
        {"institution": "University", "degree": "BSc", "field": "Computer Science", "graduation_date": "2018"}
    ],
    "certifications": ["certification1"],
    "projects": [
        {"name": "Project", "description": "What it does", "technologies": ["tech1"]}
    ],
    "languages": ["English"],
    "overall_profile": "Brief assessment of the candidate's profile"
}

{json_only}"#;
