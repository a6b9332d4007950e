use serde::{Deserialize, Deserializer, Serialize};

/// Models often answer `null` where an empty list is meant.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ────────────────────────────────────────────────────────────────────────────
// Job description analysis
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillDemand {
    #[serde(default, deserialize_with = "null_as_default")]
    pub high_demand_skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub trending_skills: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketInsights {
    pub skill_demand: Option<SkillDemand>,
    pub salary_insights: Option<String>,
    pub industry_outlook: Option<String>,
}

/// Structured view of a job description. Only `required_skills` is mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobAnalysis {
    pub required_skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub preferred_skills: Vec<String>,
    pub minimum_experience: Option<String>,
    pub education: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub responsibilities: Vec<String>,
    pub job_type: Option<String>,
    pub salary_range: Option<String>,
    pub company_culture: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub benefits: Vec<String>,
    pub industry: Option<String>,
    pub seniority_level: Option<String>,
    pub market_insights: Option<MarketInsights>,
    pub reasoning: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Résumé analysis
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
    pub company: Option<String>,
    pub title: Option<String>,
    pub dates: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub responsibilities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub field: Option<String>,
    pub graduation_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub technologies: Vec<String>,
}

/// Structured view of a résumé. `contact_info` must be an object, possibly empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateAnalysis {
    pub contact_info: ContactInfo,
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub work_experience: Vec<WorkExperience>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub education: Vec<Education>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub certifications: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub projects: Vec<Project>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub languages: Vec<String>,
    pub overall_profile: Option<String>,
}
