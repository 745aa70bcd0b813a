//! Job analysis: breaks a raw job posting into skills, duties and keywords.

use serde::{Deserialize, Serialize};

use crate::analysis::normalize::{lenient_opt_string, lenient_string, lenient_vec};
use crate::analysis::prompts::{fill, JOB_ANALYSIS_PROMPT_TEMPLATE, JOB_ANALYSIS_SYSTEM};
use crate::analysis::request;
use crate::errors::AppError;
use crate::llm_client::prompts::system_prompt;
use crate::llm_client::LlmClient;

/// Structured view of a job posting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobAnalysis {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub experience_level: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub summary: String,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub required_skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub preferred_skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub responsibilities: Vec<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub qualifications: Vec<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub keywords: Vec<String>,
}

impl JobAnalysis {
    /// Title to show for a posting; falls back when the model found none.
    pub fn display_title(&self) -> String {
        match (self.title.is_empty(), self.company.as_deref()) {
            (false, Some(company)) => format!("{} at {company}", self.title),
            (false, None) => self.title.clone(),
            (true, Some(company)) => format!("Position at {company}"),
            (true, None) => "Untitled position".to_string(),
        }
    }
}

pub fn build_prompt(job_description: &str) -> String {
    fill(
        JOB_ANALYSIS_PROMPT_TEMPLATE,
        &[("job_description", job_description)],
    )
}

pub async fn analyze_job_posting(
    llm: &LlmClient,
    job_description: &str,
) -> Result<JobAnalysis, AppError> {
    request(
        llm,
        &build_prompt(job_description),
        &system_prompt(JOB_ANALYSIS_SYSTEM),
        "analyze job posting",
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::parse_reply;
    use serde_json::json;

    #[test]
    fn test_full_reply_deserializes() {
        let analysis: JobAnalysis = parse_reply(
            json!({
                "title": "Senior Rust Engineer",
                "company": "Acme",
                "location": "Remote",
                "experience_level": "senior",
                "summary": "Build the platform.",
                "required_skills": ["Rust", "PostgreSQL"],
                "preferred_skills": ["Kubernetes"],
                "responsibilities": ["Own services"],
                "qualifications": ["5+ years"],
                "keywords": ["rust", "tokio"]
            }),
            "analyze job posting",
        )
        .unwrap();
        assert_eq!(analysis.required_skills, vec!["Rust", "PostgreSQL"]);
        assert_eq!(analysis.display_title(), "Senior Rust Engineer at Acme");
    }

    #[test]
    fn test_missing_arrays_become_empty_not_null() {
        let analysis: JobAnalysis = parse_reply(
            json!({"title": "Engineer", "required_skills": null, "keywords": "rust"}),
            "analyze job posting",
        )
        .unwrap();
        assert!(analysis.required_skills.is_empty());
        assert!(analysis.keywords.is_empty());
        assert!(analysis.responsibilities.is_empty());

        let serialized = serde_json::to_value(&analysis).unwrap();
        for field in [
            "required_skills",
            "preferred_skills",
            "responsibilities",
            "qualifications",
            "keywords",
        ] {
            assert!(serialized[field].is_array(), "{field} must serialize as an array");
        }
    }

    #[test]
    fn test_display_title_fallbacks() {
        let mut analysis = JobAnalysis::default();
        assert_eq!(analysis.display_title(), "Untitled position");
        analysis.company = Some("Acme".to_string());
        assert_eq!(analysis.display_title(), "Position at Acme");
    }
}
