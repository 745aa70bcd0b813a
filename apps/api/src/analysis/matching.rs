//! Match scoring: how well a resume fits an analyzed job, on a 0–100 scale.

use serde::{Deserialize, Serialize};

use crate::analysis::job::JobAnalysis;
use crate::analysis::normalize::{lenient_score, lenient_string, lenient_vec};
use crate::analysis::prompts::{fill, MATCH_PROMPT_TEMPLATE, MATCH_SYSTEM};
use crate::analysis::{request, to_prompt_json};
use crate::errors::AppError;
use crate::llm_client::prompts::system_prompt;
use crate::llm_client::LlmClient;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchAnalysis {
    #[serde(default, deserialize_with = "lenient_score")]
    pub overall_score: u8,
    #[serde(default, deserialize_with = "lenient_score")]
    pub skills_score: u8,
    #[serde(default, deserialize_with = "lenient_score")]
    pub experience_score: u8,
    #[serde(default, deserialize_with = "lenient_string")]
    pub summary: String,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub matched_skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub missing_skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub strengths: Vec<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub improvements: Vec<String>,
}

/// Human-readable band for a 0–100 score.
pub fn score_band(score: u8) -> &'static str {
    match score {
        80..=100 => "strong",
        60..=79 => "moderate",
        _ => "weak",
    }
}

pub fn build_prompt(resume_text: &str, job: &JobAnalysis) -> String {
    let job_json = to_prompt_json(job);
    fill(
        MATCH_PROMPT_TEMPLATE,
        &[
            ("job_analysis_json", job_json.as_str()),
            ("resume_text", resume_text),
        ],
    )
}

pub async fn score_match(
    llm: &LlmClient,
    resume_text: &str,
    job: &JobAnalysis,
) -> Result<MatchAnalysis, AppError> {
    request(
        llm,
        &build_prompt(resume_text, job),
        &system_prompt(MATCH_SYSTEM),
        "score resume match",
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::parse_reply;
    use serde_json::json;

    #[test]
    fn test_prompt_embeds_resume_and_analysis() {
        let job = JobAnalysis {
            title: "Rust Engineer".to_string(),
            required_skills: vec!["tokio".to_string()],
            ..Default::default()
        };
        let prompt = build_prompt("Built services in Rust", &job);
        assert!(prompt.contains("Built services in Rust"));
        assert!(prompt.contains("\"tokio\""));
        assert!(!prompt.contains("{job_analysis_json}"));
    }

    #[test]
    fn test_scores_default_and_clamp() {
        let m: MatchAnalysis = parse_reply(
            json!({"overall_score": "91", "skills_score": 120, "matched_skills": ["Rust"]}),
            "score resume match",
        )
        .unwrap();
        assert_eq!(m.overall_score, 91);
        assert_eq!(m.skills_score, 100);
        assert_eq!(m.experience_score, 0);
        assert_eq!(m.matched_skills, vec!["Rust"]);
        assert!(m.missing_skills.is_empty());
        assert!(m.improvements.is_empty());
    }

    #[test]
    fn test_score_band() {
        assert_eq!(score_band(85), "strong");
        assert_eq!(score_band(60), "moderate");
        assert_eq!(score_band(10), "weak");
    }
}
