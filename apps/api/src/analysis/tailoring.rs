//! Resume tailoring: rewrites resume content for one analyzed job.
//!
//! Output arrays are cut to fixed lengths after parsing; the prompt asks for
//! the same limits but the model does not always honor them.

use serde::{Deserialize, Serialize};

use crate::analysis::job::JobAnalysis;
use crate::analysis::matching::MatchAnalysis;
use crate::analysis::normalize::{lenient_string, lenient_vec, truncate};
use crate::analysis::prompts::{fill, TAILOR_PROMPT_TEMPLATE, TAILOR_SYSTEM};
use crate::analysis::{request, to_prompt_json};
use crate::errors::AppError;
use crate::llm_client::prompts::{system_prompt, GROUNDING_INSTRUCTION};
use crate::llm_client::LlmClient;

pub const MAX_BULLETS_PER_ROLE: usize = 5;
pub const MAX_SKILLS: usize = 15;
pub const MAX_HIGHLIGHTS: usize = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TailoredExperience {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub company: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub dates: String,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TailoredContent {
    #[serde(default, deserialize_with = "lenient_string")]
    pub summary: String,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub experience: Vec<TailoredExperience>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub highlights: Vec<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub keywords_added: Vec<String>,
}

impl TailoredContent {
    /// Applies the fixed length limits and drops roles with nothing in them.
    pub fn normalized(self) -> Self {
        TailoredContent {
            summary: self.summary,
            experience: self
                .experience
                .into_iter()
                .filter(|e| !(e.title.is_empty() && e.company.is_empty() && e.bullets.is_empty()))
                .map(|e| TailoredExperience {
                    bullets: truncate(e.bullets, MAX_BULLETS_PER_ROLE),
                    ..e
                })
                .collect(),
            skills: truncate(self.skills, MAX_SKILLS),
            highlights: truncate(self.highlights, MAX_HIGHLIGHTS),
            keywords_added: self.keywords_added,
        }
    }

    /// Flattens the content back into resume-like text for follow-on prompts.
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        if !self.summary.is_empty() {
            out.push_str(&self.summary);
            out.push_str("\n\n");
        }
        for role in &self.experience {
            out.push_str(&format!("{} | {} | {}\n", role.title, role.company, role.dates));
            for bullet in &role.bullets {
                out.push_str(&format!("- {bullet}\n"));
            }
            out.push('\n');
        }
        if !self.skills.is_empty() {
            out.push_str(&format!("Skills: {}\n", self.skills.join(", ")));
        }
        out.trim_end().to_string()
    }
}

pub fn build_prompt(resume_text: &str, job: &JobAnalysis, fit: &MatchAnalysis) -> String {
    let job_json = to_prompt_json(job);
    let match_json = to_prompt_json(fit);
    let max_bullets = MAX_BULLETS_PER_ROLE.to_string();
    let max_skills = MAX_SKILLS.to_string();
    let max_highlights = MAX_HIGHLIGHTS.to_string();
    fill(
        TAILOR_PROMPT_TEMPLATE,
        &[
            ("grounding_instruction", GROUNDING_INSTRUCTION),
            ("max_bullets", max_bullets.as_str()),
            ("max_skills", max_skills.as_str()),
            ("max_highlights", max_highlights.as_str()),
            ("job_analysis_json", job_json.as_str()),
            ("match_json", match_json.as_str()),
            ("resume_text", resume_text),
        ],
    )
}

pub async fn tailor_resume(
    llm: &LlmClient,
    resume_text: &str,
    job: &JobAnalysis,
    fit: &MatchAnalysis,
) -> Result<TailoredContent, AppError> {
    let content: TailoredContent = request(
        llm,
        &build_prompt(resume_text, job, fit),
        &system_prompt(TAILOR_SYSTEM),
        "tailor resume",
    )
    .await?;
    Ok(content.normalized())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::parse_reply;
    use serde_json::json;

    #[test]
    fn test_prompt_fills_every_placeholder() {
        let prompt = build_prompt(
            "Resume body",
            &JobAnalysis::default(),
            &MatchAnalysis::default(),
        );
        assert!(prompt.contains("Resume body"));
        assert!(prompt.contains("at most 5"));
        assert!(prompt.contains("at most 15"));
        for placeholder in ["{grounding_instruction}", "{job_analysis_json}", "{match_json}", "{resume_text}"] {
            assert!(!prompt.contains(placeholder), "{placeholder} left unfilled");
        }
    }

    #[test]
    fn test_arrays_truncated_to_limits() {
        let bullets: Vec<String> = (0..9).map(|i| format!("bullet {i}")).collect();
        let skills: Vec<String> = (0..30).map(|i| format!("skill {i}")).collect();
        let content: TailoredContent = parse_reply(
            json!({
                "summary": "Engineer",
                "experience": [{"title": "Dev", "company": "Acme", "dates": "2020", "bullets": bullets}],
                "skills": skills,
                "highlights": ["a", "b", "c", "d", "e", "f", "g"]
            }),
            "tailor resume",
        )
        .unwrap();
        let content = content.normalized();
        assert_eq!(content.experience[0].bullets.len(), MAX_BULLETS_PER_ROLE);
        assert_eq!(content.experience[0].bullets[0], "bullet 0");
        assert_eq!(content.skills.len(), MAX_SKILLS);
        assert_eq!(content.highlights.len(), MAX_HIGHLIGHTS);
        assert!(content.keywords_added.is_empty());
    }

    #[test]
    fn test_plain_text_lists_roles_and_skills() {
        let content = TailoredContent {
            summary: "Backend engineer".to_string(),
            experience: vec![TailoredExperience {
                title: "Dev".to_string(),
                company: "Acme".to_string(),
                dates: "2020-2024".to_string(),
                bullets: vec!["Shipped the billing API".to_string()],
            }],
            skills: vec!["Rust".to_string(), "SQL".to_string()],
            ..Default::default()
        };
        let text = content.to_plain_text();
        assert!(text.starts_with("Backend engineer"));
        assert!(text.contains("Dev | Acme | 2020-2024"));
        assert!(text.contains("- Shipped the billing API"));
        assert!(text.ends_with("Skills: Rust, SQL"));
    }

    #[test]
    fn test_malformed_experience_entries_are_dropped() {
        let content: TailoredContent = parse_reply(
            json!({"experience": ["just a string", {}, {"title": "Dev", "bullets": null}]}),
            "tailor resume",
        )
        .unwrap();
        let content = content.normalized();
        assert_eq!(content.experience.len(), 1);
        assert_eq!(content.experience[0].title, "Dev");
        assert!(content.experience[0].bullets.is_empty());
        assert_eq!(content.summary, "");
    }
}
