//! Interview preparation: likely questions with suggested answers.

use serde::{Deserialize, Serialize};

use crate::analysis::job::JobAnalysis;
use crate::analysis::normalize::{lenient_string, lenient_vec, truncate};
use crate::analysis::prompts::{fill, INTERVIEW_PROMPT_TEMPLATE, INTERVIEW_SYSTEM};
use crate::analysis::{request, to_prompt_json};
use crate::errors::AppError;
use crate::llm_client::prompts::system_prompt;
use crate::llm_client::LlmClient;

pub const MAX_QUESTIONS: usize = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterviewQuestion {
    #[serde(default, deserialize_with = "lenient_string")]
    pub question: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub suggested_answer: String,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub tips: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct QuestionSet {
    #[serde(default, deserialize_with = "lenient_vec")]
    questions: Vec<InterviewQuestion>,
}

impl QuestionSet {
    fn normalized(self) -> Vec<InterviewQuestion> {
        let questions = self
            .questions
            .into_iter()
            .filter(|q| !q.question.is_empty())
            .map(|q| InterviewQuestion {
                category: if q.category.is_empty() {
                    "general".to_string()
                } else {
                    q.category.to_lowercase()
                },
                ..q
            })
            .collect();
        truncate(questions, MAX_QUESTIONS)
    }
}

pub fn build_prompt(resume_text: &str, job: &JobAnalysis) -> String {
    let job_json = to_prompt_json(job);
    let max_questions = MAX_QUESTIONS.to_string();
    fill(
        INTERVIEW_PROMPT_TEMPLATE,
        &[
            ("max_questions", max_questions.as_str()),
            ("job_analysis_json", job_json.as_str()),
            ("resume_text", resume_text),
        ],
    )
}

pub async fn generate_interview_questions(
    llm: &LlmClient,
    resume_text: &str,
    job: &JobAnalysis,
) -> Result<Vec<InterviewQuestion>, AppError> {
    let set: QuestionSet = request(
        llm,
        &build_prompt(resume_text, job),
        &system_prompt(INTERVIEW_SYSTEM),
        "generate interview questions",
    )
    .await?;
    Ok(set.normalized())
}
