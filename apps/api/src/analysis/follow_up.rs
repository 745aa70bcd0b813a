//! Follow-up drafting: subject and body for an email tied to an application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::normalize::lenient_string;
use crate::analysis::prompts::{fill, FOLLOW_UP_PROMPT_TEMPLATE, FOLLOW_UP_SYSTEM};
use crate::analysis::request;
use crate::errors::AppError;
use crate::llm_client::prompts::system_prompt;
use crate::llm_client::LlmClient;
use crate::models::application::{FollowUpKind, JobApplication};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FollowUpEmail {
    #[serde(default, deserialize_with = "lenient_string")]
    pub subject: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub body: String,
}

impl FollowUpEmail {
    fn normalized(self, position: &str) -> Self {
        FollowUpEmail {
            subject: if self.subject.is_empty() {
                format!("Following up on my application for {position}")
            } else {
                self.subject
            },
            body: self.body,
        }
    }
}

pub fn build_prompt(
    application: &JobApplication,
    kind: FollowUpKind,
    candidate_name: &str,
    now: DateTime<Utc>,
) -> String {
    let days = application
        .applied_at
        .map(|at| (now - at).num_days().max(0).to_string())
        .unwrap_or_else(|| "unknown".to_string());
    fill(
        FOLLOW_UP_PROMPT_TEMPLATE,
        &[
            ("kind_description", kind.describe()),
            ("status", application.status.as_str()),
            ("days_since_applied", days.as_str()),
            ("candidate_name", candidate_name),
            ("company", application.company.as_str()),
            ("position", application.position.as_str()),
            ("notes", application.notes.as_deref().unwrap_or("none")),
        ],
    )
}

pub async fn draft_follow_up_email(
    llm: &LlmClient,
    application: &JobApplication,
    kind: FollowUpKind,
    candidate_name: &str,
) -> Result<FollowUpEmail, AppError> {
    let email: FollowUpEmail = request(
        llm,
        &build_prompt(application, kind, candidate_name, Utc::now()),
        &system_prompt(FOLLOW_UP_SYSTEM),
        "draft follow-up email",
    )
    .await?;
    Ok(email.normalized(&application.position))
}
