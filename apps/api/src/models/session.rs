use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Progress of a tailoring run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Created,
    Analyzed,
    Tailored,
    Completed,
}

/// One tailoring run: a resume plus a job description and everything the
/// analysis passes have produced for them so far.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeSession {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub stored_resume_id: Option<Uuid>,
    pub resume_text: String,
    pub job_description: String,
    pub job_url: Option<String>,
    pub contact_info: Option<Value>,
    pub job_analysis: Option<Value>,
    pub match_analysis: Option<Value>,
    pub tailored_content: Option<Value>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewResumeSession {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub stored_resume_id: Option<Uuid>,
    pub resume_text: String,
    pub job_description: String,
    #[serde(default)]
    pub job_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ResumeSessionUpdate {
    pub contact_info: Option<Value>,
    pub job_analysis: Option<Value>,
    pub match_analysis: Option<Value>,
    pub tailored_content: Option<Value>,
    pub status: Option<SessionStatus>,
}

impl ResumeSessionUpdate {
    pub fn apply(self, session: &mut ResumeSession) {
        if let Some(v) = self.contact_info {
            session.contact_info = Some(v);
        }
        if let Some(v) = self.job_analysis {
            session.job_analysis = Some(v);
        }
        if let Some(v) = self.match_analysis {
            session.match_analysis = Some(v);
        }
        if let Some(v) = self.tailored_content {
            session.tailored_content = Some(v);
        }
        if let Some(v) = self.status {
            session.status = v;
        }
    }
}
