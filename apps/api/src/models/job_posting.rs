use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobPosting {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: Option<Uuid>,
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: String,
    pub url: Option<String>,
    pub analysis: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewJobPosting {
    pub user_id: Uuid,
    pub session_id: Option<Uuid>,
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: String,
    pub url: Option<String>,
    pub analysis: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobPostingUpdate {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
    pub analysis: Option<Value>,
}

impl JobPostingUpdate {
    pub fn apply(self, posting: &mut JobPosting) {
        if let Some(v) = self.title {
            posting.title = v;
        }
        if let Some(v) = self.company {
            posting.company = Some(v);
        }
        if let Some(v) = self.location {
            posting.location = Some(v);
        }
        if let Some(v) = self.url {
            posting.url = Some(v);
        }
        if let Some(v) = self.analysis {
            posting.analysis = Some(v);
        }
    }
}
