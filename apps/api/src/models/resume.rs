use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A base resume kept for reuse across tailoring sessions.
/// At most one per user carries `is_default = true`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StoredResume {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub content: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewStoredResume {
    pub user_id: Uuid,
    pub name: String,
    pub content: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoredResumeUpdate {
    pub name: Option<String>,
    pub content: Option<String>,
    pub is_default: Option<bool>,
}

impl StoredResumeUpdate {
    /// Merges the fields into `resume`. Clearing other defaults is the
    /// storage backend's job, not this merge.
    pub fn apply(self, resume: &mut StoredResume) {
        if let Some(v) = self.name {
            resume.name = v;
        }
        if let Some(v) = self.content {
            resume.content = v;
        }
        if let Some(v) = self.is_default {
            resume.is_default = v;
        }
    }
}

/// Model-generated resume customized for one job posting.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TailoredResume {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: Option<Uuid>,
    pub stored_resume_id: Option<Uuid>,
    pub job_posting_id: Option<Uuid>,
    pub title: String,
    pub content: Value,
    pub match_score: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewTailoredResume {
    pub user_id: Uuid,
    pub session_id: Option<Uuid>,
    pub stored_resume_id: Option<Uuid>,
    pub job_posting_id: Option<Uuid>,
    pub title: String,
    pub content: Value,
    pub match_score: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TailoredResumeUpdate {
    pub title: Option<String>,
    pub content: Option<Value>,
    pub match_score: Option<i32>,
}

impl TailoredResumeUpdate {
    pub fn apply(self, resume: &mut TailoredResume) {
        if let Some(v) = self.title {
            resume.title = v;
        }
        if let Some(v) = self.content {
            resume.content = v;
        }
        if let Some(v) = self.match_score {
            resume.match_score = Some(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_resume_update_merges() {
        let now = Utc::now();
        let mut resume = StoredResume {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Base".to_string(),
            content: "Experience...".to_string(),
            is_default: false,
            created_at: now,
            updated_at: now,
        };
        StoredResumeUpdate {
            is_default: Some(true),
            ..Default::default()
        }
        .apply(&mut resume);
        assert!(resume.is_default);
        assert_eq!(resume.name, "Base");
        assert_eq!(resume.content, "Experience...");
    }
}
