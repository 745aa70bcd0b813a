// Job-search tracker: applications and the follow-ups scheduled against them.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{
    ApplicationStatus, FollowUpKind, FollowUpStatus, FollowUpUpdate, NewFollowUp,
    NewJobApplication,
};

pub mod handlers;

#[derive(Debug, Default, Deserialize)]
pub struct ApplicationQuery {
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
}

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub company: String,
    pub position: String,
    #[serde(default)]
    pub job_url: Option<String>,
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
    #[serde(default)]
    pub applied_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tailored_resume_id: Option<Uuid>,
    #[serde(default)]
    pub job_posting_id: Option<Uuid>,
}

impl CreateApplicationRequest {
    /// Validates the request and builds the record. An application created
    /// as `applied` without a date is stamped with `now`.
    pub fn into_new(self, user_id: Uuid, now: DateTime<Utc>) -> Result<NewJobApplication, AppError> {
        let company = self.company.trim().to_string();
        let position = self.position.trim().to_string();
        if company.is_empty() {
            return Err(AppError::Validation("company cannot be empty".to_string()));
        }
        if position.is_empty() {
            return Err(AppError::Validation("position cannot be empty".to_string()));
        }
        let status = self.status.unwrap_or_default();
        let applied_at = match (self.applied_at, status) {
            (Some(at), _) => Some(at),
            (None, ApplicationStatus::Saved) => None,
            (None, _) => Some(now),
        };
        Ok(NewJobApplication {
            user_id,
            tailored_resume_id: self.tailored_resume_id,
            job_posting_id: self.job_posting_id,
            company,
            position,
            job_url: self.job_url,
            status,
            applied_at,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateFollowUpRequest {
    #[serde(default)]
    pub kind: FollowUpKind,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl CreateFollowUpRequest {
    /// Builds the record; a missing subject defaults from the kind and company.
    pub fn into_new(self, user_id: Uuid, application_id: Uuid, company: &str) -> NewFollowUp {
        let subject = self
            .subject
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| default_subject(self.kind, company));
        NewFollowUp {
            user_id,
            application_id,
            kind: self.kind,
            due_date: self.due_date,
            subject,
            message: self.message,
        }
    }
}

pub fn default_subject(kind: FollowUpKind, company: &str) -> String {
    match kind {
        FollowUpKind::Email => format!("Follow up with {company}"),
        FollowUpKind::Call => format!("Call {company}"),
        FollowUpKind::ThankYou => format!("Thank-you note to {company}"),
        FollowUpKind::CheckIn => format!("Check in with {company}"),
    }
}

/// Update that marks a follow-up done at `now`.
pub fn completion(now: DateTime<Utc>) -> FollowUpUpdate {
    stamp_completion(
        FollowUpUpdate {
            status: Some(FollowUpStatus::Completed),
            ..Default::default()
        },
        now,
    )
}

/// Fills in `completed_at` when an update completes a follow-up without one.
pub fn stamp_completion(mut update: FollowUpUpdate, now: DateTime<Utc>) -> FollowUpUpdate {
    if update.status == Some(FollowUpStatus::Completed) && update.completed_at.is_none() {
        update.completed_at = Some(now);
    }
    update
}
