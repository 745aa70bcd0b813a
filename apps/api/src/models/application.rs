use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum ApplicationStatus {
    Saved,
    #[default]
    Applied,
    Interviewing,
    Offered,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    #[cfg(test)]
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Saved,
        ApplicationStatus::Applied,
        ApplicationStatus::Interviewing,
        ApplicationStatus::Offered,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Saved => "saved",
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Interviewing => "interviewing",
            ApplicationStatus::Offered => "offered",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobApplication {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tailored_resume_id: Option<Uuid>,
    pub job_posting_id: Option<Uuid>,
    pub company: String,
    pub position: String,
    pub job_url: Option<String>,
    pub status: ApplicationStatus,
    pub applied_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewJobApplication {
    pub user_id: Uuid,
    pub tailored_resume_id: Option<Uuid>,
    pub job_posting_id: Option<Uuid>,
    pub company: String,
    pub position: String,
    pub job_url: Option<String>,
    pub status: ApplicationStatus,
    pub applied_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobApplicationUpdate {
    pub company: Option<String>,
    pub position: Option<String>,
    pub job_url: Option<String>,
    pub status: Option<ApplicationStatus>,
    pub applied_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub tailored_resume_id: Option<Uuid>,
}

impl JobApplicationUpdate {
    pub fn apply(self, app: &mut JobApplication) {
        if let Some(v) = self.company {
            app.company = v;
        }
        if let Some(v) = self.position {
            app.position = v;
        }
        if let Some(v) = self.job_url {
            app.job_url = Some(v);
        }
        if let Some(v) = self.status {
            app.status = v;
        }
        if let Some(v) = self.applied_at {
            app.applied_at = Some(v);
        }
        if let Some(v) = self.notes {
            app.notes = Some(v);
        }
        if let Some(v) = self.tailored_resume_id {
            app.tailored_resume_id = Some(v);
        }
    }
}

/// Per-status application counts for one user. The per-status fields always
/// sum to `total`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationStats {
    pub total: i64,
    pub saved: i64,
    pub applied: i64,
    pub interviewing: i64,
    pub offered: i64,
    pub rejected: i64,
    pub withdrawn: i64,
}

impl ApplicationStats {
    pub fn record(&mut self, status: ApplicationStatus, count: i64) {
        self.total += count;
        match status {
            ApplicationStatus::Saved => self.saved += count,
            ApplicationStatus::Applied => self.applied += count,
            ApplicationStatus::Interviewing => self.interviewing += count,
            ApplicationStatus::Offered => self.offered += count,
            ApplicationStatus::Rejected => self.rejected += count,
            ApplicationStatus::Withdrawn => self.withdrawn += count,
        }
    }

    #[cfg(test)]
    pub fn count(&self, status: ApplicationStatus) -> i64 {
        match status {
            ApplicationStatus::Saved => self.saved,
            ApplicationStatus::Applied => self.applied,
            ApplicationStatus::Interviewing => self.interviewing,
            ApplicationStatus::Offered => self.offered,
            ApplicationStatus::Rejected => self.rejected,
            ApplicationStatus::Withdrawn => self.withdrawn,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum FollowUpKind {
    #[default]
    Email,
    Call,
    ThankYou,
    CheckIn,
}

impl FollowUpKind {
    pub fn describe(&self) -> &'static str {
        match self {
            FollowUpKind::Email => "a general follow-up email",
            FollowUpKind::Call => "a short note confirming or requesting a call",
            FollowUpKind::ThankYou => "a thank-you note after an interview",
            FollowUpKind::CheckIn => "a polite status check-in on the application",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum FollowUpStatus {
    #[default]
    Pending,
    Completed,
    Skipped,
}

/// A scheduled reminder or email tied to a job application.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FollowUp {
    pub id: Uuid,
    pub user_id: Uuid,
    pub application_id: Uuid,
    pub kind: FollowUpKind,
    pub due_date: DateTime<Utc>,
    pub subject: String,
    pub message: Option<String>,
    pub status: FollowUpStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFollowUp {
    pub user_id: Uuid,
    pub application_id: Uuid,
    pub kind: FollowUpKind,
    pub due_date: DateTime<Utc>,
    pub subject: String,
    pub message: Option<String>,
}

/// Partial follow-up update. `completed_at` only survives on a completed
/// follow-up; any other status clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FollowUpUpdate {
    pub kind: Option<FollowUpKind>,
    pub due_date: Option<DateTime<Utc>>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub status: Option<FollowUpStatus>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl FollowUpUpdate {
    pub fn apply(self, follow_up: &mut FollowUp) {
        if let Some(v) = self.kind {
            follow_up.kind = v;
        }
        if let Some(v) = self.due_date {
            follow_up.due_date = v;
        }
        if let Some(v) = self.subject {
            follow_up.subject = v;
        }
        if let Some(v) = self.message {
            follow_up.message = Some(v);
        }
        if let Some(v) = self.status {
            follow_up.status = v;
        }
        if let Some(v) = self.completed_at {
            follow_up.completed_at = Some(v);
        }
        if follow_up.status != FollowUpStatus::Completed {
            follow_up.completed_at = None;
        }
    }
}

/// Follow-up counts for one user. `pending + completed + skipped == total`;
/// `overdue` is the pending subset whose due date has passed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FollowUpStats {
    pub total: i64,
    pub pending: i64,
    pub completed: i64,
    pub skipped: i64,
    pub overdue: i64,
}

/// Service-wide counts for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminStats {
    pub users: i64,
    pub sessions: i64,
    pub tailored_resumes: i64,
    pub applications: i64,
}
