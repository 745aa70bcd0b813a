//! Storage: one repository contract over every persisted entity.
//!
//! Two interchangeable backends implement [`Storage`]:
//! - [`memory::MemStorage`]: `HashMap` tables behind a single `RwLock`.
//! - [`postgres::PgStorage`]: `sqlx` over PostgreSQL.
//!
//! `AppState` holds an `Arc<dyn Storage>`, picked at startup from config.
//!
//! Not-found is never an error: `get`/`update` return `None`, `delete` returns
//! `false`. `StorageError` is reserved for backend failures.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::application::{
    AdminStats, ApplicationStats, ApplicationStatus, FollowUp, FollowUpStats, FollowUpUpdate,
    JobApplication, JobApplicationUpdate, NewFollowUp, NewJobApplication,
};
use crate::models::auth::AuthSession;
use crate::models::job_posting::{JobPosting, JobPostingUpdate, NewJobPosting};
use crate::models::resume::{
    NewStoredResume, NewTailoredResume, StoredResume, StoredResumeUpdate, TailoredResume,
    TailoredResumeUpdate,
};
use crate::models::session::{NewResumeSession, ResumeSession, ResumeSessionUpdate};
use crate::models::user::{NewUser, User, UserUpdate};

#[cfg(test)]
pub(crate) mod conformance;
pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    // ── Users ──────────────────────────────────────────────────────────────
    async fn create_user(&self, new: NewUser) -> StorageResult<User>;
    async fn get_user(&self, id: Uuid) -> StorageResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>>;
    async fn update_user(&self, id: Uuid, update: UserUpdate) -> StorageResult<Option<User>>;
    async fn delete_user(&self, id: Uuid) -> StorageResult<bool>;
    /// All users, newest first.
    async fn list_users(&self) -> StorageResult<Vec<User>>;

    // ── Auth sessions ──────────────────────────────────────────────────────
    async fn create_auth_session(&self, user_id: Uuid, ttl: Duration)
        -> StorageResult<AuthSession>;
    async fn get_auth_session(&self, token: &str) -> StorageResult<Option<AuthSession>>;
    async fn delete_auth_session(&self, token: &str) -> StorageResult<bool>;

    // ── Resume sessions ────────────────────────────────────────────────────
    async fn create_session(&self, new: NewResumeSession) -> StorageResult<ResumeSession>;
    async fn get_session(&self, id: Uuid) -> StorageResult<Option<ResumeSession>>;
    async fn update_session(
        &self,
        id: Uuid,
        update: ResumeSessionUpdate,
    ) -> StorageResult<Option<ResumeSession>>;
    async fn delete_session(&self, id: Uuid) -> StorageResult<bool>;
    async fn list_sessions_by_user(&self, user_id: Uuid) -> StorageResult<Vec<ResumeSession>>;

    // ── Job postings ───────────────────────────────────────────────────────
    async fn create_job_posting(&self, new: NewJobPosting) -> StorageResult<JobPosting>;
    async fn get_job_posting(&self, id: Uuid) -> StorageResult<Option<JobPosting>>;
    async fn update_job_posting(
        &self,
        id: Uuid,
        update: JobPostingUpdate,
    ) -> StorageResult<Option<JobPosting>>;
    async fn delete_job_posting(&self, id: Uuid) -> StorageResult<bool>;
    async fn list_job_postings_by_user(&self, user_id: Uuid) -> StorageResult<Vec<JobPosting>>;

    // ── Stored resumes ─────────────────────────────────────────────────────
    /// Creating with `is_default = true` clears the owner's previous default.
    async fn create_stored_resume(&self, new: NewStoredResume) -> StorageResult<StoredResume>;
    async fn get_stored_resume(&self, id: Uuid) -> StorageResult<Option<StoredResume>>;
    /// `is_default = Some(true)` clears the owner's previous default.
    async fn update_stored_resume(
        &self,
        id: Uuid,
        update: StoredResumeUpdate,
    ) -> StorageResult<Option<StoredResume>>;
    async fn delete_stored_resume(&self, id: Uuid) -> StorageResult<bool>;
    /// Most recently updated first.
    async fn list_stored_resumes_by_user(&self, user_id: Uuid)
        -> StorageResult<Vec<StoredResume>>;
    async fn get_default_stored_resume(&self, user_id: Uuid)
        -> StorageResult<Option<StoredResume>>;
    /// Atomically clears any previous default of `user_id` and flags `id`.
    /// Returns `None` without mutating if `id` is unknown or not owned by `user_id`.
    async fn set_default_stored_resume(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> StorageResult<Option<StoredResume>>;

    // ── Tailored resumes ───────────────────────────────────────────────────
    async fn create_tailored_resume(&self, new: NewTailoredResume)
        -> StorageResult<TailoredResume>;
    async fn get_tailored_resume(&self, id: Uuid) -> StorageResult<Option<TailoredResume>>;
    async fn update_tailored_resume(
        &self,
        id: Uuid,
        update: TailoredResumeUpdate,
    ) -> StorageResult<Option<TailoredResume>>;
    async fn delete_tailored_resume(&self, id: Uuid) -> StorageResult<bool>;
    async fn list_tailored_resumes_by_user(
        &self,
        user_id: Uuid,
    ) -> StorageResult<Vec<TailoredResume>>;

    // ── Job applications ───────────────────────────────────────────────────
    async fn create_application(&self, new: NewJobApplication) -> StorageResult<JobApplication>;
    async fn get_application(&self, id: Uuid) -> StorageResult<Option<JobApplication>>;
    async fn update_application(
        &self,
        id: Uuid,
        update: JobApplicationUpdate,
    ) -> StorageResult<Option<JobApplication>>;
    /// Also removes the application's follow-ups.
    async fn delete_application(&self, id: Uuid) -> StorageResult<bool>;
    async fn list_applications_by_user(
        &self,
        user_id: Uuid,
        status: Option<ApplicationStatus>,
    ) -> StorageResult<Vec<JobApplication>>;
    async fn application_stats(&self, user_id: Uuid) -> StorageResult<ApplicationStats>;

    // ── Follow-ups ─────────────────────────────────────────────────────────
    async fn create_follow_up(&self, new: NewFollowUp) -> StorageResult<FollowUp>;
    async fn get_follow_up(&self, id: Uuid) -> StorageResult<Option<FollowUp>>;
    async fn update_follow_up(
        &self,
        id: Uuid,
        update: FollowUpUpdate,
    ) -> StorageResult<Option<FollowUp>>;
    async fn delete_follow_up(&self, id: Uuid) -> StorageResult<bool>;
    /// Soonest due first.
    async fn list_follow_ups_by_application(
        &self,
        application_id: Uuid,
    ) -> StorageResult<Vec<FollowUp>>;
    /// Pending follow-ups of a user, soonest due first.
    async fn list_pending_follow_ups(&self, user_id: Uuid) -> StorageResult<Vec<FollowUp>>;
    /// Pending follow-ups of every user due before `before`, soonest first.
    async fn list_due_follow_ups(&self, before: DateTime<Utc>) -> StorageResult<Vec<FollowUp>>;
    async fn follow_up_stats(&self, user_id: Uuid, now: DateTime<Utc>)
        -> StorageResult<FollowUpStats>;

    // ── Admin ──────────────────────────────────────────────────────────────
    async fn admin_stats(&self) -> StorageResult<AdminStats>;
}

/// Generates an opaque session token: two v4 UUIDs, hex, no dashes.
pub fn new_session_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_tokens_are_unique_hex() {
        let a = new_session_token();
        let b = new_session_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
