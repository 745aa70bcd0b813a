//! PostgreSQL storage backend.
//!
//! Partial updates use `COALESCE($n, column)` so absent fields keep their value,
//! and `RETURNING *` + `fetch_optional` so an unknown id yields `None` without
//! touching any row. The single-default invariant is enforced twice: the
//! default swap runs in one transaction holding a per-user row lock, and a
//! partial unique index rejects a second default per user (surfaced as
//! `StorageError::Conflict`).

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use super::{new_session_token, Storage, StorageError, StorageResult};
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

/// Schema, applied statement by statement at startup. Every statement is idempotent.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        first_name TEXT,
        last_name TEXT,
        profile_image_url TEXT,
        is_admin BOOLEAN NOT NULL DEFAULT FALSE,
        password_hash TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS auth_sessions (
        token TEXT PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        expires_at TIMESTAMPTZ NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS resume_sessions (
        id UUID PRIMARY KEY,
        user_id UUID REFERENCES users(id) ON DELETE CASCADE,
        stored_resume_id UUID,
        resume_text TEXT NOT NULL,
        job_description TEXT NOT NULL,
        job_url TEXT,
        contact_info JSONB,
        job_analysis JSONB,
        match_analysis JSONB,
        tailored_content JSONB,
        status TEXT NOT NULL DEFAULT 'created',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS job_postings (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        session_id UUID REFERENCES resume_sessions(id) ON DELETE SET NULL,
        title TEXT NOT NULL,
        company TEXT,
        location TEXT,
        description TEXT NOT NULL,
        url TEXT,
        analysis JSONB,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS stored_resumes (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        content TEXT NOT NULL,
        is_default BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS stored_resumes_one_default \
     ON stored_resumes (user_id) WHERE is_default",
    r#"
    CREATE TABLE IF NOT EXISTS tailored_resumes (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        session_id UUID REFERENCES resume_sessions(id) ON DELETE SET NULL,
        stored_resume_id UUID REFERENCES stored_resumes(id) ON DELETE SET NULL,
        job_posting_id UUID REFERENCES job_postings(id) ON DELETE SET NULL,
        title TEXT NOT NULL,
        content JSONB NOT NULL,
        match_score INTEGER,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS job_applications (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        tailored_resume_id UUID REFERENCES tailored_resumes(id) ON DELETE SET NULL,
        job_posting_id UUID REFERENCES job_postings(id) ON DELETE SET NULL,
        company TEXT NOT NULL,
        position TEXT NOT NULL,
        job_url TEXT,
        status TEXT NOT NULL DEFAULT 'applied',
        applied_at TIMESTAMPTZ,
        notes TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS follow_ups (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        application_id UUID NOT NULL REFERENCES job_applications(id) ON DELETE CASCADE,
        kind TEXT NOT NULL DEFAULT 'email',
        due_date TIMESTAMPTZ NOT NULL,
        subject TEXT NOT NULL,
        message TEXT,
        status TEXT NOT NULL DEFAULT 'pending',
        completed_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS follow_ups_due ON follow_ups (status, due_date)",
];

pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates any missing tables and indexes.
    pub async fn migrate(&self) -> StorageResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema is up to date ({} statements)", SCHEMA.len());
        Ok(())
    }
}

/// Serializes default-resume changes per user: every writer that may move the
/// default takes this row lock first. `NO KEY UPDATE` leaves foreign-key
/// inserts against the user unblocked.
async fn lock_user_defaults(conn: &mut PgConnection, user_id: Uuid) -> StorageResult<()> {
    sqlx::query("SELECT id FROM users WHERE id = $1 FOR NO KEY UPDATE")
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}

fn conflict_on_unique(e: sqlx::Error, what: &str) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StorageError::Conflict(format!("{what} already exists"))
        }
        _ => StorageError::Database(e),
    }
}

#[async_trait]
impl Storage for PgStorage {
    // ── Users ──────────────────────────────────────────────────────────────

    async fn create_user(&self, new: NewUser) -> StorageResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, first_name, last_name, profile_image_url, is_admin, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.email.trim().to_lowercase())
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.profile_image_url)
        .bind(new.is_admin)
        .bind(new.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "user email"))
    }

    async fn get_user(&self, id: Uuid) -> StorageResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_user(&self, id: Uuid, update: UserUpdate) -> StorageResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                profile_image_url = COALESCE($4, profile_image_url),
                is_admin = COALESCE($5, is_admin),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.first_name)
        .bind(update.last_name)
        .bind(update.profile_image_url)
        .bind(update.is_admin)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_user(&self, id: Uuid) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_users(&self) -> StorageResult<Vec<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?)
    }

    // ── Auth sessions ──────────────────────────────────────────────────────

    async fn create_auth_session(
        &self,
        user_id: Uuid,
        ttl: Duration,
    ) -> StorageResult<AuthSession> {
        Ok(sqlx::query_as::<_, AuthSession>(
            "INSERT INTO auth_sessions (token, user_id, expires_at) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(new_session_token())
        .bind(user_id)
        .bind(Utc::now() + ttl)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get_auth_session(&self, token: &str) -> StorageResult<Option<AuthSession>> {
        Ok(
            sqlx::query_as::<_, AuthSession>("SELECT * FROM auth_sessions WHERE token = $1")
                .bind(token)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn delete_auth_session(&self, token: &str) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Resume sessions ────────────────────────────────────────────────────

    async fn create_session(&self, new: NewResumeSession) -> StorageResult<ResumeSession> {
        Ok(sqlx::query_as::<_, ResumeSession>(
            r#"
            INSERT INTO resume_sessions
                (id, user_id, stored_resume_id, resume_text, job_description, job_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.stored_resume_id)
        .bind(new.resume_text)
        .bind(new.job_description)
        .bind(new.job_url)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get_session(&self, id: Uuid) -> StorageResult<Option<ResumeSession>> {
        Ok(
            sqlx::query_as::<_, ResumeSession>("SELECT * FROM resume_sessions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn update_session(
        &self,
        id: Uuid,
        update: ResumeSessionUpdate,
    ) -> StorageResult<Option<ResumeSession>> {
        Ok(sqlx::query_as::<_, ResumeSession>(
            r#"
            UPDATE resume_sessions SET
                contact_info = COALESCE($2, contact_info),
                job_analysis = COALESCE($3, job_analysis),
                match_analysis = COALESCE($4, match_analysis),
                tailored_content = COALESCE($5, tailored_content),
                status = COALESCE($6, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.contact_info)
        .bind(update.job_analysis)
        .bind(update.match_analysis)
        .bind(update.tailored_content)
        .bind(update.status)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_session(&self, id: Uuid) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM resume_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_sessions_by_user(&self, user_id: Uuid) -> StorageResult<Vec<ResumeSession>> {
        Ok(sqlx::query_as::<_, ResumeSession>(
            "SELECT * FROM resume_sessions WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    // ── Job postings ───────────────────────────────────────────────────────

    async fn create_job_posting(&self, new: NewJobPosting) -> StorageResult<JobPosting> {
        Ok(sqlx::query_as::<_, JobPosting>(
            r#"
            INSERT INTO job_postings
                (id, user_id, session_id, title, company, location, description, url, analysis)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.session_id)
        .bind(new.title)
        .bind(new.company)
        .bind(new.location)
        .bind(new.description)
        .bind(new.url)
        .bind(new.analysis)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get_job_posting(&self, id: Uuid) -> StorageResult<Option<JobPosting>> {
        Ok(
            sqlx::query_as::<_, JobPosting>("SELECT * FROM job_postings WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn update_job_posting(
        &self,
        id: Uuid,
        update: JobPostingUpdate,
    ) -> StorageResult<Option<JobPosting>> {
        Ok(sqlx::query_as::<_, JobPosting>(
            r#"
            UPDATE job_postings SET
                title = COALESCE($2, title),
                company = COALESCE($3, company),
                location = COALESCE($4, location),
                url = COALESCE($5, url),
                analysis = COALESCE($6, analysis),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.title)
        .bind(update.company)
        .bind(update.location)
        .bind(update.url)
        .bind(update.analysis)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_job_posting(&self, id: Uuid) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM job_postings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_job_postings_by_user(&self, user_id: Uuid) -> StorageResult<Vec<JobPosting>> {
        Ok(sqlx::query_as::<_, JobPosting>(
            "SELECT * FROM job_postings WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    // ── Stored resumes ─────────────────────────────────────────────────────

    async fn create_stored_resume(&self, new: NewStoredResume) -> StorageResult<StoredResume> {
        let mut tx = self.pool.begin().await?;
        if new.is_default {
            lock_user_defaults(&mut tx, new.user_id).await?;
            sqlx::query(
                "UPDATE stored_resumes SET is_default = FALSE, updated_at = NOW() \
                 WHERE user_id = $1 AND is_default",
            )
            .bind(new.user_id)
            .execute(&mut *tx)
            .await?;
        }
        let resume = sqlx::query_as::<_, StoredResume>(
            r#"
            INSERT INTO stored_resumes (id, user_id, name, content, is_default)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.name)
        .bind(new.content)
        .bind(new.is_default)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "default resume"))?;
        tx.commit().await?;
        Ok(resume)
    }

    async fn get_stored_resume(&self, id: Uuid) -> StorageResult<Option<StoredResume>> {
        Ok(
            sqlx::query_as::<_, StoredResume>("SELECT * FROM stored_resumes WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn update_stored_resume(
        &self,
        id: Uuid,
        update: StoredResumeUpdate,
    ) -> StorageResult<Option<StoredResume>> {
        let mut tx = self.pool.begin().await?;
        if update.is_default == Some(true) {
            let owner: Option<Uuid> =
                sqlx::query_scalar("SELECT user_id FROM stored_resumes WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if let Some(user_id) = owner {
                lock_user_defaults(&mut tx, user_id).await?;
                sqlx::query(
                    "UPDATE stored_resumes SET is_default = FALSE, updated_at = NOW() \
                     WHERE user_id = $1 AND is_default AND id <> $2",
                )
                .bind(user_id)
                .bind(id)
                .execute(&mut *tx)
                .await?;
            }
        }
        let resume = sqlx::query_as::<_, StoredResume>(
            r#"
            UPDATE stored_resumes SET
                name = COALESCE($2, name),
                content = COALESCE($3, content),
                is_default = COALESCE($4, is_default),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.name)
        .bind(update.content)
        .bind(update.is_default)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "default resume"))?;
        tx.commit().await?;
        Ok(resume)
    }

    async fn delete_stored_resume(&self, id: Uuid) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM stored_resumes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_stored_resumes_by_user(
        &self,
        user_id: Uuid,
    ) -> StorageResult<Vec<StoredResume>> {
        Ok(sqlx::query_as::<_, StoredResume>(
            "SELECT * FROM stored_resumes WHERE user_id = $1 ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_default_stored_resume(
        &self,
        user_id: Uuid,
    ) -> StorageResult<Option<StoredResume>> {
        Ok(sqlx::query_as::<_, StoredResume>(
            "SELECT * FROM stored_resumes WHERE user_id = $1 AND is_default LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn set_default_stored_resume(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> StorageResult<Option<StoredResume>> {
        let mut tx = self.pool.begin().await?;
        lock_user_defaults(&mut tx, user_id).await?;

        let owned: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM stored_resumes WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        if owned.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        sqlx::query(
            "UPDATE stored_resumes SET is_default = FALSE, updated_at = NOW() \
             WHERE user_id = $1 AND is_default AND id <> $2",
        )
        .bind(user_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let resume = sqlx::query_as::<_, StoredResume>(
            "UPDATE stored_resumes SET is_default = TRUE, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "default resume"))?;

        tx.commit().await?;
        Ok(Some(resume))
    }

    // ── Tailored resumes ───────────────────────────────────────────────────

    async fn create_tailored_resume(
        &self,
        new: NewTailoredResume,
    ) -> StorageResult<TailoredResume> {
        Ok(sqlx::query_as::<_, TailoredResume>(
            r#"
            INSERT INTO tailored_resumes
                (id, user_id, session_id, stored_resume_id, job_posting_id, title, content, match_score)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.session_id)
        .bind(new.stored_resume_id)
        .bind(new.job_posting_id)
        .bind(new.title)
        .bind(new.content)
        .bind(new.match_score)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get_tailored_resume(&self, id: Uuid) -> StorageResult<Option<TailoredResume>> {
        Ok(
            sqlx::query_as::<_, TailoredResume>("SELECT * FROM tailored_resumes WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn update_tailored_resume(
        &self,
        id: Uuid,
        update: TailoredResumeUpdate,
    ) -> StorageResult<Option<TailoredResume>> {
        Ok(sqlx::query_as::<_, TailoredResume>(
            r#"
            UPDATE tailored_resumes SET
                title = COALESCE($2, title),
                content = COALESCE($3, content),
                match_score = COALESCE($4, match_score),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.title)
        .bind(update.content)
        .bind(update.match_score)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_tailored_resume(&self, id: Uuid) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM tailored_resumes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_tailored_resumes_by_user(
        &self,
        user_id: Uuid,
    ) -> StorageResult<Vec<TailoredResume>> {
        Ok(sqlx::query_as::<_, TailoredResume>(
            "SELECT * FROM tailored_resumes WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    // ── Job applications ───────────────────────────────────────────────────

    async fn create_application(&self, new: NewJobApplication) -> StorageResult<JobApplication> {
        Ok(sqlx::query_as::<_, JobApplication>(
            r#"
            INSERT INTO job_applications
                (id, user_id, tailored_resume_id, job_posting_id, company, position,
                 job_url, status, applied_at, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.tailored_resume_id)
        .bind(new.job_posting_id)
        .bind(new.company)
        .bind(new.position)
        .bind(new.job_url)
        .bind(new.status)
        .bind(new.applied_at)
        .bind(new.notes)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get_application(&self, id: Uuid) -> StorageResult<Option<JobApplication>> {
        Ok(
            sqlx::query_as::<_, JobApplication>("SELECT * FROM job_applications WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn update_application(
        &self,
        id: Uuid,
        update: JobApplicationUpdate,
    ) -> StorageResult<Option<JobApplication>> {
        Ok(sqlx::query_as::<_, JobApplication>(
            r#"
            UPDATE job_applications SET
                company = COALESCE($2, company),
                position = COALESCE($3, position),
                job_url = COALESCE($4, job_url),
                status = COALESCE($5, status),
                applied_at = COALESCE($6, applied_at),
                notes = COALESCE($7, notes),
                tailored_resume_id = COALESCE($8, tailored_resume_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.company)
        .bind(update.position)
        .bind(update.job_url)
        .bind(update.status)
        .bind(update.applied_at)
        .bind(update.notes)
        .bind(update.tailored_resume_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_application(&self, id: Uuid) -> StorageResult<bool> {
        // follow_ups rows go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM job_applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_applications_by_user(
        &self,
        user_id: Uuid,
        status: Option<ApplicationStatus>,
    ) -> StorageResult<Vec<JobApplication>> {
        Ok(sqlx::query_as::<_, JobApplication>(
            r#"
            SELECT * FROM job_applications
            WHERE user_id = $1 AND ($2::text IS NULL OR status = $2::text)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn application_stats(&self, user_id: Uuid) -> StorageResult<ApplicationStats> {
        let rows: Vec<(ApplicationStatus, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM job_applications WHERE user_id = $1 GROUP BY status",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut stats = ApplicationStats::default();
        for (status, count) in rows {
            stats.record(status, count);
        }
        Ok(stats)
    }

    // ── Follow-ups ─────────────────────────────────────────────────────────

    async fn create_follow_up(&self, new: NewFollowUp) -> StorageResult<FollowUp> {
        Ok(sqlx::query_as::<_, FollowUp>(
            r#"
            INSERT INTO follow_ups (id, user_id, application_id, kind, due_date, subject, message)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.application_id)
        .bind(new.kind)
        .bind(new.due_date)
        .bind(new.subject)
        .bind(new.message)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get_follow_up(&self, id: Uuid) -> StorageResult<Option<FollowUp>> {
        Ok(sqlx::query_as::<_, FollowUp>("SELECT * FROM follow_ups WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_follow_up(
        &self,
        id: Uuid,
        update: FollowUpUpdate,
    ) -> StorageResult<Option<FollowUp>> {
        Ok(sqlx::query_as::<_, FollowUp>(
            r#"
            UPDATE follow_ups SET
                kind = COALESCE($2, kind),
                due_date = COALESCE($3, due_date),
                subject = COALESCE($4, subject),
                message = COALESCE($5, message),
                status = COALESCE($6, status),
                completed_at = CASE
                    WHEN COALESCE($6, status) = 'completed' THEN COALESCE($7, completed_at)
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.kind)
        .bind(update.due_date)
        .bind(update.subject)
        .bind(update.message)
        .bind(update.status)
        .bind(update.completed_at)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_follow_up(&self, id: Uuid) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM follow_ups WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_follow_ups_by_application(
        &self,
        application_id: Uuid,
    ) -> StorageResult<Vec<FollowUp>> {
        Ok(sqlx::query_as::<_, FollowUp>(
            "SELECT * FROM follow_ups WHERE application_id = $1 ORDER BY due_date ASC, created_at ASC",
        )
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_pending_follow_ups(&self, user_id: Uuid) -> StorageResult<Vec<FollowUp>> {
        Ok(sqlx::query_as::<_, FollowUp>(
            r#"
            SELECT * FROM follow_ups
            WHERE user_id = $1 AND status = 'pending'
            ORDER BY due_date ASC, created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_due_follow_ups(&self, before: DateTime<Utc>) -> StorageResult<Vec<FollowUp>> {
        Ok(sqlx::query_as::<_, FollowUp>(
            r#"
            SELECT * FROM follow_ups
            WHERE status = 'pending' AND due_date < $1
            ORDER BY due_date ASC, created_at ASC
            "#,
        )
        .bind(before)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn follow_up_stats(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> StorageResult<FollowUpStats> {
        let (total, pending, completed, skipped, overdue): (i64, i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COUNT(*) FILTER (WHERE status = 'pending'),
                    COUNT(*) FILTER (WHERE status = 'completed'),
                    COUNT(*) FILTER (WHERE status = 'skipped'),
                    COUNT(*) FILTER (WHERE status = 'pending' AND due_date < $2)
                FROM follow_ups
                WHERE user_id = $1
                "#,
            )
            .bind(user_id)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        Ok(FollowUpStats {
            total,
            pending,
            completed,
            skipped,
            overdue,
        })
    }

    // ── Admin ──────────────────────────────────────────────────────────────

    async fn admin_stats(&self) -> StorageResult<AdminStats> {
        let (users, sessions, tailored_resumes, applications): (i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM users),
                    (SELECT COUNT(*) FROM resume_sessions),
                    (SELECT COUNT(*) FROM tailored_resumes),
                    (SELECT COUNT(*) FROM job_applications)
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        Ok(AdminStats {
            users,
            sessions,
            tailored_resumes,
            applications,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::conformance::storage_conformance_tests;
    use tokio::sync::OnceCell;

    static SCHEMA_READY: OnceCell<()> = OnceCell::const_new();

    /// A handle on the scratch database named by `DATABASE_URL`. Every test
    /// builds its own pool because each `#[tokio::test]` has its own runtime.
    async fn pg_storage() -> PgStorage {
        let url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must point at a scratch Postgres database");
        let pool = crate::db::create_pool(&url).await.unwrap();
        let store = PgStorage::new(pool);
        SCHEMA_READY
            .get_or_init(|| async { store.migrate().await.unwrap() })
            .await;
        store
    }

    storage_conformance_tests!(
        ignore = "needs a Postgres DATABASE_URL",
        store = pg_storage().await;
        set_default_leaves_exactly_one,
        default_flag_on_create_and_update,
        set_default_is_scoped_to_owner,
        concurrent_set_default_keeps_one,
        unknown_ids_are_none_without_mutation,
        partial_update_merges_fields,
        session_json_and_status_round_trip,
        delete_twice_returns_false,
        delete_application_removes_follow_ups,
        delete_user_removes_owned_rows,
        deleting_referenced_rows_clears_links,
        application_stats_match_filtered_lists,
        lists_are_newest_first,
        follow_ups_are_soonest_due_first,
        follow_up_stats_partition,
        completed_at_follows_status,
        duplicate_email_conflicts,
        auth_session_lifecycle,
        admin_flag_updates,
    );

    #[test]
    fn test_schema_statements_are_idempotent() {
        for statement in SCHEMA {
            let s = statement.trim_start();
            assert!(
                s.contains("IF NOT EXISTS"),
                "statement must be safe to re-run: {s}"
            );
        }
    }

    #[test]
    fn test_schema_enforces_single_default() {
        assert!(SCHEMA
            .iter()
            .any(|s| s.contains("UNIQUE INDEX") && s.contains("WHERE is_default")));
    }
}
