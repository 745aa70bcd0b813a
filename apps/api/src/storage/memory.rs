//! In-memory storage backend. Every table lives behind one `RwLock`, so a
//! multi-record write (like moving the default resume) happens under a
//! single guard and is never observed half-done.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{new_session_token, Storage, StorageError, StorageResult};
use crate::models::application::{
    AdminStats, ApplicationStats, ApplicationStatus, FollowUp, FollowUpStats, FollowUpStatus,
    FollowUpUpdate, JobApplication, JobApplicationUpdate, NewFollowUp, NewJobApplication,
};
use crate::models::auth::AuthSession;
use crate::models::job_posting::{JobPosting, JobPostingUpdate, NewJobPosting};
use crate::models::resume::{
    NewStoredResume, NewTailoredResume, StoredResume, StoredResumeUpdate, TailoredResume,
    TailoredResumeUpdate,
};
use crate::models::session::{NewResumeSession, ResumeSession, ResumeSessionUpdate, SessionStatus};
use crate::models::user::{NewUser, User, UserUpdate};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    auth_sessions: HashMap<String, AuthSession>,
    sessions: HashMap<Uuid, ResumeSession>,
    job_postings: HashMap<Uuid, JobPosting>,
    stored_resumes: HashMap<Uuid, StoredResume>,
    tailored_resumes: HashMap<Uuid, TailoredResume>,
    applications: HashMap<Uuid, JobApplication>,
    follow_ups: HashMap<Uuid, FollowUp>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Tables {
    /// Wall-clock time, bumped by a microsecond when it would not advance, so
    /// timestamp ordering matches insertion order.
    fn now(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_timestamp {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_timestamp = Some(now);
        now
    }

    // References to a deleted row are nulled, matching `ON DELETE SET NULL`.

    fn detach_session(&mut self, id: Uuid) {
        for posting in self.job_postings.values_mut() {
            if posting.session_id == Some(id) {
                posting.session_id = None;
            }
        }
        for resume in self.tailored_resumes.values_mut() {
            if resume.session_id == Some(id) {
                resume.session_id = None;
            }
        }
    }

    fn detach_job_posting(&mut self, id: Uuid) {
        for resume in self.tailored_resumes.values_mut() {
            if resume.job_posting_id == Some(id) {
                resume.job_posting_id = None;
            }
        }
        for app in self.applications.values_mut() {
            if app.job_posting_id == Some(id) {
                app.job_posting_id = None;
            }
        }
    }

    fn detach_stored_resume(&mut self, id: Uuid) {
        for resume in self.tailored_resumes.values_mut() {
            if resume.stored_resume_id == Some(id) {
                resume.stored_resume_id = None;
            }
        }
    }

    fn detach_tailored_resume(&mut self, id: Uuid) {
        for app in self.applications.values_mut() {
            if app.tailored_resume_id == Some(id) {
                app.tailored_resume_id = None;
            }
        }
    }

    fn clear_default(&mut self, user_id: Uuid, except: Uuid, now: DateTime<Utc>) {
        for resume in self.stored_resumes.values_mut() {
            if resume.user_id == user_id && resume.id != except && resume.is_default {
                resume.is_default = false;
                resume.updated_at = now;
            }
        }
    }
}

#[derive(Default)]
pub struct MemStorage {
    tables: RwLock<Tables>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T>(mut rows: Vec<T>, key: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    rows.sort_by_key(|r| std::cmp::Reverse(key(r)));
    rows
}

fn soonest_first(mut rows: Vec<FollowUp>) -> Vec<FollowUp> {
    rows.sort_by_key(|f| (f.due_date, f.created_at));
    rows
}

#[async_trait]
impl Storage for MemStorage {
    // ── Users ──────────────────────────────────────────────────────────────

    async fn create_user(&self, new: NewUser) -> StorageResult<User> {
        let mut t = self.tables.write().await;
        let email = new.email.trim().to_lowercase();
        if t.users.values().any(|u| u.email == email) {
            return Err(StorageError::Conflict(format!("email {email} already registered")));
        }
        let now = t.now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            first_name: new.first_name,
            last_name: new.last_name,
            profile_image_url: new.profile_image_url,
            is_admin: new.is_admin,
            password_hash: new.password_hash,
            created_at: now,
            updated_at: now,
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> StorageResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let email = email.trim().to_lowercase();
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, id: Uuid, update: UserUpdate) -> StorageResult<Option<User>> {
        let mut t = self.tables.write().await;
        if !t.users.contains_key(&id) {
            return Ok(None);
        }
        let now = t.now();
        Ok(t.users.get_mut(&id).map(|user| {
            update.apply(user);
            user.updated_at = now;
            user.clone()
        }))
    }

    /// Removes the user together with everything they own.
    async fn delete_user(&self, id: Uuid) -> StorageResult<bool> {
        let mut t = self.tables.write().await;
        let removed = t.users.remove(&id).is_some();
        if removed {
            t.auth_sessions.retain(|_, s| s.user_id != id);
            t.follow_ups.retain(|_, f| f.user_id != id);
            t.applications.retain(|_, a| a.user_id != id);
            t.tailored_resumes.retain(|_, r| r.user_id != id);
            t.stored_resumes.retain(|_, r| r.user_id != id);
            t.job_postings.retain(|_, p| p.user_id != id);
            let session_ids: Vec<Uuid> = t
                .sessions
                .values()
                .filter(|s| s.user_id == Some(id))
                .map(|s| s.id)
                .collect();
            for session_id in session_ids {
                t.sessions.remove(&session_id);
                t.detach_session(session_id);
            }
        }
        Ok(removed)
    }

    async fn list_users(&self) -> StorageResult<Vec<User>> {
        let t = self.tables.read().await;
        Ok(newest_first(t.users.values().cloned().collect(), |u| u.created_at))
    }

    // ── Auth sessions ──────────────────────────────────────────────────────

    async fn create_auth_session(
        &self,
        user_id: Uuid,
        ttl: Duration,
    ) -> StorageResult<AuthSession> {
        let mut t = self.tables.write().await;
        let now = t.now();
        let session = AuthSession {
            token: new_session_token(),
            user_id,
            expires_at: now + ttl,
            created_at: now,
        };
        t.auth_sessions.insert(session.token.clone(), session.clone());
        Ok(session)
    }

    async fn get_auth_session(&self, token: &str) -> StorageResult<Option<AuthSession>> {
        Ok(self.tables.read().await.auth_sessions.get(token).cloned())
    }

    async fn delete_auth_session(&self, token: &str) -> StorageResult<bool> {
        Ok(self.tables.write().await.auth_sessions.remove(token).is_some())
    }

    // ── Resume sessions ────────────────────────────────────────────────────

    async fn create_session(&self, new: NewResumeSession) -> StorageResult<ResumeSession> {
        let mut t = self.tables.write().await;
        let now = t.now();
        let session = ResumeSession {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            stored_resume_id: new.stored_resume_id,
            resume_text: new.resume_text,
            job_description: new.job_description,
            job_url: new.job_url,
            contact_info: None,
            job_analysis: None,
            match_analysis: None,
            tailored_content: None,
            status: SessionStatus::Created,
            created_at: now,
            updated_at: now,
        };
        t.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: Uuid) -> StorageResult<Option<ResumeSession>> {
        Ok(self.tables.read().await.sessions.get(&id).cloned())
    }

    async fn update_session(
        &self,
        id: Uuid,
        update: ResumeSessionUpdate,
    ) -> StorageResult<Option<ResumeSession>> {
        let mut t = self.tables.write().await;
        if !t.sessions.contains_key(&id) {
            return Ok(None);
        }
        let now = t.now();
        Ok(t.sessions.get_mut(&id).map(|session| {
            update.apply(session);
            session.updated_at = now;
            session.clone()
        }))
    }

    async fn delete_session(&self, id: Uuid) -> StorageResult<bool> {
        let mut t = self.tables.write().await;
        let removed = t.sessions.remove(&id).is_some();
        if removed {
            t.detach_session(id);
        }
        Ok(removed)
    }

    async fn list_sessions_by_user(&self, user_id: Uuid) -> StorageResult<Vec<ResumeSession>> {
        let t = self.tables.read().await;
        let rows = t
            .sessions
            .values()
            .filter(|s| s.user_id == Some(user_id))
            .cloned()
            .collect();
        Ok(newest_first(rows, |s| s.created_at))
    }

    // ── Job postings ───────────────────────────────────────────────────────

    async fn create_job_posting(&self, new: NewJobPosting) -> StorageResult<JobPosting> {
        let mut t = self.tables.write().await;
        let now = t.now();
        let posting = JobPosting {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            session_id: new.session_id,
            title: new.title,
            company: new.company,
            location: new.location,
            description: new.description,
            url: new.url,
            analysis: new.analysis,
            created_at: now,
            updated_at: now,
        };
        t.job_postings.insert(posting.id, posting.clone());
        Ok(posting)
    }

    async fn get_job_posting(&self, id: Uuid) -> StorageResult<Option<JobPosting>> {
        Ok(self.tables.read().await.job_postings.get(&id).cloned())
    }

    async fn update_job_posting(
        &self,
        id: Uuid,
        update: JobPostingUpdate,
    ) -> StorageResult<Option<JobPosting>> {
        let mut t = self.tables.write().await;
        if !t.job_postings.contains_key(&id) {
            return Ok(None);
        }
        let now = t.now();
        Ok(t.job_postings.get_mut(&id).map(|posting| {
            update.apply(posting);
            posting.updated_at = now;
            posting.clone()
        }))
    }

    async fn delete_job_posting(&self, id: Uuid) -> StorageResult<bool> {
        let mut t = self.tables.write().await;
        let removed = t.job_postings.remove(&id).is_some();
        if removed {
            t.detach_job_posting(id);
        }
        Ok(removed)
    }

    async fn list_job_postings_by_user(&self, user_id: Uuid) -> StorageResult<Vec<JobPosting>> {
        let t = self.tables.read().await;
        let rows = t
            .job_postings
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |p| p.created_at))
    }

    // ── Stored resumes ─────────────────────────────────────────────────────

    async fn create_stored_resume(&self, new: NewStoredResume) -> StorageResult<StoredResume> {
        let mut t = self.tables.write().await;
        let now = t.now();
        let resume = StoredResume {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            name: new.name,
            content: new.content,
            is_default: new.is_default,
            created_at: now,
            updated_at: now,
        };
        if resume.is_default {
            t.clear_default(resume.user_id, resume.id, now);
        }
        t.stored_resumes.insert(resume.id, resume.clone());
        Ok(resume)
    }

    async fn get_stored_resume(&self, id: Uuid) -> StorageResult<Option<StoredResume>> {
        Ok(self.tables.read().await.stored_resumes.get(&id).cloned())
    }

    async fn update_stored_resume(
        &self,
        id: Uuid,
        update: StoredResumeUpdate,
    ) -> StorageResult<Option<StoredResume>> {
        let mut t = self.tables.write().await;
        let Some(user_id) = t.stored_resumes.get(&id).map(|r| r.user_id) else {
            return Ok(None);
        };
        let now = t.now();
        if update.is_default == Some(true) {
            t.clear_default(user_id, id, now);
        }
        Ok(t.stored_resumes.get_mut(&id).map(|resume| {
            update.apply(resume);
            resume.updated_at = now;
            resume.clone()
        }))
    }

    async fn delete_stored_resume(&self, id: Uuid) -> StorageResult<bool> {
        let mut t = self.tables.write().await;
        let removed = t.stored_resumes.remove(&id).is_some();
        if removed {
            t.detach_stored_resume(id);
        }
        Ok(removed)
    }

    async fn list_stored_resumes_by_user(
        &self,
        user_id: Uuid,
    ) -> StorageResult<Vec<StoredResume>> {
        let t = self.tables.read().await;
        let rows = t
            .stored_resumes
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |r| r.updated_at))
    }

    async fn get_default_stored_resume(
        &self,
        user_id: Uuid,
    ) -> StorageResult<Option<StoredResume>> {
        let t = self.tables.read().await;
        Ok(t
            .stored_resumes
            .values()
            .find(|r| r.user_id == user_id && r.is_default)
            .cloned())
    }

    async fn set_default_stored_resume(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> StorageResult<Option<StoredResume>> {
        let mut t = self.tables.write().await;
        match t.stored_resumes.get(&id) {
            Some(r) if r.user_id == user_id => {}
            _ => return Ok(None),
        }
        let now = t.now();
        t.clear_default(user_id, id, now);
        Ok(t.stored_resumes.get_mut(&id).map(|resume| {
            resume.is_default = true;
            resume.updated_at = now;
            resume.clone()
        }))
    }

    // ── Tailored resumes ───────────────────────────────────────────────────

    async fn create_tailored_resume(
        &self,
        new: NewTailoredResume,
    ) -> StorageResult<TailoredResume> {
        let mut t = self.tables.write().await;
        let now = t.now();
        let resume = TailoredResume {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            session_id: new.session_id,
            stored_resume_id: new.stored_resume_id,
            job_posting_id: new.job_posting_id,
            title: new.title,
            content: new.content,
            match_score: new.match_score,
            created_at: now,
            updated_at: now,
        };
        t.tailored_resumes.insert(resume.id, resume.clone());
        Ok(resume)
    }

    async fn get_tailored_resume(&self, id: Uuid) -> StorageResult<Option<TailoredResume>> {
        Ok(self.tables.read().await.tailored_resumes.get(&id).cloned())
    }

    async fn update_tailored_resume(
        &self,
        id: Uuid,
        update: TailoredResumeUpdate,
    ) -> StorageResult<Option<TailoredResume>> {
        let mut t = self.tables.write().await;
        if !t.tailored_resumes.contains_key(&id) {
            return Ok(None);
        }
        let now = t.now();
        Ok(t.tailored_resumes.get_mut(&id).map(|resume| {
            update.apply(resume);
            resume.updated_at = now;
            resume.clone()
        }))
    }

    async fn delete_tailored_resume(&self, id: Uuid) -> StorageResult<bool> {
        let mut t = self.tables.write().await;
        let removed = t.tailored_resumes.remove(&id).is_some();
        if removed {
            t.detach_tailored_resume(id);
        }
        Ok(removed)
    }

    async fn list_tailored_resumes_by_user(
        &self,
        user_id: Uuid,
    ) -> StorageResult<Vec<TailoredResume>> {
        let t = self.tables.read().await;
        let rows = t
            .tailored_resumes
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |r| r.created_at))
    }

    // ── Job applications ───────────────────────────────────────────────────

    async fn create_application(&self, new: NewJobApplication) -> StorageResult<JobApplication> {
        let mut t = self.tables.write().await;
        let now = t.now();
        let app = JobApplication {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            tailored_resume_id: new.tailored_resume_id,
            job_posting_id: new.job_posting_id,
            company: new.company,
            position: new.position,
            job_url: new.job_url,
            status: new.status,
            applied_at: new.applied_at,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };
        t.applications.insert(app.id, app.clone());
        Ok(app)
    }

    async fn get_application(&self, id: Uuid) -> StorageResult<Option<JobApplication>> {
        Ok(self.tables.read().await.applications.get(&id).cloned())
    }

    async fn update_application(
        &self,
        id: Uuid,
        update: JobApplicationUpdate,
    ) -> StorageResult<Option<JobApplication>> {
        let mut t = self.tables.write().await;
        if !t.applications.contains_key(&id) {
            return Ok(None);
        }
        let now = t.now();
        Ok(t.applications.get_mut(&id).map(|app| {
            update.apply(app);
            app.updated_at = now;
            app.clone()
        }))
    }

    async fn delete_application(&self, id: Uuid) -> StorageResult<bool> {
        let mut t = self.tables.write().await;
        let removed = t.applications.remove(&id).is_some();
        if removed {
            t.follow_ups.retain(|_, f| f.application_id != id);
        }
        Ok(removed)
    }

    async fn list_applications_by_user(
        &self,
        user_id: Uuid,
        status: Option<ApplicationStatus>,
    ) -> StorageResult<Vec<JobApplication>> {
        let t = self.tables.read().await;
        let rows = t
            .applications
            .values()
            .filter(|a| a.user_id == user_id && status.map_or(true, |s| a.status == s))
            .cloned()
            .collect();
        Ok(newest_first(rows, |a| a.created_at))
    }

    async fn application_stats(&self, user_id: Uuid) -> StorageResult<ApplicationStats> {
        let t = self.tables.read().await;
        let mut stats = ApplicationStats::default();
        for app in t.applications.values().filter(|a| a.user_id == user_id) {
            stats.record(app.status, 1);
        }
        Ok(stats)
    }

    // ── Follow-ups ─────────────────────────────────────────────────────────

    async fn create_follow_up(&self, new: NewFollowUp) -> StorageResult<FollowUp> {
        let mut t = self.tables.write().await;
        let now = t.now();
        let follow_up = FollowUp {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            application_id: new.application_id,
            kind: new.kind,
            due_date: new.due_date,
            subject: new.subject,
            message: new.message,
            status: FollowUpStatus::Pending,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        t.follow_ups.insert(follow_up.id, follow_up.clone());
        Ok(follow_up)
    }

    async fn get_follow_up(&self, id: Uuid) -> StorageResult<Option<FollowUp>> {
        Ok(self.tables.read().await.follow_ups.get(&id).cloned())
    }

    async fn update_follow_up(
        &self,
        id: Uuid,
        update: FollowUpUpdate,
    ) -> StorageResult<Option<FollowUp>> {
        let mut t = self.tables.write().await;
        if !t.follow_ups.contains_key(&id) {
            return Ok(None);
        }
        let now = t.now();
        Ok(t.follow_ups.get_mut(&id).map(|follow_up| {
            update.apply(follow_up);
            follow_up.updated_at = now;
            follow_up.clone()
        }))
    }

    async fn delete_follow_up(&self, id: Uuid) -> StorageResult<bool> {
        Ok(self.tables.write().await.follow_ups.remove(&id).is_some())
    }

    async fn list_follow_ups_by_application(
        &self,
        application_id: Uuid,
    ) -> StorageResult<Vec<FollowUp>> {
        let t = self.tables.read().await;
        Ok(soonest_first(
            t.follow_ups
                .values()
                .filter(|f| f.application_id == application_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_pending_follow_ups(&self, user_id: Uuid) -> StorageResult<Vec<FollowUp>> {
        let t = self.tables.read().await;
        Ok(soonest_first(
            t.follow_ups
                .values()
                .filter(|f| f.user_id == user_id && f.status == FollowUpStatus::Pending)
                .cloned()
                .collect(),
        ))
    }

    async fn list_due_follow_ups(&self, before: DateTime<Utc>) -> StorageResult<Vec<FollowUp>> {
        let t = self.tables.read().await;
        Ok(soonest_first(
            t.follow_ups
                .values()
                .filter(|f| f.status == FollowUpStatus::Pending && f.due_date < before)
                .cloned()
                .collect(),
        ))
    }

    async fn follow_up_stats(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> StorageResult<FollowUpStats> {
        let t = self.tables.read().await;
        let mut stats = FollowUpStats::default();
        for f in t.follow_ups.values().filter(|f| f.user_id == user_id) {
            stats.total += 1;
            match f.status {
                FollowUpStatus::Pending => {
                    stats.pending += 1;
                    if f.due_date < now {
                        stats.overdue += 1;
                    }
                }
                FollowUpStatus::Completed => stats.completed += 1,
                FollowUpStatus::Skipped => stats.skipped += 1,
            }
        }
        Ok(stats)
    }

    // ── Admin ──────────────────────────────────────────────────────────────

    async fn admin_stats(&self) -> StorageResult<AdminStats> {
        let t = self.tables.read().await;
        Ok(AdminStats {
            users: t.users.len() as i64,
            sessions: t.sessions.len() as i64,
            tailored_resumes: t.tailored_resumes.len() as i64,
            applications: t.applications.len() as i64,
        })
    }
}
