pub mod application;
pub mod auth;
pub mod job_posting;
pub mod resume;
pub mod session;
pub mod user;

use uuid::Uuid;

/// Records that belong to a single user.
pub trait Owned {
    fn owner_id(&self) -> Option<Uuid>;
}

impl Owned for session::ResumeSession {
    fn owner_id(&self) -> Option<Uuid> {
        self.user_id
    }
}

impl Owned for job_posting::JobPosting {
    fn owner_id(&self) -> Option<Uuid> {
        Some(self.user_id)
    }
}

impl Owned for resume::StoredResume {
    fn owner_id(&self) -> Option<Uuid> {
        Some(self.user_id)
    }
}

impl Owned for resume::TailoredResume {
    fn owner_id(&self) -> Option<Uuid> {
        Some(self.user_id)
    }
}

impl Owned for application::JobApplication {
    fn owner_id(&self) -> Option<Uuid> {
        Some(self.user_id)
    }
}

impl Owned for application::FollowUp {
    fn owner_id(&self) -> Option<Uuid> {
        Some(self.user_id)
    }
}
