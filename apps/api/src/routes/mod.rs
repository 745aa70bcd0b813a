pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::admin;
use crate::auth::{self, require_admin, require_auth};
use crate::resumes::{self, handlers as resume_handlers};
use crate::sessions::handlers as session_handlers;
use crate::state::AppState;
use crate::tracker::handlers as tracker_handlers;

const UPLOAD_BODY_LIMIT: usize = resumes::MAX_UPLOAD_BYTES + 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/auth/register", post(auth::handlers::handle_register))
        .route("/api/auth/login", post(auth::handlers::handle_login))
        .route("/api/auth/logout", post(auth::handlers::handle_logout));

    let admin = Router::new()
        .route("/api/admin/stats", get(admin::handle_admin_stats))
        .route("/api/admin/users", get(admin::handle_list_users))
        .route(
            "/api/admin/users/:id",
            patch(admin::handle_update_user).delete(admin::handle_delete_user),
        )
        .route("/api/admin/follow-ups/due", get(admin::handle_due_follow_ups))
        .route_layer(middleware::from_fn(require_admin));

    let protected = Router::new()
        .route("/api/auth/user", get(auth::handlers::handle_current_user))
        // Tailoring sessions
        .route(
            "/api/sessions",
            get(session_handlers::handle_list_sessions).post(session_handlers::handle_create_session),
        )
        .route(
            "/api/sessions/:id",
            get(session_handlers::handle_get_session).delete(session_handlers::handle_delete_session),
        )
        .route(
            "/api/sessions/:id/analyze",
            post(session_handlers::handle_analyze_session),
        )
        .route(
            "/api/sessions/:id/tailor",
            post(session_handlers::handle_tailor_session),
        )
        // Stored resumes
        .route(
            "/api/resumes",
            get(resume_handlers::handle_list_stored_resumes)
                .post(resume_handlers::handle_create_stored_resume),
        )
        .route(
            "/api/resumes/upload",
            post(resume_handlers::handle_upload_resume)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/resumes/default",
            get(resume_handlers::handle_get_default_resume),
        )
        .route(
            "/api/resumes/:id",
            get(resume_handlers::handle_get_stored_resume)
                .patch(resume_handlers::handle_update_stored_resume)
                .delete(resume_handlers::handle_delete_stored_resume),
        )
        .route(
            "/api/resumes/:id/default",
            post(resume_handlers::handle_set_default_resume),
        )
        // Job postings
        .route(
            "/api/job-postings",
            get(resume_handlers::handle_list_job_postings),
        )
        .route(
            "/api/job-postings/:id",
            get(resume_handlers::handle_get_job_posting)
                .delete(resume_handlers::handle_delete_job_posting),
        )
        // Tailored resumes
        .route(
            "/api/tailored-resumes",
            get(resume_handlers::handle_list_tailored_resumes),
        )
        .route(
            "/api/tailored-resumes/:id",
            get(resume_handlers::handle_get_tailored_resume)
                .patch(resume_handlers::handle_update_tailored_resume)
                .delete(resume_handlers::handle_delete_tailored_resume),
        )
        .route(
            "/api/tailored-resumes/:id/interview-questions",
            post(resume_handlers::handle_interview_questions),
        )
        // Applications
        .route(
            "/api/applications",
            get(tracker_handlers::handle_list_applications)
                .post(tracker_handlers::handle_create_application),
        )
        .route(
            "/api/applications/stats",
            get(tracker_handlers::handle_application_stats),
        )
        .route(
            "/api/applications/:id",
            get(tracker_handlers::handle_get_application)
                .patch(tracker_handlers::handle_update_application)
                .delete(tracker_handlers::handle_delete_application),
        )
        // Follow-ups
        .route(
            "/api/applications/:id/follow-ups",
            get(tracker_handlers::handle_list_follow_ups)
                .post(tracker_handlers::handle_create_follow_up),
        )
        .route(
            "/api/follow-ups/pending",
            get(tracker_handlers::handle_pending_follow_ups),
        )
        .route(
            "/api/follow-ups/stats",
            get(tracker_handlers::handle_follow_up_stats),
        )
        .route(
            "/api/follow-ups/:id",
            patch(tracker_handlers::handle_update_follow_up)
                .delete(tracker_handlers::handle_delete_follow_up),
        )
        .route(
            "/api/follow-ups/:id/complete",
            post(tracker_handlers::handle_complete_follow_up),
        )
        .route(
            "/api/follow-ups/:id/draft-email",
            post(tracker_handlers::handle_draft_follow_up_email),
        )
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    public.merge(protected).with_state(state)
}
