//! Axum route handlers for job applications and follow-ups.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::analysis::follow_up::{draft_follow_up_email, FollowUpEmail};
use crate::auth::{require_owner, CurrentUser};
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::models::application::{
    ApplicationStats, FollowUp, FollowUpStats, FollowUpUpdate, JobApplication,
    JobApplicationUpdate,
};
use crate::models::user::User;
use crate::state::AppState;
use crate::tracker::{
    completion, stamp_completion, ApplicationQuery, CreateApplicationRequest, CreateFollowUpRequest,
};

#[derive(Debug, Serialize)]
pub struct DraftEmailResponse {
    pub follow_up: FollowUp,
    pub email: FollowUpEmail,
}

async fn owned_application(state: &AppState, user: &User, id: Uuid) -> Result<JobApplication, AppError> {
    require_owner(state.storage.get_application(id).await?, user, "Application", id)
}

async fn owned_follow_up(state: &AppState, user: &User, id: Uuid) -> Result<FollowUp, AppError> {
    require_owner(state.storage.get_follow_up(id).await?, user, "Follow-up", id)
}

// ────────────────────────────────────────────────────────────────────────────
// Applications
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/applications?status=
pub async fn handle_list_applications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppQuery(query): AppQuery<ApplicationQuery>,
) -> Result<Json<Vec<JobApplication>>, AppError> {
    Ok(Json(
        state
            .storage
            .list_applications_by_user(user.id, query.status)
            .await?,
    ))
}

/// POST /api/applications
pub async fn handle_create_application(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(req): AppJson<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<JobApplication>), AppError> {
    if let Some(id) = req.tailored_resume_id {
        require_owner(state.storage.get_tailored_resume(id).await?, &user, "Tailored resume", id)?;
    }
    if let Some(id) = req.job_posting_id {
        require_owner(state.storage.get_job_posting(id).await?, &user, "Job posting", id)?;
    }
    let new = req.into_new(user.id, Utc::now())?;
    let application = state.storage.create_application(new).await?;
    info!("Tracked application {} ({} at {})", application.id, application.position, application.company);
    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/applications/stats
pub async fn handle_application_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApplicationStats>, AppError> {
    Ok(Json(state.storage.application_stats(user.id).await?))
}

/// GET /api/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<JobApplication>, AppError> {
    Ok(Json(owned_application(&state, &user, id).await?))
}

/// PATCH /api/applications/:id
pub async fn handle_update_application(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(update): AppJson<JobApplicationUpdate>,
) -> Result<Json<JobApplication>, AppError> {
    owned_application(&state, &user, id).await?;
    if let Some(tailored_id) = update.tailored_resume_id {
        require_owner(
            state.storage.get_tailored_resume(tailored_id).await?,
            &user,
            "Tailored resume",
            tailored_id,
        )?;
    }
    state
        .storage
        .update_application(id, update)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Application", id))
}

/// DELETE /api/applications/:id
///
/// Removes the application's follow-ups with it.
pub async fn handle_delete_application(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    owned_application(&state, &user, id).await?;
    state.storage.delete_application(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Follow-ups
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/applications/:id/follow-ups
pub async fn handle_list_follow_ups(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Vec<FollowUp>>, AppError> {
    owned_application(&state, &user, id).await?;
    Ok(Json(state.storage.list_follow_ups_by_application(id).await?))
}

/// POST /api/applications/:id/follow-ups
pub async fn handle_create_follow_up(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<CreateFollowUpRequest>,
) -> Result<(StatusCode, Json<FollowUp>), AppError> {
    let application = owned_application(&state, &user, id).await?;
    let new = req.into_new(user.id, application.id, &application.company);
    let follow_up = state.storage.create_follow_up(new).await?;
    Ok((StatusCode::CREATED, Json(follow_up)))
}

/// GET /api/follow-ups/pending
pub async fn handle_pending_follow_ups(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<FollowUp>>, AppError> {
    Ok(Json(state.storage.list_pending_follow_ups(user.id).await?))
}

/// GET /api/follow-ups/stats
pub async fn handle_follow_up_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<FollowUpStats>, AppError> {
    Ok(Json(state.storage.follow_up_stats(user.id, Utc::now()).await?))
}

/// PATCH /api/follow-ups/:id
///
/// Completing stamps `completed_at`; any other status clears it.
pub async fn handle_update_follow_up(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(update): AppJson<FollowUpUpdate>,
) -> Result<Json<FollowUp>, AppError> {
    owned_follow_up(&state, &user, id).await?;
    if update.subject.as_deref().is_some_and(|s| s.trim().is_empty()) {
        return Err(AppError::Validation("subject cannot be empty".to_string()));
    }
    state
        .storage
        .update_follow_up(id, stamp_completion(update, Utc::now()))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Follow-up", id))
}

/// DELETE /api/follow-ups/:id
pub async fn handle_delete_follow_up(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    owned_follow_up(&state, &user, id).await?;
    state.storage.delete_follow_up(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/follow-ups/:id/complete
pub async fn handle_complete_follow_up(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<FollowUp>, AppError> {
    owned_follow_up(&state, &user, id).await?;
    state
        .storage
        .update_follow_up(id, completion(Utc::now()))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Follow-up", id))
}

/// POST /api/follow-ups/:id/draft-email
///
/// Drafts the email with the model and saves it onto the follow-up.
pub async fn handle_draft_follow_up_email(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<DraftEmailResponse>, AppError> {
    let follow_up = owned_follow_up(&state, &user, id).await?;
    let application = owned_application(&state, &user, follow_up.application_id).await?;

    let email =
        draft_follow_up_email(&state.llm, &application, follow_up.kind, &user.display_name())
            .await?;
    let follow_up = state
        .storage
        .update_follow_up(
            id,
            FollowUpUpdate {
                subject: Some(email.subject.clone()),
                message: Some(email.body.clone()),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| AppError::not_found("Follow-up", id))?;
    info!("Drafted {:?} email for follow-up {}", follow_up.kind, id);

    Ok(Json(DraftEmailResponse { follow_up, email }))
}
