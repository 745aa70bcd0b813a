//! Axum route handlers for stored resumes, tailored resumes and job postings.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::analysis::interview::InterviewQuestion;
use crate::auth::{require_owner, CurrentUser};
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath};
use crate::models::job_posting::JobPosting;
use crate::models::resume::{
    NewStoredResume, StoredResume, StoredResumeUpdate, TailoredResume, TailoredResumeUpdate,
};
use crate::resumes::{extract_upload_text, name_from_file};
use crate::sessions::prepare_interview;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateStoredResumeRequest {
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Serialize)]
pub struct InterviewQuestionsResponse {
    pub tailored_resume_id: Uuid,
    pub questions: Vec<InterviewQuestion>,
}

fn validate_stored_resume(name: &str, content: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    if content.trim().is_empty() {
        return Err(AppError::Validation("content cannot be empty".to_string()));
    }
    Ok(())
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

// ────────────────────────────────────────────────────────────────────────────
// Stored resumes
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/resumes
pub async fn handle_list_stored_resumes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<StoredResume>>, AppError> {
    Ok(Json(state.storage.list_stored_resumes_by_user(user.id).await?))
}

/// POST /api/resumes
pub async fn handle_create_stored_resume(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(req): AppJson<CreateStoredResumeRequest>,
) -> Result<(StatusCode, Json<StoredResume>), AppError> {
    validate_stored_resume(&req.name, &req.content)?;
    let resume = state
        .storage
        .create_stored_resume(NewStoredResume {
            user_id: user.id,
            name: req.name.trim().to_string(),
            content: req.content,
            is_default: req.is_default,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(resume)))
}

/// POST /api/resumes/upload
///
/// Multipart form: `file` (PDF or plain text), optional `name` and `is_default`.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<StoredResume>), AppError> {
    let mut name: Option<String> = None;
    let mut is_default = false;
    let mut content: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "name" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid name field: {e}")))?;
                name = Some(text.trim().to_string()).filter(|n| !n.is_empty());
            }
            "is_default" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid is_default field: {e}")))?;
                is_default = parse_flag(&text);
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("resume").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid file field: {e}")))?;
                content = Some(extract_upload_text(&file_name, content_type.as_deref(), data).await?);
                if name.is_none() {
                    name = Some(name_from_file(&file_name));
                }
            }
            _ => {}
        }
    }

    let content = content.ok_or_else(|| AppError::Validation("file is required".to_string()))?;
    let resume = state
        .storage
        .create_stored_resume(NewStoredResume {
            user_id: user.id,
            name: name.unwrap_or_else(|| "Uploaded resume".to_string()),
            content,
            is_default,
        })
        .await?;
    info!("Stored uploaded resume {} for user {}", resume.id, user.id);
    Ok((StatusCode::CREATED, Json(resume)))
}

/// GET /api/resumes/default
pub async fn handle_get_default_resume(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<StoredResume>, AppError> {
    state
        .storage
        .get_default_stored_resume(user.id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No default resume set".to_string()))
}

/// GET /api/resumes/:id
pub async fn handle_get_stored_resume(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<StoredResume>, AppError> {
    let resume = state.storage.get_stored_resume(id).await?;
    Ok(Json(require_owner(resume, &user, "Stored resume", id)?))
}

/// PATCH /api/resumes/:id
pub async fn handle_update_stored_resume(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(update): AppJson<StoredResumeUpdate>,
) -> Result<Json<StoredResume>, AppError> {
    require_owner(state.storage.get_stored_resume(id).await?, &user, "Stored resume", id)?;
    if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    state
        .storage
        .update_stored_resume(id, update)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Stored resume", id))
}

/// DELETE /api/resumes/:id
pub async fn handle_delete_stored_resume(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    require_owner(state.storage.get_stored_resume(id).await?, &user, "Stored resume", id)?;
    state.storage.delete_stored_resume(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/resumes/:id/default
pub async fn handle_set_default_resume(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<StoredResume>, AppError> {
    state
        .storage
        .set_default_stored_resume(user.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Stored resume", id))
}

// ────────────────────────────────────────────────────────────────────────────
// Tailored resumes
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/tailored-resumes
pub async fn handle_list_tailored_resumes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<TailoredResume>>, AppError> {
    Ok(Json(state.storage.list_tailored_resumes_by_user(user.id).await?))
}

/// GET /api/tailored-resumes/:id
pub async fn handle_get_tailored_resume(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<TailoredResume>, AppError> {
    let resume = state.storage.get_tailored_resume(id).await?;
    Ok(Json(require_owner(resume, &user, "Tailored resume", id)?))
}

/// PATCH /api/tailored-resumes/:id
pub async fn handle_update_tailored_resume(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(update): AppJson<TailoredResumeUpdate>,
) -> Result<Json<TailoredResume>, AppError> {
    require_owner(state.storage.get_tailored_resume(id).await?, &user, "Tailored resume", id)?;
    if update.match_score.is_some_and(|s| !(0..=100).contains(&s)) {
        return Err(AppError::Validation("match_score must be between 0 and 100".to_string()));
    }
    state
        .storage
        .update_tailored_resume(id, update)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Tailored resume", id))
}

/// DELETE /api/tailored-resumes/:id
pub async fn handle_delete_tailored_resume(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    require_owner(state.storage.get_tailored_resume(id).await?, &user, "Tailored resume", id)?;
    state.storage.delete_tailored_resume(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/tailored-resumes/:id/interview-questions
pub async fn handle_interview_questions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<InterviewQuestionsResponse>, AppError> {
    let tailored =
        require_owner(state.storage.get_tailored_resume(id).await?, &user, "Tailored resume", id)?;
    let questions = prepare_interview(state.storage.as_ref(), &state.llm, &tailored).await?;
    info!("Generated {} interview questions for {}", questions.len(), id);
    Ok(Json(InterviewQuestionsResponse {
        tailored_resume_id: id,
        questions,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Job postings
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/job-postings
pub async fn handle_list_job_postings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<JobPosting>>, AppError> {
    Ok(Json(state.storage.list_job_postings_by_user(user.id).await?))
}

/// GET /api/job-postings/:id
pub async fn handle_get_job_posting(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<JobPosting>, AppError> {
    let posting = state.storage.get_job_posting(id).await?;
    Ok(Json(require_owner(posting, &user, "Job posting", id)?))
}

/// DELETE /api/job-postings/:id
pub async fn handle_delete_job_posting(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    require_owner(state.storage.get_job_posting(id).await?, &user, "Job posting", id)?;
    state.storage.delete_job_posting(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
