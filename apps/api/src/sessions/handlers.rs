//! Axum route handlers for tailoring sessions.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{require_owner, CurrentUser};
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath};
use crate::models::session::ResumeSession;
use crate::sessions::{
    analyze_session, open_session, tailor_session, AnalysisOutcome, ResumeSource, TailorOutcome,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub resume_text: Option<String>,
    #[serde(default)]
    pub stored_resume_id: Option<Uuid>,
    pub job_description: String,
    #[serde(default)]
    pub job_url: Option<String>,
}

impl CreateSessionRequest {
    /// Explicit text wins, then an explicit stored resume, then the default.
    fn source(&self) -> ResumeSource {
        match (&self.resume_text, self.stored_resume_id) {
            (Some(text), _) if !text.trim().is_empty() => ResumeSource::Text(text.clone()),
            (_, Some(id)) => ResumeSource::Stored(id),
            _ => ResumeSource::Default,
        }
    }
}

async fn owned_session(state: &AppState, user: &CurrentUser, id: Uuid) -> Result<ResumeSession, AppError> {
    require_owner(state.storage.get_session(id).await?, &user.0, "Session", id)
}

/// POST /api/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(req): AppJson<CreateSessionRequest>,
) -> Result<(StatusCode, Json<ResumeSession>), AppError> {
    let source = req.source();
    let session = open_session(
        state.storage.as_ref(),
        &user,
        source,
        req.job_description,
        req.job_url,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/sessions
pub async fn handle_list_sessions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ResumeSession>>, AppError> {
    Ok(Json(state.storage.list_sessions_by_user(user.id).await?))
}

/// GET /api/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ResumeSession>, AppError> {
    Ok(Json(owned_session(&state, &user, id).await?))
}

/// DELETE /api/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    owned_session(&state, &user, id).await?;
    state.storage.delete_session(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/sessions/:id/analyze
///
/// Contact extraction, job analysis and match scoring in one pass.
pub async fn handle_analyze_session(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<AnalysisOutcome>, AppError> {
    let session = owned_session(&state, &user, id).await?;
    let outcome = analyze_session(state.storage.as_ref(), &state.llm, session, user.0.id).await?;
    Ok(Json(outcome))
}

/// POST /api/sessions/:id/tailor
///
/// Requires a prior analyze; stores the rewrite as a tailored resume.
pub async fn handle_tailor_session(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<(StatusCode, Json<TailorOutcome>), AppError> {
    let session = owned_session(&state, &user, id).await?;
    let outcome = tailor_session(state.storage.as_ref(), &state.llm, session, user.0.id).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(resume_text: Option<&str>, stored: Option<Uuid>) -> CreateSessionRequest {
        CreateSessionRequest {
            resume_text: resume_text.map(str::to_string),
            stored_resume_id: stored,
            job_description: "job".to_string(),
            job_url: None,
        }
    }

    #[test]
    fn test_resume_source_precedence() {
        let id = Uuid::new_v4();
        assert_eq!(req(Some("text"), Some(id)).source(), ResumeSource::Text("text".to_string()));
        assert_eq!(req(Some("  "), Some(id)).source(), ResumeSource::Stored(id));
        assert_eq!(req(None, None).source(), ResumeSource::Default);
    }
}
