//! Admin-only routes. Mounted behind both `require_auth` and `require_admin`.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::models::application::{AdminStats, FollowUp};
use crate::models::user::{User, UserUpdate};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DueQuery {
    #[serde(default)]
    pub before: Option<DateTime<Utc>>,
}

/// GET /api/admin/stats
pub async fn handle_admin_stats(State(state): State<AppState>) -> Result<Json<AdminStats>, AppError> {
    Ok(Json(state.storage.admin_stats().await?))
}

/// GET /api/admin/users
pub async fn handle_list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.storage.list_users().await?))
}

/// PATCH /api/admin/users/:id
///
/// An admin cannot revoke their own flag.
pub async fn handle_update_user(
    State(state): State<AppState>,
    CurrentUser(admin): CurrentUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(update): AppJson<UserUpdate>,
) -> Result<Json<User>, AppError> {
    if id == admin.id && update.is_admin == Some(false) {
        return Err(AppError::Validation(
            "admins cannot remove their own admin flag".to_string(),
        ));
    }
    let user = state
        .storage
        .update_user(id, update)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))?;
    info!("Admin {} updated user {} (admin: {})", admin.id, user.id, user.is_admin);
    Ok(Json(user))
}

/// DELETE /api/admin/users/:id
///
/// Removes the account and every record it owns. Admins cannot delete
/// themselves.
pub async fn handle_delete_user(
    State(state): State<AppState>,
    CurrentUser(admin): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    if id == admin.id {
        return Err(AppError::Validation("admins cannot delete their own account".to_string()));
    }
    if !state.storage.delete_user(id).await? {
        return Err(AppError::not_found("User", id));
    }
    info!("Admin {} deleted user {}", admin.id, id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/admin/follow-ups/due?before=
///
/// Follow-ups across all users due before the instant (default: now).
pub async fn handle_due_follow_ups(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<DueQuery>,
) -> Result<Json<Vec<FollowUp>>, AppError> {
    let before = query.before.unwrap_or_else(Utc::now);
    Ok(Json(state.storage.list_due_follow_ups(before).await?))
}
