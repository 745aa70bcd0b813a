//! Axum route handlers for registration, login and logout.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::CookieJar;
use chrono::Duration;
use serde::Deserialize;
use tracing::info;

use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::auth::{removal_cookie, session_cookie, CurrentUser, SESSION_COOKIE};
use crate::errors::AppError;
use crate::extract::AppJson;
use crate::models::user::{NewUser, User};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn validate_registration(req: &RegisterRequest) -> Result<(), AppError> {
    let email = req.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("a valid email is required".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

async fn start_session(state: &AppState, jar: CookieJar, user: &User) -> Result<CookieJar, AppError> {
    let session = state
        .storage
        .create_auth_session(user.id, Duration::hours(state.config.session_ttl_hours))
        .await?;
    Ok(jar.add(session_cookie(session.token, &state.config)))
}

/// POST /api/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<User>), AppError> {
    validate_registration(&req)?;

    let password_hash = hash_password_blocking(req.password.clone()).await?;
    let is_admin = state.config.is_admin_email(&req.email);
    let user = state
        .storage
        .create_user(NewUser {
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
            profile_image_url: None,
            is_admin,
            password_hash: Some(password_hash),
        })
        .await?;
    info!("Registered user {} (admin: {})", user.id, user.is_admin);

    let jar = start_session(&state, jar, &user).await?;
    Ok((StatusCode::CREATED, jar, Json(user)))
}

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<(CookieJar, Json<User>), AppError> {
    let user = state
        .storage
        .get_user_by_email(&req.email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let hash = user.password_hash.clone().ok_or(AppError::Unauthorized)?;
    if !verify_password_blocking(req.password, hash).await? {
        return Err(AppError::Unauthorized);
    }

    info!("User {} signed in", user.id);
    let jar = start_session(&state, jar, &user).await?;
    Ok((jar, Json(user)))
}

/// POST /api/auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(StatusCode, CookieJar), AppError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.storage.delete_auth_session(cookie.value()).await?;
    }
    Ok((StatusCode::NO_CONTENT, jar.remove(removal_cookie())))
}

/// GET /api/auth/user
pub async fn handle_current_user(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}
