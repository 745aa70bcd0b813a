//! Session authentication.
//!
//! A signed-in browser carries an opaque token in the `sid` cookie; the token
//! maps to an `AuthSession` row. Two guards sit in front of the routes:
//! - [`require_auth`]: the session exists, is unexpired, and its user exists.
//! - [`require_admin`]: additionally, the user is flagged `is_admin`.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AppError;
use crate::models::auth::AuthSession;
use crate::models::user::User;
use crate::models::Owned;
use crate::state::AppState;

pub mod handlers;
pub mod password;

pub const SESSION_COOKIE: &str = "sid";

/// The signed-in user, placed in request extensions by [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

pub fn is_authenticated(session: Option<&AuthSession>, now: DateTime<Utc>) -> bool {
    session.is_some_and(|s| !s.is_expired(now))
}

pub fn is_admin(user: Option<&User>) -> bool {
    user.is_some_and(|u| u.is_admin)
}

/// Guard: rejects with 401 unless the `sid` cookie names a live session.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(AppError::Unauthorized)?;

    let session = state.storage.get_auth_session(&token).await?;
    if !is_authenticated(session.as_ref(), Utc::now()) {
        if session.is_some() {
            debug!("Expired session presented, removing it");
            state.storage.delete_auth_session(&token).await?;
        }
        warn!("Authentication denied: no live session");
        return Err(AppError::Unauthorized);
    }

    let user_id = session.map(|s| s.user_id).ok_or(AppError::Unauthorized)?;
    let user = state
        .storage
        .get_user(user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Guard: must run after [`require_auth`]; rejects non-admins with 403.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let user = request.extensions().get::<CurrentUser>().map(|c| &c.0);
    if user.is_none() {
        return Err(AppError::Unauthorized);
    }
    if !is_admin(user) {
        warn!("Admin access denied for user {:?}", user.map(|u| u.id));
        return Err(AppError::Forbidden);
    }
    Ok(next.run(request).await)
}

/// Unwraps a looked-up record, hiding records of other users behind 404.
pub fn require_owner<T: Owned>(
    record: Option<T>,
    user: &User,
    kind: &str,
    id: Uuid,
) -> Result<T, AppError> {
    match record {
        Some(r) if r.owner_id() == Some(user.id) => Ok(r),
        _ => Err(AppError::not_found(kind, id)),
    }
}

pub fn session_cookie(token: String, config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}
