//! Request extractors for the logged-in user.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use tracing::debug;

use vitae_store::User;

use crate::error::{AppError, LOGIN_REQUIRED};
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "vitae_session";

/// Session ID from `Authorization: Bearer` or the session cookie.
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Resolve the request's session to a user, if any.
pub fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<Option<(User, String)>, AppError> {
    let Some(sid) = session_id(headers) else {
        return Ok(None);
    };
    let Some(user_id) = state.sessions.resolve(&sid) else {
        debug!("Unknown or expired session");
        return Ok(None);
    };
    match state.store.get_user(user_id)? {
        Some(user) => Ok(Some((user, sid))),
        None => {
            state.sessions.revoke(&sid);
            Ok(None)
        }
    }
}

/// Any logged-in user.
pub struct CurrentUser {
    pub user: User,
    pub session_id: String,
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match resolve_user(state, &parts.headers)? {
            Some((user, session_id)) => Ok(Self { user, session_id }),
            None => Err(AppError::Unauthorized(LOGIN_REQUIRED.into())),
        }
    }
}

/// A logged-in user whose email address is confirmed.
pub struct ConfirmedUser(pub User);

impl FromRequestParts<Arc<AppState>> for ConfirmedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser { user, .. } = CurrentUser::from_request_parts(parts, state).await?;
        if !user.confirmed {
            return Err(AppError::Unconfirmed);
        }
        Ok(Self(user))
    }
}

/// A logged-in administrator.
pub struct AdminUser(pub User);

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser { user, .. } = CurrentUser::from_request_parts(parts, state).await?;
        if !user.admin {
            return Err(AppError::Forbidden("Administrator access required.".into()));
        }
        Ok(Self(user))
    }
}
