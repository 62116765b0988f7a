//! Account routes: registration, login, profile and email confirmation.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tracing::{info, warn};

use vitae_auth::{hash_password, verify_password};
use vitae_store::{normalize_email, NewUser, SqliteStore};

use crate::error::{AppError, AppResult, CONFIRM_REQUIRED};
use crate::extract::{ConfirmedUser, CurrentUser};
use crate::flash::Flash;
use crate::forms::{ChangePasswordForm, FieldErrors, LoginForm, RegisterForm};
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid email and/or password.";
const INVALID_CONFIRM_LINK: &str = "The confirmation link is invalid or has expired.";
const EMAIL_REGISTERED: &str = "Email already registered";
const PASSWORD_CHANGE_FAILED: &str = "Password change was unsuccessful.";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/profile", get(get_profile).post(change_password))
        .route("/confirm/{token}", get(confirm_email))
        .route("/unconfirmed", get(unconfirmed))
        .route("/resend", get(resend_confirmation))
}

/// Insert a new account. A concurrent registration of the same address
/// surfaces as the same field error the pre-check gives.
fn create_account(store: &SqliteStore, email: &str, password_hash: String) -> AppResult<i64> {
    let new_user = NewUser {
        email: email.to_string(),
        password_hash,
        ..Default::default()
    };
    match store.create_user(new_user) {
        Ok(id) => Ok(id),
        Err(vitae_core::Error::Duplicate(_)) => {
            let mut errors = FieldErrors::new();
            errors.add("email", EMAIL_REGISTERED);
            Err(AppError::Validation(errors))
        }
        Err(e) => Err(e.into()),
    }
}

async fn hash_blocking(password: String, cost: u32) -> AppResult<String> {
    Ok(tokio::task::spawn_blocking(move || hash_password(&password, cost)).await??)
}

/// POST /api/register
async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterForm>, JsonRejection>,
) -> AppResult<Flash> {
    let Json(form) = payload?;
    let email = normalize_email(&form.email);

    let mut errors = form.validate();
    if errors.get("email").is_none() && state.store.find_user_by_email(&email)?.is_some() {
        errors.add("email", EMAIL_REGISTERED);
    }
    errors.into_result()?;

    let password_hash = hash_blocking(form.password, state.config.bcrypt_cost).await?;
    let user_id = create_account(&state.store, &email, password_hash)?;
    info!("Registered user {} ({})", user_id, email);

    if let Err(e) = state.send_confirmation(&email) {
        warn!("Could not send confirmation mail to {}: {}", email, e);
    }

    let session = state.sessions.create(user_id);
    Ok(
        Flash::success("You registered and are now logged in. Welcome!")
            .redirect("/api/unconfirmed")
            .with_status(StatusCode::CREATED)
            .with_data(serde_json::json!({
                "user_id": user_id,
                "email": email,
                "token": session.id,
            }))
            .login_cookie(&session.id, state.config.session_ttl),
    )
}

/// POST /api/login
async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginForm>, JsonRejection>,
) -> AppResult<Flash> {
    let Json(form) = payload?;
    form.validate().into_result()?;

    let email = normalize_email(&form.email);
    let Some(user) = state.store.find_user_by_email(&email)? else {
        warn!("Login rejected for unknown email {}", email);
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    };

    let hash = user.password_hash.clone();
    let password = form.password;
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await?;
    if !valid {
        warn!("Login rejected for {}", email);
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let session = state.sessions.create(user.id);
    info!("User {} logged in", user.id);
    Ok(Flash::success("Welcome.")
        .redirect("/")
        .with_data(serde_json::json!({
            "token": session.id,
            "user": user,
        }))
        .login_cookie(&session.id, state.config.session_ttl))
}

/// GET /api/logout
async fn logout(State(state): State<Arc<AppState>>, current: CurrentUser) -> Flash {
    state.sessions.revoke(&current.session_id);
    info!("User {} logged out", current.user.id);
    Flash::success("You were logged out.")
        .redirect("/api/login")
        .clear_cookie()
}

/// GET /api/profile
async fn get_profile(ConfirmedUser(user): ConfirmedUser) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "user": user }))
}

/// POST /api/profile: change password.
async fn change_password(
    State(state): State<Arc<AppState>>,
    ConfirmedUser(user): ConfirmedUser,
    payload: Result<Json<ChangePasswordForm>, JsonRejection>,
) -> AppResult<Flash> {
    let Json(form) = payload?;
    form.validate().into_result()?;

    let password_hash = hash_blocking(form.password, state.config.bcrypt_cost).await?;
    if !state.store.update_password(user.id, &password_hash)? {
        warn!("Password change for missing user {}", user.id);
        return Ok(Flash::danger(PASSWORD_CHANGE_FAILED)
            .with_status(StatusCode::NOT_FOUND)
            .redirect("/api/profile"));
    }
    info!("User {} changed password", user.id);
    Ok(Flash::success("Password successfully changed.").redirect("/api/profile"))
}

/// GET /api/confirm/{token}
async fn confirm_email(
    State(state): State<Arc<AppState>>,
    _current: CurrentUser,
    Path(token): Path<String>,
) -> AppResult<Flash> {
    let email = state.tokens.confirm_token(&token).map_err(|e| {
        warn!("Rejected confirmation token: {}", e);
        AppError::BadRequest(INVALID_CONFIRM_LINK.into())
    })?;

    let user = state
        .store
        .find_user_by_email(&email)?
        .ok_or_else(|| AppError::NotFound(format!("No account for {}", email)))?;

    if user.confirmed {
        return Ok(Flash::success("Account already confirmed. Please login.").redirect("/"));
    }

    state.store.confirm_user(user.id, Utc::now())?;
    info!("User {} confirmed {}", user.id, email);
    Ok(Flash::success("You have confirmed your account. Thanks!").redirect("/"))
}

/// GET /api/unconfirmed
async fn unconfirmed(current: CurrentUser) -> Flash {
    if current.user.confirmed {
        return Flash::info("Your account is already confirmed.").redirect("/");
    }
    Flash::warning(CONFIRM_REQUIRED).with_data(serde_json::json!({
        "email": current.user.email,
    }))
}

/// GET /api/resend
async fn resend_confirmation(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> AppResult<Flash> {
    state.send_confirmation(&current.user.email)?;
    Ok(Flash::success("A new confirmation email has been sent.").redirect("/api/unconfirmed"))
}
