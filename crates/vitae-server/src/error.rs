//! HTTP-facing error type.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use crate::flash::FlashCategory;
use crate::forms::FieldErrors;

pub const LOGIN_REQUIRED: &str = "Please log in to access this page.";
pub const CONFIRM_REQUIRED: &str = "Please confirm your account!";

/// Errors returned by route handlers.
#[derive(Debug)]
pub enum AppError {
    Internal(anyhow::Error),
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    Validation(FieldErrors),
    /// Logged in but the email address is not confirmed yet.
    Unconfirmed,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) | Self::Unconfirmed => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Internal(e) => write!(f, "{}", e),
            Self::NotFound(m)
            | Self::BadRequest(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::Conflict(m) => f.write_str(m),
            Self::Validation(_) => f.write_str("Please correct the errors below."),
            Self::Unconfirmed => f.write_str(CONFIRM_REQUIRED),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = serde_json::json!({
            "error": self.to_string(),
            "category": FlashCategory::Danger,
        });

        match &self {
            Self::Internal(e) => {
                error!("Internal error: {:#}", e);
                body["error"] = "Internal server error".into();
            }
            Self::Unauthorized(_) => {
                body["redirect"] = "/api/login".into();
            }
            Self::Unconfirmed => {
                body["category"] = serde_json::json!(FlashCategory::Warning);
                body["redirect"] = "/api/unconfirmed".into();
            }
            Self::Validation(fields) => {
                body["fields"] = serde_json::json!(fields);
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}

impl From<vitae_core::Error> for AppError {
    fn from(err: vitae_core::Error) -> Self {
        use vitae_core::Error;
        match err {
            Error::NotFound(m) => Self::NotFound(format!("Not found: {}", m)),
            Error::Duplicate(m) => Self::Conflict(format!("Already exists: {}", m)),
            Error::Token(m) => Self::Unauthorized(m),
            other => Self::Internal(other.into()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(err.into())
    }
}

pub type AppResult<T> = Result<T, AppError>;
