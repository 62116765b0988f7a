//! Flash responses: a one-shot message, its category, and where a page
//! would go next.

use axum::http::header::SET_COOKIE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::extract::SESSION_COOKIE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Success,
    Danger,
    Warning,
    Info,
}

/// A successful handler response.
#[derive(Debug)]
pub struct Flash {
    message: String,
    category: FlashCategory,
    redirect: Option<String>,
    data: Option<serde_json::Value>,
    status: StatusCode,
    cookie: Option<String>,
}

#[derive(Serialize)]
struct FlashBody<'a> {
    message: &'a str,
    category: FlashCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a serde_json::Value>,
}

impl Flash {
    pub fn new(category: FlashCategory, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            category,
            redirect: None,
            data: None,
            status: StatusCode::OK,
            cookie: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(FlashCategory::Success, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(FlashCategory::Danger, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(FlashCategory::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(FlashCategory::Info, message)
    }

    pub fn redirect(mut self, to: impl Into<String>) -> Self {
        self.redirect = Some(to.into());
        self
    }

    pub fn with_data(mut self, data: impl Serialize) -> Self {
        self.data = serde_json::to_value(data).ok();
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Set the session cookie for a new login.
    pub fn login_cookie(mut self, session_id: &str, max_age_secs: u64) -> Self {
        self.cookie = Some(format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE, session_id, max_age_secs
        ));
        self
    }

    /// Expire the session cookie.
    pub fn clear_cookie(mut self) -> Self {
        self.cookie = Some(format!(
            "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
            SESSION_COOKIE
        ));
        self
    }
}

impl IntoResponse for Flash {
    fn into_response(self) -> Response {
        let body = FlashBody {
            message: &self.message,
            category: self.category,
            redirect: self.redirect.as_deref(),
            data: self.data.as_ref(),
        };
        let mut response = (self.status, Json(body)).into_response();
        if let Some(cookie) = self.cookie.and_then(|c| HeaderValue::from_str(&c).ok()) {
            response.headers_mut().insert(SET_COOKIE, cookie);
        }
        response
    }
}
