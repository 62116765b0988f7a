//! Shared harness for router-level tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt; // oneshot

use vitae_core::AppConfig;
use vitae_server::mail::LogMailer;
use vitae_server::{build_router, AppState};
use vitae_store::SqliteStore;

pub const PASSWORD: &str = "just_a_test_password";

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub mailer: Arc<LogMailer>,
    _tmp: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let config = AppConfig::testing(tmp.path().join("vitae.db"));
        let store = SqliteStore::open(&config.database_path).unwrap();
        let mailer = Arc::new(LogMailer::new(config.mail.clone()));
        let state = Arc::new(AppState::new(config, store, mailer.clone()));
        Self {
            router: build_router(state.clone()),
            state,
            mailer,
            _tmp: tmp,
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let req = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let set_cookie = resp
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse {
            status,
            set_cookie,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::DELETE, uri, token, None).await
    }

    /// Register an account and return its session token.
    pub async fn register(&self, email: &str) -> String {
        let resp = self
            .post(
                "/api/register",
                None,
                serde_json::json!({ "email": email, "password": PASSWORD, "confirm": PASSWORD }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.body);
        resp.body["data"]["token"].as_str().unwrap().to_string()
    }

    /// Confirmation token from the most recent mail to `email`.
    pub fn mailed_token(&self, email: &str) -> String {
        let mail = self
            .mailer
            .sent()
            .into_iter()
            .rev()
            .find(|m| m.to == email)
            .expect("no mail sent");
        let start = mail.html.find("/api/confirm/").unwrap() + "/api/confirm/".len();
        let rest = &mail.html[start..];
        let end = rest.find('"').unwrap();
        rest[..end].to_string()
    }

    /// Register and confirm an account, returning its session token.
    pub async fn confirmed_user(&self, email: &str) -> String {
        let token = self.register(email).await;
        let confirm = self.mailed_token(email);
        let resp = self.get(&format!("/api/confirm/{}", confirm), Some(&token)).await;
        assert_eq!(resp.status, StatusCode::OK, "{}", resp.body);
        token
    }
}
