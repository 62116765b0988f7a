//! Registration, login, confirmation and account routes exercised through
//! the full router.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use common::{TestApp, PASSWORD};

#[tokio::test]
async fn test_home_and_status() {
    let app = TestApp::new();

    let resp = app.get("/", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["service"], "vitae");
    assert!(resp.body["user"].is_null());

    let resp = app.get("/api/status", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["status"], "ok");
    assert_eq!(resp.body["profile"], "testing");
    assert_eq!(resp.body["store"]["users"], 0);
}

#[tokio::test]
async fn test_register_logs_in_and_sends_mail() {
    let app = TestApp::new();
    let resp = app
        .post(
            "/api/register",
            None,
            json!({ "email": "Ada@Example.com", "password": PASSWORD, "confirm": PASSWORD }),
        )
        .await;

    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(
        resp.body["message"],
        "You registered and are now logged in. Welcome!"
    );
    assert_eq!(resp.body["category"], "success");
    assert_eq!(resp.body["redirect"], "/api/unconfirmed");
    assert_eq!(resp.body["data"]["email"], "ada@example.com");
    assert!(resp.set_cookie.unwrap().starts_with("vitae_session="));

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ada@example.com");
    assert_eq!(sent[0].subject, "Please confirm your email");
    assert!(sent[0].html.contains("http://localhost:5000/api/confirm/"));

    let token = resp.body["data"]["token"].as_str().unwrap();
    let home = app.get("/", Some(token)).await;
    assert_eq!(home.body["user"]["email"], "ada@example.com");
    assert_eq!(home.body["user"]["confirmed"], false);
    assert!(home.body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() {
    let app = TestApp::new();
    app.register("dup@example.com").await;

    let resp = app
        .post(
            "/api/register",
            None,
            json!({ "email": "DUP@example.com", "password": PASSWORD, "confirm": PASSWORD }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp.body["fields"]["email"][0], "Email already registered");
}

#[tokio::test]
async fn test_register_validation_errors() {
    let app = TestApp::new();
    let resp = app
        .post(
            "/api/register",
            None,
            json!({ "email": "not-an-email", "password": "short", "confirm": "other" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp.body["category"], "danger");
    assert_eq!(resp.body["fields"]["email"][0], "Invalid email address.");
    assert_eq!(
        resp.body["fields"]["password"][0],
        "Field must be between 6 and 25 characters long."
    );
    assert_eq!(resp.body["fields"]["confirm"][0], "Passwords must match.");
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new();
    let req = Request::builder()
        .method("POST")
        .uri("/api/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login() {
    let app = TestApp::new();
    app.register("bob@example.com").await;

    let resp = app
        .post(
            "/api/login",
            None,
            json!({ "email": "bob@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["message"], "Welcome.");
    assert_eq!(resp.body["redirect"], "/");
    assert!(resp.body["data"]["token"].is_string());

    let resp = app
        .post(
            "/api/login",
            None,
            json!({ "email": "bob@example.com", "password": "wrong_password" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["error"], "Invalid email and/or password.");
    assert_eq!(resp.body["category"], "danger");

    let resp = app
        .post(
            "/api/login",
            None,
            json!({ "email": "nobody@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["error"], "Invalid email and/or password.");
}

#[tokio::test]
async fn test_login_required() {
    let app = TestApp::new();
    for uri in ["/api/logout", "/api/dashboard", "/api/unconfirmed", "/api/resend"] {
        let resp = app.get(uri, None).await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(resp.body["error"], "Please log in to access this page.");
        assert_eq!(resp.body["redirect"], "/api/login");
    }

    let resp = app.get("/api/dashboard", Some("bogus-session")).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_cookie_authenticates() {
    let app = TestApp::new();
    let token = app.register("cookie@example.com").await;

    let req = Request::builder()
        .uri("/api/dashboard")
        .header(header::COOKIE, format!("vitae_session={}", token))
        .body(Body::empty())
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unconfirmed_user_is_redirected() {
    let app = TestApp::new();
    let token = app.register("carol@example.com").await;

    for uri in ["/api/profile", "/api/personal", "/api/employment"] {
        let resp = app.get(uri, Some(&token)).await;
        assert_eq!(resp.status, StatusCode::FORBIDDEN, "{}", uri);
        assert_eq!(resp.body["error"], "Please confirm your account!");
        assert_eq!(resp.body["category"], "warning");
        assert_eq!(resp.body["redirect"], "/api/unconfirmed");
    }

    let resp = app.get("/api/unconfirmed", Some(&token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["message"], "Please confirm your account!");
    assert_eq!(resp.body["category"], "warning");
}

#[tokio::test]
async fn test_confirm_account() {
    let app = TestApp::new();
    let token = app.register("dave@example.com").await;
    let confirm = app.mailed_token("dave@example.com");

    let resp = app.get(&format!("/api/confirm/{}", confirm), Some(&token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["message"], "You have confirmed your account. Thanks!");
    assert_eq!(resp.body["redirect"], "/");

    let resp = app.get(&format!("/api/confirm/{}", confirm), Some(&token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["message"], "Account already confirmed. Please login.");

    let resp = app.get("/api/unconfirmed", Some(&token)).await;
    assert_eq!(resp.body["redirect"], "/");

    let resp = app.get("/api/profile", Some(&token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["user"]["confirmed"], true);
    assert!(resp.body["user"]["confirmed_on"].is_string());
}

#[tokio::test]
async fn test_confirm_rejects_bad_token() {
    let app = TestApp::new();
    let token = app.register("erin@example.com").await;

    let resp = app.get("/api/confirm/not-a-token", Some(&token)).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.body["error"],
        "The confirmation link is invalid or has expired."
    );

    let user = app
        .state
        .store
        .find_user_by_email("erin@example.com")
        .unwrap()
        .unwrap();
    assert!(!user.confirmed);
}

#[tokio::test]
async fn test_confirm_unknown_email() {
    let app = TestApp::new();
    let token = app.register("frank@example.com").await;
    let stray = app
        .state
        .tokens
        .generate_confirmation_token("ghost@example.com")
        .unwrap();

    let resp = app.get(&format!("/api/confirm/{}", stray), Some(&token)).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_confirm_requires_login() {
    let app = TestApp::new();
    app.register("gina@example.com").await;
    let confirm = app.mailed_token("gina@example.com");

    let resp = app.get(&format!("/api/confirm/{}", confirm), None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_resend_confirmation() {
    let app = TestApp::new();
    let token = app.register("hank@example.com").await;

    let resp = app.get("/api/resend", Some(&token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["message"], "A new confirmation email has been sent.");
    assert_eq!(resp.body["redirect"], "/api/unconfirmed");
    assert_eq!(app.mailer.sent().len(), 2);

    let confirm = app.mailed_token("hank@example.com");
    let resp = app.get(&format!("/api/confirm/{}", confirm), Some(&token)).await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = TestApp::new();
    let token = app.register("ivy@example.com").await;

    let resp = app.get("/api/logout", Some(&token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["message"], "You were logged out.");
    assert_eq!(resp.body["redirect"], "/api/login");
    assert!(resp.set_cookie.unwrap().contains("Max-Age=0"));

    let resp = app.get("/api/dashboard", Some(&token)).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::new();
    let token = app.confirmed_user("jack@example.com").await;

    let resp = app
        .post(
            "/api/profile",
            Some(&token),
            json!({ "password": "brand_new_pw", "confirm": "mismatch" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp.body["fields"]["confirm"][0], "Passwords must match.");

    let resp = app
        .post(
            "/api/profile",
            Some(&token),
            json!({ "password": "brand_new_pw", "confirm": "brand_new_pw" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["message"], "Password successfully changed.");
    assert_eq!(resp.body["redirect"], "/api/profile");

    let old = app
        .post(
            "/api/login",
            None,
            json!({ "email": "jack@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);

    let new = app
        .post(
            "/api/login",
            None,
            json!({ "email": "jack@example.com", "password": "brand_new_pw" }),
        )
        .await;
    assert_eq!(new.status, StatusCode::OK);
}

#[tokio::test]
async fn test_dashboard() {
    let app = TestApp::new();
    let token = app.confirmed_user("kim@example.com").await;

    app.put(
        "/api/personal",
        Some(&token),
        json!({ "firstname": "Kim", "surname": "Lee" }),
    )
    .await;
    app.post(
        "/api/employment",
        Some(&token),
        json!({ "human_id": "j1", "employer": "Acme", "position": "Dev" }),
    )
    .await;

    let resp = app.get("/api/dashboard", Some(&token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["email"], "kim@example.com");
    assert_eq!(resp.body["firstname"], "Kim");
    assert_eq!(resp.body["confirmed"], true);
    assert_eq!(resp.body["sections"]["employment"], 1);
    assert_eq!(resp.body["sections"]["patents"], 0);
}
