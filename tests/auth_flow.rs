//! Sign-in, CSRF-protected posts and sign-out through the application routes.

use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::{Method, StatusCode};
use chrono::{Duration as ChronoDuration, Utc};
use std::time::Duration;

use pengoe::csrf::check::{CSRF_HEADER, HX_RETARGET, HX_TRIGGER};
use pengoe::services::{Session, SessionId, SessionService};
use pengoe::TokenStore;

mod common;

use common::{json_body, TestApp};

#[tokio::test]
async fn test_protected_get_redirects_to_signin() {
    let app = TestApp::new();

    let response = app.get("/account/42", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/signin?redirect=%2Faccount%2F42");
}

#[tokio::test]
async fn test_protected_post_without_session_is_unauthorized() {
    let app = TestApp::new();

    let response = app.form(Method::POST, "/event", None, "csrf=x&name=a").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .form(Method::DELETE, "/event/evt-1", Some("session=999"), "csrf=x")
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sign_in_sets_cookie_and_honours_redirect() {
    let app = TestApp::new();

    let response = app
        .form(Method::POST, "/signin?redirect=%2Faccount%2Fnew", None, "user_id=3")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/account/new");
    let cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));

    assert_eq!(app.database.len(), 1);
    assert_eq!(app.store.len().unwrap(), 1);
}

#[tokio::test]
async fn test_sign_in_form_validation() {
    let app = TestApp::new();

    let response = app.form(Method::POST, "/signin", None, "").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.form(Method::POST, "/signin", None, "user_id=abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .form(Method::POST, "/signin?redirect=https%3A%2F%2Fevil.example", None, "user_id=1")
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    for target in ["%2F%5Cevil.example", "%2F%09%2Fevil.example", "%2Fa%0Ab"] {
        let response = app
            .form(Method::POST, &format!("/signin?redirect={}", target), None, "user_id=1")
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "redirect={}", target);
    }

    assert!(app.database.is_empty());
    assert!(app.store.is_empty().unwrap());
}

#[tokio::test]
async fn test_signin_page_redirects_signed_in_user() {
    let app = TestApp::new();
    let (cookie, _) = app.sign_in(1).await;

    let response = app.get("/signin?redirect=%2Faccount%2F9", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/account/9");

    let page = json_body(app.get("/signup?redirect=%2Faccount%2F9", None).await).await;
    assert_eq!(page["redirect"], "%2Faccount%2F9");
}

#[tokio::test]
async fn test_dashboard_and_account_pages() {
    let app = TestApp::new();
    let (cookie, csrf) = app.sign_in(12).await;

    let dashboard = json_body(app.get("/dashboard", Some(&cookie)).await).await;
    assert_eq!(dashboard["user_id"], 12);
    assert_eq!(dashboard["csrf"], csrf.as_str());

    let account = json_body(app.get("/account/42", Some(&cookie)).await).await;
    assert_eq!(account["account_id"], "42");

    let new_page = json_body(app.get("/account/new", Some(&cookie)).await).await;
    assert_eq!(new_page["page"], "new-account");
}

#[tokio::test]
async fn test_csrf_protected_posts() {
    let app = TestApp::new();
    let (cookie, csrf) = app.sign_in(5).await;

    let response = app
        .form(
            Method::POST,
            "/event",
            Some(&cookie),
            &format!("csrf={}&account_id=acc-1&name=Rent", urlencode(&csrf)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(json_body(response).await["event"]["name"], "Rent");

    let response = app
        .form(Method::POST, "/event", Some(&cookie), "csrf=forged&account_id=acc-1&name=Rent")
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .form(Method::POST, "/event", Some(&cookie), "account_id=acc-1&name=Rent")
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .form(
            Method::PATCH,
            "/event/evt-9",
            Some(&cookie),
            &format!("csrf={}&name=Salary", urlencode(&csrf)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["event"]["id"], "evt-9");

    let response = app
        .form(
            Method::DELETE,
            "/account/acc-1",
            Some(&cookie),
            &format!("csrf={}", urlencode(&csrf)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_expired_csrf_token_is_renewed_not_rejected() {
    let app = TestApp::with_csrf_ttl(Duration::from_millis(300));
    let (cookie, csrf) = app.sign_in(5).await;
    tokio::time::sleep(Duration::from_millis(400)).await;

    let body = format!("csrf={}&account_id=acc-1&name=Rent", urlencode(&csrf));
    let response = app.form(Method::POST, "/event", Some(&cookie), &body).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[HX_RETARGET], "#csrf");
    assert_eq!(response.headers()[HX_TRIGGER], "csrf-renewed");
    let renewed = response.headers()[CSRF_HEADER].to_str().unwrap().to_string();
    assert_ne!(renewed, csrf);

    // The stale value is now a mismatch.
    let response = app.form(Method::POST, "/event", Some(&cookie), &body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = format!("csrf={}&account_id=acc-1&name=Rent", urlencode(&renewed));
    let response = app.form(Method::POST, "/event", Some(&cookie), &body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_sign_out_drops_session_and_token() {
    let app = TestApp::new();
    let (cookie, _) = app.sign_in(8).await;
    let session_id: SessionId = cookie.trim_start_matches("session=").parse().unwrap();

    let response = app.form(Method::POST, "/signout", Some(&cookie), "").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["hx-redirect"], "/signin");
    assert!(response.headers()[SET_COOKIE]
        .to_str()
        .unwrap()
        .contains("Max-Age=0"));

    assert!(app.store.get(session_id).is_err());
    assert!(app.database.get_by_id(session_id).await.is_err());

    let response = app.get("/dashboard", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_database_outage_is_internal_error() {
    let app = TestApp::new();
    let (cookie, _) = app.sign_in(2).await;
    app.database.set_available(false);

    let response = app.get("/dashboard", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = app.get("/ui/check?user_id=2", None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_ui_check_reports_live_sessions() {
    let app = TestApp::new();
    app.sign_in(4).await;

    let body = json_body(app.get("/ui/check?user_id=4", None).await).await;
    assert_eq!(body["signed_in"], true);
    let body = json_body(app.get("/ui/check?user_id=5", None).await).await;
    assert_eq!(body["signed_in"], false);

    let response = app.get("/ui/check", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_restart_reseeds_tokens_for_active_sessions() {
    let app = TestApp::new();
    let (cookie, old_csrf) = app.sign_in(6).await;
    let session_id: SessionId = cookie.trim_start_matches("session=").parse().unwrap();
    let now = Utc::now();
    app.database
        .insert(Session {
            id: SessionId(500),
            user_id: 7,
            valid_until: now - ChronoDuration::minutes(5),
            created_at: now - ChronoDuration::days(8),
        })
        .unwrap();

    let restarted = TokenStore::default();
    assert_eq!(restarted.seed(&app.database).await.unwrap(), 1);
    let record = restarted.get(session_id).unwrap();
    assert_ne!(record.value, old_csrf);
    assert!(restarted.get(SessionId(500)).is_err());
}

fn urlencode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
