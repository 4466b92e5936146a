//! Shared utilities for integration testing.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router as AxumRouter;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceExt;

use pengoe::app::build_router;
use pengoe::config::AppConfig;
use pengoe::services::MemoryDatabase;
use pengoe::{HttpServer, TokenStore};

pub const FORM: &str = "application/x-www-form-urlencoded";

/// Application wired as in the binary, with handles on its shared state.
pub struct TestApp {
    pub app: AxumRouter,
    pub store: Arc<TokenStore>,
    pub database: MemoryDatabase,
    pub static_dir: tempfile::TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_csrf_ttl(Duration::from_secs(600))
    }

    pub fn with_csrf_ttl(ttl: Duration) -> Self {
        let static_dir = tempfile::tempdir().unwrap();
        std::fs::write(static_dir.path().join("site.css"), "body { margin: 0 }").unwrap();

        let mut config = AppConfig::default();
        config.static_files.root = static_dir.path().to_path_buf();

        let database = MemoryDatabase::new();
        let store = Arc::new(TokenStore::new(ttl));
        let router = build_router(&config, Arc::new(database.clone()), store.clone());

        Self {
            app: HttpServer::new(router).app(),
            store,
            database,
            static_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        self.send(request(Method::GET, uri, cookie, None)).await
    }

    pub async fn form(&self, method: Method, uri: &str, cookie: Option<&str>, body: &str) -> Response {
        self.send(request(method, uri, cookie, Some(body))).await
    }

    /// Sign `user_id` in; returns the `Cookie` header value and the CSRF token.
    pub async fn sign_in(&self, user_id: i64) -> (String, String) {
        let response = self
            .form(Method::POST, "/signin", None, &format!("user_id={}", user_id))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/dashboard");

        let set_cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        let cookie = set_cookie.split(';').next().unwrap().to_string();

        let dashboard = json_body(self.get("/dashboard", Some(&cookie)).await).await;
        let csrf = dashboard["csrf"].as_str().unwrap().to_string();
        (cookie, csrf)
    }
}

pub fn request(method: Method, uri: &str, cookie: Option<&str>, form: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    match form {
        Some(form) => builder
            .header(CONTENT_TYPE, FORM)
            .body(Body::from(form.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn json_body(response: Response) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

/// Serve `app` on an ephemeral port.
pub async fn spawn_server(app: TestApp) -> (SocketAddr, TestApp) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let service = app.app.clone();
    tokio::spawn(async move {
        axum::serve(listener, service).await.unwrap();
    });
    (addr, app)
}
