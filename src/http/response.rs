//! Standard failure responses and cookie headers.
//!
//! Each function builds a complete response with a fixed status code so
//! middlewares and handlers can hand it back inside a `Rejection`.

use axum::http::header::{HeaderValue, CONTENT_TYPE, SET_COOKIE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};

use crate::http::request::percent_encode;
use crate::services::SessionId;

const HTML: &str = "text/html; charset=utf-8";

fn page(status: StatusCode, message: &'static str) -> Response {
    (status, [(CONTENT_TYPE, HTML)], message).into_response()
}

pub fn not_found() -> Response {
    page(StatusCode::NOT_FOUND, "Page not found")
}

pub fn method_not_allowed() -> Response {
    page(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

pub fn internal_error() -> Response {
    page(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

pub fn unauthorized() -> Response {
    StatusCode::UNAUTHORIZED.into_response()
}

pub fn bad_request() -> Response {
    StatusCode::BAD_REQUEST.into_response()
}

/// 303 See Other to `location`.
pub fn redirect(location: &str) -> Response {
    Redirect::to(location).into_response()
}

/// 303 to the sign-in page, remembering where the user was going.
pub fn redirect_to_signin(signin_path: &str, original_path: &str) -> Response {
    tracing::debug!(path = %original_path, "Redirecting to sign-in");
    redirect(&format!(
        "{}?redirect={}",
        signin_path,
        percent_encode(original_path)
    ))
}

/// `Set-Cookie` value carrying the session ID.
pub fn session_cookie(name: &str, id: SessionId, secure: bool) -> HeaderValue {
    let secure = if secure { "; Secure" } else { "" };
    HeaderValue::from_str(&format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax{}",
        name, id, secure
    ))
    .unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// `Set-Cookie` value that clears the session cookie.
pub fn expired_session_cookie(name: &str) -> HeaderValue {
    HeaderValue::from_str(&format!(
        "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax",
        name
    ))
    .unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Attach a `Set-Cookie` header to `response`.
pub fn with_cookie(mut response: Response, cookie: HeaderValue) -> Response {
    response.headers_mut().append(SET_COOKIE, cookie);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;

    #[test]
    fn test_fixed_status_codes() {
        assert_eq!(not_found().status(), StatusCode::NOT_FOUND);
        assert_eq!(method_not_allowed().status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(unauthorized().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(bad_request().status(), StatusCode::BAD_REQUEST);
        assert_eq!(internal_error().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_redirect_to_signin_encodes_path() {
        let response = redirect_to_signin("/signin", "/account/42");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "/signin?redirect=%2Faccount%2F42"
        );
    }

    #[test]
    fn test_session_cookie_values() {
        assert_eq!(
            session_cookie("session", SessionId(7), false),
            "session=7; Path=/; HttpOnly; SameSite=Lax"
        );
        assert_eq!(
            session_cookie("session", SessionId(7), true),
            "session=7; Path=/; HttpOnly; SameSite=Lax; Secure"
        );
        assert!(expired_session_cookie("session")
            .to_str()
            .unwrap()
            .contains("Max-Age=0"));
    }
}
