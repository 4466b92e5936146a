//! Request inspection helpers.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4)
//! - Read the session cookie and query parameters
//! - Percent-encode values placed into query strings
//!
//! # Design Decisions
//! - Request ID is assigned by the outermost layer so every log line has it
//! - Cookie parsing is lenient about whitespace and quoting

use axum::http::header::{HeaderMap, HeaderValue, COOKIE};
use axum::http::{Request, Uri};
use thiserror::Error;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::services::SessionId;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a fresh UUID v4 for requests without an ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdMaker;

impl MakeRequestId for RequestIdMaker {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Request ID set by [`RequestIdMaker`], or `"unknown"` outside the server stack.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CookieError {
    #[error("cookie `{0}` not present")]
    Missing(String),

    #[error("cookie `{name}` has malformed value `{value}`")]
    Malformed { name: String, value: String },
}

/// Value of the first cookie named `name`.
pub fn cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
}

/// Session ID stored in the session cookie.
pub fn session_id_from_cookie(headers: &HeaderMap, name: &str) -> Result<SessionId, CookieError> {
    let raw = cookie(headers, name).ok_or_else(|| CookieError::Missing(name.to_string()))?;
    raw.parse().map_err(|_| CookieError::Malformed {
        name: name.to_string(),
        value: raw.to_string(),
    })
}

/// First value of query parameter `name`, decoded.
pub fn query_param(uri: &Uri, name: &str) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Encode a value for use inside a query string.
pub fn percent_encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
