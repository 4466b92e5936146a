//! Crate-wide error type.

use axum::http::Method;
use thiserror::Error;

use crate::csrf::TokenError;
use crate::http::context::ContextKey;
use crate::http::request::CookieError;
use crate::services::ServiceError;

/// Errors produced while routing and serving a request.
#[derive(Debug, Error)]
pub enum Error {
    /// No registered pattern fits the path.
    #[error("no route matches {method} {path}")]
    NotMatched { method: Method, path: String },

    /// A pattern fits the path but not with this method.
    #[error("route {path} does not accept {method}")]
    MethodMismatch { method: Method, path: String },

    /// A middleware ran before the one that populates its input.
    #[error("middleware precondition failed: `{0}` missing from request context")]
    MissingContext(ContextKey),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Cookie(#[from] CookieError),

    #[error("redirect target `{0}` is not a local path")]
    InvalidRedirect(String),

    #[error("missing form field `{0}`")]
    MissingField(&'static str),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl Error {
    /// True for lock contention in the token store.
    pub fn is_contention(&self) -> bool {
        matches!(self, Error::Token(TokenError::Contention))
    }
}
