//! Route handlers and middleware composition.
//!
//! # Responsibilities
//! - Define the per-request value handed down a middleware chain
//! - Define the handler and middleware traits the route table stores
//! - Compose a terminal handler with its ordered middleware list
//!
//! # Design Decisions
//! - A middleware is a `Handler -> Handler` transformer
//! - The first declared middleware is the outermost wrapper and runs first
//! - A failed handler still owns its response: `Rejection` carries the
//!   response to send together with the error to log

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, Uri};
use axum::response::Response;
use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::error::Error;
use crate::http::context::Context;
use crate::http::request::query_param;
use crate::http::response;
use crate::routing::matcher::PathVars;

/// Upper bound on form bodies read by [`RouteRequest::form`].
pub const MAX_FORM_BYTES: usize = 64 * 1024;

/// Outcome of a handler or middleware.
pub type HandlerResult = Result<Response, Rejection>;

/// A matched request travelling down a middleware chain.
pub struct RouteRequest {
    request: Request<Body>,
    vars: PathVars,
    /// Values injected by middlewares for the handlers behind them.
    pub ctx: Context,
}

impl RouteRequest {
    pub fn new(request: Request<Body>, vars: PathVars) -> Self {
        Self {
            request,
            vars,
            ctx: Context::default(),
        }
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn uri(&self) -> &Uri {
        self.request.uri()
    }

    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    /// Value bound to a `:name` segment of the matched pattern.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn vars(&self) -> &PathVars {
        &self.vars
    }

    /// First value of a query string parameter.
    pub fn query(&self, name: &str) -> Option<String> {
        query_param(self.request.uri(), name)
    }

    /// Read the body as `application/x-www-form-urlencoded`.
    ///
    /// The body is consumed; a second call sees an empty form.
    pub async fn form(&mut self) -> Result<HashMap<String, String>, Error> {
        let body = std::mem::take(self.request.body_mut());
        let bytes = axum::body::to_bytes(body, MAX_FORM_BYTES)
            .await
            .map_err(|e| Error::BadRequest(e.to_string()))?;

        Ok(url::form_urlencoded::parse(&bytes).into_owned().collect())
    }
}

/// A response that has already been decided on, plus the reason for it.
///
/// The dispatcher sends `response` unchanged and logs `error`.
pub struct Rejection {
    response: Response,
    error: Error,
}

impl Rejection {
    pub fn new(response: Response, error: impl Into<Error>) -> Self {
        Self {
            response,
            error: error.into(),
        }
    }

    pub fn bad_request(error: impl Into<Error>) -> Self {
        Self::new(response::bad_request(), error)
    }

    pub fn unauthorized(error: impl Into<Error>) -> Self {
        Self::new(response::unauthorized(), error)
    }

    pub fn not_found(error: impl Into<Error>) -> Self {
        Self::new(response::not_found(), error)
    }

    pub fn internal(error: impl Into<Error>) -> Self {
        Self::new(response::internal_error(), error)
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn error(&self) -> &Error {
        &self.error
    }

    pub fn into_parts(self) -> (Response, Error) {
        (self.response, self.error)
    }
}

impl fmt::Debug for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejection")
            .field("status", &self.response.status())
            .field("error", &self.error)
            .finish()
    }
}

/// Terminal request handler.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, request: RouteRequest) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, request: RouteRequest) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self(request))
    }
}

pub type BoxHandler = Arc<dyn Handler>;

/// Wraps a handler, producing a new handler.
pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: BoxHandler) -> BoxHandler;
}

impl<F> Middleware for F
where
    F: Fn(BoxHandler) -> BoxHandler + Send + Sync + 'static,
{
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        self(next)
    }
}

pub type BoxMiddleware = Arc<dyn Middleware>;

/// Box a handler for storage in the route table.
pub fn boxed<H: Handler>(handler: H) -> BoxHandler {
    Arc::new(handler)
}

/// Bind shared state to a handler function.
pub fn with_state<S, F, Fut>(state: Arc<S>, f: F) -> impl Handler
where
    S: Send + Sync + 'static,
    F: Fn(Arc<S>, RouteRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    move |request: RouteRequest| f(state.clone(), request)
}

/// Apply `middlewares` to `handler` so that `middlewares[0]` runs first.
pub fn compose(handler: BoxHandler, middlewares: &[BoxMiddleware]) -> BoxHandler {
    middlewares
        .iter()
        .rev()
        .fold(handler, |next, middleware| middleware.wrap(next))
}
