//! Route registration and request dispatch.
//!
//! # Responsibilities
//! - Expose the `get`/`post`/`put`/`patch`/`delete` registration surface
//! - Serve the static asset prefix straight from disk
//! - Normalize the path, resolve a route and run its middleware chain
//! - Log handler errors in one place
//!
//! # Design Decisions
//! - Registration happens before serving; dispatch only reads
//! - Routing misses become fixed responses, never errors
//! - A handler error never changes the response the handler produced

use axum::body::Body;
use axum::http::header::{HeaderValue, CACHE_CONTROL};
use axum::http::{Method, Request, Uri};
use axum::response::Response;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::error::Error;
use crate::http::handler::{boxed, BoxMiddleware, Handler, RouteRequest};
use crate::http::request::request_id;
use crate::http::response;
use crate::observability::metrics;
use crate::routing::matcher::{remove_trailing_slash, Pattern};
use crate::routing::table::{Resolution, Route, RouteTable};

/// Cache policy applied to every static asset response.
pub const STATIC_CACHE_CONTROL: &str = "no-cache, no-store, must-revalidate";

/// Static asset passthrough: requests under `prefix` are served from `root`.
#[derive(Debug, Clone)]
struct StaticFiles {
    prefix: String,
    root: PathBuf,
    service: ServeDir,
}

/// The application router.
#[derive(Debug, Default)]
pub struct Router {
    table: RouteTable,
    static_files: Option<StaticFiles>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve files under `root` for any path starting with `prefix`.
    pub fn set_static_path(&mut self, prefix: impl Into<String>, root: impl AsRef<Path>) -> &mut Self {
        let root = root.as_ref().to_path_buf();
        self.static_files = Some(StaticFiles {
            prefix: prefix.into(),
            service: ServeDir::new(&root),
            root,
        });
        self
    }

    pub fn get(&mut self, pattern: &str, handler: impl Handler, middlewares: Vec<BoxMiddleware>) -> &mut Self {
        self.add_route(Method::GET, pattern, handler, middlewares)
    }

    pub fn post(&mut self, pattern: &str, handler: impl Handler, middlewares: Vec<BoxMiddleware>) -> &mut Self {
        self.add_route(Method::POST, pattern, handler, middlewares)
    }

    pub fn put(&mut self, pattern: &str, handler: impl Handler, middlewares: Vec<BoxMiddleware>) -> &mut Self {
        self.add_route(Method::PUT, pattern, handler, middlewares)
    }

    pub fn patch(&mut self, pattern: &str, handler: impl Handler, middlewares: Vec<BoxMiddleware>) -> &mut Self {
        self.add_route(Method::PATCH, pattern, handler, middlewares)
    }

    pub fn delete(&mut self, pattern: &str, handler: impl Handler, middlewares: Vec<BoxMiddleware>) -> &mut Self {
        self.add_route(Method::DELETE, pattern, handler, middlewares)
    }

    /// Register a route. A second registration of the same method and
    /// pattern is ignored.
    pub fn add_route(
        &mut self,
        method: Method,
        pattern: &str,
        handler: impl Handler,
        middlewares: Vec<BoxMiddleware>,
    ) -> &mut Self {
        let route = Route::new(method, Pattern::parse(pattern), boxed(handler), middlewares);
        self.table.insert(route);
        self
    }

    pub fn routes(&self) -> &[Route] {
        self.table.routes()
    }

    /// `METHOD /pattern` lines in registration order.
    pub fn describe(&self) -> Vec<String> {
        self.table
            .routes()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Serve one request.
    pub async fn dispatch(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let request_id = request_id(request.headers()).to_string();

        if let Some(files) = &self.static_files {
            if path.starts_with(&files.prefix) {
                let response = serve_static(files, request).await;
                metrics::record_request(method.as_str(), response.status().as_u16(), &files.prefix, start);
                return response;
            }
        }

        let normalized = remove_trailing_slash(&path);
        let (route, vars) = match self.table.resolve(&method, normalized) {
            Resolution::Found { route, vars } => (route, vars),
            Resolution::MethodNotAllowed => {
                let error = Error::MethodMismatch {
                    method: method.clone(),
                    path: path.clone(),
                };
                tracing::warn!(request_id = %request_id, error = %error, "Method not allowed");
                metrics::record_request(method.as_str(), 405, "none", start);
                return response::method_not_allowed();
            }
            Resolution::NotFound => {
                let error = Error::NotMatched {
                    method: method.clone(),
                    path: path.clone(),
                };
                tracing::warn!(request_id = %request_id, error = %error, "No route matched");
                metrics::record_request(method.as_str(), 404, "none", start);
                return response::not_found();
            }
        };

        let route_label = route.pattern().to_string();
        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            route = %route_label,
            "Dispatching request"
        );

        let response = match route.endpoint().call(RouteRequest::new(request, vars)).await {
            Ok(response) => response,
            Err(rejection) => {
                let (response, error) = rejection.into_parts();
                tracing::error!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    route = %route_label,
                    status = response.status().as_u16(),
                    error = %error,
                    "Handler failed"
                );
                response
            }
        };

        metrics::record_request(method.as_str(), response.status().as_u16(), &route_label, start);
        response
    }
}

async fn serve_static(files: &StaticFiles, mut request: Request<Body>) -> Response {
    let Some(uri) = strip_prefix(request.uri(), &files.prefix) else {
        return response::not_found();
    };
    *request.uri_mut() = uri;

    let mut response = match files.service.clone().oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    };
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static(STATIC_CACHE_CONTROL));
    response
}

fn strip_prefix(uri: &Uri, prefix: &str) -> Option<Uri> {
    let rest = uri.path().strip_prefix(prefix)?;
    let mut path_and_query = if rest.starts_with('/') {
        rest.to_string()
    } else {
        format!("/{}", rest)
    };
    if let Some(query) = uri.query() {
        path_and_query.push('?');
        path_and_query.push_str(query);
    }
    path_and_query.parse().ok()
}
