//! Route storage and resolution.
//!
//! # Responsibilities
//! - Hold registered routes in insertion order
//! - Reject duplicate (method, pattern) registrations
//! - Resolve a method and path to one route, or an explicit failure
//!
//! # Design Decisions
//! - Immutable after startup (shared across tasks without locks)
//! - Candidates are filtered by segment count before any comparison
//! - Narrowing runs left to right: a literal hit at a position drops every
//!   variable candidate at that position
//! - Method is considered only after narrowing; the earliest registered
//!   survivor with the method wins

use axum::http::Method;
use std::fmt;

use crate::http::handler::{compose, BoxHandler, BoxMiddleware};
use crate::routing::matcher::{tokenize, PathVars, Pattern};

/// A registered route with its middleware chain already composed.
pub struct Route {
    method: Method,
    pattern: Pattern,
    middlewares: Vec<BoxMiddleware>,
    endpoint: BoxHandler,
}

impl Route {
    pub fn new(
        method: Method,
        pattern: Pattern,
        handler: BoxHandler,
        middlewares: Vec<BoxMiddleware>,
    ) -> Self {
        let endpoint = compose(handler, &middlewares);
        Self {
            method,
            pattern,
            middlewares,
            endpoint,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// The handler wrapped by all of its middlewares.
    pub fn endpoint(&self) -> &BoxHandler {
        &self.endpoint
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.to_string())
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.pattern)
    }
}

/// Result of a route lookup.
#[derive(Debug)]
pub enum Resolution<'a> {
    Found { route: &'a Route, vars: PathVars },
    /// A pattern matched but not with the method, and the method is GET.
    MethodNotAllowed,
    NotFound,
}

/// Insertion-ordered route collection.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route. Returns false, leaving the table unchanged, when a route
    /// with the same method and pattern already exists.
    pub fn insert(&mut self, route: Route) -> bool {
        let exists = self
            .routes
            .iter()
            .any(|r| r.method == route.method && r.pattern == route.pattern);

        if exists {
            tracing::warn!(route = %route, "Duplicate route ignored");
            return false;
        }

        self.routes.push(route);
        true
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routes whose pattern fits `path`, ignoring method, in registration order.
    pub fn candidates(&self, path: &[&str]) -> Vec<&Route> {
        narrow(same_length(&self.routes, path.len()), path)
    }

    /// Resolve a request to a route.
    pub fn resolve(&self, method: &Method, path: &str) -> Resolution<'_> {
        let tokens = tokenize(path);
        let candidates = self.candidates(&tokens);

        if candidates.is_empty() {
            return Resolution::NotFound;
        }

        match candidates.into_iter().find(|r| r.method == *method) {
            Some(route) => Resolution::Found {
                route,
                vars: route.pattern.bindings(&tokens),
            },
            None if *method == Method::GET => Resolution::MethodNotAllowed,
            None => Resolution::NotFound,
        }
    }
}

fn same_length(routes: &[Route], len: usize) -> Vec<&Route> {
    routes.iter().filter(|r| r.pattern.len() == len).collect()
}

fn narrow<'a>(mut candidates: Vec<&'a Route>, path: &[&str]) -> Vec<&'a Route> {
    for (i, segment) in path.iter().enumerate() {
        let literal: Vec<&Route> = candidates
            .iter()
            .copied()
            .filter(|r| r.pattern.segments()[i].is_literal_match(segment))
            .collect();

        candidates = if literal.is_empty() {
            candidates
                .into_iter()
                .filter(|r| r.pattern.segments()[i].is_variable())
                .collect()
        } else {
            literal
        };

        if candidates.is_empty() {
            break;
        }
    }
    candidates
}
