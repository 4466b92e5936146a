//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span)
//!     → routing::Router::dispatch (static files, route lookup)
//!     → handler.rs (middleware chain → handler)
//!         ↳ middleware/ writes db, token, session, redirect into context.rs
//!     → response.rs (fixed failure responses, cookies)
//!     → Send to client
//! ```

pub mod context;
pub mod handler;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use context::{Context, ContextKey, RedirectTarget};
pub use handler::{
    boxed, compose, with_state, BoxHandler, BoxMiddleware, Handler, HandlerResult, Middleware,
    Rejection, RouteRequest,
};
pub use request::{RequestIdMaker, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
