//! pengoe web application core.
//!
//! Request routing with middleware composition, plus the session-linked
//! CSRF token store the authentication middlewares depend on.

pub mod app;
pub mod config;
pub mod csrf;
pub mod error;
pub mod handlers;
pub mod http;
pub mod observability;
pub mod routing;
pub mod services;

pub use config::AppConfig;
pub use csrf::TokenStore;
pub use error::Error;
pub use http::HttpServer;
pub use routing::Router;
