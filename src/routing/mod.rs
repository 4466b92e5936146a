//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (static prefix? trailing slash removed)
//!     → table.rs (segment-count filter, left-to-right narrowing, method)
//!     → matcher.rs (segment comparison, variable bindings)
//!     → Return: Found { route, vars } | MethodNotAllowed | NotFound
//!
//! Registration (at startup):
//!     get/post/put/patch/delete(pattern, handler, middlewares)
//!     → parse pattern into segments
//!     → compose middleware chain around the handler
//!     → append to the table (duplicates ignored)
//! ```
//!
//! # Design Decisions
//! - Routes registered at startup, immutable at runtime
//! - No regex: segments are literals or single `:name` variables
//! - Deterministic: a literal beats a variable at the same position,
//!   otherwise the earliest registration wins

pub mod matcher;
pub mod router;
pub mod table;

pub use matcher::{remove_trailing_slash, PathVars, Pattern, Segment};
pub use router::Router;
pub use table::{Resolution, Route, RouteTable};
