//! Session-linked CSRF tokens.
//!
//! # Data Flow
//! ```text
//! sign-in
//!     → TokenStore::create(session_id)
//! token middleware
//!     → session cookie → TokenStore::get → TokenRecord in request context
//! form post handler
//!     → check_form_token → verify_or_renew
//!         ├─ fresh    → proceed
//!         ├─ expired  → renewal response, client resubmits
//!         └─ mismatch → 401
//! sign-out
//!     → TokenStore::delete(session_id)
//! ```

pub mod check;
pub mod store;

pub use check::{check_form_token, CsrfCheck, CSRF_FIELD};
pub use store::{generate_token, TokenError, TokenRecord, TokenStore, DEFAULT_TOKEN_TTL};
