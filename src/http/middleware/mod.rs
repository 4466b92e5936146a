//! Standard middlewares.
//!
//! | Middleware  | Needs in context | Writes to context | Fails with            |
//! |-------------|------------------|-------------------|-----------------------|
//! | `db`        | -                | db                | 500                   |
//! | `token`     | -                | token             | 303 to sign-in / 401  |
//! | `session`   | token, db        | session           | 500                   |
//! | `auth_page` | -                | redirect          | 303 away / 400        |
//!
//! Declare them in that order: `token, db, session`.

pub mod auth;
pub mod db;
pub mod session;

pub use auth::{auth_page, token, AuthPage, TokenAuth};
pub use db::{db, DbMiddleware};
pub use session::{session, SessionMiddleware};
