//! Typed per-request context shared between middlewares and handlers.
//!
//! Each slot is written by exactly one standard middleware. Readers get an
//! [`Error::MissingContext`] when the writer did not run before them, which
//! the middlewares turn into an Internal Error response.

use std::fmt;

use crate::csrf::TokenRecord;
use crate::error::Error;
use crate::http::request::percent_encode;
use crate::services::{Db, Session};

/// Names of the context slots, used in precondition errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKey {
    Db,
    Token,
    Session,
    Redirect,
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContextKey::Db => "db",
            ContextKey::Token => "token",
            ContextKey::Session => "session",
            ContextKey::Redirect => "redirect",
        };
        f.write_str(name)
    }
}

/// A local redirect target accepted by the auth page middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    path: String,
}

impl RedirectTarget {
    /// Accept only local absolute paths.
    ///
    /// Browsers read `\` as `/` and strip tabs and newlines, so `//host`,
    /// `/\host` and `/<TAB>/host` all leave the site. Whitespace and control
    /// characters are rejected outright.
    pub fn parse(path: &str) -> Result<Self, Error> {
        let local = path.starts_with('/')
            && !matches!(path.as_bytes().get(1), Some(b'/' | b'\\'))
            && !path.chars().any(|c| c.is_control() || c.is_whitespace());
        if local {
            Ok(Self {
                path: path.to_string(),
            })
        } else {
            Err(Error::InvalidRedirect(path.to_string()))
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Percent-encoded form, for embedding in a query string or form field.
    pub fn encoded(&self) -> String {
        percent_encode(&self.path)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Context {
    db: Option<Db>,
    token: Option<TokenRecord>,
    session: Option<Session>,
    redirect: Option<RedirectTarget>,
}

impl Context {
    pub fn set_db(&mut self, db: Db) {
        self.db = Some(db);
    }

    pub fn set_token(&mut self, token: TokenRecord) {
        self.token = Some(token);
    }

    pub fn set_session(&mut self, session: Session) {
        self.session = Some(session);
    }

    pub fn set_redirect(&mut self, redirect: RedirectTarget) {
        self.redirect = Some(redirect);
    }

    pub fn db(&self) -> Result<&Db, Error> {
        self.db.as_ref().ok_or(Error::MissingContext(ContextKey::Db))
    }

    pub fn token(&self) -> Result<&TokenRecord, Error> {
        self.token
            .as_ref()
            .ok_or(Error::MissingContext(ContextKey::Token))
    }

    pub fn session(&self) -> Result<&Session, Error> {
        self.session
            .as_ref()
            .ok_or(Error::MissingContext(ContextKey::Session))
    }

    pub fn redirect(&self) -> Result<&RedirectTarget, Error> {
        self.redirect
            .as_ref()
            .ok_or(Error::MissingContext(ContextKey::Redirect))
    }
}
