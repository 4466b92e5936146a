//! Interfaces to collaborators outside the routing core.
//!
//! # Data Flow
//! ```text
//! db middleware
//!     → Database::handle() (shared handle, may be unavailable)
//!     → Db injected into the request context
//! session middleware
//!     → Db::sessions().get_by_id(token.session_id)
//!     → Session injected into the request context
//! startup
//!     → SessionService::active_sessions() → TokenStore::seed
//! ```
//!
//! # Design Decisions
//! - Storage is reached only through these traits
//! - Trait methods return boxed futures so handles can be trait objects

pub mod memory;

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

pub use memory::MemoryDatabase;

/// Identifier of a persisted user session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub i64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(SessionId)
    }
}

/// A user session as stored by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: i64,
    pub valid_until: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_until > now
    }
}

/// Errors reported by external services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("database unavailable: {0}")]
    Unavailable(String),

    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Session persistence.
pub trait SessionService: Send + Sync {
    /// Start a session for `user_id`, reusing the user's existing session.
    fn create(&self, user_id: i64) -> BoxFuture<'_, Result<Session, ServiceError>>;

    fn get_by_id(&self, id: SessionId) -> BoxFuture<'_, Result<Session, ServiceError>>;

    fn delete(&self, id: SessionId) -> BoxFuture<'_, Result<(), ServiceError>>;

    /// Sessions whose `valid_until` lies in the future.
    fn active_sessions(&self) -> BoxFuture<'_, Result<Vec<Session>, ServiceError>>;
}

/// Shared database handle placed in the request context.
#[derive(Clone)]
pub struct Db {
    sessions: Arc<dyn SessionService>,
}

impl Db {
    pub fn new(sessions: Arc<dyn SessionService>) -> Self {
        Self { sessions }
    }

    pub fn sessions(&self) -> &dyn SessionService {
        self.sessions.as_ref()
    }
}

impl fmt::Debug for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db").finish_non_exhaustive()
    }
}

/// Source of database handles.
pub trait Database: Send + Sync {
    fn handle(&self) -> Result<Db, ServiceError>;
}
