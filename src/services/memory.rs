//! In-memory session storage.
//!
//! Stands in for the relational store in the binary and in tests. One
//! session per user: creating a session for a user that already has one
//! extends it instead of inserting a new row.

use chrono::{Duration, Utc};
use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, RwLock};

use super::{Database, Db, ServiceError, Session, SessionId, SessionService};

/// Default lifetime of a persisted session.
pub const SESSION_TTL_DAYS: i64 = 7;

struct Inner {
    sessions: RwLock<HashMap<SessionId, Session>>,
    next_id: AtomicI64,
    available: AtomicBool,
    session_ttl: Duration,
}

#[derive(Clone)]
pub struct MemoryDatabase {
    inner: Arc<Inner>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::with_session_ttl(Duration::days(SESSION_TTL_DAYS))
    }

    pub fn with_session_ttl(session_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                sessions: RwLock::new(HashMap::new()),
                next_id: AtomicI64::new(1),
                available: AtomicBool::new(true),
                session_ttl,
            }),
        }
    }

    /// Toggle whether `handle()` succeeds.
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    /// Store a session as-is, e.g. to simulate rows left from a previous run.
    pub fn insert(&self, session: Session) -> Result<(), ServiceError> {
        let mut sessions = self.write()?;
        self.inner
            .next_id
            .fetch_max(session.id.0.saturating_add(1), Ordering::SeqCst);
        sessions.insert(session.id, session);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<SessionId, Session>>, ServiceError> {
        self.inner
            .sessions
            .write()
            .map_err(|_| ServiceError::Storage("session table poisoned".into()))
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<SessionId, Session>>, ServiceError> {
        self.inner
            .sessions
            .read()
            .map_err(|_| ServiceError::Storage("session table poisoned".into()))
    }

    fn create_sync(&self, user_id: i64) -> Result<Session, ServiceError> {
        let now = Utc::now();
        let valid_until = now + self.inner.session_ttl;
        let mut sessions = self.write()?;

        if let Some(existing) = sessions.values_mut().find(|s| s.user_id == user_id) {
            existing.valid_until = valid_until;
            return Ok(existing.clone());
        }

        let id = SessionId(self.inner.next_id.fetch_add(1, Ordering::SeqCst));
        let session = Session {
            id,
            user_id,
            valid_until,
            created_at: now,
        };
        sessions.insert(id, session.clone());
        Ok(session)
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionService for MemoryDatabase {
    fn create(&self, user_id: i64) -> BoxFuture<'_, Result<Session, ServiceError>> {
        Box::pin(async move { self.create_sync(user_id) })
    }

    fn get_by_id(&self, id: SessionId) -> BoxFuture<'_, Result<Session, ServiceError>> {
        Box::pin(async move {
            self.read()?
                .get(&id)
                .cloned()
                .ok_or(ServiceError::SessionNotFound(id))
        })
    }

    fn delete(&self, id: SessionId) -> BoxFuture<'_, Result<(), ServiceError>> {
        Box::pin(async move {
            self.write()?.remove(&id);
            Ok(())
        })
    }

    fn active_sessions(&self) -> BoxFuture<'_, Result<Vec<Session>, ServiceError>> {
        Box::pin(async move {
            let now = Utc::now();
            let mut active: Vec<Session> = self
                .read()?
                .values()
                .filter(|s| s.is_active_at(now))
                .cloned()
                .collect();
            active.sort_by_key(|s| s.id);
            Ok(active)
        })
    }
}

impl Database for MemoryDatabase {
    fn handle(&self) -> Result<Db, ServiceError> {
        if !self.inner.available.load(Ordering::SeqCst) {
            return Err(ServiceError::Unavailable("memory database switched off".into()));
        }
        Ok(Db::new(Arc::new(self.clone())))
    }
}
