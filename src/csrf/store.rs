//! In-memory CSRF token store.
//!
//! # Responsibilities
//! - Keep at most one token record per session
//! - Create, read, renew and delete records
//! - Verify a presented token, renewing it when it has expired
//! - Rebuild the session linkage at startup from active sessions
//!
//! # Design Decisions
//! - One mutex guards the whole map
//! - The lock is taken with `try_lock`: a busy store fails the call with
//!   `TokenError::Contention` instead of queueing it, and nothing retries
//! - Expiry is checked on access; expired records stay until replaced
//! - Records are never persisted, a restart issues fresh values

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::time::Duration;
use thiserror::Error;

use crate::error::Error;
use crate::observability::metrics;
use crate::services::{SessionId, SessionService};

/// Random bytes per token, before encoding.
pub const TOKEN_BYTES: usize = 32;

/// Token lifetime used when none is configured.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(600);

/// CSRF state for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRecord {
    pub session_id: SessionId,
    pub value: String,
    pub valid_until: DateTime<Utc>,
}

impl TokenRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_until < now
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token store is busy")]
    Contention,

    #[error("no token for session {0}")]
    NotFound(SessionId),

    #[error("csrf token mismatch for session {0}")]
    Invalid(SessionId),

    #[error("csrf token for session {0} has expired")]
    Expired(SessionId),

    #[error("random source failed: {0}")]
    Random(#[from] rand::Error),
}

/// Generate a URL-safe token from [`TOKEN_BYTES`] random bytes.
pub fn generate_token() -> Result<String, rand::Error> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(URL_SAFE.encode(bytes))
}

/// Process-wide token table, shared behind an `Arc`.
#[derive(Debug)]
pub struct TokenStore {
    tokens: Mutex<HashMap<SessionId, TokenRecord>>,
    ttl: chrono::Duration,
}

impl TokenStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
            ttl: chrono::Duration::from_std(ttl)
                .unwrap_or_else(|_| chrono::Duration::seconds(DEFAULT_TOKEN_TTL.as_secs() as i64)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl.to_std().unwrap_or(DEFAULT_TOKEN_TTL)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SessionId, TokenRecord>>, TokenError> {
        match self.tokens.try_lock() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::WouldBlock) => {
                metrics::record_token_event("contention");
                Err(TokenError::Contention)
            }
            // Every critical section leaves the map consistent.
            Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
        }
    }

    /// Hold the map lock, making every other call see a busy store.
    #[cfg(test)]
    pub(crate) fn hold(&self) -> MutexGuard<'_, HashMap<SessionId, TokenRecord>> {
        self.tokens
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn mint(&self, session_id: SessionId) -> Result<TokenRecord, TokenError> {
        Ok(TokenRecord {
            session_id,
            value: generate_token()?,
            valid_until: Utc::now() + self.ttl,
        })
    }

    /// Issue a new record for `session_id`, replacing any existing one.
    pub fn create(&self, session_id: SessionId) -> Result<TokenRecord, TokenError> {
        let record = self.mint(session_id)?;
        let mut tokens = self.lock()?;
        tokens.insert(session_id, record.clone());

        metrics::record_token_event("create");
        metrics::record_store_size(tokens.len());
        Ok(record)
    }

    pub fn get(&self, session_id: SessionId) -> Result<TokenRecord, TokenError> {
        self.lock()?
            .get(&session_id)
            .cloned()
            .ok_or(TokenError::NotFound(session_id))
    }

    /// Remove the record; removing an absent record is not an error.
    pub fn delete(&self, session_id: SessionId) -> Result<(), TokenError> {
        let mut tokens = self.lock()?;
        if tokens.remove(&session_id).is_some() {
            metrics::record_token_event("delete");
        }
        metrics::record_store_size(tokens.len());
        Ok(())
    }

    /// Replace an existing record with a fresh value and expiry.
    pub fn renew(&self, session_id: SessionId) -> Result<TokenRecord, TokenError> {
        let mut tokens = self.lock()?;
        if !tokens.contains_key(&session_id) {
            return Err(TokenError::NotFound(session_id));
        }

        let record = self.mint(session_id)?;
        tokens.insert(session_id, record.clone());

        metrics::record_token_event("renew");
        Ok(record)
    }

    /// Verify `presented`, renewing the record when it has expired.
    ///
    /// Returns `Ok(None)` when the caller may proceed, and `Ok(Some(record))`
    /// when the token was renewed: the caller must hand the new value to the
    /// client and ask for the action to be repeated.
    pub fn verify_or_renew(
        &self,
        session_id: SessionId,
        presented: &str,
    ) -> Result<Option<TokenRecord>, TokenError> {
        let mut tokens = self.lock()?;
        let record = tokens
            .get(&session_id)
            .ok_or(TokenError::NotFound(session_id))?;

        match check(record, presented, Utc::now()) {
            Ok(()) => Ok(None),
            Err(TokenError::Expired(_)) => {
                let renewed = self.mint(session_id)?;
                tokens.insert(session_id, renewed.clone());
                metrics::record_token_event("renew");
                tracing::debug!(session_id = %session_id, "Expired csrf token renewed");
                Ok(Some(renewed))
            }
            Err(e) => {
                metrics::record_token_event("invalid");
                Err(e)
            }
        }
    }

    pub fn len(&self) -> Result<usize, TokenError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, TokenError> {
        Ok(self.lock()?.is_empty())
    }

    /// Create a record for every session the service reports active.
    ///
    /// Only the session linkage survives a restart; every value is new.
    pub async fn seed(&self, sessions: &dyn SessionService) -> Result<usize, Error> {
        let active = sessions.active_sessions().await?;
        for session in &active {
            self.create(session.id)?;
        }
        tracing::info!(sessions = active.len(), "Token store seeded from active sessions");
        Ok(active.len())
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_TTL)
    }
}

fn check(record: &TokenRecord, presented: &str, now: DateTime<Utc>) -> Result<(), TokenError> {
    if !constant_time_eq(record.value.as_bytes(), presented.as_bytes()) {
        return Err(TokenError::Invalid(record.session_id));
    }
    if record.is_expired_at(now) {
        return Err(TokenError::Expired(record.session_id));
    }
    Ok(())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
