// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cache-then-store session resolution.

use std::sync::Arc;

use thiserror::Error;

use super::cache::SessionCache;
use super::model::Session;
use super::store::{SessionStore, StoreError};

/// Session resolution failure.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No session exists for the token (or its user no longer resolves).
    #[error("no session found for token")]
    NotFound,
    /// The authoritative store could not be reached. Callers log this and
    /// treat it as `NotFound` for the current request.
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}

/// Resolves a verified token to a normalized session.
///
/// Stages run in sequence and short-circuit on failure: cache lookup, store
/// fallback, normalization, best-effort cache insertion. There is no
/// single-flight coalescing; concurrent misses for the same token each hit
/// the store, which is idempotent, and the cache settles last-write-wins.
pub struct SessionResolver {
    cache: Arc<SessionCache>,
    store: Arc<dyn SessionStore>,
}

impl SessionResolver {
    pub fn new(cache: Arc<SessionCache>, store: Arc<dyn SessionStore>) -> Self {
        Self { cache, store }
    }

    /// Resolve a token to its session.
    ///
    /// Cache hits return the session unchanged; it was normalized once at
    /// insertion time. A record without a backing user is `NotFound`,
    /// never a half-populated session.
    pub async fn resolve(&self, token: &str) -> Result<Arc<Session>, SessionError> {
        if let Some(session) = self.cache.get(token) {
            tracing::trace!("session served from cache");
            return Ok(session);
        }

        let record = self
            .store
            .find_by_token(token)
            .await?
            .ok_or(SessionError::NotFound)?;

        let session = Session::from_record(record).ok_or_else(|| {
            tracing::warn!("session record has no resolvable user, treating as not found");
            SessionError::NotFound
        })?;

        let session = Arc::new(session);
        // Fire-and-forget: a failed write is logged inside the cache and the
        // fresh session is still returned.
        self.cache.put(token, Arc::clone(&session));

        Ok(session)
    }
}
