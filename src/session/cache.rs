// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process TTL cache for token → session lookups.
//!
//! Eviction is time-driven only: entries expire after the configured TTL and
//! a background sweeper purges them; there is no access-based (LRU) policy.
//! The cache is best-effort: a failed write is logged and the request
//! proceeds with the freshly fetched session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::model::Session;

/// Cached entry: normalized session + insertion timestamp.
struct CacheEntry {
    session: Arc<Session>,
    inserted_at: Instant,
}

/// In-process session cache with a bounded time-to-live.
///
/// Owned by the server process via `AppState`; constructed explicitly,
/// never ambient global state. Safe for concurrent readers and writers;
/// racing inserts for the same token resolve last-write-wins.
pub struct SessionCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    shutdown: CancellationToken,
}

impl SessionCache {
    /// Create a new cache.
    ///
    /// `ttl` trades freshness against store load and comes from configuration
    /// (`SESSION_CACHE_TTL_SECS`), never a hard-coded constant.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            shutdown: CancellationToken::new(),
        }
    }

    /// Get the cached session for a token.
    ///
    /// Returns `None` if not cached or expired; an expired entry is removed
    /// on the spot.
    pub fn get(&self, token: &str) -> Option<Arc<Session>> {
        let mut entries = self.entries.lock().ok()?;
        if let Some(entry) = entries.get(token) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(Arc::clone(&entry.session));
            }
            entries.remove(token);
        }
        None
    }

    /// Store a normalized session under its token.
    ///
    /// Best-effort: on a poisoned lock the write is skipped and logged.
    pub fn put(&self, token: &str, session: Arc<Session>) {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert(
                    token.to_string(),
                    CacheEntry {
                        session,
                        inserted_at: Instant::now(),
                    },
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "session cache write skipped");
            }
        }
    }

    /// Drop the entry for a token (logout / forced refresh hook).
    pub fn invalidate(&self, token: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(token);
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    /// Number of entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all entries whose TTL has elapsed.
    pub fn purge_expired(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            let before = entries.len();
            entries.retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
            let purged = before - entries.len();
            if purged > 0 {
                tracing::debug!(purged, "purged expired session cache entries");
            }
        }
    }

    /// Spawn the background sweep task purging expired entries.
    ///
    /// Runs until [`SessionCache::shutdown`] is called.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => cache.purge_expired(),
                }
            }
        })
    }

    /// Stop the sweeper task.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}
