// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session store contract and in-memory reference implementation.
//!
//! The authoritative session collection lives in the platform's persistent
//! store; this crate only reads it through [`SessionStore`]. The companion
//! [`SettingsStore`] holds platform-wide settings, of which the gate only
//! uses the shared session secret.
//!
//! [`MemoryStore`] implements both and backs the standalone binary and the
//! test suite.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use super::model::SessionRecord;

/// Store access failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Lookup contract for the persistent session collection.
///
/// `find_by_token` must be idempotent: concurrent cache misses for the same
/// token may each query the store independently.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the session record keyed by the given bearer token.
    async fn find_by_token(&self, token: &str) -> Result<Option<SessionRecord>, StoreError>;
}

/// Platform-wide settings, keyed by name.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_setting(&self, name: &str) -> Result<Option<String>, StoreError>;

    async fn put_setting(&self, name: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory store for the standalone binary and tests.
#[derive(Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<String, SessionRecord>>,
    settings: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session record, keyed by its token.
    pub fn insert_session(&self, record: SessionRecord) {
        let mut sessions = self.sessions.lock().expect("session map poisoned");
        sessions.insert(record.token.clone(), record);
    }

    /// Remove a session record (logout hook).
    pub fn remove_session(&self, token: &str) -> Option<SessionRecord> {
        let mut sessions = self.sessions.lock().expect("session map poisoned");
        sessions.remove(token)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn find_by_token(&self, token: &str) -> Result<Option<SessionRecord>, StoreError> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        // Expired records are treated as absent, matching a TTL'd collection.
        Ok(sessions
            .get(token)
            .filter(|record| record.expires_at > Utc::now())
            .cloned())
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get_setting(&self, name: &str) -> Result<Option<String>, StoreError> {
        let settings = self
            .settings
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(settings.get(name).cloned())
    }

    async fn put_setting(&self, name: &str, value: &str) -> Result<(), StoreError> {
        let mut settings = self
            .settings
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        settings.insert(name.to_string(), value.to_string());
        Ok(())
    }
}
