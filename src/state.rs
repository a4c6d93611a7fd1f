// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared application state: the components every request pipeline
//! invocation borrows. Everything is `Arc`-held so `AppState` clones are
//! cheap; the [`SessionCache`] is the only shared mutable resource.

use std::sync::Arc;

use crate::acl::AclConfig;
use crate::auth::TokenVerifier;
use crate::config::AppConfig;
use crate::session::{SessionCache, SessionResolver, SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub verifier: Arc<TokenVerifier>,
    pub cache: Arc<SessionCache>,
    pub resolver: Arc<SessionResolver>,
    pub acl: Arc<AclConfig>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        verifier: TokenVerifier,
        acl: AclConfig,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let cache = Arc::new(SessionCache::new(config.cache_ttl));
        let resolver = Arc::new(SessionResolver::new(Arc::clone(&cache), store));
        Self {
            config: Arc::new(config),
            verifier: Arc::new(verifier),
            cache,
            resolver,
            acl: Arc::new(acl),
        }
    }

    /// Stop the cache sweeper and drop cached sessions.
    pub fn shutdown(&self) {
        self.cache.shutdown();
        self.cache.clear();
    }
}
