// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Module
//!
//! Resolution of a verified bearer token to an authenticated session.
//!
//! ## Lookup Flow
//!
//! 1. [`SessionResolver`] asks the in-process [`SessionCache`] first.
//! 2. On a miss it falls back to the authoritative [`SessionStore`]
//!    (a persistent collection owned by the platform, opaque to this crate).
//! 3. The fetched record is normalized once into a [`Session`] projection
//!    (diagnostics stripped) and inserted into the cache best-effort.
//!
//! Sessions are immutable snapshots once cached; the cache is the only
//! shared mutable resource in the request pipeline.

pub mod cache;
pub mod model;
pub mod resolver;
pub mod store;

pub use cache::SessionCache;
pub use model::{PermissionValue, SectionPermission, SectionRights, Session, SessionRecord};
pub use resolver::{SessionError, SessionResolver};
pub use store::{MemoryStore, SessionStore, SettingsStore, StoreError};
