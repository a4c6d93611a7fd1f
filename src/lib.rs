// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session Gate - Authentication / Authorization Middleware Service
//!
//! This crate turns an opaque bearer token into a verified identity,
//! resolves it to a cached session record and decides whether the
//! requesting route may proceed given the caller's per-application
//! section rights.
//!
//! ## Modules
//!
//! - `api` - HTTP endpoints (Axum): `/basic-config`, `/health`, `/session`
//! - `auth` - Token verification against the shared session secret
//! - `session` - Session model, cache, store contract and resolver
//! - `acl` - Route-pattern table and permission evaluation
//! - `gate` - The per-request middleware pipeline

pub mod acl;
pub mod api;
pub mod auth;
pub mod config;
pub mod gate;
pub mod session;
pub mod state;
