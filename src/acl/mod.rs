// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Access Control Module
//!
//! Configuration-driven route protection.
//!
//! [`AclConfig`] maps route patterns to [`RouteSettings`]; patterns are
//! validated and compiled once at startup, never per request. The
//! [`evaluate`] function is pure over (auth state, route settings, method)
//! and applies the section/verb rights rules, fail-closed: a route must
//! opt in to being open.

pub mod evaluate;
pub mod routes;

pub use evaluate::{evaluate, AuthState, Decision, DenyReason, Grant};
pub use routes::{AclConfig, AclEntry, RouteSettings};
