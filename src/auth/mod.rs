// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer-token verification against the platform-wide session secret.
//!
//! ## Token Flow
//!
//! 1. A login app (external to this service) issues an HS256 token signed
//!    with the shared session secret and stores the matching session record.
//! 2. Clients present the token per request (body field, query parameter or
//!    `x-access-token` header).
//! 3. This module verifies signature and expiry and yields the decoded
//!    [`Claims`]; session resolution happens afterwards in `session`.
//!
//! ## Security
//!
//! - Expiry is enforced by default; the lenient mode that ignores it is
//!   deprecated and must be opted into explicitly.
//! - Clock skew tolerance is 60 seconds.

pub mod error;
pub mod token;

pub use error::AuthError;
pub use token::{Claims, TokenVerifier};
