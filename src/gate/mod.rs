// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Request Gate
//!
//! The middleware entry point sequencing the pipeline per inbound request:
//! token extraction → verification → session resolution → permission
//! evaluation. Requests without a token proceed as anonymous; the route's
//! ACL settings decide whether that is acceptable.

pub mod extract;
pub mod middleware;

pub use extract::BearerToken;
pub use middleware::request_gate;
