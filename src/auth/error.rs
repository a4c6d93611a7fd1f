// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Token verification error.
///
/// Variants are distinct so the gate can log precisely why a token was
/// rejected; all of them surface as 401 when a protected route is hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Token string is empty or whitespace-only
    EmptyToken,
    /// Token has expired
    TokenExpired,
    /// Token signature does not match the session secret
    InvalidSignature,
    /// Token is structurally broken or carries unusable claims
    MalformedToken,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::EmptyToken => "empty_token",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::MalformedToken => "malformed_token",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::EmptyToken
            | AuthError::TokenExpired
            | AuthError::InvalidSignature
            | AuthError::MalformedToken => StatusCode::UNAUTHORIZED,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::EmptyToken => write!(f, "Token is empty"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::InvalidSignature => write!(f, "Token signature is invalid"),
            AuthError::MalformedToken => write!(f, "Token is malformed"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
