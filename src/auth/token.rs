// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HS256 token verification against the shared session secret.

use std::collections::HashMap;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::SessionSecret;

use super::AuthError;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Decoded payload of a verified bearer token.
///
/// Immutable once verified. Login apps may attach custom fields; they are
/// carried opaquely in `extra` and never interpreted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Issued at timestamp
    #[serde(default)]
    pub iat: i64,

    /// Expiration timestamp
    #[serde(default)]
    pub exp: i64,

    /// Session ID (optional, set by some login apps)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,

    /// Opaque custom claims
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Verifies bearer tokens with the platform-wide session secret.
///
/// Verification is pure aside from the secret captured at construction:
/// no I/O, no shared mutable state, safe to call concurrently.
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier in strict mode (expiry enforced).
    pub fn new(secret: &SessionSecret) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.validate_aud = false;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Switch to the legacy lenient mode that ignores token expiry.
    ///
    /// Kept for older platform installations that never rotated tokens.
    /// New deployments must stay on the strict default.
    #[deprecated(note = "lenient expiry handling is a legacy configuration; use strict mode")]
    pub fn ignore_expiry(mut self) -> Self {
        self.validation.validate_exp = false;
        self
    }

    /// Verify a token's signature and expiry and extract its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::EmptyToken);
        }

        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn secret() -> SessionSecret {
        SessionSecret::new("test-session-secret")
    }

    fn mint(claims: &Claims, secret: &SessionSecret) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn sample_claims(exp: i64) -> Claims {
        Claims {
            sub: "user_123".to_string(),
            iat: 1700000000,
            exp,
            sid: Some("sess_abc".to_string()),
            extra: Default::default(),
        }
    }

    fn far_future() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn verify_accepts_valid_token() {
        let secret = secret();
        let token = mint(&sample_claims(far_future()), &secret);

        let claims = TokenVerifier::new(&secret).verify(&token).unwrap();
        assert_eq!(claims.sub, "user_123");
        assert_eq!(claims.sid.as_deref(), Some("sess_abc"));
    }

    #[test]
    fn verify_rejects_empty_token() {
        let verifier = TokenVerifier::new(&secret());
        assert_eq!(verifier.verify("").unwrap_err(), AuthError::EmptyToken);
        assert_eq!(verifier.verify("   ").unwrap_err(), AuthError::EmptyToken);
    }

    #[test]
    fn verify_rejects_expired_token() {
        let secret = secret();
        // Expired well beyond the clock-skew leeway
        let token = mint(&sample_claims(chrono::Utc::now().timestamp() - 3600), &secret);

        let err = TokenVerifier::new(&secret).verify(&token).unwrap_err();
        assert_eq!(err, AuthError::TokenExpired);
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let token = mint(&sample_claims(far_future()), &SessionSecret::new("other-secret"));

        let err = TokenVerifier::new(&secret()).verify(&token).unwrap_err();
        assert_eq!(err, AuthError::InvalidSignature);
    }

    #[test]
    fn verify_rejects_garbage() {
        let err = TokenVerifier::new(&secret())
            .verify("not.a.jwt")
            .unwrap_err();
        assert_eq!(err, AuthError::MalformedToken);
    }

    #[test]
    #[allow(deprecated)]
    fn lenient_mode_ignores_expiry() {
        let secret = secret();
        let token = mint(&sample_claims(chrono::Utc::now().timestamp() - 3600), &secret);

        let claims = TokenVerifier::new(&secret)
            .ignore_expiry()
            .verify(&token)
            .unwrap();
        assert_eq!(claims.sub, "user_123");
    }

    #[test]
    fn extra_claims_are_preserved() {
        let secret = secret();
        let mut claims = sample_claims(far_future());
        claims
            .extra
            .insert("tenant".to_string(), serde_json::json!("appX"));
        let token = mint(&claims, &secret);

        let decoded = TokenVerifier::new(&secret).verify(&token).unwrap();
        assert_eq!(decoded.extra["tenant"], "appX");
    }
}
