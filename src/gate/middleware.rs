// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The gate middleware: verification → resolution → evaluation per request.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::acl::{evaluate, AuthState, Decision};
use crate::session::SessionError;
use crate::state::AppState;

use super::extract::{client_ip, extract_token, BearerToken};

/// Paths that never pass through the ACL stage. `/basic-config` must stay
/// reachable without credentials so login apps can bootstrap; probes and
/// docs likewise.
const ACL_EXEMPT_PREFIXES: &[&str] = &["/basic-config", "/health", "/docs", "/api-doc"];

/// Gate middleware. All per-request failures are converted to HTTP status +
/// reason here; nothing propagates out of the pipeline.
pub async fn request_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (token, mut request) = match extract_token(request).await {
        Ok(pair) => pair,
        Err(response) => return response,
    };

    let auth = authenticate(&state, token.as_deref()).await;

    // Attach session and raw token for downstream handlers regardless of
    // whether the ACL stage runs; /basic-config merges session fields.
    if let AuthState::Authenticated(session) = &auth {
        request.extensions_mut().insert(Arc::clone(session));
    }
    if let Some(token) = token {
        request.extensions_mut().insert(BearerToken(token));
    }

    let path = request.uri().path().to_string();
    if is_exempt(&path) {
        return next.run(request).await;
    }

    // Internal topology is trusted: enforcement is skipped but the bypass is
    // always logged so it stays auditable.
    if let Some(ip) = client_ip(&request, &state.config.internal_addrs) {
        if state.config.internal_addrs.contains(&ip) {
            tracing::info!(%ip, path, "internal request, acl enforcement bypassed");
            return next.run(request).await;
        }
    }

    let decision = evaluate(
        &auth,
        state.acl.lookup(&path),
        &state.config.app_name,
        request.method(),
    );

    match decision {
        Decision::Allow { grant } => {
            if let Some(grant) = grant {
                request.extensions_mut().insert(grant);
            }
            next.run(request).await
        }
        Decision::Deny(reason) => {
            tracing::debug!(path, %reason, "request denied");
            reason.into_response()
        }
    }
}

/// Run token verification and session resolution, folding every failure
/// into the auth state. Errors here never abort the request on their own;
/// the evaluator decides whether the route tolerates them.
async fn authenticate(state: &AppState, token: Option<&str>) -> AuthState {
    let Some(token) = token else {
        return AuthState::Anonymous;
    };

    match state.verifier.verify(token) {
        Err(e) => {
            tracing::debug!(error = %e, "token rejected");
            AuthState::Invalid
        }
        Ok(_claims) => match state.resolver.resolve(token).await {
            Ok(session) => AuthState::Authenticated(session),
            Err(SessionError::StoreUnavailable(e)) => {
                tracing::error!(error = %e, "session store unavailable, treating as not found");
                AuthState::Invalid
            }
            Err(SessionError::NotFound) => {
                tracing::debug!("no session for verified token");
                AuthState::Invalid
            }
        },
    }
}

/// Exempt prefixes match on whole path segments only; `/healthcheck` is not
/// `/health`.
fn is_exempt(path: &str) -> bool {
    ACL_EXEMPT_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::{AclConfig, AclEntry};
    use crate::auth::{Claims, TokenVerifier};
    use crate::config::{AppConfig, SessionSecret};
    use crate::session::model::tests::sample_record;
    use crate::session::MemoryStore;
    use axum::{
        body::{to_bytes, Body},
        http::{Request as HttpRequest, StatusCode},
        routing::get,
        Router,
    };
    use jsonwebtoken::{encode, EncodingKey, Header};
    use tower::ServiceExt;

    const SECRET: &str = "gate-test-secret";

    fn mint_token(sub: &str) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            iat: chrono::Utc::now().timestamp(),
            exp: chrono::Utc::now().timestamp() + 3600,
            sid: None,
            extra: Default::default(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn test_state(store: MemoryStore) -> AppState {
        let secret = SessionSecret::new(SECRET);
        let acl = AclConfig::from_entries([
            ("^/open".to_string(), AclEntry::Flag(false)),
            (
                "^/reports".to_string(),
                AclEntry::Protected {
                    section: "reports".to_string(),
                },
            ),
        ])
        .unwrap();

        let config = AppConfig {
            app_name: "appX".to_string(),
            ..AppConfig::default()
        };

        AppState::new(config, TokenVerifier::new(&secret), acl, Arc::new(store))
    }

    fn app(state: AppState) -> Router {
        async fn ok() -> &'static str {
            "ok"
        }

        Router::new()
            .route("/open", get(ok))
            .route("/reports", get(ok).post(ok))
            .route("/unlisted", get(ok))
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                request_gate,
            ))
            .with_state(state)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_token_on_protected_route_is_401() {
        let app = app(test_state(MemoryStore::new()));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/reports")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "token missing");
    }

    #[tokio::test]
    async fn unlisted_route_is_fail_closed_403() {
        let app = app(test_state(MemoryStore::new()));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/unlisted")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["error_code"], "no_route_settings");
    }

    #[tokio::test]
    async fn public_route_allows_without_token() {
        let app = app(test_state(MemoryStore::new()));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/open")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn valid_token_with_read_rights_passes_get() {
        let store = MemoryStore::new();
        let token = mint_token("user_123");
        store.insert_session(sample_record(&token));
        let app = app(test_state(store));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/reports")
                    .header("x-access-token", &token)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn post_without_write_role_is_403() {
        let store = MemoryStore::new();
        let token = mint_token("user_123");
        // Sample rights: write = ["admin"], user groups = ["staff"].
        store.insert_session(sample_record(&token));
        let app = app(test_state(store));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/reports")
                    .header("x-access-token", &token)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["error_code"], "insufficient_permissions");
    }

    #[tokio::test]
    async fn verified_token_without_session_is_401() {
        // Token signs fine but no session record exists.
        let app = app(test_state(MemoryStore::new()));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/reports")
                    .header("x-access-token", mint_token("user_123"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "token expired or invalid");
    }

    fn state_with_internal(addr: &str) -> AppState {
        let mut state = test_state(MemoryStore::new());
        let mut config = (*state.config).clone();
        config.internal_addrs.insert(addr.parse().unwrap());
        state.config = Arc::new(config);
        state
    }

    fn peer(addr: &str) -> axum::extract::ConnectInfo<std::net::SocketAddr> {
        axum::extract::ConnectInfo(addr.parse().unwrap())
    }

    #[tokio::test]
    async fn internal_peer_bypasses_acl() {
        let app = app(state_with_internal("10.0.0.7"));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/reports")
                    .extension(peer("10.0.0.7:40000"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn forwarded_internal_address_from_external_peer_is_enforced() {
        // A spoofed header must not grant the internal bypass.
        let app = app(test_state(MemoryStore::new()));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/reports")
                    .extension(peer("203.0.113.9:40000"))
                    .header("x-forwarded-for", "127.0.0.1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "token missing");
    }

    #[tokio::test]
    async fn forwarded_internal_client_behind_trusted_proxy_bypasses_acl() {
        // Loopback peer is a trusted proxy; its forwarded client is internal.
        let app = app(state_with_internal("10.0.0.7"));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/reports")
                    .extension(peer("127.0.0.1:40000"))
                    .header("x-forwarded-for", "10.0.0.7")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn external_client_behind_trusted_proxy_is_enforced() {
        let app = app(test_state(MemoryStore::new()));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/reports")
                    .extension(peer("127.0.0.1:40000"))
                    .header("x-forwarded-for", "203.0.113.9")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn exempt_paths_match_whole_segments_only() {
        assert!(is_exempt("/health"));
        assert!(is_exempt("/docs/index.html"));
        assert!(is_exempt("/api-doc/openapi.json"));
        assert!(!is_exempt("/healthcheck"));
        assert!(!is_exempt("/docs-internal"));
        assert!(!is_exempt("/basic-configuration"));
    }

    #[tokio::test]
    async fn token_via_query_parameter_is_accepted() {
        let store = MemoryStore::new();
        let token = mint_token("user_123");
        store.insert_session(sample_record(&token));
        let app = app(test_state(store));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri(format!("/reports?token={token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
