// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer-token and client-address extraction.
//!
//! Tokens may arrive in the JSON request body (`token` field), the query
//! string (`token` parameter) or the `x-access-token` header, checked in
//! that precedence order; the first non-empty value wins. JSON bodies are
//! buffered and replayed so downstream extractors still see them; other
//! bodies pass through untouched.

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};

use axum::{
    body::{to_bytes, Body},
    extract::{ConnectInfo, Request},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};

/// Header carrying the bearer token.
pub const TOKEN_HEADER: &str = "x-access-token";

/// Upper bound for buffering JSON bodies during token extraction.
const MAX_BODY_BUFFER: usize = 1024 * 1024;

/// The raw bearer token, attached to request extensions for downstream use.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// Pull the bearer token out of the request, rebuilding it for downstream
/// consumption. Fails with 400 only when a JSON body cannot be buffered.
pub async fn extract_token(request: Request) -> Result<(Option<String>, Request), Response> {
    let (parts, body) = request.into_parts();

    let (body_token, body) = if is_json(&parts.headers) {
        match to_bytes(body, MAX_BODY_BUFFER).await {
            Ok(bytes) => {
                let token = token_from_json(&bytes);
                (token, Body::from(bytes))
            }
            Err(e) => {
                tracing::debug!(error = %e, "failed to buffer request body");
                return Err(StatusCode::BAD_REQUEST.into_response());
            }
        }
    } else {
        (None, body)
    };

    let token = body_token
        .or_else(|| token_from_query(&parts.uri))
        .or_else(|| token_from_headers(&parts.headers));

    Ok((token, Request::from_parts(parts, body)))
}

/// Client address for the internal-bypass check.
///
/// The `x-forwarded-for` header is client-controlled, so it is only honored
/// when the socket peer itself is one of the configured trusted addresses
/// (a reverse proxy in front of the gate). Any other peer is taken at face
/// value, header or not.
pub fn client_ip(request: &Request, trusted_peers: &HashSet<IpAddr>) -> Option<IpAddr> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_canonical())?;

    if trusted_peers.contains(&peer) {
        if let Some(forwarded) = forwarded_ip(request.headers()) {
            return Some(forwarded);
        }
    }

    Some(peer)
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let forwarded = headers.get("x-forwarded-for")?.to_str().ok()?;
    let first = forwarded.split(',').next()?.trim();
    let first = first.strip_prefix("::ffff:").unwrap_or(first);
    first.parse::<IpAddr>().ok().map(|ip| ip.to_canonical())
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

fn token_from_json(bytes: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(bytes).ok()?;
    value
        .get("token")
        .and_then(|t| t.as_str())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn token_from_query(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, value)| key == "token" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
