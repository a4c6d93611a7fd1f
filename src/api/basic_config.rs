// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Public platform configuration endpoint.

use std::sync::Arc;

use axum::{extract::State, Extension, Json};

use crate::session::Session;
use crate::state::AppState;

/// Login bootstrap information for platform frontends.
///
/// Unauthenticated by design and never answers 401/403. When the request
/// carried a token that resolved to a session, the normalized session
/// fields are merged into the response so frontends can skip a second
/// round-trip.
#[utoipa::path(
    post,
    path = "/basic-config",
    tag = "Config",
    responses(
        (status = 200, description = "App name and login URLs, plus session fields for authenticated callers")
    )
)]
pub async fn basic_config(
    State(state): State<AppState>,
    session: Option<Extension<Arc<Session>>>,
) -> Json<serde_json::Value> {
    let mut body = serde_json::json!({
        "app": state.config.app_name,
        "loginUrl": state.config.login_url,
        "loginMainUrl": state.config.login_main_url,
    });

    if let Some(Extension(session)) = session {
        if let (Some(map), Ok(serde_json::Value::Object(fields))) = (
            body.as_object_mut(),
            serde_json::to_value(session.as_ref()),
        ) {
            // The projection already dropped diagnostics and skips the token.
            for (key, value) in fields {
                map.insert(key, value);
            }
        }
    }

    Json(body)
}
