// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum::{Extension, Json};

use crate::acl::DenyReason;
use crate::session::Session;

/// The caller's normalized session.
///
/// Protected by the ACL table like any other route; the session extension
/// is only absent when the ACL stage was bypassed (internal callers) and no
/// token was sent, which still gets the 401 here.
#[utoipa::path(
    get,
    path = "/session",
    tag = "Session",
    responses(
        (status = 200, description = "Normalized session of the caller", body = Session),
        (status = 401, description = "No resolvable session")
    )
)]
pub async fn session_info(
    session: Option<Extension<Arc<Session>>>,
) -> Result<Json<Session>, DenyReason> {
    match session {
        Some(Extension(session)) => Ok(Json((*session).clone())),
        None => Err(DenyReason::TokenMissing),
    }
}
