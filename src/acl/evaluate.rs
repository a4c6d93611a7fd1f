// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Permission evaluation: pure rules over (auth state, route settings, method).

use std::sync::Arc;

use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::session::{SectionPermission, Session};

use super::routes::RouteSettings;

/// Authentication outcome of the token/session stage, as the evaluator
/// sees it.
#[derive(Debug, Clone)]
pub enum AuthState {
    /// No token supplied.
    Anonymous,
    /// A token was supplied but failed verification or resolved to no
    /// session. The gate logged the detail; the evaluator only needs to
    /// distinguish this from absence.
    Invalid,
    /// Verified token with a resolved session.
    Authenticated(Arc<Session>),
}

/// Section rights granted to the request, attached to the request context
/// for downstream handlers.
#[derive(Debug, Clone)]
pub struct Grant {
    pub section: String,
    pub permission: SectionPermission,
}

/// Evaluation outcome.
#[derive(Debug, Clone)]
pub enum Decision {
    Allow { grant: Option<Grant> },
    Deny(DenyReason),
}

/// Why a request was denied.
#[derive(Debug, Clone, PartialEq)]
pub enum DenyReason {
    /// Route declares no protection metadata: fail-closed.
    NoRouteSettings,
    /// Protected route, no token supplied.
    TokenMissing,
    /// Protected route, token invalid/expired or session unresolvable.
    TokenInvalid,
    /// Session has no rights entry for the current application.
    NoAppRights { app: String },
    /// Application rights have no entry for the route's section.
    NoSectionRights { section: String },
    /// Section entry denies the required verb for this caller.
    InsufficientPermissions { section: String },
}

#[derive(Serialize)]
struct DenyBody {
    error: String,
    error_code: String,
}

impl DenyReason {
    pub fn error_code(&self) -> &'static str {
        match self {
            DenyReason::NoRouteSettings => "no_route_settings",
            DenyReason::TokenMissing => "token_missing",
            DenyReason::TokenInvalid => "token_invalid",
            DenyReason::NoAppRights { .. } => "no_app_rights",
            DenyReason::NoSectionRights { .. } => "no_section_rights",
            DenyReason::InsufficientPermissions { .. } => "insufficient_permissions",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            DenyReason::TokenMissing | DenyReason::TokenInvalid => StatusCode::UNAUTHORIZED,
            DenyReason::NoRouteSettings
            | DenyReason::NoAppRights { .. }
            | DenyReason::NoSectionRights { .. }
            | DenyReason::InsufficientPermissions { .. } => StatusCode::FORBIDDEN,
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenyReason::NoRouteSettings => write!(f, "route declares no access policy"),
            DenyReason::TokenMissing => write!(f, "token missing"),
            DenyReason::TokenInvalid => write!(f, "token expired or invalid"),
            DenyReason::NoAppRights { app } => write!(f, "no app rights for '{app}'"),
            DenyReason::NoSectionRights { section } => {
                write!(f, "no section rights for '{section}'")
            }
            DenyReason::InsufficientPermissions { section } => {
                write!(f, "insufficient permissions for '{section}'")
            }
        }
    }
}

impl IntoResponse for DenyReason {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(DenyBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

/// Apply the rights rules for one request. First match wins.
///
/// Explicitly public routes allow before any token check, so an expired
/// token never blocks a public route. Everything else is fail-closed:
/// missing settings, missing section declaration, missing rights entries
/// and falsy/empty permission values all deny.
pub fn evaluate(
    auth: &AuthState,
    settings: Option<&RouteSettings>,
    app: &str,
    method: &Method,
) -> Decision {
    let Some(settings) = settings else {
        return Decision::Deny(DenyReason::NoRouteSettings);
    };

    if settings.public {
        return Decision::Allow { grant: None };
    }

    let Some(section) = settings.section.as_deref() else {
        return Decision::Deny(DenyReason::NoRouteSettings);
    };

    let session = match auth {
        AuthState::Anonymous => return Decision::Deny(DenyReason::TokenMissing),
        AuthState::Invalid => return Decision::Deny(DenyReason::TokenInvalid),
        AuthState::Authenticated(session) => session,
    };

    let Some(app_rights) = session.app_rights(app) else {
        return Decision::Deny(DenyReason::NoAppRights {
            app: app.to_string(),
        });
    };

    let Some(permission) = app_rights.get(section) else {
        return Decision::Deny(DenyReason::NoSectionRights {
            section: section.to_string(),
        });
    };

    // GET reads; every other verb writes.
    let required = if method == Method::GET {
        &permission.read
    } else {
        &permission.write
    };

    if required.grants(&session.user.groups) {
        Decision::Allow {
            grant: Some(Grant {
                section: section.to_string(),
                permission: permission.clone(),
            }),
        }
    } else {
        Decision::Deny(DenyReason::InsufficientPermissions {
            section: section.to_string(),
        })
    }
}
