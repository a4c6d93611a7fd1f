// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::gate::request_gate;
use crate::session::model::{PublicUser, Session};
use crate::state::AppState;

pub mod basic_config;
pub mod health;
pub mod session_info;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/basic-config", post(basic_config::basic_config))
        .route("/health", get(health::health))
        .route("/session", get(session_info::session_info))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            request_gate,
        ))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        basic_config::basic_config,
        health::health,
        session_info::session_info
    ),
    components(schemas(Session, PublicUser, health::HealthResponse)),
    tags(
        (name = "Config", description = "Public platform configuration"),
        (name = "Session", description = "Authenticated session introspection"),
        (name = "Health", description = "Liveness probes")
    )
)]
struct ApiDoc;
