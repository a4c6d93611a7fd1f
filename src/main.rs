// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use session_gate::acl::{AclConfig, AclEntry};
use session_gate::api::router;
use session_gate::auth::TokenVerifier;
use session_gate::config::{AppConfig, SessionSecret, ACL_FILE_ENV, HOST_ENV, PORT_ENV};
use session_gate::session::MemoryStore;
use session_gate::state::AppState;

#[tokio::main]
async fn main() {
    init_tracing();

    // Startup-time configuration errors are fatal: better to halt than to
    // serve with a broken auth subsystem.
    let config = AppConfig::from_env().expect("invalid configuration");
    let acl = load_acl();

    let store = Arc::new(MemoryStore::new());
    let secret = SessionSecret::load_or_create(store.as_ref())
        .await
        .expect("failed to provision session secret");
    let verifier = TokenVerifier::new(&secret);

    let state = AppState::new(config, verifier, acl, store);
    state.cache.spawn_sweeper(state.config.cache_sweep);

    let app = router(state.clone());

    let host = std::env::var(HOST_ENV).unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var(PORT_ENV)
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("failed to parse bind address");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listener");
    tracing::info!(%addr, app = %state.config.app_name, "session gate listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("server failed");

    state.shutdown();
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

/// Read and validate the ACL table. Patterns compile here or the process
/// halts; per-request lookups only run precompiled rules.
fn load_acl() -> AclConfig {
    let Ok(path) = std::env::var(ACL_FILE_ENV) else {
        tracing::warn!("no {ACL_FILE_ENV} configured, every route denies by default");
        return AclConfig::empty();
    };

    let raw = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read acl file '{path}': {e}"));
    let table: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&raw).unwrap_or_else(|e| panic!("invalid acl file '{path}': {e}"));

    let entries = table.into_iter().map(|(pattern, value)| {
        let entry: AclEntry = serde_json::from_value(value)
            .unwrap_or_else(|e| panic!("invalid acl entry for '{pattern}': {e}"));
        (pattern, entry)
    });

    AclConfig::from_entries(entries).expect("invalid acl table")
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    tracing::info!("shutdown signal received");
}
