// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup; the shared
//! session secret is provisioned through the platform settings store.
//! Configuration errors are fatal at startup and never surface at request
//! time.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `APP_NAME` | Application name keying the session rights map | `app` |
//! | `LOGIN_URL` | Full login URL returned by `/basic-config` | `""` |
//! | `LOGIN_MAIN_URL` | Login app base URL returned by `/basic-config` | `""` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `SESSION_CACHE_TTL_SECS` | Session cache time-to-live | `600` |
//! | `SESSION_CACHE_SWEEP_SECS` | Cache sweeper period | `60` |
//! | `INTERNAL_ADDRS` | Comma-separated internal addresses bypassing the ACL; peers on this list are also trusted to set `x-forwarded-for` | loopback only |
//! | `ACL_FILE` | Path to the JSON ACL table | none (deny-all) |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::collections::HashSet;
use std::net::IpAddr;
use std::time::Duration;

use rand::RngCore;
use thiserror::Error;

use crate::session::{SettingsStore, StoreError};

/// Environment variable names.
pub const APP_NAME_ENV: &str = "APP_NAME";
pub const LOGIN_URL_ENV: &str = "LOGIN_URL";
pub const LOGIN_MAIN_URL_ENV: &str = "LOGIN_MAIN_URL";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const CACHE_TTL_ENV: &str = "SESSION_CACHE_TTL_SECS";
pub const CACHE_SWEEP_ENV: &str = "SESSION_CACHE_SWEEP_SECS";
pub const INTERNAL_ADDRS_ENV: &str = "INTERNAL_ADDRS";
pub const ACL_FILE_ENV: &str = "ACL_FILE";

/// Settings-store key under which the shared session secret lives.
pub const SESSION_SECRET_KEY: &str = "sessionSecret";

/// Startup configuration error. Always fatal: the process must not serve
/// requests with a broken auth subsystem.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid acl pattern '{pattern}': {source}")]
    InvalidAclPattern {
        pattern: String,
        source: regex::Error,
    },
    #[error("invalid acl entry for '{pattern}': {message}")]
    InvalidAclEntry { pattern: String, message: String },
    #[error("failed to load session secret: {0}")]
    SecretUnavailable(#[from] StoreError),
    #[error("invalid value for {var}: {message}")]
    InvalidEnv { var: &'static str, message: String },
}

/// The platform-wide token signing secret.
///
/// High-entropy random value shared by the login app and every gate
/// process; never printed or logged.
#[derive(Clone)]
pub struct SessionSecret(String);

impl SessionSecret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Load the secret from the settings store, generating and persisting a
    /// fresh one if none exists yet (available to the other platform apps).
    pub async fn load_or_create(store: &dyn SettingsStore) -> Result<Self, ConfigError> {
        if let Some(value) = store.get_setting(SESSION_SECRET_KEY).await? {
            return Ok(Self(value));
        }

        tracing::info!("no session secret found, generating a new one");
        let mut bytes = [0u8; 64];
        rand::rng().fill_bytes(&mut bytes);
        let value = hex::encode(bytes);

        store.put_setting(SESSION_SECRET_KEY, &value).await?;
        Ok(Self(value))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionSecret(redacted)")
    }
}

/// Runtime configuration assembled at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application name: the key into each session's rights map.
    pub app_name: String,
    pub login_url: String,
    pub login_main_url: String,
    /// Session cache time-to-live.
    pub cache_ttl: Duration,
    /// Background sweeper period.
    pub cache_sweep: Duration,
    /// Addresses allowed to bypass ACL enforcement. A socket peer on this
    /// list is also trusted as a proxy: its `x-forwarded-for` header is
    /// believed when deriving the client address.
    pub internal_addrs: HashSet<IpAddr>,
}

impl AppConfig {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            app_name: env_or(APP_NAME_ENV, "app"),
            login_url: env_or(LOGIN_URL_ENV, ""),
            login_main_url: env_or(LOGIN_MAIN_URL_ENV, ""),
            cache_ttl: Duration::from_secs(env_parse(CACHE_TTL_ENV, 600)?),
            cache_sweep: Duration::from_secs(env_parse(CACHE_SWEEP_ENV, 60)?),
            internal_addrs: parse_internal_addrs(std::env::var(INTERNAL_ADDRS_ENV).ok())?,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "app".to_string(),
            login_url: String::new(),
            login_main_url: String::new(),
            cache_ttl: Duration::from_secs(600),
            cache_sweep: Duration::from_secs(60),
            internal_addrs: loopback_addrs(),
        }
    }
}

fn env_or(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

fn env_parse(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidEnv {
            var,
            message: format!("'{raw}' is not a number of seconds"),
        }),
        Err(_) => Ok(default),
    }
}

fn loopback_addrs() -> HashSet<IpAddr> {
    ["127.0.0.1", "::1"]
        .iter()
        .map(|a| a.parse().expect("loopback literal"))
        .collect()
}

/// Parse the comma-separated internal address list. Loopback is always
/// included so co-located platform services can talk to each other.
fn parse_internal_addrs(raw: Option<String>) -> Result<HashSet<IpAddr>, ConfigError> {
    let mut addrs = loopback_addrs();
    if let Some(raw) = raw {
        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let addr = part.parse().map_err(|_| ConfigError::InvalidEnv {
                var: INTERNAL_ADDRS_ENV,
                message: format!("'{part}' is not an IP address"),
            })?;
            addrs.insert(addr);
        }
    }
    Ok(addrs)
}
