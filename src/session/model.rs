// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session domain types.
//!
//! [`SessionRecord`] is the full document as the persistent store returns it.
//! [`Session`] is the public projection produced once at the cache-insertion
//! boundary; everything downstream (request extensions, `/basic-config`,
//! `/session`) only ever sees the projection.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Per-section read/write permission record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionPermission {
    #[serde(default)]
    pub read: PermissionValue,
    #[serde(default)]
    pub write: PermissionValue,
}

/// Mapping from section name to its permission record.
pub type SectionRights = HashMap<String, SectionPermission>;

/// A single permission value: a blanket flag or a role-name list.
///
/// `false` or an empty list denies. `true` grants to any authenticated
/// caller; a non-empty list grants only to callers whose groups intersect it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PermissionValue {
    Flag(bool),
    Roles(Vec<String>),
}

impl Default for PermissionValue {
    /// Missing keys deny.
    fn default() -> Self {
        PermissionValue::Flag(false)
    }
}

impl PermissionValue {
    /// Whether this value grants access to a caller with the given groups.
    pub fn grants(&self, groups: &[String]) -> bool {
        match self {
            PermissionValue::Flag(allowed) => *allowed,
            PermissionValue::Roles(roles) => {
                roles.iter().any(|role| groups.iter().any(|g| g == role))
            }
        }
    }
}

/// User reference carried inside a session record.
///
/// The user entity itself is owned by the persistent store; the session only
/// holds the fields the gate needs. `account` is the nested account document
/// the store may have populated; it is stripped during normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<serde_json::Value>,
}

/// Diagnostic client metadata recorded at login time.
///
/// Never exposed outside the store layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserInfo {
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// Full session document as stored by the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: Uuid,
    pub token: String,
    /// `None` when the referenced user no longer resolves; such a record is
    /// invalid and must never be cached.
    #[serde(default)]
    pub user: Option<User>,
    /// Application name → section rights.
    #[serde(default)]
    pub rights: HashMap<String, SectionRights>,
    #[serde(default)]
    pub browser_info: Option<BrowserInfo>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Normalized user projection (nested account document stripped).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    #[serde(default)]
    pub account_id: Option<String>,
    /// Group/role names, kept because permission lists match against them.
    #[serde(default)]
    pub groups: Vec<String>,
}

/// Public projection of an authenticated session.
///
/// Produced by [`Session::from_record`] exactly once per store fetch; the
/// bearer token is retained as the cache key but never serialized back out.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(skip)]
    pub token: String,
    pub user: PublicUser,
    /// Application name → section rights.
    #[schema(value_type = Object)]
    pub rights: HashMap<String, SectionRights>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Normalize a store record for external exposure.
    ///
    /// Strips `browser_info` and the user's populated account document.
    /// Returns `None` for records without a backing user.
    pub fn from_record(record: SessionRecord) -> Option<Self> {
        let user = record.user?;
        Some(Self {
            token: record.token,
            user: PublicUser {
                id: user.id,
                account_id: user.account_id,
                groups: user.groups,
            },
            rights: record.rights,
            created_at: record.created_at,
            expires_at: record.expires_at,
        })
    }

    /// Section rights for the given application, if any.
    pub fn app_rights(&self, app: &str) -> Option<&SectionRights> {
        self.rights.get(app)
    }
}
