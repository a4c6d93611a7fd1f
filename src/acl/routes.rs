// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Route-pattern table mapping URL patterns to protection rules.

use regex::Regex;
use serde::Deserialize;

use crate::config::ConfigError;

/// Protection metadata a route declares.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSettings {
    /// Section whose rights gate this route. `None` together with
    /// `public == false` is a misconfiguration and denies.
    pub section: Option<String>,
    /// Explicitly public route: allowed regardless of token/session state.
    pub public: bool,
}

impl RouteSettings {
    pub fn public() -> Self {
        Self {
            section: None,
            public: true,
        }
    }

    pub fn section(name: impl Into<String>) -> Self {
        Self {
            section: Some(name.into()),
            public: false,
        }
    }
}

/// One configured ACL entry, as written in the config table.
///
/// `false` marks a route explicitly public; an object names the section
/// whose rights protect it. A literal `true` is rejected at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AclEntry {
    Flag(bool),
    Protected { section: String },
}

#[derive(Debug)]
struct AclRule {
    pattern: Regex,
    settings: RouteSettings,
}

/// Validated, ordered route-pattern table.
///
/// Compiled once at startup; lookups run the precompiled regexes in
/// configuration order and return the first match. Paths matching no rule
/// get no settings, which the evaluator denies (fail-closed).
#[derive(Debug)]
pub struct AclConfig {
    rules: Vec<AclRule>,
}

impl AclConfig {
    /// Empty table: every route denies.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Build the table from ordered `(pattern, entry)` pairs.
    ///
    /// Fails fast on an invalid pattern or a `true` entry so a broken table
    /// halts startup instead of surfacing per request.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (String, AclEntry)>,
    ) -> Result<Self, ConfigError> {
        let mut rules = Vec::new();
        for (pattern, entry) in entries {
            let settings = match entry {
                AclEntry::Flag(false) => RouteSettings::public(),
                AclEntry::Flag(true) => {
                    return Err(ConfigError::InvalidAclEntry {
                        pattern,
                        message: "`true` is not a valid entry; use `false` (public) or {\"section\": ...}"
                            .to_string(),
                    });
                }
                AclEntry::Protected { section } => RouteSettings::section(section),
            };

            let compiled = Regex::new(&pattern).map_err(|source| ConfigError::InvalidAclPattern {
                pattern: pattern.clone(),
                source,
            })?;

            rules.push(AclRule {
                pattern: compiled,
                settings,
            });
        }

        if rules.is_empty() {
            tracing::warn!("acl table is empty, every route denies by default");
        }

        Ok(Self { rules })
    }

    /// Settings of the first rule whose pattern matches the path.
    pub fn lookup(&self, path: &str) -> Option<&RouteSettings> {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(path))
            .map(|rule| &rule.settings)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> AclConfig {
        AclConfig::from_entries([
            ("^/public".to_string(), AclEntry::Flag(false)),
            (
                "^/reports".to_string(),
                AclEntry::Protected {
                    section: "reports".to_string(),
                },
            ),
            (
                "^/admin".to_string(),
                AclEntry::Protected {
                    section: "admin".to_string(),
                },
            ),
        ])
        .unwrap()
    }

    #[test]
    fn lookup_returns_first_match_in_order() {
        let acl = table();
        let settings = acl.lookup("/reports/monthly").unwrap();
        assert_eq!(settings.section.as_deref(), Some("reports"));
    }

    #[test]
    fn lookup_misses_unlisted_path() {
        let acl = table();
        assert!(acl.lookup("/unlisted").is_none());
    }

    #[test]
    fn public_entry_has_no_section() {
        let acl = table();
        let settings = acl.lookup("/public/info").unwrap();
        assert!(settings.public);
        assert!(settings.section.is_none());
    }

    #[test]
    fn invalid_pattern_fails_fast() {
        let err = AclConfig::from_entries([(
            "(unclosed".to_string(),
            AclEntry::Protected {
                section: "x".to_string(),
            },
        )])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAclPattern { .. }));
    }

    #[test]
    fn true_entry_is_rejected() {
        let err =
            AclConfig::from_entries([("^/x".to_string(), AclEntry::Flag(true))]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAclEntry { .. }));
    }

    #[test]
    fn entries_deserialize_from_config_json() {
        let raw = r#"{"^/reports": {"section": "reports"}, "^/login": false}"#;
        let parsed: Vec<(String, AclEntry)> =
            serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(raw)
                .unwrap()
                .into_iter()
                .map(|(k, v)| (k, serde_json::from_value(v).unwrap()))
                .collect();

        let acl = AclConfig::from_entries(parsed).unwrap();
        assert!(acl.lookup("/reports").is_some());
    }

    #[test]
    fn empty_table_matches_nothing() {
        let acl = AclConfig::empty();
        assert!(acl.is_empty());
        assert!(acl.lookup("/anything").is_none());
    }
}
