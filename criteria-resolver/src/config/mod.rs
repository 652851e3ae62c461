//! Resolver configuration

use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ParseKindError;
use crate::orm::JoinKind;

/// What to do with a search field that does not fit the entity metamodel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorPolicy {
    /// Fail the whole build with every offending field listed
    #[default]
    FailFast,
    /// Log a warning and leave the field out of the query
    SkipAndLog,
}

impl FromStr for FieldErrorPolicy {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail_fast" | "fail-fast" | "strict" => Ok(FieldErrorPolicy::FailFast),
            "skip_and_log" | "skip-and-log" | "skip" | "permissive" => {
                Ok(FieldErrorPolicy::SkipAndLog)
            }
            _ => Err(ParseKindError {
                what: "field error policy",
                value: s.to_string(),
            }),
        }
    }
}

/// Settings shared by every query a repository builds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Handling of fields whose path or comparison is invalid
    pub field_error_policy: FieldErrorPolicy,

    /// Join type for associations joined on demand by a path
    pub default_join_kind: JoinKind,
}

impl ResolverConfig {
    pub fn with_field_error_policy(mut self, policy: FieldErrorPolicy) -> Self {
        self.field_error_policy = policy;
        self
    }

    pub fn with_default_join_kind(mut self, kind: JoinKind) -> Self {
        self.default_join_kind = kind;
        self
    }

    /// Load configuration from environment variables
    ///
    /// - `CRITERIA_FIELD_ERROR_POLICY`: `fail_fast` (default) or `skip_and_log`
    /// - `CRITERIA_DEFAULT_JOIN_KIND`: `inner` (default), `left` or `right`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup("CRITERIA_FIELD_ERROR_POLICY") {
            config.field_error_policy = value
                .parse()
                .with_context(|| format!("Invalid CRITERIA_FIELD_ERROR_POLICY: {}", value))?;
        }

        if let Some(value) = lookup("CRITERIA_DEFAULT_JOIN_KIND") {
            config.default_join_kind = value
                .parse()
                .with_context(|| format!("Invalid CRITERIA_DEFAULT_JOIN_KIND: {}", value))?;
        }

        Ok(config)
    }
}
