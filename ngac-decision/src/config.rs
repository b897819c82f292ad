//! Decision engine configuration.
//!
//! Configuration is loaded from environment variables with defaults that
//! keep the engine's standard NGAC semantics.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable controlling [`EngineConfig::audit_decisions`].
pub const AUDIT_DECISIONS_ENV: &str = "NGAC_AUDIT_DECISIONS";

/// Environment variable controlling [`EngineConfig::require_policy_class`].
pub const REQUIRE_POLICY_CLASS_ENV: &str = "NGAC_REQUIRE_POLICY_CLASS";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Decision engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// Emit an `info` level audit line for every decision.
    pub audit_decisions: bool,

    /// Treat a grant whose destination reaches no policy class as invalid.
    ///
    /// When disabled, such a destination is vacuously consistent with every
    /// resource it contains.
    pub require_policy_class: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            audit_decisions: true,
            require_policy_class: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to the
    /// default for anything missing or unparsable.
    ///
    /// Environment variables:
    /// - `NGAC_AUDIT_DECISIONS`: log every decision (default: true)
    /// - `NGAC_REQUIRE_POLICY_CLASS`: reject grants outside any policy class (default: false)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            audit_decisions: std::env::var(AUDIT_DECISIONS_ENV)
                .ok()
                .and_then(|s| parse_bool(&s))
                .unwrap_or(default.audit_decisions),
            require_policy_class: std::env::var(REQUIRE_POLICY_CLASS_ENV)
                .ok()
                .and_then(|s| parse_bool(&s))
                .unwrap_or(default.require_policy_class),
        }
    }

    /// Load configuration from environment variables, rejecting values that
    /// are present but not booleans.
    pub fn try_from_env() -> Result<Self, ConfigError> {
        let default = Self::default();

        Ok(Self {
            audit_decisions: read_bool(AUDIT_DECISIONS_ENV)?.unwrap_or(default.audit_decisions),
            require_policy_class: read_bool(REQUIRE_POLICY_CLASS_ENV)?
                .unwrap_or(default.require_policy_class),
        })
    }

    /// Set whether decisions are audited.
    pub fn with_audit_decisions(mut self, audit: bool) -> Self {
        self.audit_decisions = audit;
        self
    }

    /// Set whether destinations must reach a policy class.
    pub fn with_require_policy_class(mut self, require: bool) -> Self {
        self.require_policy_class = require;
        self
    }
}

fn read_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => parse_bool(&value).map(Some).ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got {:?}", value),
        }),
        Err(_) => Ok(None),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
