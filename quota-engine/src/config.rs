//! Engine configuration, loaded once from JSON.
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::capability::CapabilityRules;
use crate::context::RodGrouping;
use crate::quota::{QuotaRules, QuotaVariant};

/// What happens when the current context's quota is met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnQuotaAction {
    /// Hand control back to the operator.
    Manual,
    /// Travel to the next route location.
    #[default]
    Navigate,
}

/// Bounded retry for obstructed travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "RetryPolicy::default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "RetryPolicy::default_base_backoff_ticks")]
    pub base_backoff_ticks: u32,
    #[serde(default = "RetryPolicy::default_max_backoff_ticks")]
    pub max_backoff_ticks: u32,
}

impl RetryPolicy {
    #[must_use]
    pub const fn default_max_attempts() -> u32 {
        3
    }

    #[must_use]
    pub const fn default_base_backoff_ticks() -> u32 {
        30
    }

    #[must_use]
    pub const fn default_max_backoff_ticks() -> u32 {
        600
    }

    /// Ticks to wait after the given failed attempt (1-based).
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> u32 {
        let shift = attempt.saturating_sub(1).min(31);
        self.base_backoff_ticks
            .saturating_mul(1_u32 << shift)
            .min(self.max_backoff_ticks)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::MinViolation {
                field: "retry.max_attempts",
                min: 1,
                value: 0,
            });
        }
        if self.base_backoff_ticks > self.max_backoff_ticks {
            return Err(ConfigError::BackoffBounds {
                base: self.base_backoff_ticks,
                max: self.max_backoff_ticks,
            });
        }
        Ok(())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::default_max_attempts(),
            base_backoff_ticks: Self::default_base_backoff_ticks(),
            max_backoff_ticks: Self::default_max_backoff_ticks(),
        }
    }
}

/// Errors raised when configuration is malformed or violates its bounds.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: u32,
        value: u32,
    },
    #[error("retry backoff base {base} exceeds cap {max}")]
    BackoffBounds { base: u32, max: u32 },
}

/// Static engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaConfig {
    #[serde(default)]
    pub variant: QuotaVariant,
    #[serde(default)]
    pub rod_grouping: RodGrouping,
    #[serde(default)]
    pub on_quota: OnQuotaAction,
    /// Promote per-event diagnostics from debug to info.
    #[serde(default)]
    pub verbose: bool,
    #[serde(default = "QuotaConfig::default_require_party_move")]
    pub require_party_move: bool,
    #[serde(default)]
    pub expand_living_families: bool,
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl QuotaConfig {
    #[must_use]
    pub const fn default_require_party_move() -> bool {
        true
    }

    /// Parse and validate a configuration document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the JSON is malformed, names an unknown
    /// variant or grouping, or violates a bound.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its contents are invalid.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates its bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.retry.validate()
    }

    #[must_use]
    pub const fn quota_rules(&self) -> QuotaRules {
        QuotaRules {
            variant: self.variant,
            expand_living_families: self.expand_living_families,
        }
    }

    #[must_use]
    pub const fn capability_rules(&self) -> CapabilityRules {
        CapabilityRules {
            require_party_move: self.require_party_move,
        }
    }
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            variant: QuotaVariant::default(),
            rod_grouping: RodGrouping::default(),
            on_quota: OnQuotaAction::default(),
            verbose: false,
            require_party_move: Self::default_require_party_move(),
            expand_living_families: false,
            retry: RetryPolicy::default(),
        }
    }
}
