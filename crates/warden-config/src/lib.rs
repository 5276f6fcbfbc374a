//! Configuration management for Warden
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. Environment variables (WARDEN_* prefix, `__` between section and key)
//! 2. warden.local.toml (gitignored, local overrides)
//! 3. warden.toml (git-tracked, project config)
//! 4. ~/.config/warden/config.toml (user defaults)
//! 5. Built-in defaults (lowest precedence)

use serde::{Deserialize, Serialize};

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::{ConfigLayer, ConfigLoader, ENV_PREFIX};

/// Main Warden configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    pub step_up: StepUpConfig,
    pub pii: PiiConfig,
    pub audit: AuditConfig,
}

/// Step-up re-authentication for high-risk TOP_SECRET operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepUpConfig {
    pub inactivity_minutes: u32,
    /// Treat a context with no recorded activity as stale.
    pub require_activity_timestamp: bool,
}

impl Default for StepUpConfig {
    fn default() -> Self {
        Self {
            inactivity_minutes: 30,
            require_activity_timestamp: true,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PiiConfig {
    /// Confidence reported on a match, 1..=100.
    pub match_confidence: u8,
    /// Mask PII on writes above OFFICIAL instead of storing plain text.
    pub sanitize_elevated_writes: bool,
    /// Base64 AES-256 key. Generated per process when absent.
    pub encryption_key: Option<String>,
    /// Base64 BLAKE3 key. Generated per process when absent.
    pub tokenization_key: Option<String>,
}

impl Default for PiiConfig {
    fn default() -> Self {
        Self {
            match_confidence: 90,
            sanitize_elevated_writes: true,
            encryption_key: None,
            tokenization_key: None,
        }
    }
}

impl std::fmt::Debug for PiiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("PiiConfig")
            .field("match_confidence", &self.match_confidence)
            .field("sanitize_elevated_writes", &self.sanitize_elevated_writes)
            .field("encryption_key", &redact(&self.encryption_key))
            .field("tokenization_key", &redact(&self.tokenization_key))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Deliver security events to the sink. Tracing output is unaffected.
    pub enabled: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl WardenConfig {
    /// Rejects values the kernel cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step_up.inactivity_minutes == 0 {
            return Err(ConfigError::ValidationError(
                "step_up.inactivity_minutes must be at least 1".to_string(),
            ));
        }
        if !(1..=100).contains(&self.pii.match_confidence) {
            return Err(ConfigError::ValidationError(format!(
                "pii.match_confidence must be within 1..=100, got {}",
                self.pii.match_confidence
            )));
        }
        for (name, key) in [
            ("pii.encryption_key", &self.pii.encryption_key),
            ("pii.tokenization_key", &self.pii.tokenization_key),
        ] {
            if key.as_deref().is_some_and(|k| k.trim().is_empty()) {
                return Err(ConfigError::ValidationError(format!("{name} is empty")));
            }
        }
        Ok(())
    }

    /// Renders the configuration as TOML with key material redacted.
    pub fn to_redacted_toml(&self) -> Result<String, ConfigError> {
        let mut shown = self.clone();
        for key in [&mut shown.pii.encryption_key, &mut shown.pii.tokenization_key] {
            if key.is_some() {
                *key = Some("[REDACTED]".to_string());
            }
        }
        toml::to_string_pretty(&shown).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }
}
