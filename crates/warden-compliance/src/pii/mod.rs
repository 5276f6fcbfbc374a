//! PII detection and protection.
//!
//! - [`PiiScanner`]: pure recursive pattern detector over JSON values
//! - [`PiiProtector`]: mask / encrypt / tokenize detected substrings
//! - [`PiiComplianceGate`]: permission checks and write sanitization

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod gate;
pub mod keys;
pub mod protector;
pub mod scanner;

pub use gate::PiiComplianceGate;
pub use keys::ProtectionKeys;
pub use protector::{PiiProtectionResult, PiiProtector};
pub use scanner::{PiiDetectionResult, PiiScanner};

/// Default confidence reported when any pattern matches.
pub const DEFAULT_MATCH_CONFIDENCE: u8 = 90;

#[derive(Debug, Error)]
pub enum ProtectionError {
    #[error("invalid PII pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("encryption failed")]
    Encryption,

    #[error("invalid protected token: {0}")]
    InvalidToken(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),
}

// ============================================================================
// PII types
// ============================================================================

/// Kinds of PII the scanner recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PiiType {
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "phone")]
    Phone,
    /// National-id-like `3-2-4` digit groups.
    #[serde(rename = "ssn")]
    NationalId,
    #[serde(rename = "uk_postcode")]
    UkPostcode,
    #[serde(rename = "credit_card")]
    CreditCard,
}

impl PiiType {
    /// Order in which detection reports types.
    pub const DETECTION_ORDER: [PiiType; 5] = [
        PiiType::Email,
        PiiType::Phone,
        PiiType::NationalId,
        PiiType::UkPostcode,
        PiiType::CreditCard,
    ];

    /// Priority when overlapping matches merge into one protected span.
    /// Longer shapes go first so a card number overlapped by a phone
    /// number is still protected as a card.
    pub const PROTECTION_ORDER: [PiiType; 5] = [
        PiiType::Email,
        PiiType::CreditCard,
        PiiType::NationalId,
        PiiType::Phone,
        PiiType::UkPostcode,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PiiType::Email => "email",
            PiiType::Phone => "phone",
            PiiType::NationalId => "ssn",
            PiiType::UkPostcode => "uk_postcode",
            PiiType::CreditCard => "credit_card",
        }
    }

    /// Fixed redaction token used by mask-level protection.
    pub fn mask_token(self) -> &'static str {
        match self {
            PiiType::Email => "[EMAIL REDACTED]",
            PiiType::Phone => "[PHONE REDACTED]",
            PiiType::NationalId => "[SSN REDACTED]",
            PiiType::UkPostcode => "[POSTCODE REDACTED]",
            PiiType::CreditCard => "[CARD REDACTED]",
        }
    }

    pub(crate) fn pattern(self) -> &'static str {
        match self {
            PiiType::Email => r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
            PiiType::Phone => r"\b(\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b",
            PiiType::NationalId => r"\b\d{3}-\d{2}-\d{4}\b",
            PiiType::UkPostcode => r"(?i)\b[A-Z]{1,2}[0-9R][0-9A-Z]?\s?[0-9][A-Z]{2}\b",
            PiiType::CreditCard => r"\b(?:\d[ -]?){12,18}\d\b",
        }
    }
}

impl Display for PiiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Protection levels
// ============================================================================

/// Transform applied to detected PII.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtectionLevel {
    /// Replace with a fixed per-type redaction token. Irreversible.
    Mask,
    /// AES-256-GCM, reversible with the protector's key.
    Encrypt,
    /// Keyed BLAKE3 token, deterministic per key. Irreversible.
    Tokenize,
}

impl ProtectionLevel {
    pub(crate) fn suffix(self) -> &'static str {
        match self {
            ProtectionLevel::Mask => "masked",
            ProtectionLevel::Encrypt => "encrypted",
            ProtectionLevel::Tokenize => "tokenized",
        }
    }
}

impl std::str::FromStr for ProtectionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mask" => Ok(ProtectionLevel::Mask),
            "encrypt" => Ok(ProtectionLevel::Encrypt),
            "tokenize" => Ok(ProtectionLevel::Tokenize),
            other => Err(format!("unknown protection level: {other}")),
        }
    }
}
