//! Key material for reversible and keyed PII protection.
//!
//! Key material is securely zeroed from memory when dropped.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::ProtectionError;

/// AES-256-GCM key for `encrypt` and BLAKE3 key for `tokenize`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ProtectionKeys {
    encryption: [u8; 32],
    tokenization: [u8; 32],
}

impl ProtectionKeys {
    /// Generates both keys from system randomness.
    pub fn generate() -> Self {
        Self {
            encryption: random_key(),
            tokenization: random_key(),
        }
    }

    pub fn from_bytes(encryption: [u8; 32], tokenization: [u8; 32]) -> Result<Self, ProtectionError> {
        if encryption == [0u8; 32] || tokenization == [0u8; 32] {
            return Err(ProtectionError::InvalidKey("key is all zeros".to_string()));
        }
        Ok(Self {
            encryption,
            tokenization,
        })
    }

    /// Decodes base64 keys, generating whichever one is absent.
    pub fn from_base64(
        encryption: Option<&str>,
        tokenization: Option<&str>,
    ) -> Result<Self, ProtectionError> {
        let encryption = match encryption {
            Some(encoded) => decode_key(encoded)?,
            None => random_key(),
        };
        let tokenization = match tokenization {
            Some(encoded) => decode_key(encoded)?,
            None => random_key(),
        };
        Self::from_bytes(encryption, tokenization)
    }

    pub(crate) fn encryption(&self) -> &[u8; 32] {
        &self.encryption
    }

    pub(crate) fn tokenization(&self) -> &[u8; 32] {
        &self.tokenization
    }
}

impl std::fmt::Debug for ProtectionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ProtectionKeys([REDACTED])")
    }
}

fn random_key() -> [u8; 32] {
    let mut key = [0u8; 32];
    OsRng.fill_bytes(&mut key);
    key
}

fn decode_key(encoded: &str) -> Result<[u8; 32], ProtectionError> {
    let mut bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| ProtectionError::InvalidKey(e.to_string()))?;
    let key: Result<[u8; 32], _> = bytes.as_slice().try_into();
    let len = bytes.len();
    bytes.zeroize();
    key.map_err(|_| ProtectionError::InvalidKey(format!("expected 32 bytes, got {len}")))
}
