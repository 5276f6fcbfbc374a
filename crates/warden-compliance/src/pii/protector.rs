//! PII protection transforms.
//!
//! | Level    | Output                                  | Reversible |
//! |----------|-----------------------------------------|------------|
//! | Mask     | `[EMAIL REDACTED]`, `[PHONE REDACTED]`… | No         |
//! | Encrypt  | `enc:<base64url(nonce ‖ ciphertext)>`   | Yes        |
//! | Tokenize | `tok_<16 hex>` (keyed BLAKE3)           | No         |

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::Serialize;
use serde_json::Value;

use super::keys::ProtectionKeys;
use super::scanner::{PiiScanner, Span};
use super::{PiiType, ProtectionError, ProtectionLevel};

const ENCRYPTED_PREFIX: &str = "enc:";
const TOKEN_PREFIX: &str = "tok_";
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Outcome of [`PiiProtector::protect_pii`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PiiProtectionResult {
    pub is_protected: bool,
    /// Distinct labels such as `phone_masked` or `email_encrypted`.
    pub protection_applied: Vec<String>,
    /// The input, untouched.
    pub original_data: Value,
    pub protected_data: Value,
}

/// Applies protection transforms to every PII substring of a value.
#[derive(Debug, Clone)]
pub struct PiiProtector {
    scanner: PiiScanner,
    keys: ProtectionKeys,
}

impl PiiProtector {
    pub fn new(scanner: PiiScanner, keys: ProtectionKeys) -> Self {
        Self { scanner, keys }
    }

    pub fn scanner(&self) -> &PiiScanner {
        &self.scanner
    }

    /// Returns a protected copy of `value`. `value` itself is never modified.
    ///
    /// # Example
    ///
    /// ```
    /// use serde_json::json;
    /// use warden_compliance::pii::{PiiProtector, PiiScanner, ProtectionKeys, ProtectionLevel};
    ///
    /// let protector = PiiProtector::new(PiiScanner::new().unwrap(), ProtectionKeys::generate());
    /// let result = protector
    ///     .protect_pii(&json!({ "msg": "call 555-123-4567" }), ProtectionLevel::Mask)
    ///     .unwrap();
    ///
    /// assert_eq!(result.protected_data["msg"], "call [PHONE REDACTED]");
    /// assert_eq!(result.protection_applied, vec!["phone_masked"]);
    /// ```
    pub fn protect_pii(
        &self,
        value: &Value,
        level: ProtectionLevel,
    ) -> Result<PiiProtectionResult, ProtectionError> {
        let mut protected = value.clone();
        let mut applied: Vec<String> = Vec::new();
        self.protect_value(&mut protected, level, &mut applied)?;

        Ok(PiiProtectionResult {
            is_protected: !applied.is_empty(),
            protection_applied: applied,
            original_data: value.clone(),
            protected_data: protected,
        })
    }

    /// Mask-level protection. Cannot fail.
    pub fn mask(&self, value: &Value) -> PiiProtectionResult {
        let mut protected = value.clone();
        let mut applied = Vec::new();
        self.mask_value(&mut protected, &mut applied);
        PiiProtectionResult {
            is_protected: !applied.is_empty(),
            protection_applied: applied,
            original_data: value.clone(),
            protected_data: protected,
        }
    }

    /// Mask-level copy of `value`, safe to log.
    pub fn create_pii_safe_copy(&self, value: &Value) -> Value {
        self.mask(value).protected_data
    }

    /// Reverses one `enc:` token produced by [`ProtectionLevel::Encrypt`].
    pub fn decrypt_token(&self, token: &str) -> Result<String, ProtectionError> {
        let encoded = token
            .strip_prefix(ENCRYPTED_PREFIX)
            .ok_or_else(|| ProtectionError::InvalidToken("missing enc: prefix".to_string()))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| ProtectionError::InvalidToken(e.to_string()))?;
        if bytes.len() < NONCE_LEN + TAG_LEN {
            return Err(ProtectionError::InvalidToken("token too short".to_string()));
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);

        let cipher = Aes256Gcm::new_from_slice(self.keys.encryption())
            .map_err(|e| ProtectionError::InvalidKey(e.to_string()))?;
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| ProtectionError::InvalidToken("authentication failed".to_string()))?;

        String::from_utf8(plaintext).map_err(|e| ProtectionError::InvalidToken(e.to_string()))
    }

    fn protect_value(
        &self,
        value: &mut Value,
        level: ProtectionLevel,
        applied: &mut Vec<String>,
    ) -> Result<(), ProtectionError> {
        match value {
            Value::Null | Value::Bool(_) | Value::Number(_) => Ok(()),
            Value::String(text) => {
                let spans = self.scanner.spans(text);
                if spans.is_empty() {
                    return Ok(());
                }
                let mut out = String::with_capacity(text.len());
                let mut cursor = 0;
                for span in &spans {
                    out.push_str(&text[cursor..span.start]);
                    out.push_str(&self.transform(&text[span.start..span.end], span.pii_type, level)?);
                    cursor = span.end;
                }
                out.push_str(&text[cursor..]);
                record_labels(&spans, level, applied);
                *text = out;
                Ok(())
            }
            Value::Array(items) => items
                .iter_mut()
                .try_for_each(|item| self.protect_value(item, level, applied)),
            Value::Object(fields) => fields
                .values_mut()
                .try_for_each(|field| self.protect_value(field, level, applied)),
        }
    }

    fn mask_value(&self, value: &mut Value, applied: &mut Vec<String>) {
        match value {
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
            Value::String(text) => {
                let spans = self.scanner.spans(text);
                if spans.is_empty() {
                    return;
                }
                let mut out = String::with_capacity(text.len());
                let mut cursor = 0;
                for span in &spans {
                    out.push_str(&text[cursor..span.start]);
                    out.push_str(span.pii_type.mask_token());
                    cursor = span.end;
                }
                out.push_str(&text[cursor..]);
                record_labels(&spans, ProtectionLevel::Mask, applied);
                *text = out;
            }
            Value::Array(items) => items.iter_mut().for_each(|i| self.mask_value(i, applied)),
            Value::Object(fields) => fields.values_mut().for_each(|f| self.mask_value(f, applied)),
        }
    }

    fn transform(
        &self,
        matched: &str,
        pii_type: PiiType,
        level: ProtectionLevel,
    ) -> Result<String, ProtectionError> {
        match level {
            ProtectionLevel::Mask => Ok(pii_type.mask_token().to_string()),
            ProtectionLevel::Encrypt => self.encrypt(matched),
            ProtectionLevel::Tokenize => Ok(self.tokenize(matched)),
        }
    }

    fn encrypt(&self, plaintext: &str) -> Result<String, ProtectionError> {
        let cipher = Aes256Gcm::new_from_slice(self.keys.encryption())
            .map_err(|e| ProtectionError::InvalidKey(e.to_string()))?;

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| ProtectionError::Encryption)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(format!("{ENCRYPTED_PREFIX}{}", URL_SAFE_NO_PAD.encode(sealed)))
    }

    fn tokenize(&self, matched: &str) -> String {
        let hash = blake3::keyed_hash(self.keys.tokenization(), matched.as_bytes());
        let hex = hash.to_hex();
        format!("{TOKEN_PREFIX}{}", &hex[..16])
    }
}

/// Appends one label per type present in `spans`, in protection order,
/// skipping labels already recorded.
fn record_labels(spans: &[Span], level: ProtectionLevel, applied: &mut Vec<String>) {
    for pii_type in PiiType::PROTECTION_ORDER {
        if spans.iter().any(|s| s.pii_type == pii_type) {
            let label = format!("{}_{}", pii_type.label(), level.suffix());
            if !applied.contains(&label) {
                applied.push(label);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn protector() -> PiiProtector {
        PiiProtector::new(PiiScanner::new().unwrap(), ProtectionKeys::generate())
    }

    #[test]
    fn test_mask_phone() {
        let result = protector()
            .protect_pii(&json!({ "msg": "call 555-123-4567" }), ProtectionLevel::Mask)
            .unwrap();
        assert!(result.is_protected);
        assert_eq!(result.protected_data, json!({ "msg": "call [PHONE REDACTED]" }));
        assert_eq!(result.original_data, json!({ "msg": "call 555-123-4567" }));
        assert!(result.protection_applied.contains(&"phone_masked".to_string()));
    }

    #[test]
    fn test_mask_every_type() {
        let input = json!({
            "email": "jane@example.com",
            "card": "4111 1111 1111 1111",
            "ssn": "123-45-6789",
            "postcode": "SW1A 1AA",
            "list": ["555-123-4567"]
        });
        let result = protector().mask(&input);
        assert_eq!(
            result.protected_data,
            json!({
                "email": "[EMAIL REDACTED]",
                "card": "[CARD REDACTED]",
                "ssn": "[SSN REDACTED]",
                "postcode": "[POSTCODE REDACTED]",
                "list": ["[PHONE REDACTED]"]
            })
        );
        assert_eq!(result.protection_applied.len(), 5);
    }

    #[test]
    fn test_mask_adjacent_card_and_phone_leaves_no_digits() {
        let result = protector().mask(&json!({ "msg": "pay 1234 5678 9012 3456 555-123-4567 today" }));
        let masked = result.protected_data["msg"].as_str().unwrap();
        assert_eq!(masked, "pay [CARD REDACTED] today");
        assert!(!masked.chars().any(|c| c.is_ascii_digit()));
        assert_eq!(result.protection_applied, vec!["credit_card_masked"]);
    }

    #[test]
    fn test_clean_value_untouched() {
        let input = json!({ "name": "Jane", "age": 41 });
        let result = protector().protect_pii(&input, ProtectionLevel::Encrypt).unwrap();
        assert!(!result.is_protected);
        assert!(result.protection_applied.is_empty());
        assert_eq!(result.protected_data, input);
    }

    #[test]
    fn test_encrypt_roundtrip() {
        let p = protector();
        let result = p
            .protect_pii(&json!("mail jane@example.com now"), ProtectionLevel::Encrypt)
            .unwrap();
        assert_eq!(result.protection_applied, vec!["email_encrypted"]);

        let text = result.protected_data.as_str().unwrap();
        assert!(!text.contains("jane@example.com"));
        let token = text
            .split_whitespace()
            .find(|w| w.starts_with(ENCRYPTED_PREFIX))
            .unwrap();
        assert_eq!(p.decrypt_token(token).unwrap(), "jane@example.com");
    }

    #[test]
    fn test_decrypt_rejects_tampering() {
        let p = protector();
        let result = p.protect_pii(&json!("123-45-6789"), ProtectionLevel::Encrypt).unwrap();
        let token = result.protected_data.as_str().unwrap().to_string();

        let other = protector();
        assert!(matches!(
            other.decrypt_token(&token),
            Err(ProtectionError::InvalidToken(_))
        ));
        assert!(p.decrypt_token("tok_0011223344556677").is_err());
        assert!(p.decrypt_token("enc:AAAA").is_err());
    }

    #[test]
    fn test_tokenize_is_deterministic_per_key() {
        let p = protector();
        let a = p.protect_pii(&json!("123-45-6789"), ProtectionLevel::Tokenize).unwrap();
        let b = p.protect_pii(&json!("123-45-6789"), ProtectionLevel::Tokenize).unwrap();
        assert_eq!(a.protected_data, b.protected_data);
        assert_eq!(a.protection_applied, vec!["ssn_tokenized"]);

        let token = a.protected_data.as_str().unwrap();
        assert!(token.starts_with(TOKEN_PREFIX));
        assert_eq!(token.len(), 20);

        let c = protector()
            .protect_pii(&json!("123-45-6789"), ProtectionLevel::Tokenize)
            .unwrap();
        assert_ne!(a.protected_data, c.protected_data);
    }

    #[test]
    fn test_pii_safe_copy() {
        let p = protector();
        let copy = p.create_pii_safe_copy(&json!({ "who": "jane@example.com" }));
        assert_eq!(copy, json!({ "who": "[EMAIL REDACTED]" }));
    }

    proptest! {
        #[test]
        fn prop_masked_output_has_no_pii(
            local in "[a-z]{1,8}",
            digits in "[0-9]{3}",
            filler in "[a-z ]{0,12}",
        ) {
            let p = protector();
            let text = format!("{filler} {local}@example.com {digits}-45-6789 555-{digits}-4567");
            let masked = p.mask(&json!(text)).protected_data;
            prop_assert!(!p.scanner().detect_pii(&masked).has_pii);
            // Masking is idempotent.
            prop_assert_eq!(p.mask(&masked).protected_data, masked);
        }
    }
}
