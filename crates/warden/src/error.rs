//! Error types for kernel construction and PII operations.

use thiserror::Error;
use warden_compliance::ProtectionError;
use warden_config::ConfigError;
use warden_types::AuthorizationError;

/// Result type for Warden facade operations.
pub type Result<T> = std::result::Result<T, WardenError>;

/// Errors raised by the facade.
///
/// Authorization denials keep their own type, [`AuthorizationError`], on
/// every gate method; this enum only wraps them where a single call can
/// fail in more than one way.
#[derive(Debug, Error)]
pub enum WardenError {
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    #[error("PII protection error: {0}")]
    Protection(#[from] ProtectionError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl WardenError {
    /// Stable code of the underlying denial, if this is one.
    pub fn denial_code(&self) -> Option<&'static str> {
        match self {
            WardenError::Authorization(e) => Some(e.code()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denial_code() {
        let denied = WardenError::from(AuthorizationError::SessionInvalid);
        assert_eq!(denied.denial_code(), Some("session_invalid"));

        let config = WardenError::from(ConfigError::ValidationError("x".to_string()));
        assert_eq!(config.denial_code(), None);
    }
}
