//! PII compliance gate.
//!
//! Detects PII in a payload, checks the acting context may handle it, and
//! sanitizes elevated-classification writes. The payload is taken by value
//! and handed back, possibly replaced; the caller writes what it gets back.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};
use warden_types::{
    AuthResult, AuthorizationContext, AuthorizationError, ClassificationLevel, Clock, Operation,
    Severity,
};

use super::protector::PiiProtector;
use crate::audit::{SecurityEventDispatcher, context_event};

pub const PII_ACCESS_DENIED_EVENT: &str = "security.pii-access-denied";

/// Why `context` may not perform `operation` on PII, if it may not.
///
/// The context needs a `pii:*` action on some resource. SECRET and
/// TOP_SECRET reads additionally need verified MFA.
pub fn pii_access_denial(context: &AuthorizationContext, operation: Operation) -> Option<String> {
    if !context.has_pii_scope() {
        return Some("no pii:* permission granted".to_string());
    }
    if operation == Operation::Read
        && context.data_classification.is_elevated()
        && !context.mfa_verified
    {
        return Some(format!(
            "MFA required to read PII at {}",
            context.data_classification
        ));
    }
    None
}

/// Gate for operations whose payload may contain PII.
pub struct PiiComplianceGate {
    protector: Arc<PiiProtector>,
    dispatcher: SecurityEventDispatcher,
    clock: Arc<dyn Clock>,
    sanitize_elevated_writes: bool,
}

impl PiiComplianceGate {
    pub fn new(
        protector: Arc<PiiProtector>,
        dispatcher: SecurityEventDispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            protector,
            dispatcher,
            clock,
            sanitize_elevated_writes: true,
        }
    }

    /// Turns write auto-masking on or off.
    pub fn with_sanitize_elevated_writes(mut self, enabled: bool) -> Self {
        self.sanitize_elevated_writes = enabled;
        self
    }

    pub fn protector(&self) -> &PiiProtector {
        &self.protector
    }

    /// Checks `data` against `context` for `operation`.
    ///
    /// Returns the payload to use: `data` unchanged, or for writes above
    /// OFFICIAL, a mask-protected replacement.
    pub fn assert_pii_compliance(
        &self,
        context: &AuthorizationContext,
        data: Value,
        operation: Operation,
    ) -> AuthResult<Value> {
        let detection = self.protector.scanner().detect_pii(&data);
        if !detection.has_pii {
            return Ok(data);
        }

        let pii_context = context.marked_for_pii_access();
        if let Some(reason) = pii_access_denial(&pii_context, operation) {
            let types: Vec<&str> = detection.pii_types.iter().map(|t| t.label()).collect();
            self.dispatcher.dispatch(
                context_event(
                    &pii_context,
                    PII_ACCESS_DENIED_EVENT,
                    Severity::High,
                    format!("PII {operation} denied: {reason}"),
                    self.clock.now(),
                )
                .with_metadata("operation", operation.as_str())
                .with_metadata("piiTypes", types)
                .with_metadata("locations", detection.locations.clone()),
            );
            return Err(AuthorizationError::PiiAccessDenied { reason });
        }

        if operation == Operation::Write
            && self.sanitize_elevated_writes
            && context.data_classification != ClassificationLevel::Official
        {
            let masked = self.protector.mask(&data);
            info!(
                org_id = %context.org_id,
                user_id = %context.user_id,
                classification = %context.data_classification,
                applied = ?masked.protection_applied,
                "PII auto-masked on elevated write"
            );
            return Ok(masked.protected_data);
        }

        debug!(
            org_id = %context.org_id,
            operation = %operation,
            locations = ?detection.locations,
            "PII access permitted"
        );
        Ok(data)
    }

    /// Mask-level copy of `data`, safe to log.
    pub fn create_pii_safe_copy(&self, data: &Value) -> Value {
        self.protector.create_pii_safe_copy(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemorySink;
    use crate::pii::{PiiScanner, ProtectionKeys};
    use chrono::Utc;
    use serde_json::json;
    use std::time::Duration;
    use warden_types::{
        Action, FixedClock, OrgId, PermissionMap, ResourceType, RoleKey, UserId,
    };

    fn gate_with(sink: Option<Arc<MemorySink>>) -> PiiComplianceGate {
        let protector = PiiProtector::new(PiiScanner::new().unwrap(), ProtectionKeys::generate());
        let dispatcher = SecurityEventDispatcher::new(
            sink.map(|s| s as Arc<dyn crate::audit::SecurityEventSink>),
        );
        PiiComplianceGate::new(
            Arc::new(protector),
            dispatcher,
            Arc::new(FixedClock::new(Utc::now())),
        )
    }

    fn context(pii: bool, level: ClassificationLevel, mfa: bool) -> AuthorizationContext {
        let mut permissions =
            PermissionMap::new().with(ResourceType::EmployeeProfile, [Action::Read]);
        if pii {
            permissions.grant(ResourceType::EmployeeProfile, Action::PiiRead);
        }
        AuthorizationContext::new(OrgId::random(), UserId::random(), RoleKey::HrAdmin)
            .with_permissions(permissions)
            .with_classification(level)
            .with_mfa_verified(mfa)
    }

    #[test]
    fn test_clean_payload_passes_without_scope() {
        let gate = gate_with(None);
        let ctx = context(false, ClassificationLevel::Official, false);
        let data = json!({ "note": "quarterly review" });
        assert_eq!(gate.assert_pii_compliance(&ctx, data.clone(), Operation::Read).unwrap(), data);
    }

    #[tokio::test]
    async fn test_pii_without_scope_denied_and_logged() {
        let sink = Arc::new(MemorySink::new());
        let gate = gate_with(Some(sink.clone()));
        let ctx = context(false, ClassificationLevel::Official, false);

        let err = gate
            .assert_pii_compliance(&ctx, json!({ "ssn": "123-45-6789" }), Operation::Read)
            .unwrap_err();
        assert!(matches!(err, AuthorizationError::PiiAccessDenied { .. }));

        tokio::time::sleep(Duration::from_millis(10)).await;
        let events = sink.events_of_type(PII_ACCESS_DENIED_EVENT);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].metadata["locations"], json!(["ssn"]));
    }

    #[test]
    fn test_secret_read_requires_mfa() {
        let gate = gate_with(None);
        let data = json!({ "email": "jane@example.com" });

        let no_mfa = context(true, ClassificationLevel::Secret, false);
        assert!(gate.assert_pii_compliance(&no_mfa, data.clone(), Operation::Read).is_err());

        let mfa = context(true, ClassificationLevel::Secret, true);
        assert_eq!(
            gate.assert_pii_compliance(&mfa, data.clone(), Operation::Read).unwrap(),
            data
        );

        // Writes at SECRET do not need MFA at this gate.
        assert!(gate.assert_pii_compliance(&no_mfa, data, Operation::Write).is_ok());
    }

    #[test]
    fn test_elevated_write_is_masked() {
        let gate = gate_with(None);
        let ctx = context(true, ClassificationLevel::OfficialSensitive, false);
        let data = json!({ "phone": "555-123-4567", "name": "Jane" });

        let out = gate.assert_pii_compliance(&ctx, data, Operation::Write).unwrap();
        assert_eq!(out, json!({ "phone": "[PHONE REDACTED]", "name": "Jane" }));
    }

    #[test]
    fn test_official_write_and_update_keep_plain_text() {
        let gate = gate_with(None);
        let data = json!({ "phone": "555-123-4567" });

        let official = context(true, ClassificationLevel::Official, false);
        assert_eq!(
            gate.assert_pii_compliance(&official, data.clone(), Operation::Write).unwrap(),
            data
        );

        let secret = context(true, ClassificationLevel::Secret, false);
        assert_eq!(
            gate.assert_pii_compliance(&secret, data.clone(), Operation::Update).unwrap(),
            data
        );
    }

    #[test]
    fn test_sanitizing_can_be_disabled() {
        let gate = gate_with(None).with_sanitize_elevated_writes(false);
        let ctx = context(true, ClassificationLevel::TopSecret, true);
        let data = json!({ "phone": "555-123-4567" });
        assert_eq!(gate.assert_pii_compliance(&ctx, data.clone(), Operation::Write).unwrap(), data);
    }
}
