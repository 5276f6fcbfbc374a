//! Security event emission.
//!
//! Gates report violations through a [`SecurityEventDispatcher`], which
//! mirrors each event to `tracing` and hands it to an optional
//! [`SecurityEventSink`] on a detached task. Delivery is best-effort:
//! failures are logged and discarded, never returned to the gate.
//!
//! The task runs on the runtime given to
//! [`SecurityEventDispatcher::with_runtime`], else on the caller's runtime.
//! Synchronous callers with neither get a background delivery thread that
//! owns a current-thread runtime and drains events in dispatch order.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use chrono::Utc;
//! use warden_compliance::audit::{MemorySink, SecurityEventDispatcher};
//! use warden_types::{OrgId, SecurityEventLogInput, Severity};
//!
//! let sink = Arc::new(MemorySink::new());
//! let dispatcher = SecurityEventDispatcher::new(Some(sink.clone()));
//!
//! // No runtime here, so the background delivery thread takes the event.
//! dispatcher.dispatch(SecurityEventLogInput::new(
//!     OrgId::random(),
//!     "security.cross-tenant-access-attempt",
//!     Severity::Critical,
//!     "denied",
//!     Utc::now(),
//! ));
//! for _ in 0..500 {
//!     if !sink.is_empty() {
//!         break;
//!     }
//!     std::thread::sleep(std::time::Duration::from_millis(2));
//! }
//! assert_eq!(sink.len(), 1);
//! ```

use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};
use warden_types::{AuthorizationContext, SecurityEventLogInput, Severity};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink unavailable: {0}")]
    Unavailable(String),

    #[error("event rejected: {0}")]
    Rejected(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Destination for security events.
#[async_trait]
pub trait SecurityEventSink: Send + Sync {
    async fn log_security_event(&self, event: SecurityEventLogInput) -> Result<(), SinkError>;
}

// ============================================================================
// Dispatcher
// ============================================================================

type Delivery = (Arc<dyn SecurityEventSink>, SecurityEventLogInput);

/// Fire-and-forget front of a [`SecurityEventSink`].
#[derive(Clone)]
pub struct SecurityEventDispatcher {
    sink: Option<Arc<dyn SecurityEventSink>>,
    enabled: bool,
    runtime: Option<Handle>,
    fallback: Arc<OnceLock<Option<DeliveryThread>>>,
}

impl SecurityEventDispatcher {
    pub fn new(sink: Option<Arc<dyn SecurityEventSink>>) -> Self {
        Self {
            sink,
            enabled: true,
            runtime: None,
            fallback: Arc::new(OnceLock::new()),
        }
    }

    /// Dispatcher with no sink. Events only reach `tracing`.
    pub fn disabled() -> Self {
        Self::new(None).with_enabled(false)
    }

    /// Delivers on `handle` instead of whatever runtime the caller is on.
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Turns sink delivery on or off. The tracing mirror is unaffected.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn has_sink(&self) -> bool {
        self.enabled && self.sink.is_some()
    }

    /// Emits `event` without waiting for delivery.
    ///
    /// The tracing mirror is written synchronously, so by the time this
    /// returns the event is recorded locally, ahead of whatever error the
    /// caller is about to raise.
    pub fn dispatch(&self, event: SecurityEventLogInput) {
        mirror_to_tracing(&event);

        if !self.enabled {
            return;
        }
        let Some(sink) = self.sink.clone() else {
            return;
        };

        if let Some(handle) = self.runtime.clone().or_else(|| Handle::try_current().ok()) {
            handle.spawn(deliver(sink, event));
            return;
        }

        match self.fallback.get_or_init(DeliveryThread::start) {
            Some(worker) => {
                if let Err(mpsc::SendError((_, event))) = worker.tx.send((sink, event)) {
                    warn!(
                        event_type = %event.event_type,
                        "Security event delivery thread stopped, event not delivered"
                    );
                }
            }
            None => warn!(
                event_type = %event.event_type,
                "No delivery runtime, security event not delivered to sink"
            ),
        }
    }
}

async fn deliver(sink: Arc<dyn SecurityEventSink>, event: SecurityEventLogInput) {
    let event_type = event.event_type.clone();
    if let Err(e) = sink.log_security_event(event).await {
        warn!(event_type = %event_type, error = %e, "Security event delivery failed");
    }
}

/// Sink delivery for callers outside any Tokio runtime.
///
/// The thread exits once every dispatcher clone sharing it is dropped.
struct DeliveryThread {
    tx: Sender<Delivery>,
}

impl DeliveryThread {
    fn start() -> Option<Self> {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(error = %e, "Failed to build security event delivery runtime");
                return None;
            }
        };
        let (tx, rx) = mpsc::channel::<Delivery>();
        let spawned = thread::Builder::new()
            .name("warden-audit".to_string())
            .spawn(move || {
                for (sink, event) in rx {
                    runtime.block_on(deliver(sink, event));
                }
            });
        match spawned {
            Ok(_) => {
                debug!("Security event delivery thread started");
                Some(Self { tx })
            }
            Err(e) => {
                warn!(error = %e, "Failed to start security event delivery thread");
                None
            }
        }
    }
}

impl Default for SecurityEventDispatcher {
    fn default() -> Self {
        Self::disabled()
    }
}

impl std::fmt::Debug for SecurityEventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityEventDispatcher")
            .field("has_sink", &self.sink.is_some())
            .field("enabled", &self.enabled)
            .field("runtime", &self.runtime.is_some())
            .finish()
    }
}

/// Event pre-filled from the acting context: user, client, clearance,
/// residency and correlation metadata.
pub fn context_event(
    context: &AuthorizationContext,
    event_type: &str,
    severity: Severity,
    description: impl Into<String>,
    occurred_at: DateTime<Utc>,
) -> SecurityEventLogInput {
    let mut event =
        SecurityEventLogInput::new(context.org_id, event_type, severity, description, occurred_at)
            .with_user(context.user_id)
            .with_client(context.ip_address.clone(), context.user_agent.clone())
            .with_classification(Some(context.data_classification))
            .with_residency(Some(context.data_residency.clone()));
    if let Some(correlation_id) = &context.correlation_id {
        event = event.with_metadata("correlationId", correlation_id.as_str());
    }
    if let Some(source) = &context.audit_source {
        event = event.with_metadata("auditSource", source.as_str());
    }
    event
}

fn mirror_to_tracing(event: &SecurityEventLogInput) {
    let org_id = event.org_id.to_string();
    let user_id = event.user_id.map(|u| u.to_string());
    match event.severity {
        Severity::Critical => error!(
            org_id = %org_id,
            user_id = ?user_id,
            event_type = %event.event_type,
            severity = %event.severity,
            "{}",
            event.description
        ),
        Severity::High => warn!(
            org_id = %org_id,
            user_id = ?user_id,
            event_type = %event.event_type,
            severity = %event.severity,
            "{}",
            event.description
        ),
        Severity::Medium => info!(
            org_id = %org_id,
            user_id = ?user_id,
            event_type = %event.event_type,
            severity = %event.severity,
            "{}",
            event.description
        ),
        Severity::Low => debug!(
            org_id = %org_id,
            user_id = ?user_id,
            event_type = %event.event_type,
            severity = %event.severity,
            "{}",
            event.description
        ),
    }
}

// ============================================================================
// In-memory sink
// ============================================================================

/// Append-only in-process sink.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<SecurityEventLogInput>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded event, in arrival order.
    pub fn events(&self) -> Vec<SecurityEventLogInput> {
        self.lock().clone()
    }

    /// Recorded events of one type.
    pub fn events_of_type(&self, event_type: &str) -> Vec<SecurityEventLogInput> {
        self.lock()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Exports every event as a JSON array.
    pub fn export_json(&self) -> Result<String, SinkError> {
        Ok(serde_json::to_string_pretty(&*self.lock())?)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SecurityEventLogInput>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SecurityEventSink for MemorySink {
    async fn log_security_event(&self, event: SecurityEventLogInput) -> Result<(), SinkError> {
        self.lock().push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use warden_types::{OrgId, RoleKey, UserId};

    struct FailingSink;

    #[async_trait]
    impl SecurityEventSink for FailingSink {
        async fn log_security_event(&self, _event: SecurityEventLogInput) -> Result<(), SinkError> {
            Err(SinkError::Unavailable("offline".to_string()))
        }
    }

    fn event(kind: &str) -> SecurityEventLogInput {
        SecurityEventLogInput::new(OrgId::random(), kind, Severity::High, "test", Utc::now())
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test]
    async fn test_dispatch_delivers_to_sink() {
        let sink = Arc::new(MemorySink::new());
        let dispatcher = SecurityEventDispatcher::new(Some(sink.clone()));

        dispatcher.dispatch(event("a"));
        dispatcher.dispatch(event("b"));
        settle().await;

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.events_of_type("b").len(), 1);
    }

    #[tokio::test]
    async fn test_failing_sink_is_swallowed() {
        let dispatcher = SecurityEventDispatcher::new(Some(Arc::new(FailingSink)));
        dispatcher.dispatch(event("a"));
        settle().await;
    }

    fn wait_for(sink: &MemorySink, count: usize) {
        for _ in 0..500 {
            if sink.len() >= count {
                return;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_delivers_without_runtime_in_order() {
        let sink = Arc::new(MemorySink::new());
        let dispatcher = SecurityEventDispatcher::new(Some(sink.clone()));

        dispatcher.dispatch(event("first"));
        dispatcher.clone().dispatch(event("second"));
        wait_for(&sink, 2);

        let kinds: Vec<_> = sink.events().into_iter().map(|e| e.event_type).collect();
        assert_eq!(kinds, ["first", "second"]);
    }

    #[test]
    fn test_failing_sink_without_runtime_is_swallowed() {
        let dispatcher = SecurityEventDispatcher::new(Some(Arc::new(FailingSink)));
        dispatcher.dispatch(event("a"));
        dispatcher.dispatch(event("b"));
    }

    #[test]
    fn test_injected_runtime_delivers() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let sink = Arc::new(MemorySink::new());
        let dispatcher =
            SecurityEventDispatcher::new(Some(sink.clone())).with_runtime(runtime.handle().clone());

        dispatcher.dispatch(event("a"));
        runtime.block_on(settle());
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_dispatcher_skips_sink() {
        let sink = Arc::new(MemorySink::new());
        let dispatcher = SecurityEventDispatcher::new(Some(sink.clone())).with_enabled(false);
        assert!(!dispatcher.has_sink());

        dispatcher.dispatch(event("a"));
        settle().await;
        assert!(sink.is_empty());
    }

    #[test]
    fn test_context_event_carries_context_fields() {
        let ctx = AuthorizationContext::new(OrgId::random(), UserId::random(), RoleKey::Manager)
            .with_ip_address("10.1.1.1")
            .with_correlation_id("req-9");
        let event = context_event(&ctx, "x", Severity::Low, "d", Utc::now());
        assert_eq!(event.user_id, Some(ctx.user_id));
        assert_eq!(event.ip_address.as_deref(), Some("10.1.1.1"));
        assert_eq!(event.metadata["correlationId"], "req-9");
        assert!(!event.metadata.contains_key("auditSource"));
    }

    #[tokio::test]
    async fn test_export_json() {
        let sink = MemorySink::new();
        sink.log_security_event(event("x")).await.unwrap();
        let json = sink.export_json().unwrap();
        assert!(json.contains("\"eventType\": \"x\""));
    }
}
