// crates/tenant-gate-http/src/audit.rs
// ============================================================================
// Module: Admission Audit Logging
// Description: Structured audit events for admission gate decisions.
// Purpose: Emit block and anomaly events without hard dependencies.
// Dependencies: tenant-gate-core, serde
// ============================================================================

//! ## Overview
//! This module defines audit event payloads and sinks for admission gate
//! logging. It is intentionally lightweight so deployments can route events
//! to their preferred logging pipeline without redesign. Gates record every
//! block, every anomaly observation, and every provider failure; none of
//! these records affect the admission decision.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;
use tenant_gate_core::AnomalySignal;
use tenant_gate_core::BillingState;
use tenant_gate_core::LifecycleStatus;
use tenant_gate_core::OperationKind;
use tenant_gate_core::ProtectionDecision;
use tenant_gate_core::TenantId;

// ============================================================================
// SECTION: Event Payloads
// ============================================================================

/// Returns the current wall-clock time as epoch milliseconds.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

/// Lifecycle gate block event payload.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleBlockEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Tenant whose request was blocked.
    pub tenant_id: TenantId,
    /// Lifecycle state at block time.
    pub state: LifecycleStatus,
    /// Request path.
    pub path: String,
    /// Request method.
    pub method: String,
    /// States that would have admitted the request.
    pub allowed_states: Vec<LifecycleStatus>,
}

impl LifecycleBlockEvent {
    /// Creates a new lifecycle block event with a consistent timestamp.
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        state: LifecycleStatus,
        path: impl Into<String>,
        method: impl Into<String>,
        allowed_states: Vec<LifecycleStatus>,
    ) -> Self {
        Self {
            event: "lifecycle_block",
            timestamp_ms: now_ms(),
            tenant_id,
            state,
            path: path.into(),
            method: method.into(),
            allowed_states,
        }
    }
}

/// Protection gate block event payload.
#[derive(Debug, Clone, Serialize)]
pub struct ProtectionBlockEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Tenant whose request was blocked.
    pub tenant_id: TenantId,
    /// Enforced decision (`REJECT` or `THROTTLE`).
    pub action: ProtectionDecision,
    /// Dimension that produced the decision.
    pub dimension: String,
    /// Request endpoint.
    pub endpoint: String,
    /// Operation classification.
    pub operation: OperationKind,
    /// Retry delay communicated to the caller, in milliseconds.
    pub retry_after_ms: u64,
    /// Anomaly payload observed alongside the decision, when any.
    pub anomaly: Option<AnomalySignal>,
}

impl ProtectionBlockEvent {
    /// Creates a new protection block event with a consistent timestamp.
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        action: ProtectionDecision,
        dimension: impl Into<String>,
        endpoint: impl Into<String>,
        operation: OperationKind,
        retry_after_ms: u64,
        anomaly: Option<AnomalySignal>,
    ) -> Self {
        Self {
            event: "protection_block",
            timestamp_ms: now_ms(),
            tenant_id,
            action,
            dimension: dimension.into(),
            endpoint: endpoint.into(),
            operation,
            retry_after_ms,
            anomaly,
        }
    }
}

/// Billing gate block event payload.
#[derive(Debug, Clone, Serialize)]
pub struct BillingBlockEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Tenant whose request was blocked.
    pub tenant_id: TenantId,
    /// Billing state at block time.
    pub billing_state: BillingState,
    /// Suggested next action for the caller.
    pub next_action: &'static str,
}

impl BillingBlockEvent {
    /// Creates a new billing block event with a consistent timestamp.
    #[must_use]
    pub fn new(tenant_id: TenantId, billing_state: BillingState) -> Self {
        Self {
            event: "billing_block",
            timestamp_ms: now_ms(),
            tenant_id,
            billing_state,
            next_action: "contact_support",
        }
    }
}

/// Anomaly observation event payload.
#[derive(Debug, Clone, Serialize)]
pub struct AnomalyEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Tenant the anomaly was observed for.
    pub tenant_id: TenantId,
    /// Request endpoint.
    pub endpoint: String,
    /// Observed signal.
    pub signal: AnomalySignal,
}

impl AnomalyEvent {
    /// Creates a new anomaly event with a consistent timestamp.
    #[must_use]
    pub fn new(tenant_id: TenantId, endpoint: impl Into<String>, signal: AnomalySignal) -> Self {
        Self {
            event: "anomaly_observed",
            timestamp_ms: now_ms(),
            tenant_id,
            endpoint: endpoint.into(),
            signal,
        }
    }
}

/// Provider infrastructure failure event payload.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderFailureEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Tenant the failed read was for, when known.
    pub tenant_id: Option<TenantId>,
    /// Component label (for example `billing_provider`).
    pub component: &'static str,
    /// Failure policy that was applied.
    pub policy: &'static str,
    /// Failure detail.
    pub detail: String,
}

impl ProviderFailureEvent {
    /// Creates a new provider failure event with a consistent timestamp.
    #[must_use]
    pub fn new(
        tenant_id: Option<TenantId>,
        component: &'static str,
        policy: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            event: "provider_failure",
            timestamp_ms: now_ms(),
            tenant_id,
            component,
            policy,
            detail: detail.into(),
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for admission gate events.
pub trait AdmissionAuditSink: Send + Sync {
    /// Records a lifecycle block.
    fn record_lifecycle_block(&self, _event: &LifecycleBlockEvent) {}

    /// Records a protection block.
    fn record_protection_block(&self, _event: &ProtectionBlockEvent) {}

    /// Records a billing block.
    fn record_billing_block(&self, _event: &BillingBlockEvent) {}

    /// Records an anomaly observation.
    fn record_anomaly(&self, _event: &AnomalyEvent) {}

    /// Records a provider infrastructure failure.
    fn record_provider_failure(&self, _event: &ProviderFailureEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl StderrAuditSink {
    /// Writes one serialized event line to stderr.
    fn write(event: &impl Serialize) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

impl AdmissionAuditSink for StderrAuditSink {
    fn record_lifecycle_block(&self, event: &LifecycleBlockEvent) {
        Self::write(event);
    }

    fn record_protection_block(&self, event: &ProtectionBlockEvent) {
        Self::write(event);
    }

    fn record_billing_block(&self, event: &BillingBlockEvent) {
        Self::write(event);
    }

    fn record_anomaly(&self, event: &AnomalyEvent) {
        Self::write(event);
    }

    fn record_provider_failure(&self, event: &ProviderFailureEvent) {
        Self::write(event);
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Writes one serialized event line to the file.
    fn write(&self, event: &impl Serialize) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl AdmissionAuditSink for FileAuditSink {
    fn record_lifecycle_block(&self, event: &LifecycleBlockEvent) {
        self.write(event);
    }

    fn record_protection_block(&self, event: &ProtectionBlockEvent) {
        self.write(event);
    }

    fn record_billing_block(&self, event: &BillingBlockEvent) {
        self.write(event);
    }

    fn record_anomaly(&self, event: &AnomalyEvent) {
        self.write(event);
    }

    fn record_provider_failure(&self, event: &ProviderFailureEvent) {
        self.write(event);
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AdmissionAuditSink for NoopAuditSink {}
