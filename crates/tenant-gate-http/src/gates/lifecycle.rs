// crates/tenant-gate-http/src/gates/lifecycle.rs
// ============================================================================
// Module: Lifecycle Gate
// Description: Request-boundary enforcement of tenant lifecycle capabilities.
// Purpose: Block execution, write, and read traffic per the capability table.
// Dependencies: tenant-gate-core, tenant-gate-config, crate::{audit, context, responses}
// ============================================================================

//! ## Overview
//! The lifecycle gate reads the tenant's status once per request (no
//! cross-request cache) and enforces the derived capability flags in order:
//! execution paths first, then write verbs, then read verbs. A tenant with
//! no lifecycle record resolves to `ACTIVE`: upstream authentication has
//! already validated the request, and blocking on a missing record would
//! punish traffic for a tenant-resolution gap. Every block records a
//! structured audit event and blocks purely via the response.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::http::Method;
use tenant_gate_config::PathPolicyConfig;
use tenant_gate_core::LifecycleStatus;
use tenant_gate_core::TenantId;
use tenant_gate_core::capabilities_for;
use tenant_gate_core::interfaces::TenantStateStore;

use crate::audit::AdmissionAuditSink;
use crate::audit::LifecycleBlockEvent;
use crate::audit::ProviderFailureEvent;
use crate::context::is_write_verb;
use crate::responses::AdmissionBlock;
use crate::responses::LifecycleBlock;

// ============================================================================
// SECTION: Lifecycle Gate
// ============================================================================

/// Request-boundary lifecycle capability check.
pub struct LifecycleGate {
    /// Store holding authoritative tenant status.
    store: Arc<dyn TenantStateStore>,
    /// Path classification policy.
    paths: PathPolicyConfig,
    /// Audit sink for block events.
    audit: Arc<dyn AdmissionAuditSink>,
}

impl LifecycleGate {
    /// Creates a lifecycle gate.
    #[must_use]
    pub fn new(
        store: Arc<dyn TenantStateStore>,
        paths: PathPolicyConfig,
        audit: Arc<dyn AdmissionAuditSink>,
    ) -> Self {
        Self {
            store,
            paths,
            audit,
        }
    }

    /// Checks a request against the tenant's lifecycle capabilities.
    ///
    /// The pipeline has already handled the exempt-path and missing-identity
    /// bypasses; this gate always has a tenant to check.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionBlock::Lifecycle`] when the state disallows the
    /// request. Store failures are fail-open: the read is audited and the
    /// request proceeds.
    pub async fn check(
        &self,
        tenant_id: &TenantId,
        method: &Method,
        path: &str,
    ) -> Result<(), AdmissionBlock> {
        let status = match self.store.fetch_status(tenant_id).await {
            Ok(Some(status)) => status,
            // Unknown tenant resolves to ACTIVE; see module overview.
            Ok(None) => LifecycleStatus::INITIAL,
            Err(error) => {
                self.audit.record_provider_failure(&ProviderFailureEvent::new(
                    Some(tenant_id.clone()),
                    "lifecycle_store",
                    "fail_open",
                    error.to_string(),
                ));
                return Ok(());
            }
        };

        let capabilities = capabilities_for(status);

        let (message, allowed_states) = if self.paths.is_execution(path) {
            if capabilities.sdk_execution {
                return Ok(());
            }
            (
                format!("state {status} does not permit SDK execution"),
                vec![LifecycleStatus::Active],
            )
        } else if is_write_verb(method) {
            if capabilities.writes {
                return Ok(());
            }
            (format!("state {status} does not permit writes"), vec![LifecycleStatus::Active])
        } else {
            if capabilities.reads {
                return Ok(());
            }
            (
                format!("state {status} does not permit reads"),
                vec![LifecycleStatus::Active, LifecycleStatus::Suspended],
            )
        };

        self.audit.record_lifecycle_block(&LifecycleBlockEvent::new(
            tenant_id.clone(),
            status,
            path,
            method.as_str(),
            allowed_states.clone(),
        ));
        Err(AdmissionBlock::Lifecycle(LifecycleBlock::new(status, message, allowed_states)))
    }
}
