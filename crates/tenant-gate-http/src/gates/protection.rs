// crates/tenant-gate-http/src/gates/protection.rs
// ============================================================================
// Module: Protection Gate
// Description: Request-boundary enforcement of abuse/rate decisions.
// Purpose: Enforce ALLOW/REJECT/THROTTLE and observe anomalies without blocking.
// Dependencies: tenant-gate-core, tenant-gate-config, crate::{audit, context, responses}
// ============================================================================

//! ## Overview
//! The protection gate delegates the admission decision to the injected
//! provider and enforces it: REJECT becomes a 429 with Retry-After, THROTTLE
//! a 503 with a shorter Retry-After. Tenants whose onboarding has not
//! completed short-circuit to ALLOW; protection must never affect
//! onboarding, even when the provider is configured to always reject.
//! Anomaly detection runs independently; its signals and failures are
//! audited and never change the decision.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::http::Method;
use tenant_gate_config::FailurePolicy;
use tenant_gate_config::ProtectionConfig;
use tenant_gate_core::AnomalySignal;
use tenant_gate_core::OnboardingState;
use tenant_gate_core::ProtectionDecision;
use tenant_gate_core::TenantId;
use tenant_gate_core::interfaces::OnboardingProvider;
use tenant_gate_core::interfaces::ProtectionProvider;

use crate::audit::AdmissionAuditSink;
use crate::audit::AnomalyEvent;
use crate::audit::ProtectionBlockEvent;
use crate::audit::ProviderFailureEvent;
use crate::context::protection_operation;
use crate::responses::AdmissionBlock;
use crate::responses::ProtectionBlock;

// ============================================================================
// SECTION: Gate Outcome
// ============================================================================

/// Successful protection gate outcome.
///
/// # Invariants
/// - `onboarding_exempt` marks contexts that bypassed enforcement because
///   onboarding is incomplete.
#[derive(Debug, Clone, Copy)]
pub struct ProtectionPass {
    /// Whether enforcement was bypassed for an onboarding tenant.
    pub onboarding_exempt: bool,
}

// ============================================================================
// SECTION: Protection Gate
// ============================================================================

/// Request-boundary abuse/rate protection check.
pub struct ProtectionGate {
    /// Combined check and anomaly detection provider.
    provider: Arc<dyn ProtectionProvider>,
    /// Onboarding completion lookup.
    onboarding: Arc<dyn OnboardingProvider>,
    /// Retry defaults and failure policy.
    config: ProtectionConfig,
    /// Audit sink for block and anomaly events.
    audit: Arc<dyn AdmissionAuditSink>,
}

impl ProtectionGate {
    /// Creates a protection gate.
    #[must_use]
    pub fn new(
        provider: Arc<dyn ProtectionProvider>,
        onboarding: Arc<dyn OnboardingProvider>,
        config: ProtectionConfig,
        audit: Arc<dyn AdmissionAuditSink>,
    ) -> Self {
        Self {
            provider,
            onboarding,
            config,
            audit,
        }
    }

    /// Checks a request against the protection provider's decision.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionBlock::Protection`] when the decision is REJECT or
    /// THROTTLE, or when the provider fails under a fail-closed policy.
    pub async fn check(
        &self,
        tenant_id: &TenantId,
        method: &Method,
        path: &str,
    ) -> Result<ProtectionPass, AdmissionBlock> {
        if !self.onboarding_complete(tenant_id).await {
            return Ok(ProtectionPass {
                onboarding_exempt: true,
            });
        }

        let operation = protection_operation(method);
        let result = match self.provider.combined_check(tenant_id, operation, path).await {
            Ok(result) => result,
            Err(error) => {
                self.audit.record_provider_failure(&ProviderFailureEvent::new(
                    Some(tenant_id.clone()),
                    "protection_provider",
                    self.config.failure_policy.as_str(),
                    error.to_string(),
                ));
                match self.config.failure_policy {
                    FailurePolicy::FailOpen => {
                        return Ok(ProtectionPass {
                            onboarding_exempt: false,
                        });
                    }
                    FailurePolicy::FailClosed => {
                        let retry_after_ms = self.config.reject_retry_after_ms;
                        return Err(AdmissionBlock::Protection(ProtectionBlock::rejected(
                            "provider_unavailable",
                            operation,
                            retry_after_ms,
                        )));
                    }
                }
            }
        };

        let anomaly = self.observe_anomaly(tenant_id, path).await;

        match result.decision {
            ProtectionDecision::Allow => Ok(ProtectionPass {
                onboarding_exempt: false,
            }),
            ProtectionDecision::Reject => {
                let retry_after_ms =
                    result.retry_after_ms.unwrap_or(self.config.reject_retry_after_ms);
                self.audit.record_protection_block(&ProtectionBlockEvent::new(
                    tenant_id.clone(),
                    ProtectionDecision::Reject,
                    result.dimension.clone(),
                    path,
                    operation,
                    retry_after_ms,
                    anomaly,
                ));
                Err(AdmissionBlock::Protection(ProtectionBlock::rejected(
                    result.dimension,
                    operation,
                    retry_after_ms,
                )))
            }
            ProtectionDecision::Throttle => {
                let retry_after_ms =
                    result.retry_after_ms.unwrap_or(self.config.throttle_retry_after_ms);
                self.audit.record_protection_block(&ProtectionBlockEvent::new(
                    tenant_id.clone(),
                    ProtectionDecision::Throttle,
                    result.dimension.clone(),
                    path,
                    operation,
                    retry_after_ms,
                    anomaly,
                ));
                Err(AdmissionBlock::Protection(ProtectionBlock::throttled(
                    result.dimension,
                    operation,
                    retry_after_ms,
                )))
            }
        }
    }

    /// Resolves onboarding completion, treating read failures as incomplete.
    async fn onboarding_complete(&self, tenant_id: &TenantId) -> bool {
        match self.onboarding.onboarding_state(tenant_id).await {
            Ok(state) => state.is_complete(),
            Err(error) => {
                self.audit.record_provider_failure(&ProviderFailureEvent::new(
                    Some(tenant_id.clone()),
                    "onboarding_provider",
                    "fail_open",
                    error.to_string(),
                ));
                OnboardingState::InProgress.is_complete()
            }
        }
    }

    /// Runs anomaly detection, recovering failures locally.
    async fn observe_anomaly(&self, tenant_id: &TenantId, path: &str) -> Option<AnomalySignal> {
        match self.provider.detect_anomaly(tenant_id, path).await {
            Ok(Some(signal)) => {
                self.audit.record_anomaly(&AnomalyEvent::new(
                    tenant_id.clone(),
                    path,
                    signal.clone(),
                ));
                Some(signal)
            }
            Ok(None) => None,
            Err(error) => {
                self.audit.record_provider_failure(&ProviderFailureEvent::new(
                    Some(tenant_id.clone()),
                    "anomaly_detector",
                    "fail_open",
                    error.to_string(),
                ));
                None
            }
        }
    }
}
