// crates/tenant-gate-http/src/gates/billing.rs
// ============================================================================
// Module: Billing Gate
// Description: Request-boundary billing applicability and limit enforcement.
// Purpose: Build per-request billing contexts and compare usage to limits.
// Dependencies: tenant-gate-core, tenant-gate-config, crate::{audit, responses}
// ============================================================================

//! ## Overview
//! Billing enforcement applies only once onboarding completes; before that,
//! the gate returns a neutral context whose usage check always passes.
//! Applicable contexts carry live state, plan, and limits plus overrides
//! resolved through the resolver at build time. Provider failures follow the
//! configured policy, fail-closed by default: admitting usage on a
//! failed billing read leaks revenue.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use tenant_gate_config::FailurePolicy;
use tenant_gate_core::BillingContext;
use tenant_gate_core::BillingState;
use tenant_gate_core::LimitId;
use tenant_gate_core::LimitViolation;
use tenant_gate_core::OnboardingState;
use tenant_gate_core::OverrideResolver;
use tenant_gate_core::TenantId;
use tenant_gate_core::interfaces::BillingError;
use tenant_gate_core::interfaces::BillingProvider;
use tenant_gate_core::interfaces::OnboardingProvider;
use time::OffsetDateTime;

use crate::audit::AdmissionAuditSink;
use crate::audit::BillingBlockEvent;
use crate::audit::ProviderFailureEvent;
use crate::responses::AdmissionBlock;
use crate::responses::BillingBlock;

// ============================================================================
// SECTION: Billing Gate
// ============================================================================

/// Request-boundary billing applicability and limit check.
pub struct BillingGate {
    /// Live billing state, plan, and limit lookups.
    provider: Arc<dyn BillingProvider>,
    /// Onboarding completion lookup.
    onboarding: Arc<dyn OnboardingProvider>,
    /// Override resolver with configured safety caps.
    resolver: OverrideResolver,
    /// Policy applied when the billing provider fails.
    failure_policy: FailurePolicy,
    /// Audit sink for block events.
    audit: Arc<dyn AdmissionAuditSink>,
}

impl BillingGate {
    /// Creates a billing gate.
    #[must_use]
    pub fn new(
        provider: Arc<dyn BillingProvider>,
        onboarding: Arc<dyn OnboardingProvider>,
        resolver: OverrideResolver,
        failure_policy: FailurePolicy,
        audit: Arc<dyn AdmissionAuditSink>,
    ) -> Self {
        Self {
            provider,
            onboarding,
            resolver,
            failure_policy,
            audit,
        }
    }

    /// Builds the per-request billing context for a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionBlock::Billing`] only when a provider read fails
    /// under the fail-closed policy; decision outcomes are carried in the
    /// context itself.
    pub async fn billing_context(
        &self,
        tenant_id: &TenantId,
    ) -> Result<BillingContext, AdmissionBlock> {
        if !self.onboarding_complete(tenant_id).await {
            return Ok(BillingContext::not_applicable());
        }

        let profile = self.resolve_profile(tenant_id).await;
        match profile {
            Ok(context) => Ok(context),
            Err(error) => {
                self.audit.record_provider_failure(&ProviderFailureEvent::new(
                    Some(tenant_id.clone()),
                    "billing_provider",
                    self.failure_policy.as_str(),
                    error.to_string(),
                ));
                match self.failure_policy {
                    // An unreadable billing account blocks usage until the
                    // read path recovers.
                    FailurePolicy::FailClosed => {
                        self.audit.record_billing_block(&BillingBlockEvent::new(
                            tenant_id.clone(),
                            BillingState::Suspended,
                        ));
                        Err(AdmissionBlock::Billing(BillingBlock::suspended(
                            BillingState::Suspended,
                        )))
                    }
                    FailurePolicy::FailOpen => Ok(BillingContext::not_applicable()),
                }
            }
        }
    }

    /// Requires usage to be allowed, blocking with 402 otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionBlock::Billing`] when the context does not permit
    /// usage.
    pub fn require_active(
        &self,
        tenant_id: &TenantId,
        context: &BillingContext,
    ) -> Result<(), AdmissionBlock> {
        if context.usage_allowed() {
            return Ok(());
        }
        self.audit.record_billing_block(&BillingBlockEvent::new(
            tenant_id.clone(),
            context.billing_state,
        ));
        Err(AdmissionBlock::Billing(BillingBlock::suspended(context.billing_state)))
    }

    /// Compares current usage against the effective limit.
    ///
    /// Returns `None` when billing is not applicable or the named limit is
    /// unset (unlimited). A violation is data for the caller, not a
    /// terminating response.
    #[must_use]
    pub fn check_limit(
        context: &BillingContext,
        limit_id: &LimitId,
        current_value: u64,
    ) -> Option<LimitViolation> {
        if !context.is_applicable {
            return None;
        }
        let base = *context.limits.get(limit_id)?;
        let effective =
            OverrideResolver::compute_effective_limit(base, context.overrides.get(limit_id));
        if current_value >= effective {
            return Some(LimitViolation {
                limit: limit_id.clone(),
                current_value,
                allowed_value: effective,
                plan: context.plan.clone(),
                billing_state: context.billing_state,
            });
        }
        None
    }

    /// Resolves the live billing profile into an applicable context.
    async fn resolve_profile(&self, tenant_id: &TenantId) -> Result<BillingContext, BillingError> {
        let billing_state = self.provider.billing_state(tenant_id).await?;
        let plan = self.provider.plan(tenant_id).await?;
        let limits = self.provider.limits(tenant_id).await?;
        let records = self.provider.limit_overrides(tenant_id).await?;
        let ordered = OverrideResolver::priority_order(records);
        let overrides = self.resolver.resolve(&ordered, OffsetDateTime::now_utc());
        Ok(BillingContext {
            billing_state,
            plan,
            limits,
            overrides,
            is_applicable: true,
        })
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
}
