// crates/tenant-gate-http/src/pipeline.rs
// ============================================================================
// Module: Admission Pipeline
// Description: Composition root and ordered middleware chain for admission.
// Purpose: Run exemption, lifecycle, protection, and billing checks in order.
// Dependencies: tenant-gate-core, tenant-gate-config, crate::{context, gates, responses}
// ============================================================================

//! ## Overview
//! The pipeline is the composition root: it owns the three gates and the
//! providers injected into them, and it is the single place where gate
//! ordering lives. A request flows exemption check → lifecycle → protection
//! → billing → handler; the first block short-circuits the remainder, so a
//! lifecycle-blocked request never touches the protection or billing
//! providers. Gates run in strict sequence within the request task and hold
//! no locks across provider awaits.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::Request;
use axum::extract::State;
use axum::http::Method;
use axum::middleware;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use serde_json::json;
use tenant_gate_config::AdmissionConfig;
use tenant_gate_core::BillingContext;
use tenant_gate_core::OverrideResolver;
use tenant_gate_core::TenantId;
use tenant_gate_core::interfaces::BillingProvider;
use tenant_gate_core::interfaces::OnboardingProvider;
use tenant_gate_core::interfaces::ProtectionProvider;
use tenant_gate_core::interfaces::TenantStateStore;
use thiserror::Error;

use crate::audit::AdmissionAuditSink;
use crate::audit::NoopAuditSink;
use crate::context::TenantIdentity;
use crate::gates::BillingGate;
use crate::gates::LifecycleGate;
use crate::gates::ProtectionGate;
use crate::responses::AdmissionBlock;

// ============================================================================
// SECTION: Pass Outcome
// ============================================================================

/// Successful admission outcome handed to the handler.
///
/// # Invariants
/// - `billing` is `None` exactly for exempt or identity-less requests.
#[derive(Debug, Clone)]
pub struct AdmissionPass {
    /// Whether the request matched an exempt path prefix.
    pub exempt: bool,
    /// Whether protection/billing were bypassed for an onboarding tenant.
    pub onboarding_exempt: bool,
    /// Billing context for the handler, when one was built.
    pub billing: Option<BillingContext>,
}

impl AdmissionPass {
    /// Builds the pass used for exempt or identity-less requests.
    #[must_use]
    const fn bypass(exempt: bool) -> Self {
        Self {
            exempt,
            onboarding_exempt: false,
            billing: None,
        }
    }
}

// ============================================================================
// SECTION: Admission Pipeline
// ============================================================================

/// Composition root running the ordered admission gates.
pub struct AdmissionPipeline {
    /// Validated admission configuration.
    config: AdmissionConfig,
    /// Lifecycle capability gate.
    lifecycle: LifecycleGate,
    /// Abuse/rate protection gate.
    protection: ProtectionGate,
    /// Billing applicability gate.
    billing: BillingGate,
}

impl AdmissionPipeline {
    /// Returns a builder for the pipeline.
    #[must_use]
    pub fn builder(config: AdmissionConfig) -> AdmissionPipelineBuilder {
        AdmissionPipelineBuilder {
            config,
            store: None,
            protection: None,
            billing: None,
            onboarding: None,
            audit: None,
        }
    }

    /// Returns the validated configuration.
    #[must_use]
    pub const fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Returns the billing gate for handler-side limit checks.
    #[must_use]
    pub const fn billing_gate(&self) -> &BillingGate {
        &self.billing
    }

    /// Evaluates the admission gates for a request.
    ///
    /// Gates run in strict order and the first block short-circuits the
    /// remainder.
    ///
    /// # Errors
    ///
    /// Returns the blocking [`AdmissionBlock`] when any gate rejects.
    pub async fn evaluate(
        &self,
        method: &Method,
        path: &str,
        tenant_id: Option<&TenantId>,
    ) -> Result<AdmissionPass, AdmissionBlock> {
        if self.config.paths.is_exempt(path) {
            return Ok(AdmissionPass::bypass(true));
        }
        let Some(tenant_id) = tenant_id else {
            // No identity attached: authentication upstream owns that gap.
            return Ok(AdmissionPass::bypass(false));
        };

        self.lifecycle.check(tenant_id, method, path).await?;
        let protection = self.protection.check(tenant_id, method, path).await?;
        let billing = self.billing.billing_context(tenant_id).await?;
        self.billing.require_active(tenant_id, &billing)?;

        Ok(AdmissionPass {
            exempt: false,
            onboarding_exempt: protection.onboarding_exempt,
            billing: Some(billing),
        })
    }
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builder wiring providers into the admission pipeline.
///
/// # Invariants
/// - `build` succeeds only when every provider is configured.
pub struct AdmissionPipelineBuilder {
    /// Validated admission configuration.
    config: AdmissionConfig,
    /// Tenant lifecycle state store.
    store: Option<Arc<dyn TenantStateStore>>,
    /// Abuse/rate protection provider.
    protection: Option<Arc<dyn ProtectionProvider>>,
    /// Billing provider.
    billing: Option<Arc<dyn BillingProvider>>,
    /// Onboarding state provider.
    onboarding: Option<Arc<dyn OnboardingProvider>>,
    /// Audit sink; defaults to a no-op sink.
    audit: Option<Arc<dyn AdmissionAuditSink>>,
}

impl AdmissionPipelineBuilder {
    /// Sets the tenant state store.
    #[must_use]
    pub fn store(mut self, store: impl TenantStateStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Sets the protection provider.
    #[must_use]
    pub fn protection(mut self, provider: impl ProtectionProvider + 'static) -> Self {
        self.protection = Some(Arc::new(provider));
        self
    }

    /// Sets the billing provider.
    #[must_use]
    pub fn billing(mut self, provider: impl BillingProvider + 'static) -> Self {
        self.billing = Some(Arc::new(provider));
        self
    }

    /// Sets the onboarding provider.
    #[must_use]
    pub fn onboarding(mut self, provider: impl OnboardingProvider + 'static) -> Self {
        self.onboarding = Some(Arc::new(provider));
        self
    }

    /// Sets the audit sink.
    #[must_use]
    pub fn audit(mut self, sink: impl AdmissionAuditSink + 'static) -> Self {
        self.audit = Some(Arc::new(sink));
        self
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineBuildError`] when a required provider is missing.
    pub fn build(self) -> Result<AdmissionPipeline, PipelineBuildError> {
        let store = self.store.ok_or(PipelineBuildError::MissingStore)?;
        let protection = self.protection.ok_or(PipelineBuildError::MissingProtection)?;
        let billing = self.billing.ok_or(PipelineBuildError::MissingBilling)?;
        let onboarding = self.onboarding.ok_or(PipelineBuildError::MissingOnboarding)?;
        let audit = self.audit.unwrap_or_else(|| Arc::new(NoopAuditSink));

        let lifecycle =
            LifecycleGate::new(store, self.config.paths.clone(), Arc::clone(&audit));
        let protection_gate = ProtectionGate::new(
            protection,
            Arc::clone(&onboarding),
            self.config.protection.clone(),
            Arc::clone(&audit),
        );
        let billing_gate = BillingGate::new(
            billing,
            onboarding,
            OverrideResolver::new(self.config.overrides.to_caps()),
            self.config.billing.failure_policy,
            audit,
        );

        Ok(AdmissionPipeline {
            config: self.config,
            lifecycle,
            protection: protection_gate,
            billing: billing_gate,
        })
    }
}

// ============================================================================
// SECTION: Build Errors
// ============================================================================

/// Pipeline construction errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum PipelineBuildError {
    /// Tenant state store was not configured.
    #[error("pipeline requires a tenant state store")]
    MissingStore,
    /// Protection provider was not configured.
    #[error("pipeline requires a protection provider")]
    MissingProtection,
    /// Billing provider was not configured.
    #[error("pipeline requires a billing provider")]
    MissingBilling,
    /// Onboarding provider was not configured.
    #[error("pipeline requires an onboarding provider")]
    MissingOnboarding,
}

// ============================================================================
// SECTION: Middleware
// ============================================================================

/// Axum middleware running the admission pipeline before the handler.
///
/// On a pass, the billing context (when built) is inserted into the request
/// extensions for the handler; on a block, the gate's structured response is
/// returned and the handler never runs.
pub async fn admission_middleware(
    State(pipeline): State<Arc<AdmissionPipeline>>,
    mut request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let tenant_id = request
        .extensions()
        .get::<TenantIdentity>()
        .map(|identity| identity.tenant_id.clone());

    match pipeline.evaluate(&method, &path, tenant_id.as_ref()).await {
        Ok(pass) => {
            if let Some(billing) = pass.billing {
                request.extensions_mut().insert(billing);
            }
            next.run(request).await
        }
        Err(block) => block.into_response(),
    }
}

/// Wraps a router with the admission middleware.
#[must_use]
pub fn with_admission(router: Router, pipeline: Arc<AdmissionPipeline>) -> Router {
    router.layer(middleware::from_fn_with_state(pipeline, admission_middleware))
}

/// Returns a router exposing the health probe.
#[must_use]
pub fn health_router() -> Router {
    Router::new().route("/health", get(handle_health))
}

/// Handles the health probe.
async fn handle_health() -> Response {
    Json(json!({"status": "ok"})).into_response()
}
