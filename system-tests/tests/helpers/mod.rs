// system-tests/tests/helpers/mod.rs
// ============================================================================
// Module: System Test Helpers
// Description: Server spawning and stub providers for admission tests.
// Purpose: Run the full middleware chain against a local listener.
// ============================================================================

//! ## Overview
//! Helpers spawn an axum server wired with the admission pipeline, a
//! header-driven identity shim standing in for upstream authentication, and
//! scenario-configurable stub providers.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use async_trait::async_trait;
use axum::Json;
use axum::Router;
use axum::extract::Request;
use axum::middleware;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use serde_json::json;
use tenant_gate_config::AdmissionConfig;
use tenant_gate_core::BillingState;
use tenant_gate_core::InMemoryTenantStateStore;
use tenant_gate_core::LifecycleStatus;
use tenant_gate_core::LimitId;
use tenant_gate_core::OnboardingState;
use tenant_gate_core::OperationKind;
use tenant_gate_core::OverrideRecord;
use tenant_gate_core::PlanId;
use tenant_gate_core::ProtectionDecision;
use tenant_gate_core::ProtectionResult;
use tenant_gate_core::TenantId;
use tenant_gate_core::interfaces::BillingError;
use tenant_gate_core::interfaces::BillingProvider;
use tenant_gate_core::interfaces::OnboardingError;
use tenant_gate_core::interfaces::OnboardingProvider;
use tenant_gate_core::interfaces::ProtectionError;
use tenant_gate_core::interfaces::ProtectionProvider;
use tenant_gate_http::AdmissionPipeline;
use tenant_gate_http::TenantIdentity;
use tenant_gate_http::health_router;
use tenant_gate_http::with_admission;

/// Header carrying the simulated authenticated tenant.
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Scenario configuration for a spawned server.
pub struct Scenario {
    /// Tenant seeded into the lifecycle store.
    pub tenant_id: &'static str,
    /// Seeded lifecycle status.
    pub status: LifecycleStatus,
    /// Decision returned by the protection stub.
    pub protection: ProtectionDecision,
    /// Billing state returned by the billing stub.
    pub billing: BillingState,
    /// Onboarding state returned by the onboarding stub.
    pub onboarding: OnboardingState,
}

impl Scenario {
    /// Baseline scenario: active tenant, allowing providers.
    pub fn active() -> Self {
        Self {
            tenant_id: "tenant-1",
            status: LifecycleStatus::Active,
            protection: ProtectionDecision::Allow,
            billing: BillingState::Active,
            onboarding: OnboardingState::Complete,
        }
    }
}

/// Protection stub returning a fixed decision.
struct FixedProtection {
    /// Decision to return.
    decision: ProtectionDecision,
}

#[async_trait]
impl ProtectionProvider for FixedProtection {
    async fn combined_check(
        &self,
        _tenant_id: &TenantId,
        _operation: OperationKind,
        _endpoint: &str,
    ) -> Result<ProtectionResult, ProtectionError> {
        Ok(ProtectionResult {
            decision: self.decision,
            dimension: "requests_per_minute".to_string(),
            retry_after_ms: None,
        })
    }
}

/// Billing stub returning a fixed profile.
struct FixedBilling {
    /// Billing state to return.
    state: BillingState,
}

#[async_trait]
impl BillingProvider for FixedBilling {
    async fn billing_state(&self, _tenant_id: &TenantId) -> Result<BillingState, BillingError> {
        Ok(self.state)
    }

    async fn plan(&self, _tenant_id: &TenantId) -> Result<PlanId, BillingError> {
        Ok(PlanId::new("pro"))
    }

    async fn limits(&self, _tenant_id: &TenantId) -> Result<BTreeMap<LimitId, u64>, BillingError> {
        Ok(BTreeMap::new())
    }

    async fn limit_overrides(
        &self,
        _tenant_id: &TenantId,
    ) -> Result<Vec<OverrideRecord>, BillingError> {
        Ok(Vec::new())
    }
}

/// Onboarding stub returning a fixed state.
struct FixedOnboarding {
    /// State to return.
    state: OnboardingState,
}

#[async_trait]
impl OnboardingProvider for FixedOnboarding {
    async fn onboarding_state(
        &self,
        _tenant_id: &TenantId,
    ) -> Result<OnboardingState, OnboardingError> {
        Ok(self.state)
    }
}

/// Identity shim standing in for upstream authentication.
async fn attach_identity(mut request: Request, next: Next) -> Response {
    let tenant = request
        .headers()
        .get(TENANT_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(TenantId::new);
    if let Some(tenant_id) = tenant {
        request.extensions_mut().insert(TenantIdentity::new(tenant_id));
    }
    next.run(request).await
}

/// Demo business handler behind the gates.
async fn handle_projects() -> Response {
    Json(json!({"projects": []})).into_response()
}

/// Demo SDK execution handler behind the gates.
async fn handle_invoke() -> Response {
    Json(json!({"invoked": true})).into_response()
}

/// Spawns a server for the scenario and returns its base URL.
pub async fn spawn_server(scenario: Scenario) -> String {
    let store = InMemoryTenantStateStore::new();
    store.seed(TenantId::new(scenario.tenant_id), scenario.status).unwrap();

    let pipeline = AdmissionPipeline::builder(AdmissionConfig::default())
        .store(store)
        .protection(FixedProtection {
            decision: scenario.protection,
        })
        .billing(FixedBilling {
            state: scenario.billing,
        })
        .onboarding(FixedOnboarding {
            state: scenario.onboarding,
        })
        .build()
        .unwrap();

    let routes = Router::new()
        .route("/v1/projects", get(handle_projects).post(handle_projects))
        .route("/v1/invoke", post(handle_invoke))
        .merge(health_router());
    let app = with_admission(routes, std::sync::Arc::new(pipeline))
        .layer(middleware::from_fn(attach_identity));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}
