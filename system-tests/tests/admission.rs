// system-tests/tests/admission.rs
// ============================================================================
// Module: Admission End-to-End Tests
// Description: Drive the full middleware chain over a local HTTP server.
// Purpose: Verify the blocked-response contracts end to end.
// ============================================================================

//! ## Overview
//! Spawns a server per scenario and exercises the admission pipeline through
//! real HTTP requests: exemptions, lifecycle read/write splits, protection
//! retry contracts, billing suspension, and onboarding exemption.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use serde_json::Value;
use serde_json::json;
use tenant_gate_core::BillingState;
use tenant_gate_core::LifecycleStatus;
use tenant_gate_core::OnboardingState;
use tenant_gate_core::ProtectionDecision;

mod helpers;

use helpers::Scenario;
use helpers::TENANT_HEADER;
use helpers::spawn_server;

/// Tests that the health probe passes unconditionally for a terminated tenant.
#[tokio::test]
async fn test_health_exempt_for_terminated_tenant() {
    let base = spawn_server(Scenario {
        status: LifecycleStatus::Terminated,
        ..Scenario::active()
    })
    .await;
    let response = reqwest::Client::new()
        .get(format!("{base}/health"))
        .header(TENANT_HEADER, "tenant-1")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

/// Tests the suspended read/write split end to end.
#[tokio::test]
async fn test_suspended_read_write_split() {
    let base = spawn_server(Scenario {
        status: LifecycleStatus::Suspended,
        ..Scenario::active()
    })
    .await;
    let client = reqwest::Client::new();

    let read = client
        .get(format!("{base}/v1/projects"))
        .header(TENANT_HEADER, "tenant-1")
        .send()
        .await
        .unwrap();
    assert_eq!(read.status(), 200);

    let write = client
        .post(format!("{base}/v1/projects"))
        .header(TENANT_HEADER, "tenant-1")
        .send()
        .await
        .unwrap();
    assert_eq!(write.status(), 403);
    let body: Value = write.json().await.unwrap();
    assert_eq!(body["error"], "lifecycle_blocked");
    assert_eq!(body["state"], "SUSPENDED");
    assert_eq!(body["allowed_states"], json!(["ACTIVE"]));
}

/// Tests that execution paths stay closed to suspended tenants.
#[tokio::test]
async fn test_execution_path_closed_for_suspended() {
    let base = spawn_server(Scenario {
        status: LifecycleStatus::Suspended,
        ..Scenario::active()
    })
    .await;
    let response = reqwest::Client::new()
        .post(format!("{base}/v1/invoke"))
        .header(TENANT_HEADER, "tenant-1")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

/// Tests the 429 + Retry-After protection contract end to end.
#[tokio::test]
async fn test_protection_reject_contract() {
    let base = spawn_server(Scenario {
        protection: ProtectionDecision::Reject,
        ..Scenario::active()
    })
    .await;
    let response = reqwest::Client::new()
        .get(format!("{base}/v1/projects"))
        .header(TENANT_HEADER, "tenant-1")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 429);
    assert_eq!(
        response.headers().get("retry-after").and_then(|value| value.to_str().ok()),
        Some("60")
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "protection_rejected");
}

/// Tests the 503 protection throttle contract end to end.
#[tokio::test]
async fn test_protection_throttle_contract() {
    let base = spawn_server(Scenario {
        protection: ProtectionDecision::Throttle,
        ..Scenario::active()
    })
    .await;
    let response = reqwest::Client::new()
        .get(format!("{base}/v1/projects"))
        .header(TENANT_HEADER, "tenant-1")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 503);
    assert_eq!(
        response.headers().get("retry-after").and_then(|value| value.to_str().ok()),
        Some("1")
    );
}

/// Tests the 402 billing suspension contract end to end.
#[tokio::test]
async fn test_billing_suspended_contract() {
    let base = spawn_server(Scenario {
        billing: BillingState::Suspended,
        ..Scenario::active()
    })
    .await;
    let response = reqwest::Client::new()
        .get(format!("{base}/v1/projects"))
        .header(TENANT_HEADER, "tenant-1")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 402);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "billing_suspended");
    assert_eq!(body["billing_state"], "SUSPENDED");
    assert_eq!(body["next_action"], "contact_support");
}

/// Tests that onboarding tenants are admitted past rejecting providers.
#[tokio::test]
async fn test_onboarding_exemption_end_to_end() {
    let base = spawn_server(Scenario {
        protection: ProtectionDecision::Reject,
        billing: BillingState::Suspended,
        onboarding: OnboardingState::InProgress,
        ..Scenario::active()
    })
    .await;
    let response = reqwest::Client::new()
        .get(format!("{base}/v1/projects"))
        .header(TENANT_HEADER, "tenant-1")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

/// Tests that requests without an identity header pass through the gates.
#[tokio::test]
async fn test_missing_identity_passes_through() {
    let base = spawn_server(Scenario {
        status: LifecycleStatus::Terminated,
        ..Scenario::active()
    })
    .await;
    let response =
        reqwest::Client::new().get(format!("{base}/v1/projects")).send().await.unwrap();
    assert_eq!(response.status(), 200);
}
