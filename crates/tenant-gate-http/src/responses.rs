// crates/tenant-gate-http/src/responses.rs
// ============================================================================
// Module: Blocked-Response Contracts
// Description: Typed response bodies and statuses for blocked requests.
// Purpose: Surface gate decisions as machine-readable responses, never panics.
// Dependencies: tenant-gate-core, axum, serde
// ============================================================================

//! ## Overview
//! Every blocked request carries enough structure for the caller to decide
//! how to proceed: lifecycle blocks name the admitting states, protection
//! blocks carry retry timing, and billing blocks name the next action. A 429
//! is not retryable until the stated delay elapses; a 503 is retryable
//! sooner; 403 and 402 require an out-of-band state change.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::RETRY_AFTER;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Serialize;
use tenant_gate_core::BillingState;
use tenant_gate_core::LifecycleStatus;
use tenant_gate_core::LimitViolation;
use tenant_gate_core::OperationKind;
use tenant_gate_core::ProtectionDecision;

// ============================================================================
// SECTION: Block Variants
// ============================================================================

/// Gate decision that blocks a request.
///
/// # Invariants
/// - Blocks are expected business results; conversion to a response never
///   fails.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AdmissionBlock {
    /// Lifecycle gate block (403).
    Lifecycle(LifecycleBlock),
    /// Protection gate block (429 or 503 + Retry-After).
    Protection(ProtectionBlock),
    /// Billing gate block (402).
    Billing(BillingBlock),
}

impl IntoResponse for AdmissionBlock {
    fn into_response(self) -> Response {
        match self {
            Self::Lifecycle(block) => block.into_response(),
            Self::Protection(block) => block.into_response(),
            Self::Billing(block) => block.into_response(),
        }
    }
}

// ============================================================================
// SECTION: Lifecycle Block
// ============================================================================

/// Lifecycle block response payload.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleBlock {
    /// Stable error identifier.
    pub error: &'static str,
    /// Lifecycle state that caused the block.
    pub state: LifecycleStatus,
    /// Human-readable explanation.
    pub message: String,
    /// States that would have admitted the request.
    pub allowed_states: Vec<LifecycleStatus>,
}

impl LifecycleBlock {
    /// Builds a lifecycle block payload.
    #[must_use]
    pub fn new(
        state: LifecycleStatus,
        message: impl Into<String>,
        allowed_states: Vec<LifecycleStatus>,
    ) -> Self {
        Self {
            error: "lifecycle_blocked",
            state,
            message: message.into(),
            allowed_states,
        }
    }
}

impl IntoResponse for LifecycleBlock {
    fn into_response(self) -> Response {
        (StatusCode::FORBIDDEN, Json(self)).into_response()
    }
}

// ============================================================================
// SECTION: Protection Block
// ============================================================================

/// Protection block response payload.
#[derive(Debug, Clone, Serialize)]
pub struct ProtectionBlock {
    /// Stable error identifier.
    pub error: &'static str,
    /// Enforced decision (`REJECT` or `THROTTLE`).
    #[serde(skip)]
    pub action: ProtectionDecision,
    /// Dimension that produced the decision.
    pub dimension: String,
    /// Operation classification.
    pub operation: OperationKind,
    /// Retry delay in milliseconds.
    pub retry_after_ms: u64,
}

impl ProtectionBlock {
    /// Builds a rejection block payload.
    #[must_use]
    pub fn rejected(
        dimension: impl Into<String>,
        operation: OperationKind,
        retry_after_ms: u64,
    ) -> Self {
        Self {
            error: "protection_rejected",
            action: ProtectionDecision::Reject,
            dimension: dimension.into(),
            operation,
            retry_after_ms,
        }
    }

    /// Builds a throttle block payload.
    #[must_use]
    pub fn throttled(
        dimension: impl Into<String>,
        operation: OperationKind,
        retry_after_ms: u64,
    ) -> Self {
        Self {
            error: "protection_throttled",
            action: ProtectionDecision::Throttle,
            dimension: dimension.into(),
            operation,
            retry_after_ms,
        }
    }

    /// Returns the response status for the enforced decision.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self.action {
            ProtectionDecision::Throttle => StatusCode::SERVICE_UNAVAILABLE,
            ProtectionDecision::Allow | ProtectionDecision::Reject => {
                StatusCode::TOO_MANY_REQUESTS
            }
        }
    }

    /// Returns the Retry-After header value in whole seconds, rounded up.
    #[must_use]
    pub const fn retry_after_seconds(&self) -> u64 {
        self.retry_after_ms.div_ceil(1_000)
    }
}

impl IntoResponse for ProtectionBlock {
    fn into_response(self) -> Response {
        let status = self.status();
        let retry_after = self.retry_after_seconds();
        let mut response = (status, Json(self)).into_response();
        if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
            response.headers_mut().insert(RETRY_AFTER, value);
        }
        response
    }
}

// ============================================================================
// SECTION: Billing Block
// ============================================================================

/// Billing block response payload.
#[derive(Debug, Clone, Serialize)]
pub struct BillingBlock {
    /// Stable error identifier.
    pub error: &'static str,
    /// Billing state that caused the block.
    pub billing_state: BillingState,
    /// Suggested next action for the caller.
    pub next_action: &'static str,
}

impl BillingBlock {
    /// Builds a billing block payload.
    #[must_use]
    pub const fn suspended(billing_state: BillingState) -> Self {
        Self {
            error: "billing_suspended",
            billing_state,
            next_action: "contact_support",
        }
    }
}

impl IntoResponse for BillingBlock {
    fn into_response(self) -> Response {
        (StatusCode::PAYMENT_REQUIRED, Json(self)).into_response()
    }
}

// ============================================================================
// SECTION: Limit Violation Body
// ============================================================================

/// Limit violation body returned as data by handlers, not as a terminating
/// response.
#[derive(Debug, Clone, Serialize)]
pub struct LimitExceededBody {
    /// Stable error identifier.
    pub error: &'static str,
    /// Limit that was exceeded.
    pub limit: String,
    /// Current usage value.
    pub current_value: u64,
    /// Effective allowed value after overrides.
    pub allowed_value: u64,
    /// Plan the tenant is on.
    pub plan: String,
    /// Billing state at check time.
    pub billing_state: BillingState,
}

impl From<LimitViolation> for LimitExceededBody {
    fn from(violation: LimitViolation) -> Self {
        Self {
            error: "limit_exceeded",
            limit: violation.limit.to_string(),
            current_value: violation.current_value,
            allowed_value: violation.allowed_value,
            plan: violation.plan.to_string(),
            billing_state: violation.billing_state,
        }
    }
}
