// crates/tenant-gate-core/src/core/billing.rs
// ============================================================================
// Module: Billing Decision Types
// Description: Billing states, per-request contexts, and limit violations.
// Purpose: Provide the stable billing contract consumed by the billing gate.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Billing types carry the quota-enforcement contract: the billing state and
//! plan resolved for a tenant, the plan's named limits, and any resolved
//! overrides. Contexts are constructed fresh per request. A tenant whose
//! onboarding has not completed receives a neutral context that can never
//! block usage.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::LimitId;
use crate::core::identifiers::PlanId;
use crate::core::overrides::ResolvedOverride;

// ============================================================================
// SECTION: Billing State
// ============================================================================

/// Billing account state resolved from the billing provider.
///
/// # Invariants
/// - Variants are stable for serialization and response contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingState {
    /// Tenant is on an evaluation plan.
    Trial,
    /// Billing is current.
    Active,
    /// Payment is overdue; usage continues during dunning.
    PastDue,
    /// Billing is suspended; usage is blocked.
    Suspended,
}

impl BillingState {
    /// Returns the stable label for the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trial => "TRIAL",
            Self::Active => "ACTIVE",
            Self::PastDue => "PAST_DUE",
            Self::Suspended => "SUSPENDED",
        }
    }

    /// Returns true when the state permits usage.
    #[must_use]
    pub const fn permits_usage(self) -> bool {
        !matches!(self, Self::Suspended)
    }
}

impl fmt::Display for BillingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Billing Context
// ============================================================================

/// Plan identifier used for tenants without a resolved billing profile.
pub const DEFAULT_PLAN: &str = "default";

/// Per-request billing context.
///
/// # Invariants
/// - A non-applicable context (onboarding incomplete) always allows usage.
/// - Contexts are constructed fresh per request and discarded.
#[derive(Debug, Clone, Serialize)]
pub struct BillingContext {
    /// Billing state at read time.
    pub billing_state: BillingState,
    /// Plan the tenant is on.
    pub plan: PlanId,
    /// Named plan limits; an absent entry means unlimited.
    pub limits: BTreeMap<LimitId, u64>,
    /// Resolved limit overrides keyed by limit.
    pub overrides: BTreeMap<LimitId, ResolvedOverride>,
    /// Whether billing enforcement applies to the request.
    pub is_applicable: bool,
}

impl BillingContext {
    /// Builds the neutral context used while onboarding is incomplete.
    #[must_use]
    pub fn not_applicable() -> Self {
        Self {
            billing_state: BillingState::Trial,
            plan: PlanId::new(DEFAULT_PLAN),
            limits: BTreeMap::new(),
            overrides: BTreeMap::new(),
            is_applicable: false,
        }
    }

    /// Returns true when the context permits usage.
    ///
    /// Non-applicable contexts always permit usage; billing must never block
    /// a tenant that has not completed onboarding.
    #[must_use]
    pub const fn usage_allowed(&self) -> bool {
        if !self.is_applicable {
            return true;
        }
        self.billing_state.permits_usage()
    }
}

// ============================================================================
// SECTION: Limit Violations
// ============================================================================

/// Structured limit violation returned by `check_limit`.
///
/// # Invariants
/// - Violations are data for the caller, not terminating responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitViolation {
    /// Limit that was exceeded.
    pub limit: LimitId,
    /// Current usage value.
    pub current_value: u64,
    /// Effective allowed value after overrides.
    pub allowed_value: u64,
    /// Plan the tenant is on.
    pub plan: PlanId,
    /// Billing state at check time.
    pub billing_state: BillingState,
}
