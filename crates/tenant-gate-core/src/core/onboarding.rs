// crates/tenant-gate-core/src/core/onboarding.rs
// ============================================================================
// Module: Onboarding State
// Description: Tenant onboarding progression consumed by admission gates.
// Purpose: Define the completion gate before which enforcement is suspended.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Protection and billing enforcement apply only after a tenant's onboarding
//! reaches `COMPLETE`. The admission pipeline treats anything short of
//! completion as exempt so that enforcement can never strand a tenant
//! mid-onboarding.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Onboarding State
// ============================================================================

/// Tenant onboarding progression.
///
/// # Invariants
/// - `Complete` is terminal; providers never report a regression out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OnboardingState {
    /// Onboarding has not begun.
    NotStarted,
    /// Onboarding is underway.
    InProgress,
    /// Onboarding has finished; enforcement applies.
    Complete,
}

impl OnboardingState {
    /// Returns the stable label for the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "NOT_STARTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Complete => "COMPLETE",
        }
    }

    /// Returns true when enforcement applies to the tenant.
    #[must_use]
    pub const fn is_complete(self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl fmt::Display for OnboardingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
