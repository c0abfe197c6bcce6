// crates/tenant-gate-core/src/core/protection.rs
// ============================================================================
// Module: Protection Decision Types
// Description: Admission decisions and anomaly signals for abuse protection.
// Purpose: Provide the stable decision contract between providers and the gate.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Protection decisions are the contract between an abuse/rate provider and
//! the protection gate. The gate enforces decisions; it never implements the
//! counters or scoring behind them. Anomaly signals ride alongside decisions
//! for observability and must never feed back into enforcement.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Operation Classification
// ============================================================================

/// Operation classification used by protection checks.
///
/// # Invariants
/// - `GET` classifies as `Read`; every other method classifies as `Write`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Read-shaped operation.
    Read,
    /// Write-shaped operation.
    Write,
}

impl OperationKind {
    /// Returns the stable label for the operation kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Protection Decisions
// ============================================================================

/// Admission decision produced by the protection provider.
///
/// # Invariants
/// - Variants are stable and exhaustive for enforcement outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtectionDecision {
    /// Admit the request.
    Allow,
    /// Reject the request; retry after the stated delay.
    Reject,
    /// Throttle the request; retry sooner than a rejection.
    Throttle,
}

impl ProtectionDecision {
    /// Returns the stable label for the decision.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "ALLOW",
            Self::Reject => "REJECT",
            Self::Throttle => "THROTTLE",
        }
    }
}

impl fmt::Display for ProtectionDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Combined protection check result.
///
/// # Invariants
/// - `retry_after_ms` is advisory; the gate substitutes configured defaults
///   when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionResult {
    /// Admission decision.
    pub decision: ProtectionDecision,
    /// Dimension that produced the decision (for example `requests_per_minute`).
    pub dimension: String,
    /// Suggested retry delay in milliseconds.
    pub retry_after_ms: Option<u64>,
}

impl ProtectionResult {
    /// Builds an allow result with no dimension attribution.
    #[must_use]
    pub fn allow() -> Self {
        Self {
            decision: ProtectionDecision::Allow,
            dimension: String::new(),
            retry_after_ms: None,
        }
    }
}

// ============================================================================
// SECTION: Anomaly Signals
// ============================================================================

/// Observational anomaly signal emitted by the detector.
///
/// # Invariants
/// - Signals are observational only and never alter admission decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalySignal {
    /// Observed value in the detection window.
    pub observed: f64,
    /// Baseline value the observation deviates from.
    pub baseline: f64,
    /// Detection window label (for example `5m`).
    pub window: String,
}
