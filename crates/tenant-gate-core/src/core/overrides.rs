// crates/tenant-gate-core/src/core/overrides.rs
// ============================================================================
// Module: Limit Override Records
// Description: Time-boxed manual limit overrides and their resolved forms.
// Purpose: Provide the override vocabulary consumed by the resolver and billing gate.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Override records are created by an out-of-band approval workflow and read
//! here as untrusted input: the resolver re-checks status and time windows on
//! every request and clamps values to a configured safety cap. Records expire
//! or are cancelled; they are never hard-deleted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::core::identifiers::LimitId;
use crate::core::identifiers::TenantId;

// ============================================================================
// SECTION: Override Status
// ============================================================================

/// Approval-workflow status of an override record.
///
/// # Invariants
/// - Only `Active` records participate in resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverrideStatus {
    /// Awaiting approval.
    Pending,
    /// Approved and eligible within its window.
    Active,
    /// Window elapsed.
    Expired,
    /// Withdrawn before or during its window.
    Cancelled,
}

impl OverrideStatus {
    /// Returns the stable label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
            Self::Expired => "EXPIRED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OverrideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Override Records
// ============================================================================

/// Time-boxed manual adjustment to a quota limit.
///
/// # Invariants
/// - `starts_at`/`expires_at` bounds are each optional; comparisons happen in UTC.
/// - `approved_at` orders records for no-stacking resolution (most recent first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRecord {
    /// Limit the override adjusts.
    pub limit_id: LimitId,
    /// Tenant the override applies to.
    pub tenant_id: TenantId,
    /// Limit value before the override.
    pub original_value: u64,
    /// Requested override value (clamped at resolution time).
    pub override_value: u64,
    /// Approval-workflow status.
    pub status: OverrideStatus,
    /// Approval timestamp used for priority ordering.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub approved_at: Option<OffsetDateTime>,
    /// Inclusive window start; absent means effective immediately.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub starts_at: Option<OffsetDateTime>,
    /// Exclusive window end; absent means no expiry.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
}

/// Override record enriched with resolution outcome.
///
/// # Invariants
/// - `effective_value` never exceeds the safety cap configured for the limit.
/// - `remaining_seconds` is present exactly when the record carries an expiry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedOverride {
    /// Underlying override record.
    pub record: OverrideRecord,
    /// Cap-clamped value to enforce instead of the base limit.
    pub effective_value: u64,
    /// Whether the override is active at the resolution instant.
    pub is_active: bool,
    /// Seconds until expiry, when an expiry exists.
    pub remaining_seconds: Option<i64>,
}
