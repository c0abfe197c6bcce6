// crates/tenant-gate-core/src/runtime/resolver.rs
// ============================================================================
// Module: Override Resolver
// Description: Resolution of time-boxed limit overrides with safety caps.
// Purpose: Turn raw override records into at-most-one capped override per limit.
// Dependencies: crate::core, time
// ============================================================================

//! ## Overview
//! The override resolver is pure logic over caller-supplied records and an
//! explicit `as_of` instant. It enforces no-stacking (first record per limit
//! in caller priority order wins), applies the optional time window, and
//! clamps every effective value to a configured safety cap regardless of the
//! requested magnitude. All time comparisons are normalized to UTC first.
//!
//! Invariants:
//! - At most one resolved override per limit.
//! - `effective_value` never exceeds the cap configured for the limit.
//! - Records outside their window are excluded, not deactivated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use time::OffsetDateTime;
use time::UtcOffset;

use crate::core::LimitId;
use crate::core::OverrideRecord;
use crate::core::OverrideStatus;
use crate::core::ResolvedOverride;
use crate::core::TenantId;

// ============================================================================
// SECTION: Safety Caps
// ============================================================================

/// Safety-cap configuration for override resolution.
///
/// # Invariants
/// - `default_value_cap` applies to every limit without a per-limit cap.
/// - `max_active_per_tenant` bounds tenant-wide ACTIVE records, independent
///   of per-limit stacking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideCaps {
    /// Cap applied when no per-limit cap is configured.
    pub default_value_cap: u64,
    /// Per-limit value caps.
    pub value_caps: BTreeMap<LimitId, u64>,
    /// Ceiling of ACTIVE overrides per tenant before flagging abuse.
    pub max_active_per_tenant: usize,
}

impl OverrideCaps {
    /// Returns the cap for a limit.
    #[must_use]
    pub fn cap_for(&self, limit_id: &LimitId) -> u64 {
        self.value_caps.get(limit_id).copied().unwrap_or(self.default_value_cap)
    }
}

// ============================================================================
// SECTION: Override Resolver
// ============================================================================

/// Resolves time-boxed limit overrides under safety caps.
#[derive(Debug, Clone)]
pub struct OverrideResolver {
    /// Safety-cap configuration.
    caps: OverrideCaps,
}

impl OverrideResolver {
    /// Creates a resolver with the provided caps.
    #[must_use]
    pub const fn new(caps: OverrideCaps) -> Self {
        Self {
            caps,
        }
    }

    /// Returns the configured caps.
    #[must_use]
    pub const fn caps(&self) -> &OverrideCaps {
        &self.caps
    }

    /// Resolves override records at an instant.
    ///
    /// Records are considered in caller-supplied order; within a limit the
    /// first ACTIVE record wins regardless of what follows. Callers must pass
    /// a deterministic priority order; the canonical key is
    /// most-recently-approved-first, available via [`Self::priority_order`].
    #[must_use]
    pub fn resolve(
        &self,
        records: &[OverrideRecord],
        as_of: OffsetDateTime,
    ) -> BTreeMap<LimitId, ResolvedOverride> {
        let as_of = as_of.to_offset(UtcOffset::UTC);
        let mut resolved = BTreeMap::new();
        let mut claimed: Vec<&LimitId> = Vec::new();

        for record in records {
            if record.status != OverrideStatus::Active {
                continue;
            }
            if claimed.contains(&&record.limit_id) {
                continue;
            }
            // First ACTIVE record claims the limit even if its window fails;
            // a shadowed record must not resurface through an expired winner.
            claimed.push(&record.limit_id);

            if !window_contains(record, as_of) {
                continue;
            }

            let remaining_seconds = record
                .expires_at
                .map(|expiry| (expiry.to_offset(UtcOffset::UTC) - as_of).whole_seconds());
            let effective_value = record.override_value.min(self.caps.cap_for(&record.limit_id));
            resolved.insert(record.limit_id.clone(), ResolvedOverride {
                record: record.clone(),
                effective_value,
                is_active: true,
                remaining_seconds,
            });
        }

        resolved
    }

    /// Resolves the override for a single limit, when one is active.
    #[must_use]
    pub fn resolve_for_limit(
        &self,
        records: &[OverrideRecord],
        limit_id: &LimitId,
        as_of: OffsetDateTime,
    ) -> Option<ResolvedOverride> {
        self.resolve(records, as_of).remove(limit_id)
    }

    /// Flags tenant-wide override stacking abuse.
    ///
    /// Counts ACTIVE records belonging to the tenant and returns true at or
    /// above `max_active_per_tenant`. Independent of per-limit no-stacking.
    #[must_use]
    pub fn check_stacking_abuse(
        tenant_id: &TenantId,
        records: &[OverrideRecord],
        max_active_per_tenant: usize,
    ) -> bool {
        let active = records
            .iter()
            .filter(|record| {
                record.status == OverrideStatus::Active && &record.tenant_id == tenant_id
            })
            .count();
        active >= max_active_per_tenant
    }

    /// Returns the effective limit given a base value and a resolved override.
    #[must_use]
    pub fn compute_effective_limit(base: u64, resolved: Option<&ResolvedOverride>) -> u64 {
        match resolved {
            Some(resolved) if resolved.is_active => resolved.effective_value,
            _ => base,
        }
    }

    /// Sorts records into the canonical resolution priority order.
    ///
    /// Most-recently-approved records come first; records without an approval
    /// timestamp sort last. The sort is stable so equal keys keep their
    /// incoming relative order.
    #[must_use]
    pub fn priority_order(mut records: Vec<OverrideRecord>) -> Vec<OverrideRecord> {
        records.sort_by(|a, b| b.approved_at.cmp(&a.approved_at));
        records
    }
}

// ============================================================================
// SECTION: Window Test
// ============================================================================

/// Returns true when `as_of` falls inside the record's window.
///
/// Both bounds are optional; the start is inclusive and the expiry exclusive.
fn window_contains(record: &OverrideRecord, as_of: OffsetDateTime) -> bool {
    if let Some(starts_at) = record.starts_at
        && as_of < starts_at.to_offset(UtcOffset::UTC)
    {
        return false;
    }
    if let Some(expires_at) = record.expires_at
        && as_of >= expires_at.to_offset(UtcOffset::UTC)
    {
        return false;
    }
    true
}
