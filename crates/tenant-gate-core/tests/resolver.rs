// crates/tenant-gate-core/tests/resolver.rs
// ============================================================================
// Module: Override Resolver Tests
// Description: Tests for no-stacking, time windows, caps, and abuse detection.
// ============================================================================
//! ## Overview
//! Validates that override resolution keeps one record per limit, honors
//! optional time windows in UTC, clamps values to safety caps, and flags
//! tenant-wide stacking abuse at exactly the configured ceiling.

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

use std::collections::BTreeMap;

use tenant_gate_core::LimitId;
use tenant_gate_core::OverrideCaps;
use tenant_gate_core::OverrideRecord;
use tenant_gate_core::OverrideResolver;
use tenant_gate_core::OverrideStatus;
use tenant_gate_core::TenantId;
use time::Duration;
use time::OffsetDateTime;
use time::UtcOffset;
use time::macros::datetime;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

const AS_OF: OffsetDateTime = datetime!(2026-03-01 12:00:00 UTC);

fn record(limit: &str, value: u64, status: OverrideStatus) -> OverrideRecord {
    OverrideRecord {
        limit_id: LimitId::new(limit),
        tenant_id: TenantId::new("tenant-1"),
        original_value: 50,
        override_value: value,
        status,
        approved_at: None,
        starts_at: None,
        expires_at: None,
    }
}

fn resolver() -> OverrideResolver {
    OverrideResolver::new(OverrideCaps {
        default_value_cap: 1_000,
        value_caps: BTreeMap::new(),
        max_active_per_tenant: 5,
    })
}

// ============================================================================
// SECTION: No-Stacking
// ============================================================================

/// Tests that two active overrides for one limit resolve to one entry.
#[test]
fn test_no_stacking_first_seen_wins() {
    let records = vec![
        record("api_calls", 200, OverrideStatus::Active),
        record("api_calls", 900, OverrideStatus::Active),
    ];
    let resolved = resolver().resolve(&records, AS_OF);
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[&LimitId::new("api_calls")].effective_value, 200);
}

/// Tests that non-active records never participate in resolution.
#[test]
fn test_only_active_status_resolves() {
    let records = vec![
        record("api_calls", 200, OverrideStatus::Pending),
        record("api_calls", 300, OverrideStatus::Cancelled),
        record("api_calls", 400, OverrideStatus::Expired),
    ];
    assert!(resolver().resolve(&records, AS_OF).is_empty());
}

/// Tests that an out-of-window winner does not let a shadowed record through.
#[test]
fn test_expired_winner_shadows_followers() {
    let mut expired = record("api_calls", 200, OverrideStatus::Active);
    expired.expires_at = Some(AS_OF - Duration::hours(1));
    let records = vec![expired, record("api_calls", 900, OverrideStatus::Active)];
    assert!(resolver().resolve(&records, AS_OF).is_empty());
}

// ============================================================================
// SECTION: Time Windows
// ============================================================================

/// Tests exclusion of records whose expiry has passed.
#[test]
fn test_expired_record_excluded() {
    let mut rec = record("api_calls", 200, OverrideStatus::Active);
    rec.expires_at = Some(AS_OF - Duration::seconds(1));
    assert!(resolver().resolve(&[rec], AS_OF).is_empty());
}

/// Tests exclusion of records that have not started yet.
#[test]
fn test_future_start_excluded() {
    let mut rec = record("api_calls", 200, OverrideStatus::Active);
    rec.starts_at = Some(AS_OF + Duration::hours(1));
    assert!(resolver().resolve(&[rec], AS_OF).is_empty());
}

/// Tests that a record with no bounds is always active.
#[test]
fn test_unbounded_record_always_active() {
    let rec = record("api_calls", 200, OverrideStatus::Active);
    let resolved = resolver().resolve(&[rec], AS_OF);
    let entry = &resolved[&LimitId::new("api_calls")];
    assert!(entry.is_active);
    assert_eq!(entry.remaining_seconds, None);
}

/// Tests that the expiry bound is exclusive and the start inclusive.
#[test]
fn test_window_bound_semantics() {
    let mut rec = record("api_calls", 200, OverrideStatus::Active);
    rec.starts_at = Some(AS_OF);
    rec.expires_at = Some(AS_OF);
    // start == as_of is inside; expiry == as_of is outside.
    assert!(resolver().resolve(std::slice::from_ref(&rec), AS_OF).is_empty());

    rec.expires_at = Some(AS_OF + Duration::seconds(30));
    let resolved = resolver().resolve(&[rec], AS_OF);
    assert_eq!(resolved[&LimitId::new("api_calls")].remaining_seconds, Some(30));
}

/// Tests that offset timestamps are normalized before comparison.
#[test]
fn test_timezone_normalization() {
    let mut rec = record("api_calls", 200, OverrideStatus::Active);
    // 13:30 at +02:00 is 11:30 UTC, already past at the 12:00 UTC instant.
    rec.expires_at = Some(datetime!(2026-03-01 13:30:00 +02:00));
    assert!(resolver().resolve(std::slice::from_ref(&rec), AS_OF).is_empty());

    let shifted = AS_OF.to_offset(UtcOffset::from_hms(5, 0, 0).unwrap());
    rec.expires_at = Some(AS_OF + Duration::hours(1));
    let resolved = resolver().resolve(&[rec], shifted);
    assert_eq!(resolved[&LimitId::new("api_calls")].remaining_seconds, Some(3_600));
}

// ============================================================================
// SECTION: Safety Caps
// ============================================================================

/// Tests that resolved values clamp to the configured cap.
#[test]
fn test_cap_clamps_override_value() {
    let resolver = OverrideResolver::new(OverrideCaps {
        default_value_cap: 100,
        value_caps: BTreeMap::new(),
        max_active_per_tenant: 5,
    });
    let rec = record("plan_quota", 500, OverrideStatus::Active);
    let resolved = resolver.resolve(&[rec], AS_OF);
    assert_eq!(resolved[&LimitId::new("plan_quota")].effective_value, 100);
}

/// Tests that per-limit caps take precedence over the default cap.
#[test]
fn test_per_limit_cap_precedence() {
    let mut value_caps = BTreeMap::new();
    value_caps.insert(LimitId::new("api_calls"), 250_u64);
    let resolver = OverrideResolver::new(OverrideCaps {
        default_value_cap: 1_000,
        value_caps,
        max_active_per_tenant: 5,
    });
    let records = vec![
        record("api_calls", 900, OverrideStatus::Active),
        record("storage_gb", 900, OverrideStatus::Active),
    ];
    let resolved = resolver.resolve(&records, AS_OF);
    assert_eq!(resolved[&LimitId::new("api_calls")].effective_value, 250);
    assert_eq!(resolved[&LimitId::new("storage_gb")].effective_value, 900);
}

// ============================================================================
// SECTION: Effective Limits
// ============================================================================

/// Tests that the effective limit takes the override only when active.
#[test]
fn test_compute_effective_limit() {
    let resolved = resolver().resolve(&[record("api_calls", 200, OverrideStatus::Active)], AS_OF);
    let entry = resolved.get(&LimitId::new("api_calls"));
    assert_eq!(OverrideResolver::compute_effective_limit(50, entry), 200);
    assert_eq!(OverrideResolver::compute_effective_limit(50, None), 50);
}

/// Tests the single-limit convenience lookup.
#[test]
fn test_resolve_for_limit() {
    let records = vec![
        record("api_calls", 200, OverrideStatus::Active),
        record("storage_gb", 300, OverrideStatus::Active),
    ];
    let resolver = resolver();
    let entry = resolver.resolve_for_limit(&records, &LimitId::new("storage_gb"), AS_OF).unwrap();
    assert_eq!(entry.effective_value, 300);
    assert!(resolver.resolve_for_limit(&records, &LimitId::new("absent"), AS_OF).is_none());
}

// ============================================================================
// SECTION: Stacking Abuse
// ============================================================================

/// Tests the abuse flag boundary at exactly the configured ceiling.
#[test]
fn test_stacking_abuse_boundary() {
    let tenant = TenantId::new("tenant-1");
    let mut records: Vec<OverrideRecord> = (0..3)
        .map(|idx| record(&format!("limit-{idx}"), 100, OverrideStatus::Active))
        .collect();
    assert!(!OverrideResolver::check_stacking_abuse(&tenant, &records, 4));
    records.push(record("limit-3", 100, OverrideStatus::Active));
    assert!(OverrideResolver::check_stacking_abuse(&tenant, &records, 4));
}

/// Tests that other tenants' records do not count toward the ceiling.
#[test]
fn test_stacking_abuse_is_per_tenant() {
    let tenant = TenantId::new("tenant-1");
    let mut other = record("limit-a", 100, OverrideStatus::Active);
    other.tenant_id = TenantId::new("tenant-2");
    let records = vec![record("limit-a", 100, OverrideStatus::Active), other];
    assert!(!OverrideResolver::check_stacking_abuse(&tenant, &records, 2));
}

// ============================================================================
// SECTION: Priority Order
// ============================================================================

/// Tests the canonical most-recently-approved-first ordering.
#[test]
fn test_priority_order_most_recent_first() {
    let mut old = record("api_calls", 100, OverrideStatus::Active);
    old.approved_at = Some(AS_OF - Duration::days(3));
    let mut recent = record("api_calls", 200, OverrideStatus::Active);
    recent.approved_at = Some(AS_OF - Duration::days(1));
    let unapproved = record("api_calls", 300, OverrideStatus::Active);

    let ordered = OverrideResolver::priority_order(vec![old, unapproved, recent]);
    assert_eq!(ordered[0].override_value, 200);
    assert_eq!(ordered[1].override_value, 100);
    assert_eq!(ordered[2].override_value, 300);

    let resolved = resolver().resolve(&ordered, AS_OF);
    assert_eq!(resolved[&LimitId::new("api_calls")].effective_value, 200);
}
