// crates/tenant-gate-http/src/context.rs
// ============================================================================
// Module: Request Classification
// Description: Tenant identity extension and method/path classification.
// Purpose: Bridge raw request metadata into the gate vocabulary.
// Dependencies: tenant-gate-core, axum
// ============================================================================

//! ## Overview
//! Upstream authentication attaches a [`TenantIdentity`] to the request
//! extensions; the admission pipeline only reads it. Requests without an
//! identity pass through; resolving one is authentication's responsibility,
//! not admission's. Method classification is split: the lifecycle gate
//! treats GET/HEAD/OPTIONS as reads, while the protection provider contract
//! classifies GET alone as a read.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::http::Method;
use tenant_gate_core::OperationKind;
use tenant_gate_core::TenantId;

// ============================================================================
// SECTION: Tenant Identity
// ============================================================================

/// Tenant identity attached to requests by upstream authentication.
///
/// # Invariants
/// - Presence means the request was authenticated; absence bypasses tenant
///   gates entirely.
#[derive(Debug, Clone)]
pub struct TenantIdentity {
    /// Authenticated tenant.
    pub tenant_id: TenantId,
}

impl TenantIdentity {
    /// Creates a new tenant identity.
    #[must_use]
    pub const fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
        }
    }
}

// ============================================================================
// SECTION: Method Classification
// ============================================================================

/// Returns true when the method is a write verb for lifecycle enforcement.
#[must_use]
pub fn is_write_verb(method: &Method) -> bool {
    !(*method == Method::GET || *method == Method::HEAD || *method == Method::OPTIONS)
}

/// Classifies a method for the protection provider contract.
///
/// GET is a read; every other method is a write.
#[must_use]
pub fn protection_operation(method: &Method) -> OperationKind {
    if *method == Method::GET {
        OperationKind::Read
    } else {
        OperationKind::Write
    }
}
