// crates/tenant-gate-core/src/runtime/engine.rs
// ============================================================================
// Module: Lifecycle Engine
// Description: Transition validation and snapshot reads over an injected store.
// Purpose: Apply the lifecycle state machine without owning the transaction.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The lifecycle engine is the only component that mutates tenant status, and
//! it does so by delegating the write to the injected [`TenantStateStore`].
//! The caller owns the transaction boundary: a successful result means the
//! write was staged, not committed. Validation failures (unknown tenant,
//! no-op transition, illegal edge) come back as
//! [`LifecycleTransitionResult`] values with `success == false`; only store
//! I/O surfaces as an `Err`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::LifecycleStateSnapshot;
use crate::core::LifecycleStatus;
use crate::core::LifecycleTransitionResult;
use crate::core::TenantId;
use crate::core::TransitionDenial;
use crate::core::lifecycle::validate_transition;
use crate::interfaces::StateStoreError;
use crate::interfaces::TenantStateStore;

// ============================================================================
// SECTION: Lifecycle Engine
// ============================================================================

/// Lifecycle state machine over an injected tenant state store.
pub struct LifecycleEngine<S> {
    /// Store holding authoritative tenant status.
    store: S,
}

impl<S: TenantStateStore> LifecycleEngine<S> {
    /// Creates an engine over the provided store.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self {
            store,
        }
    }

    /// Returns the injected store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Reads the tenant's current state as a derived snapshot.
    ///
    /// Returns `Ok(None)` when the tenant has no lifecycle record.
    ///
    /// # Errors
    ///
    /// Returns [`StateStoreError`] when the read fails.
    pub async fn get_state(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<LifecycleStateSnapshot>, StateStoreError> {
        let status = self.store.fetch_status(tenant_id).await?;
        Ok(status.map(|status| LifecycleStateSnapshot::derive(tenant_id.clone(), status)))
    }

    /// Attempts a lifecycle transition for a tenant.
    ///
    /// The result is always a value; `success == false` carries the denial.
    /// On success the new status has been staged in the store and the caller
    /// commits or rolls back.
    ///
    /// # Errors
    ///
    /// Returns [`StateStoreError`] only when the store read or staged write
    /// fails.
    pub async fn transition(
        &self,
        tenant_id: &TenantId,
        to_status: LifecycleStatus,
        actor: &str,
    ) -> Result<LifecycleTransitionResult, StateStoreError> {
        let Some(current) = self.store.fetch_status(tenant_id).await? else {
            return Ok(LifecycleTransitionResult::denied(
                tenant_id.clone(),
                None,
                to_status,
                actor,
                TransitionDenial::TenantNotFound,
            ));
        };

        if let Some(denial) = validate_transition(current, to_status) {
            return Ok(LifecycleTransitionResult::denied(
                tenant_id.clone(),
                Some(current),
                to_status,
                actor,
                denial,
            ));
        }

        self.store.update_status(tenant_id, to_status).await?;
        Ok(LifecycleTransitionResult::applied(tenant_id.clone(), current, to_status, actor))
    }
}
