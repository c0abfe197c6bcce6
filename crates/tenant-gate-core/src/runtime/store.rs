// crates/tenant-gate-core/src/runtime/store.rs
// ============================================================================
// Module: In-Memory Tenant State Store
// Description: Simple in-memory tenant status store for tests and examples.
// Purpose: Provide a deterministic store implementation without external deps.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! This module provides a simple in-memory implementation of
//! [`TenantStateStore`] for tests and local composition. It is not intended
//! for production use; real deployments inject a store backed by their
//! lifecycle database.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::LifecycleStatus;
use crate::core::TenantId;
use crate::interfaces::StateStoreError;
use crate::interfaces::TenantStateStore;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory tenant state store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTenantStateStore {
    /// Status map protected by a mutex.
    statuses: Arc<Mutex<BTreeMap<TenantId, LifecycleStatus>>>,
}

impl InMemoryTenantStateStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            statuses: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Seeds a tenant at a status, replacing any existing record.
    ///
    /// # Errors
    ///
    /// Returns [`StateStoreError`] when the store mutex is poisoned.
    pub fn seed(
        &self,
        tenant_id: TenantId,
        status: LifecycleStatus,
    ) -> Result<(), StateStoreError> {
        self.statuses
            .lock()
            .map_err(|_| StateStoreError::Store("tenant state store mutex poisoned".to_string()))?
            .insert(tenant_id, status);
        Ok(())
    }
}

#[async_trait]
impl TenantStateStore for InMemoryTenantStateStore {
    async fn fetch_status(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<LifecycleStatus>, StateStoreError> {
        let guard = self
            .statuses
            .lock()
            .map_err(|_| StateStoreError::Store("tenant state store mutex poisoned".to_string()))?;
        Ok(guard.get(tenant_id).copied())
    }

    async fn update_status(
        &self,
        tenant_id: &TenantId,
        status: LifecycleStatus,
    ) -> Result<(), StateStoreError> {
        self.statuses
            .lock()
            .map_err(|_| StateStoreError::Store("tenant state store mutex poisoned".to_string()))?
            .insert(tenant_id.clone(), status);
        Ok(())
    }
}
