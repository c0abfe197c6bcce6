// crates/tenant-gate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Tenant Gate Interfaces
// Description: Backend-agnostic interfaces for state, protection, and billing.
// Purpose: Define the collaborator surfaces consumed by the admission pipeline.
// Dependencies: crate::core, async-trait, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how Tenant Gate integrates with external systems without
//! embedding backend-specific details. Every store read or provider call is a
//! suspension point; implementations must not require locks held across
//! awaits. Decision outcomes are values: a provider returns `REJECT` as data,
//! and reserves `Err` for genuine infrastructure failures so that gates can
//! apply their configured fail-open/fail-closed policy.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::AnomalySignal;
use crate::core::BillingState;
use crate::core::LifecycleStatus;
use crate::core::LimitId;
use crate::core::OnboardingState;
use crate::core::OperationKind;
use crate::core::OverrideRecord;
use crate::core::PlanId;
use crate::core::ProtectionResult;
use crate::core::TenantId;

// ============================================================================
// SECTION: Tenant State Store
// ============================================================================

/// Tenant state store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum StateStoreError {
    /// Store I/O error.
    #[error("tenant state store io error: {0}")]
    Io(String),
    /// Store reported an error.
    #[error("tenant state store error: {0}")]
    Store(String),
}

/// Authoritative store for tenant lifecycle status.
///
/// The interface exposes exactly the two operations the lifecycle engine
/// needs. The transaction boundary belongs to the caller: `update_status`
/// stages the write and the orchestrating handler commits or rolls back.
#[async_trait]
pub trait TenantStateStore: Send + Sync {
    /// Fetches the current status for a tenant, or `None` when unknown.
    ///
    /// # Errors
    ///
    /// Returns [`StateStoreError`] when the read fails.
    async fn fetch_status(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<LifecycleStatus>, StateStoreError>;

    /// Stages a status update for a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`StateStoreError`] when the write fails.
    async fn update_status(
        &self,
        tenant_id: &TenantId,
        status: LifecycleStatus,
    ) -> Result<(), StateStoreError>;
}

// ============================================================================
// SECTION: Protection Provider
// ============================================================================

/// Protection provider errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ProtectionError {
    /// Provider reported an error.
    #[error("protection provider error: {0}")]
    Provider(String),
}

/// Anomaly detection errors.
///
/// # Invariants
/// - Detector failures are recovered locally by the gate and never block.
#[derive(Debug, Error)]
pub enum AnomalyError {
    /// Detector reported an error.
    #[error("anomaly detector error: {0}")]
    Detector(String),
}

/// Combined abuse/rate protection provider.
///
/// The combined check owns counter state and scoring; the gate only enforces
/// the returned decision. Anomaly detection is observational and independent
/// of the admission decision.
#[async_trait]
pub trait ProtectionProvider: Send + Sync {
    /// Runs the combined protection check for an operation.
    ///
    /// # Errors
    ///
    /// Returns [`ProtectionError`] when the check itself fails (not when it
    /// decides to reject).
    async fn combined_check(
        &self,
        tenant_id: &TenantId,
        operation: OperationKind,
        endpoint: &str,
    ) -> Result<ProtectionResult, ProtectionError>;

    /// Observes traffic for anomalies without affecting admission.
    ///
    /// # Errors
    ///
    /// Returns [`AnomalyError`] when observation fails; the gate logs and
    /// continues.
    async fn detect_anomaly(
        &self,
        _tenant_id: &TenantId,
        _endpoint: &str,
    ) -> Result<Option<AnomalySignal>, AnomalyError> {
        Ok(None)
    }
}

// ============================================================================
// SECTION: Billing Provider
// ============================================================================

/// Billing provider errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum BillingError {
    /// Provider reported an error.
    #[error("billing provider error: {0}")]
    Provider(String),
}

/// Live billing state, plan, and limit lookups.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Resolves the tenant's billing state.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError`] when the lookup fails.
    async fn billing_state(&self, tenant_id: &TenantId) -> Result<BillingState, BillingError>;

    /// Resolves the tenant's plan.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError`] when the lookup fails.
    async fn plan(&self, tenant_id: &TenantId) -> Result<PlanId, BillingError>;

    /// Resolves the tenant's named plan limits; absent entries are unlimited.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError`] when the lookup fails.
    async fn limits(&self, tenant_id: &TenantId) -> Result<BTreeMap<LimitId, u64>, BillingError>;

    /// Returns the tenant's override records in priority order.
    ///
    /// Callers must supply a deterministic priority order; the canonical key
    /// is most-recently-approved-first (see
    /// [`crate::runtime::OverrideResolver::priority_order`]).
    ///
    /// # Errors
    ///
    /// Returns [`BillingError`] when the lookup fails.
    async fn limit_overrides(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<OverrideRecord>, BillingError>;
}

// ============================================================================
// SECTION: Onboarding Provider
// ============================================================================

/// Onboarding provider errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum OnboardingError {
    /// Provider reported an error.
    #[error("onboarding provider error: {0}")]
    Provider(String),
}

/// Current onboarding state lookup, with `COMPLETE` terminal.
#[async_trait]
pub trait OnboardingProvider: Send + Sync {
    /// Resolves the tenant's onboarding state.
    ///
    /// # Errors
    ///
    /// Returns [`OnboardingError`] when the lookup fails; gates treat a
    /// failed read as `IN_PROGRESS` so enforcement can never block
    /// onboarding.
    async fn onboarding_state(
        &self,
        tenant_id: &TenantId,
    ) -> Result<OnboardingState, OnboardingError>;
}
