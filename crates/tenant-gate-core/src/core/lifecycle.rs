// crates/tenant-gate-core/src/core/lifecycle.rs
// ============================================================================
// Module: Tenant Lifecycle Model
// Description: Lifecycle statuses, transition graph, and derived capabilities.
// Purpose: Provide the pure state-machine vocabulary consumed by the engine and gates.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The tenant lifecycle is a closed four-state machine. Transition legality
//! and per-state capabilities are pure functions of the status so that gate
//! decisions stay deterministic and replayable. Mutation happens only through
//! [`crate::runtime::LifecycleEngine::transition`], which returns typed result
//! values; an illegal transition is a business outcome, never a panic.
//!
//! Invariants:
//! - `TERMINATED` is irreversible except for the archival edge.
//! - `ARCHIVED` accepts no outgoing edge.
//! - `ARCHIVED` is unreachable directly from `ACTIVE`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::TenantId;

// ============================================================================
// SECTION: Lifecycle Status
// ============================================================================

/// Authoritative tenant account status.
///
/// # Invariants
/// - Variants are stable for serialization and response contracts.
/// - Exactly one status is authoritative per tenant at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleStatus {
    /// Tenant is fully operational.
    Active,
    /// Tenant is suspended; reads remain available.
    Suspended,
    /// Tenant is terminated; only archival remains.
    Terminated,
    /// Tenant is archived; terminal state.
    Archived,
}

impl LifecycleStatus {
    /// Initial status assigned to new tenants.
    pub const INITIAL: Self = Self::Active;

    /// Returns the stable wire label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Suspended => "SUSPENDED",
            Self::Terminated => "TERMINATED",
            Self::Archived => "ARCHIVED",
        }
    }

    /// Returns the action name associated with entering this status.
    #[must_use]
    pub const fn entry_action(self) -> &'static str {
        match self {
            Self::Active => "activate",
            Self::Suspended => "suspend",
            Self::Terminated => "terminate",
            Self::Archived => "archive",
        }
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Transition Graph
// ============================================================================

/// Returns the legal transition targets for a status.
#[must_use]
pub const fn legal_targets(from: LifecycleStatus) -> &'static [LifecycleStatus] {
    match from {
        LifecycleStatus::Active => &[LifecycleStatus::Suspended, LifecycleStatus::Terminated],
        LifecycleStatus::Suspended => &[LifecycleStatus::Active, LifecycleStatus::Terminated],
        LifecycleStatus::Terminated => &[LifecycleStatus::Archived],
        LifecycleStatus::Archived => &[],
    }
}

/// Returns true when `from -> to` is an edge of the transition graph.
#[must_use]
pub fn is_legal_edge(from: LifecycleStatus, to: LifecycleStatus) -> bool {
    legal_targets(from).contains(&to)
}

/// Validates a proposed transition without touching any store.
///
/// Returns `None` when the edge is legal, or the denial explaining why not.
/// A no-op transition (`from == to`) is a denial, not a success.
#[must_use]
pub fn validate_transition(
    from: LifecycleStatus,
    to: LifecycleStatus,
) -> Option<TransitionDenial> {
    if from == to {
        return Some(TransitionDenial::AlreadyInStatus {
            status: from,
        });
    }
    if is_legal_edge(from, to) {
        return None;
    }
    Some(match (from, to) {
        (LifecycleStatus::Archived, _) => TransitionDenial::ArchivedTerminal,
        (LifecycleStatus::Terminated, _) => TransitionDenial::TerminatedIrreversible,
        (LifecycleStatus::Active, LifecycleStatus::Archived) => {
            TransitionDenial::ArchiveRequiresTerminated
        }
        _ => TransitionDenial::EdgeNotAllowed {
            from,
            to,
        },
    })
}

// ============================================================================
// SECTION: Transition Results
// ============================================================================

/// Reason a lifecycle transition was denied.
///
/// # Invariants
/// - Denials are business outcomes carried inside [`LifecycleTransitionResult`];
///   they are never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum TransitionDenial {
    /// Tenant has no lifecycle record.
    TenantNotFound,
    /// Tenant is already in the requested status.
    AlreadyInStatus {
        /// Current (and requested) status.
        status: LifecycleStatus,
    },
    /// `TERMINATED` permits no edge except archival.
    TerminatedIrreversible,
    /// `ARCHIVED` permits no outgoing edge.
    ArchivedTerminal,
    /// Archival requires passing through `TERMINATED` first.
    ArchiveRequiresTerminated,
    /// Edge is absent from the transition graph.
    EdgeNotAllowed {
        /// Current status.
        from: LifecycleStatus,
        /// Requested status.
        to: LifecycleStatus,
    },
}

impl TransitionDenial {
    /// Returns a stable human-readable message for the denial.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::TenantNotFound => "tenant not found".to_string(),
            Self::AlreadyInStatus {
                status,
            } => format!("already in {status}"),
            Self::TerminatedIrreversible => "TERMINATED is irreversible".to_string(),
            Self::ArchivedTerminal => "ARCHIVED is terminal".to_string(),
            Self::ArchiveRequiresTerminated => {
                "ARCHIVED is unreachable from ACTIVE".to_string()
            }
            Self::EdgeNotAllowed {
                from,
                to,
            } => format!("transition {from} -> {to} is not allowed"),
        }
    }
}

impl fmt::Display for TransitionDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Outcome of a lifecycle transition attempt.
///
/// # Invariants
/// - Always a value; validation failures populate `denial` with `success == false`.
/// - `from_status`/`to_status` are `None` only when the tenant was not found.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleTransitionResult {
    /// Whether the transition was applied.
    pub success: bool,
    /// Tenant the transition was attempted for.
    pub tenant_id: TenantId,
    /// Status before the attempt, when the tenant exists.
    pub from_status: Option<LifecycleStatus>,
    /// Requested target status.
    pub to_status: LifecycleStatus,
    /// Action name derived from the target status.
    pub action_name: &'static str,
    /// Actor that requested the transition.
    pub actor: String,
    /// Denial reason when the transition was not applied.
    pub denial: Option<TransitionDenial>,
}

impl LifecycleTransitionResult {
    /// Builds a successful transition result.
    #[must_use]
    pub fn applied(
        tenant_id: TenantId,
        from: LifecycleStatus,
        to: LifecycleStatus,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            tenant_id,
            from_status: Some(from),
            to_status: to,
            action_name: to.entry_action(),
            actor: actor.into(),
            denial: None,
        }
    }

    /// Builds a denied transition result.
    #[must_use]
    pub fn denied(
        tenant_id: TenantId,
        from: Option<LifecycleStatus>,
        to: LifecycleStatus,
        actor: impl Into<String>,
        denial: TransitionDenial,
    ) -> Self {
        Self {
            success: false,
            tenant_id,
            from_status: from,
            to_status: to,
            action_name: to.entry_action(),
            actor: actor.into(),
            denial: Some(denial),
        }
    }
}

// ============================================================================
// SECTION: Derived Capabilities
// ============================================================================

/// Capability flags derived from a lifecycle status.
///
/// # Invariants
/// - Derivation is a pure function: identical status yields identical flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LifecycleCapabilities {
    /// SDK execution paths are permitted.
    pub sdk_execution: bool,
    /// Write operations are permitted.
    pub writes: bool,
    /// Read operations are permitted.
    pub reads: bool,
    /// New API keys may be issued.
    pub new_api_keys: bool,
    /// Auth tokens may be refreshed.
    pub token_refresh: bool,
}

/// Returns the capability flags for a status.
#[must_use]
pub const fn capabilities_for(status: LifecycleStatus) -> LifecycleCapabilities {
    match status {
        LifecycleStatus::Active => LifecycleCapabilities {
            sdk_execution: true,
            writes: true,
            reads: true,
            new_api_keys: true,
            token_refresh: true,
        },
        LifecycleStatus::Suspended => LifecycleCapabilities {
            sdk_execution: false,
            writes: false,
            reads: true,
            new_api_keys: false,
            token_refresh: false,
        },
        LifecycleStatus::Terminated | LifecycleStatus::Archived => LifecycleCapabilities {
            sdk_execution: false,
            writes: false,
            reads: false,
            new_api_keys: false,
            token_refresh: false,
        },
    }
}

/// Returns true when the status can still return to `ACTIVE`.
#[must_use]
pub const fn is_reversible(status: LifecycleStatus) -> bool {
    matches!(status, LifecycleStatus::Suspended)
}

/// Point-in-time view of a tenant's lifecycle state.
///
/// # Invariants
/// - Snapshots are constructed fresh per request and never cached across requests.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleStateSnapshot {
    /// Tenant the snapshot describes.
    pub tenant_id: TenantId,
    /// Authoritative status at read time.
    pub status: LifecycleStatus,
    /// Capability flags derived from the status.
    pub capabilities: LifecycleCapabilities,
    /// Whether the status can still return to `ACTIVE`.
    pub reversible: bool,
    /// Legal transition targets from the status.
    pub legal_next: &'static [LifecycleStatus],
}

impl LifecycleStateSnapshot {
    /// Derives a snapshot for a tenant and status.
    #[must_use]
    pub fn derive(tenant_id: TenantId, status: LifecycleStatus) -> Self {
        Self {
            tenant_id,
            status,
            capabilities: capabilities_for(status),
            reversible: is_reversible(status),
            legal_next: legal_targets(status),
        }
    }
}
