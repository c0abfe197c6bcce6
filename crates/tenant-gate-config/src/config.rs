// crates/tenant-gate-config/src/config.rs
// ============================================================================
// Module: Tenant Gate Configuration
// Description: Configuration loading and validation for the admission pipeline.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: tenant-gate-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size limits. Missing
//! or invalid configuration fails closed: the pipeline refuses to start
//! rather than running with a partial path policy. The exempt and execution
//! path-prefix sets are configuration contracts, not hard-coded literals;
//! the defaults below are the documented baseline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use tenant_gate_core::LimitId;
use tenant_gate_core::OverrideCaps;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "tenant-gate.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "TENANT_GATE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum number of configured path prefixes per set.
pub(crate) const MAX_PATH_PREFIXES: usize = 128;
/// Maximum length of a configured path prefix.
pub(crate) const MAX_PATH_PREFIX_LENGTH: usize = 256;
/// Minimum allowed retry-after value in milliseconds.
pub(crate) const MIN_RETRY_AFTER_MS: u64 = 100;
/// Maximum allowed retry-after value in milliseconds.
pub(crate) const MAX_RETRY_AFTER_MS: u64 = 3_600_000;
/// Default retry-after for protection rejections in milliseconds.
pub(crate) const DEFAULT_REJECT_RETRY_AFTER_MS: u64 = 60_000;
/// Default retry-after for protection throttles in milliseconds.
pub(crate) const DEFAULT_THROTTLE_RETRY_AFTER_MS: u64 = 1_000;
/// Default safety cap applied to override values without a per-limit cap.
pub(crate) const DEFAULT_OVERRIDE_VALUE_CAP: u64 = 1_000_000;
/// Default ceiling of ACTIVE overrides per tenant.
pub(crate) const DEFAULT_MAX_ACTIVE_OVERRIDES: usize = 10;
/// Maximum configurable ceiling of ACTIVE overrides per tenant.
pub(crate) const MAX_MAX_ACTIVE_OVERRIDES: usize = 1_000;

/// Default exempt path prefixes bypassing every gate.
const DEFAULT_EXEMPT_PREFIXES: &[&str] = &["/health", "/metrics", "/auth/", "/account/", "/docs"];
/// Default path prefixes classified as SDK execution paths.
const DEFAULT_EXECUTION_PREFIXES: &[&str] = &["/v1/invoke", "/v1/sdk/"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("config io error: {0}")]
    Io(String),
    /// Configuration file could not be parsed.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Configuration failed validation.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Admission Config
// ============================================================================

/// Root configuration for the admission pipeline.
///
/// # Invariants
/// - `validate` must succeed before the config is handed to the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdmissionConfig {
    /// Path classification policy.
    #[serde(default)]
    pub paths: PathPolicyConfig,
    /// Protection gate settings.
    #[serde(default)]
    pub protection: ProtectionConfig,
    /// Billing gate settings.
    #[serde(default)]
    pub billing: BillingConfig,
    /// Override resolution settings.
    #[serde(default)]
    pub overrides: OverridePolicyConfig,
}

impl AdmissionConfig {
    /// Loads configuration from the resolved path and validates it.
    ///
    /// Resolution order: explicit `path` argument, the `TENANT_GATE_CONFIG`
    /// environment variable, then `tenant-gate.toml` in the working
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_config_path(path);
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section, failing closed on the first violation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.paths.validate()?;
        self.protection.validate()?;
        self.overrides.validate()?;
        Ok(())
    }
}

/// Resolves the configuration file path.
fn resolve_config_path(path: Option<&Path>) -> PathBuf {
    if let Some(path) = path {
        return path.to_path_buf();
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR)
        && !env_path.trim().is_empty()
    {
        return PathBuf::from(env_path);
    }
    PathBuf::from(DEFAULT_CONFIG_NAME)
}

// ============================================================================
// SECTION: Path Policy
// ============================================================================

/// Path classification policy for the admission pipeline.
///
/// # Invariants
/// - Prefixes are matched literally against the request path, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathPolicyConfig {
    /// Prefixes that bypass every gate (health, metrics, auth subtree,
    /// self-service subtree, docs).
    #[serde(default = "default_exempt_prefixes")]
    pub exempt_prefixes: Vec<String>,
    /// Prefixes classified as SDK execution paths.
    #[serde(default = "default_execution_prefixes")]
    pub execution_prefixes: Vec<String>,
}

impl Default for PathPolicyConfig {
    fn default() -> Self {
        Self {
            exempt_prefixes: default_exempt_prefixes(),
            execution_prefixes: default_execution_prefixes(),
        }
    }
}

impl PathPolicyConfig {
    /// Returns true when the path matches an exempt prefix.
    #[must_use]
    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt_prefixes.iter().any(|prefix| path.starts_with(prefix))
    }

    /// Returns true when the path is classified as an execution path.
    #[must_use]
    pub fn is_execution(&self, path: &str) -> bool {
        self.execution_prefixes.iter().any(|prefix| path.starts_with(prefix))
    }

    /// Validates prefix shape and count bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_prefix_set("paths.exempt_prefixes", &self.exempt_prefixes)?;
        validate_prefix_set("paths.execution_prefixes", &self.execution_prefixes)?;
        Ok(())
    }
}

/// Returns the default exempt prefix set.
fn default_exempt_prefixes() -> Vec<String> {
    DEFAULT_EXEMPT_PREFIXES.iter().map(|prefix| (*prefix).to_string()).collect()
}

/// Returns the default execution prefix set.
fn default_execution_prefixes() -> Vec<String> {
    DEFAULT_EXECUTION_PREFIXES.iter().map(|prefix| (*prefix).to_string()).collect()
}

/// Validates a prefix set against shape and count bounds.
fn validate_prefix_set(field: &str, prefixes: &[String]) -> Result<(), ConfigError> {
    if prefixes.len() > MAX_PATH_PREFIXES {
        return Err(ConfigError::Invalid(format!("{field} exceeds max entries")));
    }
    for prefix in prefixes {
        if prefix.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("{field} entries must be non-empty")));
        }
        if !prefix.starts_with('/') {
            return Err(ConfigError::Invalid(format!("{field} entries must start with '/'")));
        }
        if prefix.len() > MAX_PATH_PREFIX_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} entry exceeds max length")));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Failure Policy
// ============================================================================

/// Policy applied when a provider read fails for infrastructure reasons.
///
/// # Invariants
/// - Variants are stable for serialization and audit labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Admit the request and record the failure.
    FailOpen,
    /// Block the request and record the failure.
    FailClosed,
}

impl FailurePolicy {
    /// Returns the stable label for the policy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FailOpen => "fail_open",
            Self::FailClosed => "fail_closed",
        }
    }
}

// ============================================================================
// SECTION: Protection Settings
// ============================================================================

/// Protection gate settings.
///
/// # Invariants
/// - Retry values are advisory defaults substituted when the provider omits
///   `retry_after_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProtectionConfig {
    /// Retry-after for rejections, in milliseconds.
    #[serde(default = "default_reject_retry_after_ms")]
    pub reject_retry_after_ms: u64,
    /// Retry-after for throttles, in milliseconds.
    #[serde(default = "default_throttle_retry_after_ms")]
    pub throttle_retry_after_ms: u64,
    /// Policy applied when the protection provider fails.
    #[serde(default = "default_protection_failure_policy")]
    pub failure_policy: FailurePolicy,
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            reject_retry_after_ms: DEFAULT_REJECT_RETRY_AFTER_MS,
            throttle_retry_after_ms: DEFAULT_THROTTLE_RETRY_AFTER_MS,
            failure_policy: FailurePolicy::FailOpen,
        }
    }
}

impl ProtectionConfig {
    /// Validates retry bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("protection.reject_retry_after_ms", self.reject_retry_after_ms),
            ("protection.throttle_retry_after_ms", self.throttle_retry_after_ms),
        ] {
            if !(MIN_RETRY_AFTER_MS ..= MAX_RETRY_AFTER_MS).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{field} must be between {MIN_RETRY_AFTER_MS} and {MAX_RETRY_AFTER_MS}"
                )));
            }
        }
        Ok(())
    }
}

/// Returns the default reject retry-after.
const fn default_reject_retry_after_ms() -> u64 {
    DEFAULT_REJECT_RETRY_AFTER_MS
}

/// Returns the default throttle retry-after.
const fn default_throttle_retry_after_ms() -> u64 {
    DEFAULT_THROTTLE_RETRY_AFTER_MS
}

/// Returns the default protection failure policy.
const fn default_protection_failure_policy() -> FailurePolicy {
    FailurePolicy::FailOpen
}

// ============================================================================
// SECTION: Billing Settings
// ============================================================================

/// Billing gate settings.
///
/// # Invariants
/// - The default failure policy is fail-closed to avoid revenue leakage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BillingConfig {
    /// Policy applied when the billing provider fails.
    #[serde(default = "default_billing_failure_policy")]
    pub failure_policy: FailurePolicy,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::FailClosed,
        }
    }
}

/// Returns the default billing failure policy.
const fn default_billing_failure_policy() -> FailurePolicy {
    FailurePolicy::FailClosed
}

// ============================================================================
// SECTION: Override Settings
// ============================================================================

/// Override resolution settings.
///
/// # Invariants
/// - Caps are enforced by the resolver regardless of requested magnitudes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverridePolicyConfig {
    /// Safety cap applied to limits without a per-limit cap.
    #[serde(default = "default_override_value_cap")]
    pub default_value_cap: u64,
    /// Per-limit safety caps.
    #[serde(default)]
    pub value_caps: BTreeMap<String, u64>,
    /// Ceiling of ACTIVE overrides per tenant before flagging abuse.
    #[serde(default = "default_max_active_overrides")]
    pub max_active_per_tenant: usize,
}

impl Default for OverridePolicyConfig {
    fn default() -> Self {
        Self {
            default_value_cap: DEFAULT_OVERRIDE_VALUE_CAP,
            value_caps: BTreeMap::new(),
            max_active_per_tenant: DEFAULT_MAX_ACTIVE_OVERRIDES,
        }
    }
}

impl OverridePolicyConfig {
    /// Converts the section into resolver caps.
    #[must_use]
    pub fn to_caps(&self) -> OverrideCaps {
        OverrideCaps {
            default_value_cap: self.default_value_cap,
            value_caps: self
                .value_caps
                .iter()
                .map(|(limit, cap)| (LimitId::new(limit.clone()), *cap))
                .collect(),
            max_active_per_tenant: self.max_active_per_tenant,
        }
    }

    /// Validates cap bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_value_cap == 0 {
            return Err(ConfigError::Invalid(
                "overrides.default_value_cap must be greater than zero".to_string(),
            ));
        }
        for (limit, cap) in &self.value_caps {
            if limit.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "overrides.value_caps keys must be non-empty".to_string(),
                ));
            }
            if *cap == 0 {
                return Err(ConfigError::Invalid(format!(
                    "overrides.value_caps.{limit} must be greater than zero"
                )));
            }
        }
        if self.max_active_per_tenant == 0 {
            return Err(ConfigError::Invalid(
                "overrides.max_active_per_tenant must be greater than zero".to_string(),
            ));
        }
        if self.max_active_per_tenant > MAX_MAX_ACTIVE_OVERRIDES {
            return Err(ConfigError::Invalid(format!(
                "overrides.max_active_per_tenant must not exceed {MAX_MAX_ACTIVE_OVERRIDES}"
            )));
        }
        Ok(())
    }
}

/// Returns the default override value cap.
const fn default_override_value_cap() -> u64 {
    DEFAULT_OVERRIDE_VALUE_CAP
}

/// Returns the default active-override ceiling.
const fn default_max_active_overrides() -> usize {
    DEFAULT_MAX_ACTIVE_OVERRIDES
}
