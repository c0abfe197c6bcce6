// crates/tenant-gate-config/tests/policy_validation.rs
// ============================================================================
// Module: Policy Config Validation Tests
// Description: Validate path, protection, and override constraints.
// Purpose: Ensure admission settings fail closed and enforce limits.
// ============================================================================

//! Validation tests for the admission configuration sections.

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

use tenant_gate_config::AdmissionConfig;
use tenant_gate_config::ConfigError;
use tenant_gate_config::FailurePolicy;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<(), ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(()) => Err("expected invalid config".to_string()),
    }
}

#[test]
fn default_config_is_valid() -> TestResult {
    let config = AdmissionConfig::default();
    config.validate().map_err(|err| err.to_string())?;
    assert!(config.paths.is_exempt("/health"));
    assert!(config.paths.is_exempt("/auth/token"));
    assert!(config.paths.is_execution("/v1/invoke"));
    assert!(!config.paths.is_execution("/v1/projects"));
    Ok(())
}

#[test]
fn default_failure_policies() -> TestResult {
    let config = AdmissionConfig::default();
    if config.protection.failure_policy != FailurePolicy::FailOpen {
        return Err("protection must default to fail_open".to_string());
    }
    if config.billing.failure_policy != FailurePolicy::FailClosed {
        return Err("billing must default to fail_closed".to_string());
    }
    Ok(())
}

#[test]
fn exempt_prefix_must_start_with_slash() -> TestResult {
    let mut config = AdmissionConfig::default();
    config.paths.exempt_prefixes = vec!["health".to_string()];
    assert_invalid(config.validate(), "must start with '/'")
}

#[test]
fn exempt_prefix_must_be_non_empty() -> TestResult {
    let mut config = AdmissionConfig::default();
    config.paths.exempt_prefixes = vec!["  ".to_string()];
    assert_invalid(config.validate(), "must be non-empty")
}

#[test]
fn execution_prefix_count_is_bounded() -> TestResult {
    let mut config = AdmissionConfig::default();
    config.paths.execution_prefixes = (0 .. 200).map(|idx| format!("/p{idx}")).collect();
    assert_invalid(config.validate(), "exceeds max entries")
}

#[test]
fn retry_after_lower_bound() -> TestResult {
    let mut config = AdmissionConfig::default();
    config.protection.reject_retry_after_ms = 10;
    assert_invalid(config.validate(), "reject_retry_after_ms")
}

#[test]
fn retry_after_upper_bound() -> TestResult {
    let mut config = AdmissionConfig::default();
    config.protection.throttle_retry_after_ms = 7_200_000;
    assert_invalid(config.validate(), "throttle_retry_after_ms")
}

#[test]
fn override_cap_must_be_nonzero() -> TestResult {
    let mut config = AdmissionConfig::default();
    config.overrides.default_value_cap = 0;
    assert_invalid(config.validate(), "default_value_cap")
}

#[test]
fn per_limit_cap_must_be_nonzero() -> TestResult {
    let mut config = AdmissionConfig::default();
    config.overrides.value_caps.insert("api_calls".to_string(), 0);
    assert_invalid(config.validate(), "value_caps.api_calls")
}

#[test]
fn max_active_overrides_must_be_nonzero() -> TestResult {
    let mut config = AdmissionConfig::default();
    config.overrides.max_active_per_tenant = 0;
    assert_invalid(config.validate(), "max_active_per_tenant")
}

#[test]
fn max_active_overrides_is_bounded() -> TestResult {
    let mut config = AdmissionConfig::default();
    config.overrides.max_active_per_tenant = 10_000;
    assert_invalid(config.validate(), "max_active_per_tenant")
}

#[test]
fn to_caps_carries_per_limit_values() -> TestResult {
    let mut config = AdmissionConfig::default();
    config.overrides.default_value_cap = 500;
    config.overrides.value_caps.insert("api_calls".to_string(), 250);
    let caps = config.overrides.to_caps();
    if caps.cap_for(&"api_calls".into()) != 250 {
        return Err("per-limit cap not carried".to_string());
    }
    if caps.cap_for(&"storage_gb".into()) != 500 {
        return Err("default cap not carried".to_string());
    }
    Ok(())
}
