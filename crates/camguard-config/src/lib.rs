//! # camguard-config
//!
//! The validated configuration record for one assessment run (spec §6).
//! This crate owns the record and its validation rules; parsing it out of a
//! YAML file on disk is an external collaborator's job.

use camguard_core::TargetSpec;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use std::env;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("environment variable {0} could not be parsed: {1}")]
    EnvParse(String, String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub use_defaults: bool,
    pub custom: Vec<camguard_core::Credential>,
    pub max_attempts_per_host: u32,
    pub delay_ms: u64,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        CredentialsConfig {
            use_defaults: true,
            custom: Vec::new(),
            max_attempts_per_host: 20,
            delay_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CveTestingConfig {
    pub enabled: bool,
    pub safe_mode: bool,
    pub categories: Vec<String>,
    pub ai_enabled: bool,
    pub ai_max_cves_per_host: u32,
}

impl Default for CveTestingConfig {
    fn default() -> Self {
        CveTestingConfig {
            enabled: true,
            safe_mode: true,
            categories: Vec::new(),
            ai_enabled: false,
            ai_max_cves_per_host: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolsConfig {
    pub rtsp: bool,
    pub onvif: bool,
    pub http: bool,
    pub telnet: bool,
    pub ssh: bool,
    pub ai_enabled: bool,
    pub ai_max_paths_per_host: u32,
}

impl Default for ProtocolsConfig {
    fn default() -> Self {
        ProtocolsConfig {
            rtsp: true,
            onvif: true,
            http: true,
            telnet: false,
            ssh: false,
            ai_enabled: false,
            ai_max_paths_per_host: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExploitationConfig {
    pub enabled: bool,
    pub timeout_per_exploit_ms: u64,
    pub auto_exploit_confirmed: bool,
}

impl Default for ExploitationConfig {
    fn default() -> Self {
        ExploitationConfig {
            enabled: false,
            timeout_per_exploit_ms: 30_000,
            auto_exploit_confirmed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Markdown,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingConfig {
    pub format: ReportFormat,
    pub include_poc: bool,
    pub severity_threshold: camguard_core::Severity,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        ReportingConfig {
            format: ReportFormat::Markdown,
            include_poc: false,
            severity_threshold: camguard_core::Severity::Info,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    pub max_concurrent_hosts: u32,
    pub requests_per_second: u32,
    pub timeout_ms: u64,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        RateLimitingConfig {
            max_concurrent_hosts: 10,
            requests_per_second: 5,
            timeout_ms: 8_000,
        }
    }
}

/// The validated configuration record described in spec §6.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessmentConfig {
    pub targets: Vec<TargetSpec>,
    pub credentials: CredentialsConfig,
    pub cve_testing: CveTestingConfig,
    pub protocols: ProtocolsConfig,
    pub exploitation: ExploitationConfig,
    pub reporting: ReportingConfig,
    pub rate_limiting: RateLimitingConfig,
}

impl AssessmentConfig {
    /// Build the default record, then overlay the subset of fields that can
    /// be set from the environment, the way `GatewayConfig::from_env` layers
    /// environment variables over built-in defaults.
    pub fn from_env() -> Self {
        let mut config = AssessmentConfig::default();

        if let Ok(v) = env::var("CAMGUARD_MAX_CONCURRENT_HOSTS") {
            if let Ok(parsed) = v.parse() {
                config.rate_limiting.max_concurrent_hosts = parsed;
            }
        }
        if let Ok(v) = env::var("CAMGUARD_REQUESTS_PER_SECOND") {
            if let Ok(parsed) = v.parse() {
                config.rate_limiting.requests_per_second = parsed;
            }
        }
        if let Ok(v) = env::var("CAMGUARD_MAX_ATTEMPTS_PER_HOST") {
            if let Ok(parsed) = v.parse() {
                config.credentials.max_attempts_per_host = parsed;
            }
        }
        if let Ok(v) = env::var("CAMGUARD_CREDENTIAL_DELAY_MS") {
            if let Ok(parsed) = v.parse() {
                config.credentials.delay_ms = parsed;
            }
        }
        if let Ok(v) = env::var("CAMGUARD_SAFE_MODE") {
            if let Ok(parsed) = v.parse() {
                config.cve_testing.safe_mode = parsed;
            }
        }
        if let Ok(v) = env::var("CAMGUARD_EXPLOITATION_ENABLED") {
            if let Ok(parsed) = v.parse() {
                config.exploitation.enabled = parsed;
            }
        }

        config
    }

    /// Validate cross-field invariants the defaults alone can't express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.targets.is_empty() {
            return Err(ConfigError::Invalid("targets must not be empty".into()));
        }
        if self.rate_limiting.requests_per_second == 0 {
            return Err(ConfigError::Invalid(
                "rate_limiting.requests_per_second must be > 0".into(),
            ));
        }
        if self.rate_limiting.max_concurrent_hosts == 0 {
            return Err(ConfigError::Invalid(
                "rate_limiting.max_concurrent_hosts must be > 0".into(),
            ));
        }
        if self.credentials.max_attempts_per_host == 0 {
            return Err(ConfigError::Invalid(
                "credentials.max_attempts_per_host must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    fn sample_target() -> TargetSpec {
        TargetSpec::host("192.0.2.10".parse::<IpAddr>().unwrap(), vec![])
    }

    #[test]
    fn default_config_fails_validation_without_targets() {
        let config = AssessmentConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_with_targets_validates() {
        let mut config = AssessmentConfig::default();
        config.targets.push(sample_target());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_rate_is_rejected() {
        let mut config = AssessmentConfig::default();
        config.targets.push(sample_target());
        config.rate_limiting.requests_per_second = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_env_overlays_defaults() {
        env::set_var("CAMGUARD_REQUESTS_PER_SECOND", "7");
        let config = AssessmentConfig::from_env();
        assert_eq!(config.rate_limiting.requests_per_second, 7);
        env::remove_var("CAMGUARD_REQUESTS_PER_SECOND");
    }
}
