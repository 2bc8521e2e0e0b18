//! Configuration management for Formguard.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use formguard_common::FormGuardError;
use formguard_common::constants::{
    DEFAULT_CHALLENGE_POOL, DEFAULT_COOKIE_NAME, DEFAULT_DNS_TIMEOUT_MS,
    DEFAULT_FORM_DEFINITION_PATH, DEFAULT_LISTEN_ADDR, DEFAULT_MAX_SUBMIT_SECS,
    DEFAULT_MIN_SUBMIT_SECS, DEFAULT_SESSION_TTL_SECS,
};
use formguard_common::definition::FORM_MESSAGE_COUNT;

use crate::protocol::SubmitWindow;

/// Prefix for environment overrides, e.g. `FORMGUARD__PROTOCOL__MIN_SUBMIT_SECS`
const ENV_PREFIX: &str = "FORMGUARD";

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Redis connection URL; sessions stay in memory when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Session lifetime in the store
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    /// Name of the session id cookie
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Form definition JSON file
    #[serde(default = "default_form_definition_path")]
    pub form_definition_path: String,

    /// Protocol configuration
    #[serde(default)]
    pub protocol: ProtocolConfig,

    /// DNS configuration for the email rule
    #[serde(default)]
    pub dns: DnsConfig,
}

/// Timing windows, challenge pool, and message overrides
#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolConfig {
    /// Minimum seconds between showing and posting the form
    #[serde(default = "default_min_submit")]
    pub min_submit_secs: i64,

    /// Maximum seconds between showing and posting the form
    #[serde(default = "default_max_submit")]
    pub max_submit_secs: i64,

    /// Strings the user is asked to type back
    #[serde(default = "default_challenge_pool")]
    pub challenge_pool: Vec<String>,

    /// Top-level message overrides indexed by failure code (0-6)
    #[serde(default)]
    pub form_error_messages: Vec<String>,

    /// Field message overrides keyed by rule name
    #[serde(default)]
    pub field_error_messages: BTreeMap<String, String>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            min_submit_secs: default_min_submit(),
            max_submit_secs: default_max_submit(),
            challenge_pool: default_challenge_pool(),
            form_error_messages: Vec::new(),
            field_error_messages: BTreeMap::new(),
        }
    }
}

impl ProtocolConfig {
    pub fn window(&self) -> SubmitWindow {
        SubmitWindow {
            min_secs: self.min_submit_secs,
            max_secs: self.max_submit_secs,
        }
    }

    pub fn validate(&self) -> Result<(), FormGuardError> {
        if self.min_submit_secs < 0 {
            return Err(FormGuardError::Config(
                "min_submit_secs must not be negative".to_string(),
            ));
        }
        if self.min_submit_secs > self.max_submit_secs {
            return Err(FormGuardError::Config(format!(
                "min_submit_secs ({}) exceeds max_submit_secs ({})",
                self.min_submit_secs, self.max_submit_secs
            )));
        }
        if self.challenge_pool.iter().all(|c| c.is_empty()) {
            return Err(FormGuardError::Config(
                "challenge_pool needs at least one non-empty entry".to_string(),
            ));
        }
        if self.form_error_messages.len() > FORM_MESSAGE_COUNT {
            return Err(FormGuardError::Config(format!(
                "form_error_messages has {} entries, at most {} allowed",
                self.form_error_messages.len(),
                FORM_MESSAGE_COUNT
            )));
        }
        Ok(())
    }
}

/// DNS lookup configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DnsConfig {
    /// Bound on each lookup; a timeout fails the email rule
    #[serde(default = "default_dns_timeout")]
    pub timeout_ms: u64,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_dns_timeout(),
        }
    }
}

impl DnsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// Default value functions
fn default_listen_addr() -> String { DEFAULT_LISTEN_ADDR.to_string() }
fn default_session_ttl() -> u64 { DEFAULT_SESSION_TTL_SECS }
fn default_cookie_name() -> String { DEFAULT_COOKIE_NAME.to_string() }
fn default_form_definition_path() -> String { DEFAULT_FORM_DEFINITION_PATH.to_string() }
fn default_min_submit() -> i64 { DEFAULT_MIN_SUBMIT_SECS }
fn default_max_submit() -> i64 { DEFAULT_MAX_SUBMIT_SECS } // 30 minutes
fn default_dns_timeout() -> u64 { DEFAULT_DNS_TIMEOUT_MS }

fn default_challenge_pool() -> Vec<String> {
    DEFAULT_CHALLENGE_POOL.iter().map(|s| s.to_string()).collect()
}

impl AppConfig {
    /// Load configuration from file and `FORMGUARD__*` environment variables
    pub fn load(config_path: &str) -> Result<Self> {
        let mut builder = config::Config::builder();

        if Path::new(config_path).exists() {
            builder = builder.add_source(config::File::with_name(config_path));
        } else {
            // Use defaults if config file doesn't exist
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
        }

        let config: Self = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .context("Failed to load config")?
            .try_deserialize()
            .context("Failed to parse config")?;

        config.protocol.validate()?;
        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            redis_url: None,
            session_ttl_secs: default_session_ttl(),
            cookie_name: default_cookie_name(),
            form_definition_path: default_form_definition_path(),
            protocol: ProtocolConfig::default(),
            dns: DnsConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.protocol.min_submit_secs, 4);
        assert_eq!(config.protocol.max_submit_secs, 1800);
        assert_eq!(config.protocol.challenge_pool.len(), 10);
        assert_eq!(config.dns.timeout(), Duration::from_secs(2));
        assert!(config.redis_url.is_none());
        assert!(config.protocol.validate().is_ok());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load("does/not/exist.toml").unwrap();
        assert_eq!(config.cookie_name, DEFAULT_COOKIE_NAME);
        assert_eq!(config.protocol.window().min_secs, 4);
    }

    #[test]
    fn test_rejects_inverted_window() {
        let protocol = ProtocolConfig {
            min_submit_secs: 60,
            max_submit_secs: 30,
            ..Default::default()
        };
        assert!(matches!(protocol.validate(), Err(FormGuardError::Config(_))));
    }

    #[test]
    fn test_rejects_empty_challenge_pool() {
        let protocol = ProtocolConfig {
            challenge_pool: vec![String::new()],
            ..Default::default()
        };
        assert!(protocol.validate().is_err());
    }
}
