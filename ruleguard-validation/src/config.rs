// Validator configuration

use crate::ConfigError;
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Default timeout for `active_url` host lookups
pub const DEFAULT_DNS_TIMEOUT_MS: u64 = 2_000;

/// Default cap on concurrent `active_url` lookup threads
pub const DEFAULT_DNS_MAX_LOOKUPS: usize = 16;

/// Default number of compiled `regex` rule patterns kept in memory
pub const DEFAULT_REGEX_CACHE_CAPACITY: usize = 256;

/// Prefix of the environment variables read by [`ValidatorConfig::from_env`]
pub const ENV_PREFIX: &str = "RULEGUARD";

/// Which message is kept when several rules fail for the same field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failing rule
    #[default]
    First,
    /// Evaluate every rule, the last failure wins
    Last,
}

impl FailurePolicy {
    /// Get policy from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "first" => Some(FailurePolicy::First),
            "last" => Some(FailurePolicy::Last),
            _ => None,
        }
    }
}

/// Validator settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Which failing rule's message is reported for a field
    pub failure_policy: FailurePolicy,
    /// Upper bound on a single `active_url` lookup
    pub dns_timeout_ms: u64,
    /// Maximum number of `active_url` lookups running at once
    pub dns_max_lookups: usize,
    /// Maximum number of compiled `regex` rule patterns cached
    pub regex_cache_capacity: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::First,
            dns_timeout_ms: DEFAULT_DNS_TIMEOUT_MS,
            dns_max_lookups: DEFAULT_DNS_MAX_LOOKUPS,
            regex_cache_capacity: DEFAULT_REGEX_CACHE_CAPACITY,
        }
    }
}

impl ValidatorConfig {
    /// Load from `RULEGUARD_*` environment variables.
    ///
    /// Unset variables keep their defaults; malformed ones are an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Lookup timeout as a `Duration`
    pub fn dns_timeout(&self) -> Duration {
        Duration::from_millis(self.dns_timeout_ms)
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(&env_key("FAILURE_POLICY")) {
            config.failure_policy =
                FailurePolicy::parse(&value).ok_or_else(|| invalid("FAILURE_POLICY", &value))?;
        }

        if let Some(value) = lookup(&env_key("DNS_TIMEOUT_MS")) {
            config.dns_timeout_ms = value
                .parse()
                .map_err(|_| invalid("DNS_TIMEOUT_MS", &value))?;
        }

        if let Some(value) = lookup(&env_key("DNS_MAX_LOOKUPS")) {
            config.dns_max_lookups = value
                .parse()
                .map_err(|_| invalid("DNS_MAX_LOOKUPS", &value))?;
        }

        if let Some(value) = lookup(&env_key("REGEX_CACHE_CAPACITY")) {
            config.regex_cache_capacity = value
                .parse()
                .map_err(|_| invalid("REGEX_CACHE_CAPACITY", &value))?;
        }

        Ok(config)
    }
}

fn env_key(key: &str) -> String {
    format!("{}_{}", ENV_PREFIX, key)
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: env_key(key),
        value: value.to_string(),
    }
}
