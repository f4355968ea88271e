//! Configuration for impress-authorship
//!
//! Centralized configuration for matching thresholds, validation,
//! retry behavior, and batch limits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Resolver-wide configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Candidate tier thresholds
    pub matching: MatchingConfig,
    /// Positional validation settings
    pub validation: ValidationConfig,
    /// Retry and backoff for every capability call
    pub retry: RetryConfig,
    /// Batch and paging limits
    pub batch: BatchConfig,
}

/// Candidate matching thresholds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum bag-of-words overlap for Tier 2 (institution-backed)
    pub tier2_threshold: f64,
    /// Minimum bag-of-words overlap for Tier 3 (topic-backed)
    pub tier3_threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            tier2_threshold: 0.90,
            tier3_threshold: 0.60,
        }
    }
}

/// Positional validation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidationConfig {
    /// Minimum similarity for the fuzzy fallback when locating the
    /// researcher in an author list
    pub fuzzy_author_threshold: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            fuzzy_author_threshold: 0.90,
        }
    }
}

/// Bounded retry with exponential backoff and jitter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt (0 = run once)
    pub max_retries: u32,
    /// Delay before the first retry, doubled on each further retry
    pub initial_backoff_ms: u64,
    /// Upper bound for a single backoff delay
    pub max_backoff_ms: u64,
    /// Random extra delay added to every backoff, up to this many ms
    pub jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
            jitter_ms: 250,
        }
    }
}

impl RetryConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

/// Batch processing limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BatchConfig {
    /// Researchers resolved concurrently
    pub max_concurrency: usize,
    /// Hard stop for a single profile's works pagination
    pub max_pages_per_profile: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            max_pages_per_profile: 500,
        }
    }
}

impl ResolverConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let thresholds = [
            ("tier2_threshold", self.matching.tier2_threshold),
            ("tier3_threshold", self.matching.tier3_threshold),
            (
                "fuzzy_author_threshold",
                self.validation.fuzzy_author_threshold,
            ),
        ];
        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange(format!(
                    "{} must be between 0.0 and 1.0",
                    name
                )));
            }
        }

        if self.matching.tier3_threshold > self.matching.tier2_threshold {
            return Err(ConfigError::InvalidThresholds(
                "tier3_threshold must not exceed tier2_threshold".to_string(),
            ));
        }

        if self.batch.max_concurrency == 0 {
            return Err(ConfigError::OutOfRange(
                "max_concurrency must be positive".to_string(),
            ));
        }

        if self.batch.max_pages_per_profile == 0 {
            return Err(ConfigError::OutOfRange(
                "max_pages_per_profile must be positive".to_string(),
            ));
        }

        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(ConfigError::InvalidThresholds(
                "initial_backoff_ms must not exceed max_backoff_ms".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ResolverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.matching.tier2_threshold, 0.90);
    }

    #[test]
    fn test_toml_roundtrip_keeps_overrides() {
        let mut config = ResolverConfig::default();
        config.batch.max_concurrency = 2;
        let toml_str = config.to_toml().unwrap();
        let parsed = ResolverConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = ResolverConfig::from_toml(
            r#"
            [matching]
            tier2_threshold = 0.95
            "#,
        )
        .unwrap();
        assert_eq!(parsed.matching.tier2_threshold, 0.95);
        assert_eq!(parsed.matching.tier3_threshold, 0.60);
        assert_eq!(parsed.retry.max_retries, 5);
    }

    #[test]
    fn test_rejects_inverted_tier_thresholds() {
        let mut config = ResolverConfig::default();
        config.matching.tier3_threshold = 0.95;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThresholds(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let result =
            ResolverConfig::from_json(r#"{"validation": {"fuzzy_author_threshold": 1.5}}"#);
        assert!(matches!(result, Err(ConfigError::OutOfRange(_))));
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let mut config = ResolverConfig::default();
        config.batch.max_concurrency = 0;
        assert!(config.validate().is_err());
    }
}
