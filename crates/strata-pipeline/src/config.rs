//! Configuration for the pipeline

use crate::context;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a document-processing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Chunk size threshold (characters); chunks end on the line that
    /// reaches it
    pub chunk_size: usize,

    /// Maximum number of concepts retained in the context window
    pub context_max_size: usize,

    /// Minimum confidence for a concept to enter the context window
    pub context_min_confidence: f64,

    /// Number of context entries rendered into each extraction request
    pub context_window_size: usize,

    /// Attempts per chunk for extract + validate + parse
    pub extraction_max_attempts: u32,

    /// Attempts per individual graph-store write
    pub store_max_attempts: u32,

    /// Delay before the first retry (milliseconds); doubles per attempt
    pub backoff_base_ms: u64,
}

impl PipelineConfig {
    /// Backoff base delay as a Duration
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    /// Retry policy for the extraction step
    pub fn extraction_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.extraction_max_attempts, self.backoff_base())
    }

    /// Retry policy for graph-store writes
    pub fn store_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.store_max_attempts, self.backoff_base())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than 0".to_string());
        }
        if self.context_max_size == 0 {
            return Err("context_max_size must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.context_min_confidence) {
            return Err(format!(
                "context_min_confidence {} out of range [0.0, 1.0]",
                self.context_min_confidence
            ));
        }
        if self.extraction_max_attempts == 0 {
            return Err("extraction_max_attempts must be greater than 0".to_string());
        }
        if self.store_max_attempts == 0 {
            return Err("store_max_attempts must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: crate::chunking::DEFAULT_CHUNK_SIZE,
            context_max_size: context::DEFAULT_MAX_SIZE,
            context_min_confidence: context::DEFAULT_MIN_CONFIDENCE,
            context_window_size: context::DEFAULT_WINDOW_SIZE,
            extraction_max_attempts: 3,
            store_max_attempts: 3,
            backoff_base_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.context_max_size, 15);
    }

    #[test]
    fn test_invalid_chunk_size() {
        let mut config = PipelineConfig::default();
        config.chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_min_confidence() {
        let mut config = PipelineConfig::default();
        config.context_min_confidence = 1.2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = PipelineConfig::default();
        config.store_max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_policies_follow_config() {
        let mut config = PipelineConfig::default();
        config.extraction_max_attempts = 5;
        config.backoff_base_ms = 10;

        let policy = config.extraction_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delay_for(2), Duration::from_millis(40));
        assert_eq!(config.store_policy().max_attempts, 3);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = PipelineConfig::from_toml("chunk_size = 250\n").unwrap();
        assert_eq!(config.chunk_size, 250);
        assert_eq!(config.context_window_size, 5);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PipelineConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = PipelineConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }
}
