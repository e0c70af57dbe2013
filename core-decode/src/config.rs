//! # Decoder Configuration
//!
//! Configuration types for stream decoder activation and teardown.

use crate::error::{DecodeError, Result};
use serde::{Deserialize, Serialize};

/// Module name that disables fallback when used as `preferred_decoder`.
pub const NO_DECODER: &str = "none";

/// Decoder orchestration configuration.
///
/// Controls the wake-burst size, module preference and worker thread settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Number of sentinel units injected per wake burst.
    ///
    /// Used both on shutdown and for discontinuities. A consumer blocked
    /// below the Fifo's own wait point may swallow several sentinels before
    /// it re-checks termination, hence more than one.
    ///
    /// Default: 10.
    #[serde(default = "default_padding_units")]
    pub padding_units: usize,

    /// Name of the decoder module to try first.
    ///
    /// Falls back to ranked resolution when the module cannot handle the
    /// format. The value `"none"` disables decoding entirely.
    ///
    /// Default: `None`.
    #[serde(default)]
    pub preferred_decoder: Option<String>,

    /// Prefix for worker thread names (`<prefix>-<stream id>`).
    ///
    /// Default: `"decoder"`.
    #[serde(default = "default_thread_name_prefix")]
    pub thread_name_prefix: String,

    /// Stack size for worker threads in bytes. `None` uses the platform default.
    #[serde(default)]
    pub worker_stack_size: Option<usize>,

    /// Number of units reserved up front in each Fifo.
    ///
    /// This is a starting allocation, not a bound: the Fifo grows without
    /// limit while the consumer lags.
    ///
    /// Default: 64.
    #[serde(default = "default_initial_fifo_capacity")]
    pub initial_fifo_capacity: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            padding_units: default_padding_units(),
            preferred_decoder: None,
            thread_name_prefix: default_thread_name_prefix(),
            worker_stack_size: None,
            initial_fifo_capacity: default_initial_fifo_capacity(),
        }
    }
}

impl DecoderConfig {
    /// Create a configuration for memory-constrained hosts.
    ///
    /// - No up-front Fifo reservation
    /// - 256 KiB worker stacks
    pub fn low_memory() -> Self {
        Self {
            worker_stack_size: Some(256 * 1024),
            initial_fifo_capacity: 0,
            ..Default::default()
        }
    }

    /// Prefer the named decoder module.
    pub fn with_preferred_decoder(mut self, name: impl Into<String>) -> Self {
        self.preferred_decoder = Some(name.into());
        self
    }

    /// Set the number of sentinel units per wake burst.
    pub fn with_padding_units(mut self, padding_units: usize) -> Self {
        self.padding_units = padding_units;
        self
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.padding_units == 0 {
            return Err(DecodeError::Config("padding_units must be > 0".to_string()));
        }

        if self.thread_name_prefix.trim().is_empty() {
            return Err(DecodeError::Config(
                "thread_name_prefix must not be empty".to_string(),
            ));
        }

        if let Some(name) = &self.preferred_decoder {
            if name.trim().is_empty() {
                return Err(DecodeError::Config(
                    "preferred_decoder must not be blank".to_string(),
                ));
            }
        }

        if self.worker_stack_size == Some(0) {
            return Err(DecodeError::Config(
                "worker_stack_size must be > 0 when set".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_padding_units() -> usize {
    10
}

fn default_thread_name_prefix() -> String {
    "decoder".to_string()
}

fn default_initial_fifo_capacity() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DecoderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.padding_units, 10);
        assert_eq!(config.thread_name_prefix, "decoder");
        assert!(config.preferred_decoder.is_none());
    }

    #[test]
    fn test_low_memory_config() {
        let config = DecoderConfig::low_memory();
        assert!(config.validate().is_ok());
        assert_eq!(config.initial_fifo_capacity, 0);
        assert!(config.worker_stack_size.is_some());
    }

    #[test]
    fn test_config_validation() {
        let mut config = DecoderConfig::default();

        config.padding_units = 0;
        assert!(config.validate().is_err());
        config.padding_units = 10;

        config.thread_name_prefix = "  ".into();
        assert!(config.validate().is_err());
        config.thread_name_prefix = "decoder".into();

        config.worker_stack_size = Some(0);
        assert!(config.validate().is_err());
        config.worker_stack_size = None;

        config.preferred_decoder = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_uses_defaults() {
        let config = DecoderConfig::from_json(r#"{ "preferred_decoder": "ffmpeg" }"#).unwrap();
        assert_eq!(config.preferred_decoder.as_deref(), Some("ffmpeg"));
        assert_eq!(config.padding_units, 10);
        assert_eq!(config.initial_fifo_capacity, 64);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        assert!(DecoderConfig::from_json(r#"{ "padding_units": 0 }"#).is_err());
        assert!(DecoderConfig::from_json("not json").is_err());
    }
}
