//! # Fallback Configuration
//!
//! Knobs for the playback fallback chain. Every field has a serde default so
//! hosts can ship partial JSON/TOML and still get a valid configuration.

use crate::container::CANONICAL_MEDIA_TYPE;
use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};

/// Fallback chain configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Run the header repair tier before transcoding.
    ///
    /// Default: true.
    #[serde(default = "default_true")]
    pub enable_header_repair: bool,

    /// Run the transcoding tier when repair fails.
    ///
    /// Default: true.
    #[serde(default = "default_true")]
    pub enable_transcode: bool,

    /// Media type declared for repaired/transcoded resources.
    ///
    /// Default: `audio/wav`.
    #[serde(default = "default_output_media_type")]
    pub output_media_type: String,

    /// Message exposed to the user when every tier fails.
    #[serde(default = "default_unsupported_message")]
    pub unsupported_message: String,

    /// Assets above this size skip both tiers and fail straight away.
    ///
    /// Default: 256 MiB.
    #[serde(default = "default_max_source_bytes")]
    pub max_source_bytes: usize,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enable_header_repair: default_true(),
            enable_transcode: default_true(),
            output_media_type: default_output_media_type(),
            unsupported_message: default_unsupported_message(),
            max_source_bytes: default_max_source_bytes(),
        }
    }
}

impl FallbackConfig {
    /// Only the header repair tier; nothing is ever decoded.
    pub fn header_repair_only() -> Self {
        Self {
            enable_transcode: false,
            ..Default::default()
        }
    }

    /// Skip header repair and always decode.
    pub fn transcode_only() -> Self {
        Self {
            enable_header_repair: false,
            ..Default::default()
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.output_media_type.trim().is_empty() {
            return Err(PlaybackError::InvalidConfig(
                "output_media_type must not be empty".to_string(),
            ));
        }

        if self.unsupported_message.trim().is_empty() {
            return Err(PlaybackError::InvalidConfig(
                "unsupported_message must not be empty".to_string(),
            ));
        }

        if self.max_source_bytes == 0 {
            return Err(PlaybackError::InvalidConfig(
                "max_source_bytes must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_true() -> bool {
    true
}

fn default_output_media_type() -> String {
    CANONICAL_MEDIA_TYPE.to_string()
}

fn default_unsupported_message() -> String {
    "This audio format is not supported by the playback surface.".to_string()
}

fn default_max_source_bytes() -> usize {
    256 * 1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FallbackConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.enable_header_repair);
        assert!(config.enable_transcode);
        assert_eq!(config.output_media_type, "audio/wav");
    }

    #[test]
    fn test_presets() {
        let repair_only = FallbackConfig::header_repair_only();
        assert!(repair_only.enable_header_repair && !repair_only.enable_transcode);
        assert!(repair_only.validate().is_ok());

        let transcode_only = FallbackConfig::transcode_only();
        assert!(!transcode_only.enable_header_repair && transcode_only.enable_transcode);
    }

    #[test]
    fn test_config_validation() {
        let mut config = FallbackConfig::default();

        config.output_media_type = " ".to_string();
        assert!(config.validate().is_err());
        config.output_media_type = "audio/wav".to_string();

        config.unsupported_message.clear();
        assert!(config.validate().is_err());
        config.unsupported_message = "nope".to_string();

        config.max_source_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: FallbackConfig =
            serde_json::from_str(r#"{ "enable_transcode": false, "max_source_bytes": 1024 }"#)
                .unwrap();

        assert!(config.enable_header_repair);
        assert!(!config.enable_transcode);
        assert_eq!(config.max_source_bytes, 1024);
        assert_eq!(config.unsupported_message, default_unsupported_message());
    }
}
