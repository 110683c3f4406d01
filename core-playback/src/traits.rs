//! # Core Playback Traits
//!
//! Input/output types shared by the fallback tiers and the [`AudioDecoder`]
//! abstraction the transcoding tier delegates to.
//!
//! ## Threading Model
//!
//! - On **native** platforms decoders are `Send + Sync` so they can be shared
//!   behind an `Arc`.
//! - On **WASM** everything runs on the page's event loop and the trait uses
//!   `?Send` from `async_trait`.

use crate::error::{PlaybackError, Result};
use async_trait::async_trait;
use bridge_traits::PlatformSendSync;
use bytes::Bytes;

// ============================================================================
// Source Asset
// ============================================================================

/// Raw bytes of a user-supplied audio file plus the media type it was
/// declared with.
///
/// The declared type comes from the upload and may be empty or wrong; it is
/// only ever used as a hint. Cloning is cheap (the bytes are reference
/// counted) and the contents are never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAsset {
    data: Bytes,
    media_type: String,
}

impl SourceAsset {
    pub fn new(data: impl Into<Bytes>, media_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            media_type: media_type.into(),
        }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Declared media type, `None` when the upload carried none.
    pub fn declared_media_type(&self) -> Option<&str> {
        let trimmed = self.media_type.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// ============================================================================
// Decoded Audio Data
// ============================================================================

/// Fully decoded audio in planar layout.
///
/// Samples are nominally in `[-1.0, 1.0]`; decoders may overshoot and the
/// codec clamps before quantizing. All channels hold the same number of
/// samples.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudioBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl DecodedAudioBuffer {
    /// Build a buffer, checking the rate and channel invariants.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::DecodingError`] if the rate is zero, there are no
    /// channels, or channel lengths differ.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(PlaybackError::DecodingError(
                "Decoded sample rate is zero".to_string(),
            ));
        }
        let Some(first) = channels.first() else {
            return Err(PlaybackError::DecodingError(
                "Decoded audio has no channels".to_string(),
            ));
        };
        let frames = first.len();
        if let Some(idx) = channels.iter().position(|c| c.len() != frames) {
            return Err(PlaybackError::DecodingError(format!(
                "Channel {} has {} samples, expected {}",
                idx,
                channels[idx].len(),
                frames
            )));
        }

        Ok(Self {
            sample_rate,
            channels,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }
}

// ============================================================================
// Decoder Abstraction
// ============================================================================

/// Generic decoder used by the transcoding tier.
///
/// Implementations turn arbitrary encoded bytes into planar float samples.
/// Any error means the bytes cannot be decoded; the transcoder does not retry.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait AudioDecoder: PlatformSendSync {
    /// Decode the whole asset.
    async fn decode(&self, asset: &SourceAsset) -> Result<DecodedAudioBuffer>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_media_type_treats_blank_as_absent() {
        assert_eq!(SourceAsset::new(vec![1u8], "").declared_media_type(), None);
        assert_eq!(SourceAsset::new(vec![1u8], "  ").declared_media_type(), None);
        assert_eq!(
            SourceAsset::new(vec![1u8], "audio/x-wav").declared_media_type(),
            Some("audio/x-wav")
        );
    }

    #[test]
    fn test_decoded_buffer_rejects_ragged_channels() {
        let err = DecodedAudioBuffer::new(8000, vec![vec![0.0; 3], vec![0.0; 2]]).unwrap_err();
        assert!(err.to_string().contains("Channel 1"));
    }

    #[test]
    fn test_decoded_buffer_rejects_zero_rate_and_no_channels() {
        assert!(DecodedAudioBuffer::new(0, vec![vec![0.0]]).is_err());
        assert!(DecodedAudioBuffer::new(44100, Vec::new()).is_err());
    }

    #[test]
    fn test_decoded_buffer_reports_shape() {
        let buffer = DecodedAudioBuffer::new(22050, vec![vec![0.1; 5], vec![0.2; 5]]).unwrap();
        assert_eq!(buffer.sample_rate(), 22050);
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frames(), 5);
    }
}
