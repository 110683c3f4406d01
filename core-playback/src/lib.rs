//! # Playback Fallback Core
//!
//! Recovers playable audio from files the host's native media element cannot
//! render.
//!
//! ## Overview
//!
//! This crate handles:
//! - A bit-exact canonical container codec (44-byte RIFF/WAVE header, 16-bit
//!   little-endian PCM)
//! - Header repair: reinterpreting odd bit depths as 16-bit without decoding
//! - Transcoding through a pluggable [`AudioDecoder`] (symphonia-backed
//!   [`SymphoniaDecoder`] behind the `core-decoder` feature)
//! - The [`PlaybackFallback`] state machine sequencing those tiers and owning
//!   the playable resources it installs on a
//!   [`PlaybackSurface`](bridge_traits::PlaybackSurface)
//!
//! ## Usage
//!
//! ```rust,ignore
//! let fallback = PlaybackFallback::new(surface, Arc::new(SymphoniaDecoder::new()), FallbackConfig::default())?;
//! let generation = fallback.assign(SourceAsset::new(bytes, "audio/x-wav"))?;
//!
//! // later, from the surface's error callback
//! match fallback.on_playback_error(generation).await {
//!     PlaybackState::Ready => { /* recovered audio is loaded */ }
//!     PlaybackState::Failed => show(fallback.error_message()),
//!     _ => {}
//! }
//! ```

pub mod config;
pub mod container;
pub mod decoder;
pub mod error;
pub mod fallback;
pub mod repair;
pub mod traits;
pub mod transcode;

pub use config::FallbackConfig;
pub use container::{CanonicalContainer, WavCodec, WavHeader, CANONICAL_MEDIA_TYPE, HEADER_LEN};
pub use error::{ContainerError, PlaybackError, RepairError, Result, TranscodeError};
pub use fallback::{AssetGeneration, PlayableResource, PlaybackFallback, PlaybackState};
pub use repair::HeaderRepair;
pub use traits::{AudioDecoder, DecodedAudioBuffer, SourceAsset};
pub use transcode::Transcoder;

#[cfg(feature = "core-decoder")]
pub use decoder::{FormatDetector, SampleConverter, SymphoniaDecoder};
