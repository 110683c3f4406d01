//! # Playback Error Types
//!
//! Errors are split by fallback tier. [`ContainerError`] and [`RepairError`]
//! are expected outcomes that make the orchestrator escalate to the next tier;
//! they never reach the user. [`TranscodeError`] is terminal for an asset and
//! is reported once through
//! [`PlaybackFallback::error_message`](crate::PlaybackFallback::error_message).

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors produced by the canonical container codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContainerError {
    /// Buffer is too short or lacks the RIFF/WAVE/fmt/data markers.
    #[error("Malformed container header: {0}")]
    MalformedHeader(String),

    /// Sample input violates the encoder's preconditions.
    #[error("Invalid sample input: {0}")]
    InvalidInput(String),

    /// Encoded data would not fit a 32-bit RIFF size field.
    #[error("Sample data too large for a RIFF container: {data_bytes} bytes")]
    TooLarge { data_bytes: u64 },
}

/// Reasons the header repair tier gave up. All of them escalate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepairError {
    #[error("Header could not be parsed: {0}")]
    Header(#[from] ContainerError),

    /// Sample encoding the normalizer does not know how to rescale.
    #[error("Unsupported sample encoding: format tag {format_tag:#06x}, {bits_per_sample} bits")]
    UnsupportedEncoding { format_tag: u16, bits_per_sample: u16 },

    /// Declared data length runs past the end of the buffer.
    #[error("Data chunk declares {declared} bytes but only {available} are present")]
    DataOutOfBounds { declared: u32, available: usize },

    /// Data chunk holds less than one complete frame.
    #[error("Data chunk holds no complete frames")]
    NoFrames,

    #[error("Header repair is disabled")]
    Disabled,
}

/// Failures of the transcoding tier. Terminal for the asset.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscodeError {
    /// The generic decoder refused the bytes (unsupported or corrupt format).
    #[error("Decoder rejected the source: {0}")]
    Rejected(String),

    /// The decoder produced buffers the codec cannot serialize.
    #[error("Decoded audio could not be encoded: {0}")]
    Encode(#[from] ContainerError),

    #[error("Transcoding is disabled")]
    Disabled,
}

/// Crate-level error type.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Format/Codec Errors
    // ========================================================================
    /// Audio format is not recognized or cannot be probed.
    #[error("Unsupported or invalid audio format: {0}")]
    InvalidFormat(String),

    /// Codec is not supported by the decoder.
    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    /// Error occurred during audio decoding.
    #[error("Decoding error: {0}")]
    DecodingError(String),

    /// Audio stream is corrupted beyond packet-level recovery.
    #[error("Corrupted audio stream: {0}")]
    CorruptedStream(String),

    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    // ========================================================================
    // Host Errors
    // ========================================================================
    /// The playback surface refused an operation.
    #[error("Playback surface error: {0}")]
    Surface(#[from] BridgeError),

    /// Asset exceeds the configured size limit.
    #[error("Source asset too large: {size} bytes (limit {limit})")]
    SourceTooLarge { size: usize, limit: usize },

    // ========================================================================
    // Generic Errors
    // ========================================================================
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PlaybackError {
    /// Returns `true` if this error is related to audio format/codec issues.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::InvalidFormat(_)
                | PlaybackError::UnsupportedCodec(_)
                | PlaybackError::DecodingError(_)
                | PlaybackError::CorruptedStream(_)
                | PlaybackError::Transcode(_)
        )
    }

    /// Returns `true` if the host playback surface caused the failure.
    pub fn is_surface_error(&self) -> bool {
        matches!(self, PlaybackError::Surface(_))
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
