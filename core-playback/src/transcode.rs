//! # Transcoder
//!
//! Last fallback tier: fully decode the asset through an [`AudioDecoder`] and
//! re-encode the samples into a canonical container. A decoder rejection here
//! is final for the asset.

use crate::container::{CanonicalContainer, WavCodec};
use crate::error::TranscodeError;
use crate::traits::{AudioDecoder, SourceAsset};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Decode-and-re-encode tier.
#[derive(Clone)]
pub struct Transcoder {
    decoder: Arc<dyn AudioDecoder>,
}

impl Transcoder {
    pub fn new(decoder: Arc<dyn AudioDecoder>) -> Self {
        Self { decoder }
    }

    /// Decode `asset` and serialize the result.
    ///
    /// Suspends while the decoder runs. Out-of-range samples produced by the
    /// decoder are clamped by the codec.
    ///
    /// # Errors
    ///
    /// - [`TranscodeError::Rejected`] if the decoder fails for any reason
    /// - [`TranscodeError::Encode`] if the decoded buffers cannot be encoded
    #[instrument(skip(self, asset), fields(len = asset.len(), media_type = ?asset.declared_media_type()))]
    pub async fn transcode(&self, asset: &SourceAsset) -> Result<CanonicalContainer, TranscodeError> {
        let decoded = self.decoder.decode(asset).await.map_err(|e| {
            warn!(error = %e, "Decoder rejected source");
            TranscodeError::Rejected(e.to_string())
        })?;

        debug!(
            sample_rate = decoded.sample_rate(),
            channels = decoded.channel_count(),
            frames = decoded.frames(),
            "Decoded source, encoding canonical container"
        );

        Ok(WavCodec::encode_buffer(&decoded)?)
    }
}
