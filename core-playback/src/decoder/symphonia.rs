//! # Symphonia Decoder Implementation
//!
//! In-memory audio decoder backing the transcoding tier.

use crate::decoder::format_detector::FormatDetector;
use crate::decoder::sample_converter::SampleConverter;
use crate::error::{PlaybackError, Result};
use crate::traits::{AudioDecoder, DecodedAudioBuffer, SourceAsset};
use async_trait::async_trait;
use std::io::Cursor;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use tracing::{debug, error, info, instrument, warn};

const MAX_CONSECUTIVE_ERRORS: usize = 10;

/// Symphonia-backed [`AudioDecoder`].
///
/// Stateless: every call probes and decodes the asset from scratch, so one
/// instance can be shared behind an `Arc` by any number of orchestrators.
/// Which containers and codecs are recognized depends on the `decoder-*`
/// features.
///
/// ## Error Recovery
///
/// Corrupt packets are skipped. Decoding only gives up after
/// `MAX_CONSECUTIVE_ERRORS` failed packets in a row.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip(asset), fields(len = asset.len(), media_type = ?asset.declared_media_type()))]
    fn decode_all(asset: &SourceAsset) -> Result<DecodedAudioBuffer> {
        let hint = FormatDetector::hint_from_mime_type(asset.declared_media_type());

        let cursor = Cursor::new(asset.data().clone());
        let media_source = Box::new(cursor) as Box<dyn MediaSource>;
        let mss = MediaSourceStream::new(media_source, Default::default());

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| {
                debug!("Format probe failed: {}", e);
                PlaybackError::InvalidFormat(format!("Failed to probe format: {}", e))
            })?;
        let mut format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| {
                PlaybackError::UnsupportedCodec("No decodable audio track".to_string())
            })?;
        let track_id = track.id;
        let declared_rate = track.codec_params.sample_rate;
        debug!(
            track_id,
            codec = FormatDetector::codec_name(track.codec_params.codec),
            sample_rate = ?declared_rate,
            "Selected track"
        );

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| {
                warn!("Failed to create decoder: {}", e);
                PlaybackError::UnsupportedCodec(format!("Failed to create codec decoder: {}", e))
            })?;

        let mut planes: Vec<Vec<f32>> = Vec::new();
        let mut decoded_rate = None;
        while Self::decode_next_packet(
            format_reader.as_mut(),
            decoder.as_mut(),
            track_id,
            &mut planes,
            &mut decoded_rate,
        )? {}

        let sample_rate = declared_rate.or(decoded_rate).ok_or_else(|| {
            PlaybackError::InvalidFormat("Missing sample rate".to_string())
        })?;

        let frames = planes.first().map_or(0, Vec::len);
        if frames == 0 {
            return Err(PlaybackError::DecodingError(
                "Stream decoded to zero frames".to_string(),
            ));
        }
        SampleConverter::count_clipped(&planes);

        info!(
            sample_rate,
            channels = planes.len(),
            frames,
            "Decoded source asset"
        );
        DecodedAudioBuffer::new(sample_rate, planes)
    }

    /// Read and decode the next packet of `track_id` into `planes`.
    ///
    /// Returns `Ok(false)` at end of stream.
    fn decode_next_packet(
        format_reader: &mut dyn FormatReader,
        decoder: &mut dyn Decoder,
        track_id: u32,
        planes: &mut Vec<Vec<f32>>,
        decoded_rate: &mut Option<u32>,
    ) -> Result<bool> {
        let mut consecutive_errors = 0;

        loop {
            let packet = match format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    debug!("Reached end of stream");
                    return Ok(false);
                }
                Err(SymphoniaError::ResetRequired) => {
                    // Chained streams; only the first one is decoded
                    debug!("Track list changed, stopping at first stream");
                    return Ok(false);
                }
                Err(SymphoniaError::IoError(e)) => {
                    consecutive_errors += 1;
                    warn!(
                        "I/O error reading packet (attempt {}/{}): {}",
                        consecutive_errors, MAX_CONSECUTIVE_ERRORS, e
                    );

                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        error!("Too many consecutive I/O errors, giving up");
                        return Err(PlaybackError::CorruptedStream(format!(
                            "Stream I/O failure after {} attempts: {}",
                            MAX_CONSECUTIVE_ERRORS, e
                        )));
                    }

                    continue;
                }
                Err(e) => {
                    error!("Fatal format reader error: {}", e);
                    return Err(PlaybackError::DecodingError(format!(
                        "Failed to read packet: {}",
                        e
                    )));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    decoded_rate.get_or_insert(decoded.spec().rate);
                    SampleConverter::append_planar(&decoded, planes)?;
                    return Ok(true);
                }
                Err(SymphoniaError::IoError(err)) => {
                    consecutive_errors += 1;
                    warn!(
                        "Skipping corrupted packet (I/O error, attempt {}/{}): {}",
                        consecutive_errors, MAX_CONSECUTIVE_ERRORS, err
                    );

                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        error!("Too many consecutive decode errors, stream may be corrupted");
                        return Err(PlaybackError::CorruptedStream(format!(
                            "Stream corruption after {} failed packets",
                            MAX_CONSECUTIVE_ERRORS
                        )));
                    }
                }
                Err(SymphoniaError::DecodeError(err)) => {
                    consecutive_errors += 1;
                    warn!(
                        "Skipping packet with decode error (attempt {}/{}): {}",
                        consecutive_errors, MAX_CONSECUTIVE_ERRORS, err
                    );

                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        error!("Too many consecutive decode errors, codec may be incompatible");
                        return Err(PlaybackError::DecodingError(format!(
                            "Decoder failure after {} failed packets: {}",
                            MAX_CONSECUTIVE_ERRORS, err
                        )));
                    }
                }
                Err(e) => {
                    error!("Fatal decode error: {}", e);
                    return Err(PlaybackError::DecodingError(format!(
                        "Failed to decode packet: {}",
                        e
                    )));
                }
            }
        }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl AudioDecoder for SymphoniaDecoder {
    async fn decode(&self, asset: &SourceAsset) -> Result<DecodedAudioBuffer> {
        Self::decode_all(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::WavCodec;

    #[tokio::test]
    async fn test_decodes_canonical_container() {
        let left: Vec<f32> = (0..64).map(|i| (i as f32 / 64.0) - 0.5).collect();
        let right: Vec<f32> = left.iter().map(|s| -s).collect();
        let container = WavCodec::encode(22050, &[left.clone(), right]).unwrap();
        let asset = SourceAsset::new(container.bytes(), "audio/wav");

        let decoded = SymphoniaDecoder::new().decode(&asset).await.unwrap();
        assert_eq!(decoded.sample_rate(), 22050);
        assert_eq!(decoded.channel_count(), 2);
        assert_eq!(decoded.frames(), 64);

        // 16-bit quantization error stays below one step
        for (got, want) in decoded.channels()[0].iter().zip(&left) {
            assert!((got - want).abs() < 1.0 / 16384.0, "{got} vs {want}");
        }
    }

    #[tokio::test]
    async fn test_wrong_declared_type_still_probes() {
        let container = WavCodec::encode(8000, &[vec![0.25f32; 16]]).unwrap();
        let asset = SourceAsset::new(container.bytes(), "audio/mpeg");

        let decoded = SymphoniaDecoder::new().decode(&asset).await.unwrap();
        assert_eq!(decoded.frames(), 16);
    }

    #[tokio::test]
    async fn test_garbage_is_rejected() {
        let asset = SourceAsset::new(vec![0x5Au8; 512], "");
        let err = SymphoniaDecoder::new().decode(&asset).await.unwrap_err();
        assert!(err.is_format_error());
    }

    #[tokio::test]
    async fn test_empty_data_chunk_decodes_to_nothing() {
        let mut bytes = WavCodec::encode(8000, &[vec![0.0f32; 1]]).unwrap().as_bytes().to_vec();
        bytes.truncate(44);
        bytes[4..8].copy_from_slice(&36u32.to_le_bytes());
        bytes[40..44].copy_from_slice(&0u32.to_le_bytes());

        let asset = SourceAsset::new(bytes, "audio/wav");
        assert!(SymphoniaDecoder::new().decode(&asset).await.is_err());
    }
}
