//! # Header Repair
//!
//! Cheapest fallback tier: reinterpret a structurally valid RIFF/WAVE buffer
//! as 16-bit PCM without involving a decoder.
//!
//! - 16-bit PCM input is re-serialized as-is (a canonical container comes back
//!   byte-identical).
//! - Unsigned 8-bit, signed 24/32-bit PCM and 32/64-bit float input is
//!   rescaled sample by sample. Integer words are normalized by their own
//!   width (negative by `2^(n-1)`, non-negative by `2^(n-1) - 1`) and then
//!   quantized exactly like [`WavCodec::encode`].
//! - A-law and µ-law bytes are expanded with the G.711 tables.
//! - IMA ADPCM is decoded block by block.
//!
//! The channel count, sample rate and data length in the header are trusted.
//! A data chunk that claims more bytes than the buffer holds is not patched up;
//! it is reported as [`RepairError::DataOutOfBounds`] so the caller escalates.

mod g711;
mod ima_adpcm;

use crate::container::{quantize, CanonicalContainer, FormatCode, WavCodec, WavHeader};
use crate::error::RepairError;
use tracing::{debug, instrument};

/// How one sample word is laid out in the source data chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SampleEncoding {
    U8,
    S16,
    S24,
    S32,
    F32,
    F64,
    ALaw,
    MuLaw,
}

impl SampleEncoding {
    fn width(self) -> usize {
        match self {
            Self::U8 | Self::ALaw | Self::MuLaw => 1,
            Self::S16 => 2,
            Self::S24 => 3,
            Self::S32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    /// Convert one little-endian sample word to 16-bit.
    fn to_i16(self, word: &[u8]) -> i16 {
        match self {
            Self::U8 => quantize(normalize(word[0] as i64 - 128, 8)),
            Self::S16 => i16::from_le_bytes([word[0], word[1]]),
            Self::S24 => {
                // Place the 24-bit word in the top of an i32 and shift back to
                // sign-extend.
                let raw = i32::from_le_bytes([0, word[0], word[1], word[2]]) >> 8;
                quantize(normalize(raw as i64, 24))
            }
            Self::S32 => {
                let raw = i32::from_le_bytes([word[0], word[1], word[2], word[3]]);
                quantize(normalize(raw as i64, 32))
            }
            Self::F32 => {
                let raw = f32::from_le_bytes([word[0], word[1], word[2], word[3]]);
                quantize(f64::from(raw))
            }
            Self::F64 => {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(&word[..8]);
                quantize(f64::from_le_bytes(bytes))
            }
            Self::ALaw => g711::expand_alaw(word[0]),
            Self::MuLaw => g711::expand_mulaw(word[0]),
        }
    }
}

/// Shape of the data chunk: fixed-width words or compressed blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceLayout {
    Words(SampleEncoding),
    ImaAdpcm { block_align: usize },
}

impl SourceLayout {
    fn detect(header: &WavHeader) -> Result<Self, RepairError> {
        let encoding = match (header.format_code(), header.bits_per_sample) {
            (Some(FormatCode::Pcm), 8) => SampleEncoding::U8,
            (Some(FormatCode::Pcm), 16) => SampleEncoding::S16,
            (Some(FormatCode::Pcm), 24) => SampleEncoding::S24,
            (Some(FormatCode::Pcm), 32) => SampleEncoding::S32,
            (Some(FormatCode::IeeeFloat), 32) => SampleEncoding::F32,
            (Some(FormatCode::IeeeFloat), 64) => SampleEncoding::F64,
            (Some(FormatCode::Alaw), 8) => SampleEncoding::ALaw,
            (Some(FormatCode::Mulaw), 8) => SampleEncoding::MuLaw,
            (Some(FormatCode::ImaAdpcm), 4)
                if ima_adpcm::is_valid_block(
                    header.block_align as usize,
                    header.channels as usize,
                ) =>
            {
                return Ok(Self::ImaAdpcm {
                    block_align: header.block_align as usize,
                })
            }
            _ => {
                return Err(RepairError::UnsupportedEncoding {
                    format_tag: header.format_tag,
                    bits_per_sample: header.bits_per_sample,
                })
            }
        };
        Ok(Self::Words(encoding))
    }

    /// Bytes in the smallest decodable unit: one frame or one block.
    fn unit_bytes(self, channels: usize) -> usize {
        match self {
            Self::Words(encoding) => encoding.width() * channels,
            Self::ImaAdpcm { block_align } => block_align,
        }
    }

    fn decode(self, data: &[u8], channels: usize) -> Vec<i16> {
        match self {
            Self::Words(encoding) => data
                .chunks_exact(encoding.width())
                .map(|word| encoding.to_i16(word))
                .collect(),
            Self::ImaAdpcm { block_align } => ima_adpcm::decode(data, channels, block_align),
        }
    }
}

/// Map a signed integer sample of `bits` width onto `[-1.0, 1.0]`.
fn normalize(value: i64, bits: u32) -> f64 {
    let half = (1i64 << (bits - 1)) as f64;
    if value < 0 {
        value as f64 / half
    } else {
        value as f64 / (half - 1.0)
    }
}

/// Entry point of the header repair tier.
pub struct HeaderRepair;

impl HeaderRepair {
    /// Reinterpret `source` as canonical 16-bit PCM.
    ///
    /// # Errors
    ///
    /// Every error means "escalate to transcoding":
    /// - [`RepairError::Header`] when the header cannot be parsed
    /// - [`RepairError::UnsupportedEncoding`] for unknown codecs, odd widths
    ///   or ADPCM with an unusable block size
    /// - [`RepairError::DataOutOfBounds`] when the data chunk overruns the buffer
    /// - [`RepairError::NoFrames`] when not even one frame (or ADPCM block) is
    ///   present
    #[instrument(skip(source), fields(len = source.len()))]
    pub fn repair(source: &[u8]) -> Result<CanonicalContainer, RepairError> {
        let header = WavCodec::parse_header(source)?;
        let layout = SourceLayout::detect(&header)?;
        debug!(
            ?layout,
            channels = header.channels,
            sample_rate = header.sample_rate,
            "Parsed repairable header"
        );

        let available = source.len() - header.data_offset;
        let declared = header.data_len as usize;
        if declared > available {
            return Err(RepairError::DataOutOfBounds {
                declared: header.data_len,
                available,
            });
        }

        let channels = header.channels as usize;
        let unit = layout.unit_bytes(channels);
        let units = declared / unit;
        if units == 0 {
            return Err(RepairError::NoFrames);
        }
        if declared % unit != 0 {
            debug!(trailing = declared % unit, "Dropping trailing partial unit");
        }

        let data = &source[header.data_offset..header.data_offset + units * unit];
        let samples = layout.decode(data, channels);
        let frames = samples.len() / channels;

        let container = WavCodec::encode_pcm16(header.sample_rate, header.channels, &samples)?;
        debug!(frames, "Header repair produced canonical container");
        Ok(container)
    }
}
