//! # Canonical Container Codec
//!
//! Every repaired or transcoded asset ends up in the same shape: a 44-byte
//! RIFF/WAVE header (one `fmt ` subchunk of 16 bytes declaring linear PCM,
//! bits per sample = 16) followed by a single `data` subchunk of interleaved
//! little-endian `i16` samples and nothing after it.
//!
//! ```text
//! 0   "RIFF"  u32 36 + data_len  "WAVE"
//! 12  "fmt "  u32 16  u16 1  u16 channels  u32 rate  u32 rate*ch*2  u16 ch*2  u16 16
//! 36  "data"  u32 data_len
//! 44  i16 samples, frame-major (ch0[0], ch1[0], ch0[1], ...)
//! ```
//!
//! [`WavCodec::encode`] is bit-exact and deterministic. [`WavCodec::parse_header`]
//! is best-effort and accepts any RIFF/WAVE layout the repair tier might
//! be able to reinterpret.

mod encode;
mod header;

pub use encode::quantize;
pub use header::{FormatCode, WavHeader};

use crate::error::ContainerError;
use crate::traits::DecodedAudioBuffer;
use bytes::{Buf, Bytes};

/// Size of the canonical header in bytes.
pub const HEADER_LEN: usize = 44;

/// Media type announced to the playback surface for canonical output.
pub const CANONICAL_MEDIA_TYPE: &str = "audio/wav";

/// A canonical 16-bit PCM container.
///
/// Only the codec can construct one, so the header always agrees with the
/// payload: RIFF size = 36 + data size, data size = channels × frames × 2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalContainer(Bytes);

impl CanonicalContainer {
    fn from_encoded(bytes: Bytes) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Cheap handle to the encoded bytes.
    pub fn bytes(&self) -> Bytes {
        self.0.clone()
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true; a container always carries a header and one frame.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn media_type(&self) -> &'static str {
        CANONICAL_MEDIA_TYPE
    }

    pub fn channels(&self) -> u16 {
        (&self.0[22..24]).get_u16_le()
    }

    pub fn sample_rate(&self) -> u32 {
        (&self.0[24..28]).get_u32_le()
    }

    /// Declared RIFF size (total length minus 8).
    pub fn riff_size(&self) -> u32 {
        (&self.0[4..8]).get_u32_le()
    }

    /// Declared data subchunk size in bytes.
    pub fn data_len(&self) -> u32 {
        (&self.0[40..44]).get_u32_le()
    }

    /// Samples per channel.
    pub fn frames(&self) -> usize {
        self.data_len() as usize / (self.channels() as usize * 2)
    }

    /// Interleaved samples in writing order.
    pub fn pcm_samples(&self) -> impl Iterator<Item = i16> + '_ {
        self.0[HEADER_LEN..]
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
    }
}

impl AsRef<[u8]> for CanonicalContainer {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Entry points of the canonical container codec.
pub struct WavCodec;

impl WavCodec {
    /// Encode planar float channels (`channels[c][i]`) at `sample_rate`.
    ///
    /// # Errors
    ///
    /// [`ContainerError::InvalidInput`] when there are no channels, the rate
    /// is zero, channels are empty or differ in length;
    /// [`ContainerError::TooLarge`] when the data would overflow the RIFF size.
    pub fn encode<C: AsRef<[f32]>>(
        sample_rate: u32,
        channels: &[C],
    ) -> Result<CanonicalContainer, ContainerError> {
        encode::encode_planar(sample_rate, channels)
    }

    pub fn encode_buffer(buffer: &DecodedAudioBuffer) -> Result<CanonicalContainer, ContainerError> {
        encode::encode_planar(buffer.sample_rate(), buffer.channels())
    }

    /// Encode samples that are already 16-bit and interleaved.
    pub fn encode_pcm16(
        sample_rate: u32,
        channels: u16,
        interleaved: &[i16],
    ) -> Result<CanonicalContainer, ContainerError> {
        encode::encode_interleaved_pcm16(sample_rate, channels, interleaved)
    }

    /// Read the header of an arbitrary RIFF/WAVE buffer.
    ///
    /// # Errors
    ///
    /// [`ContainerError::MalformedHeader`] if the buffer is shorter than
    /// [`HEADER_LEN`], lacks `RIFF`/`WAVE`, or has no usable `fmt `/`data`
    /// subchunks.
    pub fn parse_header(bytes: &[u8]) -> Result<WavHeader, ContainerError> {
        header::parse(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_and_riff_size_agree() {
        for (rate, channels, frames) in [(8000u32, 1usize, 1usize), (44100, 2, 17), (96000, 6, 256)] {
            let planes = vec![vec![0.25f32; frames]; channels];
            let container = WavCodec::encode(rate, &planes).unwrap();

            assert_eq!(container.len(), HEADER_LEN + channels * frames * 2);
            assert_eq!(container.riff_size() as usize, container.len() - 8);
            assert_eq!(container.riff_size(), 36 + container.data_len());
            assert_eq!(container.frames(), frames);
            assert_eq!(container.channels() as usize, channels);
            assert_eq!(container.sample_rate(), rate);
        }
    }

    #[test]
    fn test_frame_major_interleaving() {
        let container = WavCodec::encode(
            16000,
            &[vec![0.0f32, 0.5, -0.5], vec![1.0f32, -1.0, 0.0]],
        )
        .unwrap();
        let samples: Vec<i16> = container.pcm_samples().collect();
        assert_eq!(samples, vec![0, 32767, 16383, -32768, -16384, 0]);
    }

    #[test]
    fn test_out_of_range_samples_clamp() {
        let clamped = WavCodec::encode(8000, &[vec![1.5f32, -1.5]]).unwrap();
        let nominal = WavCodec::encode(8000, &[vec![1.0f32, -1.0]]).unwrap();
        assert_eq!(clamped, nominal);
        assert_eq!(clamped.pcm_samples().collect::<Vec<_>>(), vec![32767, -32768]);
    }

    #[test]
    fn test_encoded_header_parses_back() {
        let container = WavCodec::encode(22050, &[vec![0.1f32; 4], vec![-0.1f32; 4]]).unwrap();
        let header = WavCodec::parse_header(container.as_bytes()).unwrap();

        assert!(header.is_pcm16());
        assert_eq!(header.channels, 2);
        assert_eq!(header.sample_rate, 22050);
        assert_eq!(header.byte_rate, 22050 * 4);
        assert_eq!(header.block_align, 4);
        assert_eq!(header.data_offset, HEADER_LEN);
        assert_eq!(header.data_len, 16);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let planes = [vec![0.3f32, -0.7, 0.9]];
        assert_eq!(
            WavCodec::encode(11025, &planes).unwrap().as_bytes(),
            WavCodec::encode(11025, &planes).unwrap().as_bytes()
        );
    }
}
