//! Canonical 16-bit PCM serialization.

use crate::container::{CanonicalContainer, HEADER_LEN};
use crate::error::ContainerError;
use bytes::{BufMut, Bytes, BytesMut};

const BYTES_PER_SAMPLE: u32 = 2;

/// Largest data chunk that keeps the RIFF size (`36 + data`) within 32 bits.
const MAX_DATA_LEN: u64 = u32::MAX as u64 - 36;

/// Scale a nominal `[-1.0, 1.0]` sample to `i16`.
///
/// Out-of-range input is clamped. Negative values scale by 32768 and the rest
/// by 32767, truncating toward zero, so `-1.0 → -32768`, `1.0 → 32767`,
/// `0.0 → 0`. NaN becomes silence.
pub fn quantize(sample: f64) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

fn invalid(reason: impl Into<String>) -> ContainerError {
    ContainerError::InvalidInput(reason.into())
}

/// Validated parameters for one canonical header.
struct Layout {
    channels: u16,
    sample_rate: u32,
    byte_rate: u32,
    block_align: u16,
    data_len: u32,
}

impl Layout {
    fn new(sample_rate: u32, channels: usize, frames: usize) -> Result<Self, ContainerError> {
        if sample_rate == 0 {
            return Err(invalid("sample rate must be positive"));
        }
        if channels == 0 {
            return Err(invalid("at least one channel is required"));
        }
        let channels = u16::try_from(channels)
            .map_err(|_| invalid(format!("{} channels exceed the 16-bit channel field", channels)))?;
        if frames == 0 {
            return Err(invalid("channels hold no samples"));
        }

        let block_align = channels
            .checked_mul(BYTES_PER_SAMPLE as u16)
            .ok_or_else(|| invalid(format!("{} channels overflow block alignment", channels)))?;
        let byte_rate = sample_rate
            .checked_mul(block_align as u32)
            .ok_or_else(|| invalid(format!("byte rate overflows at {} Hz", sample_rate)))?;

        let data_bytes = frames as u64 * block_align as u64;
        if data_bytes > MAX_DATA_LEN {
            return Err(ContainerError::TooLarge { data_bytes });
        }

        Ok(Self {
            channels,
            sample_rate,
            byte_rate,
            block_align,
            data_len: data_bytes as u32,
        })
    }

    fn write_header(&self, buf: &mut BytesMut) {
        buf.put_slice(b"RIFF");
        buf.put_u32_le(36 + self.data_len);
        buf.put_slice(b"WAVE");

        buf.put_slice(b"fmt ");
        buf.put_u32_le(16);
        buf.put_u16_le(1); // linear PCM
        buf.put_u16_le(self.channels);
        buf.put_u32_le(self.sample_rate);
        buf.put_u32_le(self.byte_rate);
        buf.put_u16_le(self.block_align);
        buf.put_u16_le(16);

        buf.put_slice(b"data");
        buf.put_u32_le(self.data_len);
    }

    fn buffer(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(HEADER_LEN + self.data_len as usize);
        self.write_header(&mut buf);
        buf
    }
}

fn finish(buf: BytesMut) -> CanonicalContainer {
    CanonicalContainer::from_encoded(Bytes::from(buf))
}

/// Interleave planar float channels into a canonical container.
pub(crate) fn encode_planar<C: AsRef<[f32]>>(
    sample_rate: u32,
    channels: &[C],
) -> Result<CanonicalContainer, ContainerError> {
    let planes: Vec<&[f32]> = channels.iter().map(AsRef::as_ref).collect();
    let frames = planes.first().map_or(0, |p| p.len());
    if let Some(idx) = planes.iter().position(|p| p.len() != frames) {
        return Err(invalid(format!(
            "channel {} has {} samples, channel 0 has {}",
            idx,
            planes[idx].len(),
            frames
        )));
    }

    let layout = Layout::new(sample_rate, planes.len(), frames)?;
    let mut buf = layout.buffer();
    for frame in 0..frames {
        for plane in &planes {
            buf.put_i16_le(quantize(f64::from(plane[frame])));
        }
    }

    Ok(finish(buf))
}

/// Wrap already-quantized interleaved samples in a canonical container.
pub(crate) fn encode_interleaved_pcm16(
    sample_rate: u32,
    channels: u16,
    interleaved: &[i16],
) -> Result<CanonicalContainer, ContainerError> {
    if channels == 0 {
        return Err(invalid("at least one channel is required"));
    }
    if interleaved.len() % channels as usize != 0 {
        return Err(invalid(format!(
            "{} samples do not divide into {} channels",
            interleaved.len(),
            channels
        )));
    }

    let layout = Layout::new(sample_rate, channels as usize, interleaved.len() / channels as usize)?;
    let mut buf = layout.buffer();
    for &sample in interleaved {
        buf.put_i16_le(sample);
    }

    Ok(finish(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_extremes_and_clamping() {
        assert_eq!(quantize(1.0), 32767);
        assert_eq!(quantize(-1.0), -32768);
        assert_eq!(quantize(1.5), 32767);
        assert_eq!(quantize(-1.5), -32768);
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(f64::NAN), 0);
    }

    #[test]
    fn test_quantize_truncates_toward_zero() {
        assert_eq!(quantize(0.5), 16383); // 16383.5
        assert_eq!(quantize(-0.5), -16384);
        assert_eq!(quantize(-0.00001), 0); // -0.32768
    }

    #[test]
    fn test_header_fields_are_derived() {
        let container = encode_planar(48000, &[vec![0.0f32; 10], vec![0.0; 10], vec![0.0; 10]]).unwrap();
        let bytes = container.as_bytes();

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..16], b"WAVEfmt ");
        assert_eq!(u32::from_le_bytes(bytes[16..20].try_into().unwrap()), 16);
        assert_eq!(u16::from_le_bytes([bytes[20], bytes[21]]), 1);
        assert_eq!(u16::from_le_bytes([bytes[22], bytes[23]]), 3);
        assert_eq!(u32::from_le_bytes(bytes[24..28].try_into().unwrap()), 48000);
        assert_eq!(u32::from_le_bytes(bytes[28..32].try_into().unwrap()), 48000 * 3 * 2);
        assert_eq!(u16::from_le_bytes([bytes[32], bytes[33]]), 6);
        assert_eq!(u16::from_le_bytes([bytes[34], bytes[35]]), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32::from_le_bytes(bytes[40..44].try_into().unwrap()), 60);
    }

    #[test]
    fn test_rejects_bad_input() {
        let empty: [Vec<f32>; 0] = [];
        assert!(matches!(encode_planar(44100, &empty), Err(ContainerError::InvalidInput(_))));
        assert!(encode_planar(0, &[vec![0.1f32]]).is_err());
        assert!(encode_planar(44100, &[Vec::<f32>::new()]).is_err());
        assert!(encode_planar(44100, &[vec![0.1f32, 0.2], vec![0.3]]).is_err());
        assert!(encode_interleaved_pcm16(44100, 2, &[1, 2, 3]).is_err());
        assert!(encode_interleaved_pcm16(44100, 0, &[1]).is_err());
    }

    #[test]
    fn test_byte_rate_overflow_is_rejected() {
        let err = encode_interleaved_pcm16(u32::MAX, 2, &[0, 0]).unwrap_err();
        assert!(err.to_string().contains("byte rate"));
    }

    #[test]
    fn test_interleaved_pcm16_written_verbatim() {
        let container = encode_interleaved_pcm16(8000, 2, &[1, -1, i16::MAX, i16::MIN]).unwrap();
        let samples: Vec<i16> = container.pcm_samples().collect();
        assert_eq!(samples, vec![1, -1, i16::MAX, i16::MIN]);
        assert_eq!(container.frames(), 2);
    }
}
