//! RIFF/WAVE header parsing.

use crate::container::HEADER_LEN;
use crate::error::ContainerError;
use bytes::Buf;
use tracing::trace;

/// `wFormatTag` values the fallback tiers care about.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatCode {
    Pcm = 0x0001,
    IeeeFloat = 0x0003,
    Alaw = 0x0006,
    Mulaw = 0x0007,
    ImaAdpcm = 0x0011,
    Extensible = 0xFFFE,
}

impl FormatCode {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0001 => Some(Self::Pcm),
            0x0003 => Some(Self::IeeeFloat),
            0x0006 => Some(Self::Alaw),
            0x0007 => Some(Self::Mulaw),
            0x0011 => Some(Self::ImaAdpcm),
            0xFFFE => Some(Self::Extensible),
            _ => None,
        }
    }
}

/// Fields read from a RIFF/WAVE header.
///
/// `format_tag` is already resolved through the sub-format GUID when the file
/// uses `WAVE_FORMAT_EXTENSIBLE`. `data_len` is the *declared* size of the
/// data chunk and is not checked against the buffer here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// Offset of the first sample byte.
    pub data_offset: usize,
    pub data_len: u32,
}

impl WavHeader {
    pub fn format_code(&self) -> Option<FormatCode> {
        FormatCode::from_u16(self.format_tag)
    }

    /// Linear PCM at 16 bits, i.e. already what the surface should accept.
    pub fn is_pcm16(&self) -> bool {
        self.format_code() == Some(FormatCode::Pcm) && self.bits_per_sample == 16
    }
}

struct FmtChunk {
    format_tag: u16,
    channels: u16,
    sample_rate: u32,
    byte_rate: u32,
    block_align: u16,
    bits_per_sample: u16,
}

fn malformed(reason: impl Into<String>) -> ContainerError {
    ContainerError::MalformedHeader(reason.into())
}

/// Parse the header of a RIFF/WAVE buffer.
///
/// Chunks are walked in order (word aligned) until both `fmt ` and `data`
/// have been seen, so `LIST`, `fact` and similar chunks may sit anywhere
/// before the samples.
pub(crate) fn parse(bytes: &[u8]) -> Result<WavHeader, ContainerError> {
    if bytes.len() < HEADER_LEN {
        return Err(malformed(format!(
            "buffer is {} bytes, a header needs at least {}",
            bytes.len(),
            HEADER_LEN
        )));
    }
    if &bytes[0..4] != b"RIFF" {
        return Err(malformed("missing RIFF group identifier"));
    }
    if &bytes[8..12] != b"WAVE" {
        return Err(malformed("missing WAVE format identifier"));
    }

    let mut fmt: Option<FmtChunk> = None;
    let mut data: Option<(usize, u32)> = None;
    let mut pos = 12usize;

    while pos + 8 <= bytes.len() && (fmt.is_none() || data.is_none()) {
        let id = &bytes[pos..pos + 4];
        let size = (&bytes[pos + 4..pos + 8]).get_u32_le();
        let body = pos + 8;

        match id {
            b"fmt " => fmt = Some(parse_fmt(&bytes[body..], size)?),
            b"data" => data = Some((body, size)),
            other => trace!(
                chunk = %String::from_utf8_lossy(other),
                size,
                "Skipping chunk"
            ),
        }

        // u64 so a 0xFFFF_FFFF size cannot wrap a 32-bit usize.
        let next = body as u64 + u64::from(size) + u64::from(size & 1);
        match usize::try_from(next) {
            Ok(next) if next <= bytes.len() => pos = next,
            _ => break,
        }
    }

    let fmt = fmt.ok_or_else(|| malformed("missing fmt subchunk"))?;
    let (data_offset, data_len) = data.ok_or_else(|| malformed("missing data subchunk"))?;

    if fmt.channels == 0 {
        return Err(malformed("fmt subchunk declares zero channels"));
    }
    if fmt.sample_rate == 0 {
        return Err(malformed("fmt subchunk declares a zero sample rate"));
    }

    Ok(WavHeader {
        format_tag: fmt.format_tag,
        channels: fmt.channels,
        sample_rate: fmt.sample_rate,
        byte_rate: fmt.byte_rate,
        block_align: fmt.block_align,
        bits_per_sample: fmt.bits_per_sample,
        data_offset,
        data_len,
    })
}

fn parse_fmt(body: &[u8], size: u32) -> Result<FmtChunk, ContainerError> {
    if size < 16 || body.len() < 16 {
        return Err(malformed(format!(
            "fmt subchunk is {} bytes, expected at least 16",
            size
        )));
    }

    let mut cur = &body[..16];
    let mut format_tag = cur.get_u16_le();
    let channels = cur.get_u16_le();
    let sample_rate = cur.get_u32_le();
    let byte_rate = cur.get_u32_le();
    let block_align = cur.get_u16_le();
    let bits_per_sample = cur.get_u16_le();

    // cbSize(2) validBits(2) channelMask(4), then the GUID whose first two
    // bytes carry the real format tag.
    if format_tag == FormatCode::Extensible as u16 && size >= 40 && body.len() >= 26 {
        format_tag = (&body[24..26]).get_u16_le();
    }

    Ok(FmtChunk {
        format_tag,
        channels,
        sample_rate,
        byte_rate,
        block_align,
        bits_per_sample,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{BufMut, BytesMut};

    fn chunk(buf: &mut BytesMut, id: &[u8; 4], body: &[u8]) {
        buf.put_slice(id);
        buf.put_u32_le(body.len() as u32);
        buf.put_slice(body);
        if body.len() % 2 == 1 {
            buf.put_u8(0);
        }
    }

    fn fmt_body(tag: u16, channels: u16, rate: u32, bits: u16) -> Vec<u8> {
        let mut body = BytesMut::new();
        let align = channels * bits / 8;
        body.put_u16_le(tag);
        body.put_u16_le(channels);
        body.put_u32_le(rate);
        body.put_u32_le(rate * align as u32);
        body.put_u16_le(align);
        body.put_u16_le(bits);
        body.to_vec()
    }

    fn riff(chunks: impl FnOnce(&mut BytesMut)) -> Vec<u8> {
        let mut inner = BytesMut::new();
        chunks(&mut inner);
        let mut buf = BytesMut::new();
        buf.put_slice(b"RIFF");
        buf.put_u32_le(4 + inner.len() as u32);
        buf.put_slice(b"WAVE");
        buf.put_slice(&inner);
        buf.to_vec()
    }

    #[test]
    fn test_parse_skips_unknown_chunks() {
        let bytes = riff(|b| {
            chunk(b, b"fmt ", &fmt_body(1, 2, 44100, 24));
            chunk(b, b"LIST", b"INFOISFT\x03\x00\x00\x00ab\x00");
            chunk(b, b"data", &[0u8; 12]);
        });

        let header = parse(&bytes).unwrap();
        assert_eq!(header.format_code(), Some(FormatCode::Pcm));
        assert_eq!(header.channels, 2);
        assert_eq!(header.sample_rate, 44100);
        assert_eq!(header.bits_per_sample, 24);
        assert_eq!(header.block_align, 6);
        assert_eq!(header.data_len, 12);
        assert_eq!(&bytes[header.data_offset - 8..header.data_offset - 4], b"data");
    }

    #[test]
    fn test_parse_resolves_extensible_subformat() {
        let mut fmt = fmt_body(0xFFFE, 1, 48000, 32);
        fmt.extend_from_slice(&22u16.to_le_bytes()); // cbSize
        fmt.extend_from_slice(&32u16.to_le_bytes()); // valid bits
        fmt.extend_from_slice(&4u32.to_le_bytes()); // channel mask
        fmt.extend_from_slice(&3u16.to_le_bytes()); // GUID prefix: IEEE float
        fmt.extend_from_slice(&[0u8; 14]);

        let bytes = riff(|b| {
            chunk(b, b"fmt ", &fmt);
            chunk(b, b"data", &[0u8; 8]);
        });

        let header = parse(&bytes).unwrap();
        assert_eq!(header.format_code(), Some(FormatCode::IeeeFloat));
        assert!(!header.is_pcm16());
    }

    #[test]
    fn test_parse_rejects_short_buffer() {
        let err = parse(b"RIFF\x00\x00\x00\x00WAVE").unwrap_err();
        assert!(matches!(err, ContainerError::MalformedHeader(_)));
    }

    #[test]
    fn test_parse_rejects_missing_markers() {
        let mut bytes = riff(|b| {
            chunk(b, b"fmt ", &fmt_body(1, 1, 8000, 16));
            chunk(b, b"data", &[0u8; 4]);
        });
        bytes[8..12].copy_from_slice(b"AVI ");
        assert!(parse(&bytes).unwrap_err().to_string().contains("WAVE"));

        bytes[0..4].copy_from_slice(b"RIFX");
        assert!(parse(&bytes).unwrap_err().to_string().contains("RIFF"));
    }

    #[test]
    fn test_parse_requires_fmt_and_data() {
        let no_fmt = riff(|b| {
            chunk(b, b"LIST", &[0u8; 20]);
            chunk(b, b"data", &[0u8; 16]);
        });
        assert!(parse(&no_fmt).unwrap_err().to_string().contains("fmt"));

        let no_data = riff(|b| {
            chunk(b, b"fmt ", &fmt_body(1, 1, 8000, 16));
            chunk(b, b"LIST", &[0u8; 20]);
        });
        assert!(parse(&no_data).unwrap_err().to_string().contains("data"));
    }

    #[test]
    fn test_parse_rejects_zero_channels() {
        let bytes = riff(|b| {
            chunk(b, b"fmt ", &fmt_body(1, 0, 8000, 16));
            chunk(b, b"data", &[0u8; 16]);
        });
        assert!(matches!(
            parse(&bytes),
            Err(ContainerError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_parse_survives_maximal_chunk_size() {
        let mut bytes = riff(|b| {
            chunk(b, b"fmt ", &fmt_body(1, 1, 8000, 16));
            chunk(b, b"LIST", &[0u8; 8]);
            chunk(b, b"data", &[0u8; 4]);
        });
        // LIST header sits right after the 24-byte fmt chunk.
        let list_at = 12 + 24 + 4;
        assert_eq!(&bytes[list_at - 4..list_at], b"LIST");
        bytes[list_at..list_at + 4].copy_from_slice(&u32::MAX.to_le_bytes());

        let err = parse(&bytes).unwrap_err();
        assert!(err.to_string().contains("data"));
    }
}
