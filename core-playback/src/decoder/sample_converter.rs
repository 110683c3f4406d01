//! # Sample Format Converter
//!
//! Converts decoded Symphonia buffers into planar `f32` channels.

use crate::error::{PlaybackError, Result};
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::conv::IntoSample;
use symphonia::core::sample::Sample;
use tracing::warn;

/// Sample converter that normalizes audio to planar f32.
///
/// Symphonia outputs audio in various sample formats (u8 through f64). This
/// converter maps everything into `[-1.0, 1.0]` floats and appends it to one
/// growing buffer per channel.
pub struct SampleConverter;

impl SampleConverter {
    /// Append every channel of `buffer` to `planes`.
    ///
    /// `planes` is sized on the first call. Later buffers must carry the same
    /// number of channels.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::DecodingError`] if the channel count changed since the
    /// first buffer.
    pub fn append_planar(buffer: &AudioBufferRef<'_>, planes: &mut Vec<Vec<f32>>) -> Result<()> {
        match buffer {
            AudioBufferRef::F32(buf) => Self::append_with(&**buf, planes, |s: f32| s),
            AudioBufferRef::F64(buf) => Self::append_with(&**buf, planes, |s: f64| s.into_sample()),
            AudioBufferRef::S32(buf) => Self::append_with(&**buf, planes, |s: i32| s.into_sample()),
            AudioBufferRef::S24(buf) => {
                Self::append_with(&**buf, planes, |s| IntoSample::<f32>::into_sample(s))
            }
            AudioBufferRef::S16(buf) => Self::append_with(&**buf, planes, |s: i16| s.into_sample()),
            AudioBufferRef::S8(buf) => Self::append_with(&**buf, planes, |s: i8| s.into_sample()),
            AudioBufferRef::U32(buf) => Self::append_with(&**buf, planes, |s: u32| s.into_sample()),
            AudioBufferRef::U24(buf) => {
                Self::append_with(&**buf, planes, |s| IntoSample::<f32>::into_sample(s))
            }
            AudioBufferRef::U16(buf) => Self::append_with(&**buf, planes, |s: u16| s.into_sample()),
            AudioBufferRef::U8(buf) => Self::append_with(&**buf, planes, |s: u8| s.into_sample()),
        }
    }

    fn append_with<T>(
        buf: &AudioBuffer<T>,
        planes: &mut Vec<Vec<f32>>,
        convert: fn(T) -> f32,
    ) -> Result<()>
    where
        T: Sample + Copy,
    {
        let num_channels = buf.spec().channels.count();
        if planes.is_empty() {
            planes.resize_with(num_channels, Vec::new);
        } else if planes.len() != num_channels {
            return Err(PlaybackError::DecodingError(format!(
                "Channel count changed mid-stream from {} to {}",
                planes.len(),
                num_channels
            )));
        }

        for (chan_idx, plane) in planes.iter_mut().enumerate() {
            plane.extend(buf.chan(chan_idx).iter().map(|&s| convert(s)));
        }

        Ok(())
    }

    /// Count samples outside `[-1.0, 1.0]` and warn when there are any.
    ///
    /// The codec clamps them later; this only surfaces decoders that
    /// overshoot.
    pub fn count_clipped(planes: &[Vec<f32>]) -> usize {
        let total: usize = planes.iter().map(Vec::len).sum();
        let clipped = planes
            .iter()
            .flatten()
            .filter(|&&s| !(-1.0..=1.0).contains(&s))
            .count();

        if clipped > 0 {
            warn!(
                "Detected {} clipped samples ({:.2}% of total)",
                clipped,
                (clipped as f64 / total as f64) * 100.0
            );
        }

        clipped
    }
}
