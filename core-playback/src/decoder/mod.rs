//! # Audio Decoder Module
//!
//! In-memory decoding for the transcoding tier, using the Symphonia library.
//!
//! ## Supported Formats
//!
//! | Format | Codec | Feature Flag |
//! |--------|-------|--------------|
//! | WAV | PCM, ADPCM | `decoder-wav` |
//! | MP3 | MPEG-1/2 Audio Layer III | `decoder-mp3` |
//! | FLAC | Free Lossless Audio Codec | `decoder-flac` |
//! | Vorbis | Ogg Vorbis | `decoder-vorbis` |
//! | AAC | Advanced Audio Coding (MP4) | `decoder-aac` |
//! | ALAC | Apple Lossless (MP4) | `decoder-alac` |
//!
//! ## Pipeline
//!
//! ```text
//! SourceAsset bytes → MediaSourceStream → FormatReader → Decoder → planar f32
//! ```
//!
//! Without the `core-decoder` feature the module is empty and hosts bring
//! their own [`AudioDecoder`](crate::traits::AudioDecoder).

#[cfg(feature = "core-decoder")]
mod format_detector;

#[cfg(feature = "core-decoder")]
mod sample_converter;

#[cfg(feature = "core-decoder")]
mod symphonia;

#[cfg(feature = "core-decoder")]
pub use self::symphonia::SymphoniaDecoder;

#[cfg(feature = "core-decoder")]
pub use format_detector::FormatDetector;

#[cfg(feature = "core-decoder")]
pub use sample_converter::SampleConverter;
