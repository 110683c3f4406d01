//! # Format Detection Module
//!
//! Turns the media type an asset was declared with into a probe hint for
//! Symphonia. The declared type is untrusted; a wrong hint only costs probe
//! time, the probe still inspects the actual bytes.

use symphonia::core::codecs::CodecType;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Format detector for in-memory assets.
pub struct FormatDetector;

impl FormatDetector {
    /// Create a probe hint from a declared media type.
    ///
    /// Parameters such as `; codecs=...` are ignored. Known audio types also
    /// set the matching file extension, which Symphonia's probe weighs more
    /// reliably than the MIME type.
    ///
    /// # Example
    ///
    /// ```rust
    /// use core_playback::FormatDetector;
    ///
    /// let hint = FormatDetector::hint_from_mime_type(Some("audio/mpeg"));
    /// // Hint will be configured for MP3 detection
    /// ```
    pub fn hint_from_mime_type(media_type: Option<&str>) -> Hint {
        let mut hint = Hint::new();

        let Some(essence) = media_type.map(Self::essence).filter(|m| !m.is_empty()) else {
            debug!("No declared media type, probe will auto-detect");
            return hint;
        };

        hint.mime_type(&essence);
        if let Some(extension) = Self::extension_for_mime_type(&essence) {
            debug!(media_type = %essence, extension, "Setting probe hint");
            hint.with_extension(extension);
        } else {
            debug!(media_type = %essence, "Unrecognized media type, probe will auto-detect");
        }

        hint
    }

    /// Common file extension for a media type, if it is an audio type we
    /// know about.
    pub fn extension_for_mime_type(media_type: &str) -> Option<&'static str> {
        let extension = match Self::essence(media_type).as_str() {
            "audio/mpeg" | "audio/mp3" | "audio/mpeg3" | "audio/x-mpeg-3" => "mp3",
            "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave" => "wav",
            "audio/flac" | "audio/x-flac" => "flac",
            "audio/ogg" | "audio/vorbis" | "application/ogg" => "ogg",
            "audio/mp4" | "audio/m4a" | "audio/x-m4a" | "audio/aac" => "m4a",
            _ => return None,
        };
        Some(extension)
    }

    /// Human-readable codec name for logs.
    pub fn codec_name(codec_type: CodecType) -> &'static str {
        use symphonia::core::codecs::*;

        if codec_type == CODEC_TYPE_MP3 {
            "mp3"
        } else if codec_type == CODEC_TYPE_AAC {
            "aac"
        } else if codec_type == CODEC_TYPE_FLAC {
            "flac"
        } else if codec_type == CODEC_TYPE_VORBIS {
            "vorbis"
        } else if codec_type == CODEC_TYPE_ALAC {
            "alac"
        } else if codec_type == CODEC_TYPE_ADPCM_IMA_WAV || codec_type == CODEC_TYPE_ADPCM_MS {
            "adpcm"
        } else if codec_type == CODEC_TYPE_PCM_S16LE
            || codec_type == CODEC_TYPE_PCM_S24LE
            || codec_type == CODEC_TYPE_PCM_S32LE
            || codec_type == CODEC_TYPE_PCM_U8
            || codec_type == CODEC_TYPE_PCM_F32LE
            || codec_type == CODEC_TYPE_PCM_F64LE
            || codec_type == CODEC_TYPE_PCM_ALAW
            || codec_type == CODEC_TYPE_PCM_MULAW
        {
            "pcm"
        } else {
            "unknown"
        }
    }

    fn essence(media_type: &str) -> String {
        media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symphonia::core::codecs::{CODEC_TYPE_MP3, CODEC_TYPE_NULL, CODEC_TYPE_PCM_S16LE};

    #[test]
    fn test_extension_for_mime_type() {
        assert_eq!(FormatDetector::extension_for_mime_type("audio/mpeg"), Some("mp3"));
        assert_eq!(FormatDetector::extension_for_mime_type("audio/x-wav"), Some("wav"));
        assert_eq!(FormatDetector::extension_for_mime_type("audio/flac"), Some("flac"));
        assert_eq!(FormatDetector::extension_for_mime_type("application/ogg"), Some("ogg"));
        assert_eq!(FormatDetector::extension_for_mime_type("audio/mp4"), Some("m4a"));
        assert_eq!(FormatDetector::extension_for_mime_type("video/webm"), None);
    }

    #[test]
    fn test_media_type_parameters_and_case_are_ignored() {
        assert_eq!(
            FormatDetector::extension_for_mime_type("Audio/OGG; codecs=vorbis"),
            Some("ogg")
        );
    }

    #[test]
    fn test_hint_from_mime_type() {
        // Hint is opaque, but none of these should panic
        let _ = FormatDetector::hint_from_mime_type(Some("audio/mpeg"));
        let _ = FormatDetector::hint_from_mime_type(Some("  "));
        let _ = FormatDetector::hint_from_mime_type(None);
    }

    #[test]
    fn test_codec_name() {
        assert_eq!(FormatDetector::codec_name(CODEC_TYPE_MP3), "mp3");
        assert_eq!(FormatDetector::codec_name(CODEC_TYPE_PCM_S16LE), "pcm");
        assert_eq!(FormatDetector::codec_name(CODEC_TYPE_NULL), "unknown");
    }
}
