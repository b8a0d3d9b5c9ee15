//! Transcode defaults and tool locations

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReelError, ReelResult};

/// Highest CRF accepted by x264/x265
pub const MAX_CRF: u8 = 51;

/// Highest audio bitrate accepted, in Kib/s
pub const MAX_AUDIO_BITRATE: u32 = 5000;

/// Largest progress report window read per poll, in bytes
pub const MAX_REPORT_TAIL_BYTES: u64 = 1024 * 1024;

/// Configuration passed into command generation and job supervision.
///
/// Every field has a default so a partial TOML file only needs to name the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeConfig {
    /// ffmpeg binary
    pub ffmpeg_path: PathBuf,
    /// ffprobe binary
    pub ffprobe_path: PathBuf,
    /// Extension appended to output stems, including the leading dot
    pub output_extension: String,
    /// Target video codec name as reported by ffprobe
    pub video_codec: String,
    /// Encoder used when transcoding video; derived from `video_codec` if unset
    pub video_encoder: Option<String>,
    /// Target audio codec
    pub audio_codec: String,
    /// Target subtitle codec
    pub subtitle_codec: String,
    /// Default constant rate factor
    pub crf: u8,
    /// Encoder preset
    pub preset: String,
    /// Output pixel format for transcoded video
    pub pixel_format: String,
    /// Default audio bitrate in Kib/s
    pub audio_bitrate: u32,
    /// Coordinator tick, in milliseconds
    pub poll_interval_ms: u64,
    /// Size of the trailing window read from the progress report
    pub report_tail_bytes: u64,
    /// Lines sampled from a subtitle file when guessing its encoding
    pub encoding_sample_lines: usize,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            output_extension: ".mp4".to_string(),
            video_codec: "h264".to_string(),
            video_encoder: None,
            audio_codec: "aac".to_string(),
            subtitle_codec: "mov_text".to_string(),
            crf: 18,
            preset: "medium".to_string(),
            pixel_format: "yuv420p".to_string(),
            audio_bitrate: 384,
            poll_interval_ms: 200,
            report_tail_bytes: 512,
            encoding_sample_lines: 10,
        }
    }
}

impl TranscodeConfig {
    /// Encoder name handed to ffmpeg when video must be transcoded
    pub fn video_encoder(&self) -> &str {
        if let Some(encoder) = &self.video_encoder {
            return encoder;
        }
        match self.video_codec.as_str() {
            "h264" => "libx264",
            "hevc" => "libx265",
            "av1" => "libsvtav1",
            "vp9" => "libvpx-vp9",
            other => other,
        }
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> ReelResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ReelError::config(format!("Failed to parse TOML config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file
    pub fn from_file(path: &Path) -> ReelResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ReelError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Range and sanity checks
    pub fn validate(&self) -> ReelResult<()> {
        if self.crf > MAX_CRF {
            return Err(ReelError::config(format!(
                "CRF value cannot exceed {}",
                MAX_CRF
            )));
        }
        if self.audio_bitrate == 0 || self.audio_bitrate > MAX_AUDIO_BITRATE {
            return Err(ReelError::config(format!(
                "Audio bitrate must be between 1 and {} Kib/s",
                MAX_AUDIO_BITRATE
            )));
        }
        for (name, value) in [
            ("video_codec", &self.video_codec),
            ("audio_codec", &self.audio_codec),
            ("subtitle_codec", &self.subtitle_codec),
            ("preset", &self.preset),
            ("pixel_format", &self.pixel_format),
        ] {
            if value.trim().is_empty() {
                return Err(ReelError::config(format!("{} cannot be empty", name)));
            }
        }
        if !self.output_extension.starts_with('.') || self.output_extension.len() < 2 {
            return Err(ReelError::config(format!(
                "Output extension must start with a dot: {:?}",
                self.output_extension
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(ReelError::config("Poll interval must be positive"));
        }
        if self.report_tail_bytes < 64 || self.report_tail_bytes > MAX_REPORT_TAIL_BYTES {
            return Err(ReelError::config(format!(
                "Progress report window must be between 64 and {} bytes",
                MAX_REPORT_TAIL_BYTES
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TranscodeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.video_encoder(), "libx264");
        assert_eq!(config.crf, 18);
        assert_eq!(config.audio_bitrate, 384);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TranscodeConfig::from_toml_str(
            r#"
            video_codec = "hevc"
            crf = 22
            "#,
        )
        .unwrap();
        assert_eq!(config.video_codec, "hevc");
        assert_eq!(config.video_encoder(), "libx265");
        assert_eq!(config.crf, 22);
        assert_eq!(config.audio_codec, "aac");
    }

    #[test]
    fn test_explicit_encoder_wins() {
        let config = TranscodeConfig {
            video_encoder: Some("h264_nvenc".to_string()),
            ..TranscodeConfig::default()
        };
        assert_eq!(config.video_encoder(), "h264_nvenc");
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        assert!(TranscodeConfig::from_toml_str("crf = 60").is_err());
        assert!(TranscodeConfig::from_toml_str("audio_bitrate = 0").is_err());
        assert!(TranscodeConfig::from_toml_str("output_extension = \"mp4\"").is_err());
        assert!(TranscodeConfig::from_toml_str("poll_interval_ms = 0").is_err());
        assert!(TranscodeConfig::from_toml_str("crf = \"high\"").is_err());
    }

    #[test]
    fn test_report_window_bounds() {
        assert!(TranscodeConfig::from_toml_str("report_tail_bytes = 63").is_err());
        assert!(TranscodeConfig::from_toml_str("report_tail_bytes = 4611686018427387904").is_err());
        let config = TranscodeConfig::from_toml_str("report_tail_bytes = 1048576").unwrap();
        assert_eq!(config.report_tail_bytes, MAX_REPORT_TAIL_BYTES);
    }
}
