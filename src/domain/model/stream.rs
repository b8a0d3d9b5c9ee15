// Elementary streams and the per-stream copy/transcode decision

use std::fmt;

use serde::{Serialize, Serializer};

use crate::config::{TranscodeConfig, MAX_AUDIO_BITRATE, MAX_CRF};
use crate::domain::model::StreamLabel;
use crate::error::{ReelError, ReelResult};
use crate::probe::ProbeStream;

/// Multimedia type of a stream, as reported by `codec_type`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
    /// Data, attachment, or anything else ffprobe reports
    Other(String),
}

impl StreamKind {
    pub fn from_codec_type(codec_type: &str) -> Self {
        match codec_type {
            "video" => StreamKind::Video,
            "audio" => StreamKind::Audio,
            "subtitle" => StreamKind::Subtitle,
            other => StreamKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StreamKind::Video => "video",
            StreamKind::Audio => "audio",
            StreamKind::Subtitle => "subtitle",
            StreamKind::Other(name) => name,
        }
    }

    /// Only audio, video and subtitle streams can be written to the output
    pub fn is_output_eligible(&self) -> bool {
        !matches!(self, StreamKind::Other(_))
    }

    /// Per-type codec option for the given output slot, e.g. `-c:v:0`
    pub fn codec_slot_option(&self, slot: usize) -> Option<String> {
        let specifier = match self {
            StreamKind::Video => "v",
            StreamKind::Audio => "a",
            StreamKind::Subtitle => "s",
            StreamKind::Other(_) => return None,
        };
        Some(format!("-c:{}:{}", specifier, slot))
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StreamKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Codec options chosen for one stream and the summary describing them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamPlan {
    /// Tokens that follow the codec slot option
    pub args: Vec<String>,
    /// `copy` or `transcode -> <codec>[, param=value]`
    pub summary: String,
}

impl StreamPlan {
    fn copy() -> Self {
        Self {
            args: vec!["copy".to_string()],
            summary: "copy".to_string(),
        }
    }
}

/// Running per-type output slot numbers.
///
/// Video, audio and subtitle slots are counted independently, each starting
/// at 0, in the order streams are written to the command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotCounter {
    video: usize,
    audio: usize,
    subtitle: usize,
}

impl SlotCounter {
    /// Claim the next slot for a stream type
    pub fn next(&mut self, kind: &StreamKind) -> usize {
        let counter = match kind {
            StreamKind::Video => &mut self.video,
            StreamKind::Audio => &mut self.audio,
            StreamKind::Subtitle => &mut self.subtitle,
            StreamKind::Other(_) => return 0,
        };
        let slot = *counter;
        *counter += 1;
        slot
    }
}

/// One elementary stream inside a container
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stream {
    /// Stable identifier within the container
    pub index: usize,
    pub kind: StreamKind,
    /// Source codec name
    pub codec: String,
    custom_crf: Option<u8>,
    custom_bitrate: Option<u32>,
    pub label: StreamLabel,
    option_summary: Option<String>,
}

impl Stream {
    pub fn new(index: usize, kind: StreamKind, codec: impl Into<String>) -> Self {
        Self {
            index,
            kind,
            codec: codec.into(),
            custom_crf: None,
            custom_bitrate: None,
            label: StreamLabel::default(),
            option_summary: None,
        }
    }

    pub fn with_label(mut self, label: StreamLabel) -> Self {
        self.label = label;
        self
    }

    pub fn from_probe(info: &ProbeStream) -> Self {
        let kind = StreamKind::from_codec_type(&info.codec_type);
        let label = StreamLabel::from_probe(&kind, info);
        Self::new(info.index as usize, kind, info.codec_name.clone()).with_label(label)
    }

    pub fn custom_crf(&self) -> Option<u8> {
        self.custom_crf
    }

    pub fn custom_bitrate(&self) -> Option<u32> {
        self.custom_bitrate
    }

    /// Summary of the most recent option build, if any
    pub fn option_summary(&self) -> Option<&str> {
        self.option_summary.as_deref()
    }

    /// Force video transcoding at a given CRF, or clear it with `None`
    pub fn set_custom_crf(&mut self, crf: Option<u8>) -> ReelResult<()> {
        if self.kind != StreamKind::Video {
            return Err(ReelError::selection(format!(
                "Stream {} is {}, CRF only applies to video",
                self.index, self.kind
            )));
        }
        if let Some(value) = crf {
            if value > MAX_CRF {
                return Err(ReelError::selection(format!(
                    "CRF {} is outside 0-{}",
                    value, MAX_CRF
                )));
            }
        }
        self.custom_crf = crf;
        Ok(())
    }

    /// Force audio transcoding at a bitrate in Kib/s, or clear it with `None`
    pub fn set_custom_bitrate(&mut self, bitrate: Option<u32>) -> ReelResult<()> {
        if self.kind != StreamKind::Audio {
            return Err(ReelError::selection(format!(
                "Stream {} is {}, bitrate only applies to audio",
                self.index, self.kind
            )));
        }
        if let Some(value) = bitrate {
            if value == 0 || value > MAX_AUDIO_BITRATE {
                return Err(ReelError::selection(format!(
                    "Bitrate {} is outside 1-{} Kib/s",
                    value, MAX_AUDIO_BITRATE
                )));
            }
        }
        self.custom_bitrate = bitrate;
        Ok(())
    }

    /// Decide copy vs transcode for this stream at the given output slot.
    pub fn plan(&self, slot: usize, config: &TranscodeConfig) -> StreamPlan {
        match &self.kind {
            StreamKind::Video => {
                if self.custom_crf.is_none() && self.codec == config.video_codec {
                    return StreamPlan::copy();
                }
                let crf = self.custom_crf.unwrap_or(config.crf);
                StreamPlan {
                    args: vec![
                        config.video_encoder().to_string(),
                        "-preset".to_string(),
                        config.preset.clone(),
                        "-crf".to_string(),
                        crf.to_string(),
                        "-pix_fmt".to_string(),
                        config.pixel_format.clone(),
                    ],
                    summary: format!("transcode -> {}, crf={}", config.video_codec, crf),
                }
            }
            StreamKind::Audio => {
                if self.custom_bitrate.is_none() && self.codec == config.audio_codec {
                    return StreamPlan::copy();
                }
                let bitrate = self
                    .custom_bitrate
                    .or_else(|| self.label.audio_kbps())
                    .unwrap_or(config.audio_bitrate);
                StreamPlan {
                    args: vec![
                        config.audio_codec.clone(),
                        format!("-b:a:{}", slot),
                        format!("{}k", bitrate),
                    ],
                    summary: format!(
                        "transcode -> {}, bitrate={}Kib/s",
                        config.audio_codec, bitrate
                    ),
                }
            }
            StreamKind::Subtitle => {
                if self.codec == config.subtitle_codec {
                    return StreamPlan::copy();
                }
                StreamPlan {
                    args: vec![config.subtitle_codec.clone()],
                    summary: format!("transcode -> {}", config.subtitle_codec),
                }
            }
            StreamKind::Other(kind) => StreamPlan {
                args: Vec::new(),
                summary: format!("skip ({})", kind),
            },
        }
    }

    /// Build codec options for the given output slot and record the decision
    /// in `option_summary`. The last call wins.
    pub fn build_options(&mut self, slot: usize, config: &TranscodeConfig) -> Vec<String> {
        let plan = self.plan(slot, config);
        self.option_summary = Some(plan.summary);
        plan.args
    }
}
