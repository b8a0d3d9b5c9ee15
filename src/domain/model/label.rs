// Display-only metadata derived from probe data

use std::time::Duration;

use serde::Serialize;

use crate::domain::model::StreamKind;
use crate::probe::{ProbeDocument, ProbeStream};

const BITS_PER_KIB: f64 = 1024.0;
const BITS_PER_MIB: f64 = 1024.0 * 1024.0;
const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Informational metadata for a stream.
///
/// Only `bitrate` ever influences output: an audio stream that must be
/// transcoded without a custom bitrate reuses it as the target.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreamLabel {
    pub title: String,
    /// Mib/s for video, Kib/s for audio, `None` otherwise or when unknown
    pub bitrate: Option<f64>,
    /// `WIDTHxHEIGHT`, empty when unknown
    pub resolution: String,
    pub language: String,
    /// Channel layout (stereo, 5.1, ...)
    pub channels: String,
    pub is_default: bool,
}

impl StreamLabel {
    /// Derive a label from one probed stream
    pub fn from_probe(kind: &StreamKind, info: &ProbeStream) -> Self {
        let bits = info.bit_rate as f64;
        let bitrate = match kind {
            StreamKind::Video if info.bit_rate > 0 => Some(round2(bits / BITS_PER_MIB)),
            StreamKind::Audio if info.bit_rate > 0 => Some((bits / BITS_PER_KIB).round()),
            _ => None,
        };
        let resolution = match (info.display_width(), info.display_height()) {
            (Some(width), Some(height)) => format!("{}x{}", width, height),
            _ => String::new(),
        };

        Self {
            title: info.tags.title.clone(),
            bitrate,
            resolution,
            language: info.tags.language.clone(),
            channels: info.channel_layout.clone(),
            is_default: info.disposition.default != 0,
        }
    }

    /// Detected audio bitrate in whole Kib/s, if any
    pub fn audio_kbps(&self) -> Option<u32> {
        self.bitrate
            .map(|b| b.round())
            .filter(|b| *b >= 1.0)
            .map(|b| b as u32)
    }

    /// Mark or unmark this stream as the default of its type
    pub fn set_default(&mut self, is_default: bool) {
        self.is_default = is_default;
    }
}

/// Informational metadata for a whole container, computed once
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContainerLabel {
    pub title: String,
    /// File size in MiB
    pub size: Option<f64>,
    /// Overall bitrate in Mib/s
    pub bitrate: Option<f64>,
    /// Long format name
    pub format: String,
    /// Duration rounded to whole seconds
    pub length: Option<Duration>,
}

impl ContainerLabel {
    pub fn from_probe(info: &ProbeDocument) -> Self {
        let format = &info.format;
        let size = (format.size > 0).then(|| round2(format.size as f64 / BYTES_PER_MIB));
        let bitrate =
            (format.bit_rate > 0).then(|| round2(format.bit_rate as f64 / BITS_PER_MIB));
        let length = format
            .duration
            .filter(|d| *d > 0.0)
            .map(|d| Duration::from_secs(d.round() as u64));

        Self {
            title: format.tags.title.clone(),
            size,
            bitrate,
            format: format.format_long_name.clone(),
            length,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
