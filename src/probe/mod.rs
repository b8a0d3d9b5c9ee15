//! Probe document model
//!
//! Mirrors the subset of `ffprobe -show_format -show_streams -of json` output
//! that container construction reads. ffprobe encodes most numbers as JSON
//! strings while hand-built documents tend to use plain numbers, so numeric
//! fields accept either form. Anything missing or unparsable falls back to
//! empty/zero; only the duration is checked later.

use serde::{Deserialize, Deserializer, Serialize};

pub mod inspector;

/// Top-level probe document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeDocument {
    /// Container-level information
    #[serde(default)]
    pub format: ProbeFormat,
    /// Elementary streams in container order
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
}

/// `format` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeFormat {
    #[serde(default)]
    pub filename: String,
    /// Duration in seconds
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub duration: Option<f64>,
    /// Size in bytes
    #[serde(default, deserialize_with = "lenient_u64")]
    pub size: u64,
    /// Overall bitrate in bits per second
    #[serde(default, deserialize_with = "lenient_u64")]
    pub bit_rate: u64,
    #[serde(default)]
    pub format_long_name: String,
    #[serde(default)]
    pub tags: ProbeTags,
}

/// One entry of `streams`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeStream {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub index: u64,
    #[serde(default)]
    pub codec_type: String,
    #[serde(default)]
    pub codec_name: String,
    /// Bits per second
    #[serde(default, deserialize_with = "lenient_u64")]
    pub bit_rate: u64,
    #[serde(default)]
    pub tags: ProbeTags,
    #[serde(default)]
    pub channel_layout: String,
    #[serde(default, deserialize_with = "lenient_opt_u32")]
    pub width: Option<u32>,
    #[serde(default, deserialize_with = "lenient_opt_u32")]
    pub height: Option<u32>,
    #[serde(default, deserialize_with = "lenient_opt_u32")]
    pub coded_width: Option<u32>,
    #[serde(default, deserialize_with = "lenient_opt_u32")]
    pub coded_height: Option<u32>,
    #[serde(default)]
    pub disposition: ProbeDisposition,
}

/// Metadata tags. Matroska files often carry upper-case keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeTags {
    #[serde(default, alias = "TITLE")]
    pub title: String,
    #[serde(default, alias = "LANGUAGE")]
    pub language: String,
}

/// Stream disposition flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeDisposition {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub default: u64,
}

impl ProbeDocument {
    /// Parse ffprobe JSON output
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl ProbeStream {
    /// Frame width, preferring the display size over the coded size
    pub fn display_width(&self) -> Option<u32> {
        self.width.or(self.coded_width).filter(|w| *w > 0)
    }

    /// Frame height, preferring the display size over the coded size
    pub fn display_height(&self) -> Option<u32> {
        self.height.or(self.coded_height).filter(|h| *h > 0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Unsigned(u64),
    Float(f64),
    Text(String),
}

impl NumberOrText {
    fn as_f64(&self) -> Option<f64> {
        match self {
            NumberOrText::Unsigned(v) => Some(*v as f64),
            NumberOrText::Float(v) => Some(*v),
            NumberOrText::Text(s) => s.trim().parse::<f64>().ok(),
        }
        .filter(|v| v.is_finite())
    }

    fn as_u64(&self) -> Option<u64> {
        match self {
            NumberOrText::Unsigned(v) => Some(*v),
            NumberOrText::Text(s) => match s.trim().parse::<u64>() {
                Ok(v) => Some(v),
                Err(_) => self.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64),
            },
            NumberOrText::Float(_) => self.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64),
        }
    }
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_u64()).unwrap_or(0))
}

fn lenient_opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| v.as_u64())
        .and_then(|v| u32::try_from(v).ok()))
}

fn lenient_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_ffprobe_string_numbers() {
        let doc = ProbeDocument::from_json(
            r#"{
                "streams": [
                    {"index": 0, "codec_type": "video", "codec_name": "h264",
                     "width": 1920, "height": 1080, "bit_rate": "5000000",
                     "disposition": {"default": 1}}
                ],
                "format": {"filename": "a.mkv", "duration": "186.727000",
                           "size": "5178880", "bit_rate": "221876",
                           "format_long_name": "Matroska / WebM"}
            }"#,
        )
        .unwrap();

        assert_eq!(doc.format.duration, Some(186.727));
        assert_eq!(doc.format.size, 5_178_880);
        assert_eq!(doc.format.bit_rate, 221_876);
        assert_eq!(doc.streams[0].bit_rate, 5_000_000);
        assert_eq!(doc.streams[0].disposition.default, 1);
        assert_eq!(doc.streams[0].display_width(), Some(1920));
    }

    #[test]
    fn test_missing_fields_default() {
        let doc = ProbeDocument::from_json(
            r#"{"format": {"filename": "a.mkv"}, "streams": [{"index": 2, "codec_type": "data"}]}"#,
        )
        .unwrap();

        assert_eq!(doc.format.duration, None);
        assert_eq!(doc.format.size, 0);
        assert_eq!(doc.streams[0].codec_name, "");
        assert_eq!(doc.streams[0].tags.language, "");
        assert_eq!(doc.streams[0].display_height(), None);
    }

    #[test]
    fn test_unparsable_numbers_fall_back() {
        let doc = ProbeDocument::from_json(
            r#"{"format": {"filename": "a.mkv", "duration": "N/A", "bit_rate": "N/A"}}"#,
        )
        .unwrap();

        assert_eq!(doc.format.duration, None);
        assert_eq!(doc.format.bit_rate, 0);
    }

    #[test]
    fn test_coded_size_fallback_and_uppercase_tags() {
        let doc = ProbeDocument::from_json(
            r#"{"streams": [{"index": 0, "codec_type": "video", "coded_width": 214,
                 "coded_height": 160, "tags": {"TITLE": "Main", "LANGUAGE": "eng"}}]}"#,
        )
        .unwrap();

        let stream = &doc.streams[0];
        assert_eq!(stream.display_width(), Some(214));
        assert_eq!(stream.display_height(), Some(160));
        assert_eq!(stream.tags.title, "Main");
        assert_eq!(stream.tags.language, "eng");
    }
}
