// External subtitle files attached to a container

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chardetng::EncodingDetector;
use serde::Serialize;
use tracing::debug;

use crate::config::TranscodeConfig;
use crate::error::{ReelError, ReelResult};

/// A subtitle file muxed into the output as an extra input.
///
/// External subtitles are always transcoded to the configured subtitle codec.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtitleFile {
    pub file_name: PathBuf,
    /// Text encoding passed to ffmpeg via `-sub_charenc`
    pub encoding: String,
    codec: String,
}

impl SubtitleFile {
    /// Attach a file with a known encoding. Does not touch the filesystem.
    pub fn with_encoding(
        file_name: impl Into<PathBuf>,
        encoding: impl Into<String>,
        config: &TranscodeConfig,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            encoding: encoding.into(),
            codec: config.subtitle_codec.clone(),
        }
    }

    /// Attach a file, guessing its encoding from the first lines when none
    /// is given.
    pub fn open(
        file_name: impl Into<PathBuf>,
        encoding: Option<String>,
        config: &TranscodeConfig,
    ) -> ReelResult<Self> {
        let file_name = file_name.into();
        let encoding = match encoding {
            Some(encoding) => encoding,
            None => guess_encoding(&file_name, config.encoding_sample_lines)?,
        };
        Ok(Self::with_encoding(file_name, encoding, config))
    }

    /// Codec options that follow the subtitle slot option
    pub fn options(&self) -> Vec<String> {
        vec![self.codec.clone()]
    }

    pub fn option_summary(&self) -> String {
        format!("transcode -> {}", self.codec)
    }
}

/// Guess a text encoding from the first `lines` lines of a file
pub fn guess_encoding(path: &Path, lines: usize) -> ReelResult<String> {
    let subtitle_error = |message: String| ReelError::Subtitle {
        file_name: path.display().to_string(),
        message,
    };

    let metadata = std::fs::metadata(path).map_err(|e| subtitle_error(e.to_string()))?;
    if metadata.is_dir() {
        return Err(subtitle_error("is a directory".to_string()));
    }

    let file = File::open(path).map_err(|e| subtitle_error(e.to_string()))?;
    let mut reader = BufReader::new(file);
    let mut sample = Vec::new();
    for _ in 0..lines {
        let read = reader
            .read_until(b'\n', &mut sample)
            .map_err(|e| subtitle_error(e.to_string()))?;
        if read == 0 {
            break;
        }
    }

    let mut detector = EncodingDetector::new();
    detector.feed(&sample, true);
    let encoding = detector.guess(None, true).name().to_string();
    debug!("Guessed encoding {} for {}", encoding, path.display());
    Ok(encoding)
}
