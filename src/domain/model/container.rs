// Input files, their streams, and the output selection

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::TranscodeConfig;
use crate::domain::model::{ContainerLabel, SlotCounter, Stream, StreamKind, SubtitleFile};
use crate::error::{ReelError, ReelResult};
use crate::probe::ProbeDocument;

/// One planned output stream, for display and dry runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedAction {
    /// `Stream <index>` or the subtitle file name
    pub source: String,
    pub summary: String,
}

/// A multimedia input file and everything needed to transcode it.
///
/// Selection and subtitle attachment are the only mutations; they happen
/// before launch. Per-run state (the process and its progress report) lives
/// in [`crate::engine::JobSupervisor`], so equality here covers durable
/// fields only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Container {
    file_name: PathBuf,
    duration: f64,
    streams: Vec<Stream>,
    subtitle_files: Vec<SubtitleFile>,
    selected: Vec<usize>,
    output_name: String,
    label: ContainerLabel,
    microseconds: u64,
}

impl Container {
    /// Create a container with the default selection and output name.
    ///
    /// Fails with `ProbeData` when the duration is not a positive number or
    /// two streams share an index.
    pub fn new(
        file_name: impl Into<PathBuf>,
        duration: f64,
        streams: Vec<Stream>,
        config: &TranscodeConfig,
    ) -> ReelResult<Self> {
        let file_name = file_name.into();
        if !duration.is_finite() || duration <= 0.0 {
            return Err(ReelError::ProbeData {
                file_name: file_name.display().to_string(),
                message: "File has no duration tag.".to_string(),
            });
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = streams.iter().find(|s| !seen.insert(s.index)) {
            return Err(ReelError::ProbeData {
                file_name: file_name.display().to_string(),
                message: format!("Duplicate stream index {}", duplicate.index),
            });
        }

        let output_name = default_output_name(&file_name, config);
        let mut container = Self {
            file_name,
            duration,
            streams,
            subtitle_files: Vec::new(),
            selected: Vec::new(),
            output_name,
            label: ContainerLabel::default(),
            microseconds: (duration * 1_000_000.0) as u64,
        };
        let defaults = container.default_streams();
        container.select(&defaults)?;
        Ok(container)
    }

    /// Build a container from a probe document
    pub fn from_probe(info: &ProbeDocument, config: &TranscodeConfig) -> ReelResult<Self> {
        let duration = info.format.duration.unwrap_or(0.0);
        let streams = info.streams.iter().map(Stream::from_probe).collect();
        let label = ContainerLabel::from_probe(info);
        Ok(Self::new(info.format.filename.clone(), duration, streams, config)?.with_label(label))
    }

    pub fn with_label(mut self, label: ContainerLabel) -> Self {
        self.label = label;
        self
    }

    /// Replace the selection, consuming and returning the container
    pub fn with_selection(mut self, indexes: &[usize]) -> ReelResult<Self> {
        self.select(indexes)?;
        Ok(self)
    }

    pub fn file_name(&self) -> &Path {
        &self.file_name
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Duration in microseconds; the denominator for progress
    pub fn microseconds(&self) -> u64 {
        self.microseconds
    }

    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    pub fn subtitle_files(&self) -> &[SubtitleFile] {
        &self.subtitle_files
    }

    /// Selected stream indexes, ascending
    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    pub fn label(&self) -> &ContainerLabel {
        &self.label
    }

    /// Streams keyed by index
    pub fn streams_by_index(&self) -> BTreeMap<usize, &Stream> {
        self.streams.iter().map(|s| (s.index, s)).collect()
    }

    pub fn stream(&self, index: usize) -> Option<&Stream> {
        self.streams.iter().find(|s| s.index == index)
    }

    pub fn stream_mut(&mut self, index: usize) -> Option<&mut Stream> {
        self.streams.iter_mut().find(|s| s.index == index)
    }

    /// Selected streams in ascending index order
    pub fn selected_streams(&self) -> impl Iterator<Item = &Stream> {
        let by_index = self.streams_by_index();
        self.selected
            .iter()
            .filter_map(move |index| by_index.get(index).copied())
    }

    /// First audio and first video stream in stream order.
    ///
    /// A missing type is simply left out.
    pub fn default_streams(&self) -> Vec<usize> {
        let audio = self
            .streams
            .iter()
            .position(|s| s.kind == StreamKind::Audio);
        let video = self
            .streams
            .iter()
            .position(|s| s.kind == StreamKind::Video);

        let mut positions: Vec<usize> = audio.into_iter().chain(video).collect();
        positions.sort_unstable();
        positions
            .into_iter()
            .map(|position| self.streams[position].index)
            .collect()
    }

    /// Replace the selection.
    ///
    /// Every index must exist and name an audio, video or subtitle stream;
    /// otherwise nothing changes. Stored sorted ascending without duplicates.
    pub fn select(&mut self, indexes: &[usize]) -> ReelResult<()> {
        let by_index = self.streams_by_index();
        for index in indexes {
            let stream = by_index.get(index).ok_or_else(|| {
                ReelError::selection(format!(
                    "This container does not contain a stream with index {}",
                    index
                ))
            })?;
            if !stream.kind.is_output_eligible() {
                return Err(ReelError::selection(format!(
                    "Cannot output streams of type {}",
                    stream.kind
                )));
            }
        }

        let mut selected = indexes.to_vec();
        selected.sort_unstable();
        selected.dedup();
        self.selected = selected;
        Ok(())
    }

    /// Append an external subtitle file; order of addition is output order
    pub fn add_subtitle_file(&mut self, subtitle: SubtitleFile) {
        self.subtitle_files.push(subtitle);
    }

    pub fn remove_subtitle_file(&mut self, position: usize) -> ReelResult<SubtitleFile> {
        if position >= self.subtitle_files.len() {
            return Err(ReelError::selection(format!(
                "No subtitle file at position {}",
                position
            )));
        }
        Ok(self.subtitle_files.remove(position))
    }

    pub fn set_subtitle_encoding(
        &mut self,
        position: usize,
        encoding: impl Into<String>,
    ) -> ReelResult<()> {
        let subtitle = self.subtitle_files.get_mut(position).ok_or_else(|| {
            ReelError::selection(format!("No subtitle file at position {}", position))
        })?;
        subtitle.encoding = encoding.into();
        Ok(())
    }

    /// Set the output name from a stem; the configured extension is appended
    pub fn set_output_stem(&mut self, stem: &str, config: &TranscodeConfig) {
        self.output_name = format!("{}{}", stem, config.output_extension);
    }

    /// Output file: the input's directory joined with the output name
    pub fn output_path(&self) -> PathBuf {
        self.file_name
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(&self.output_name)
    }

    /// What each output stream will be, in output order. Does not touch
    /// the streams' recorded summaries.
    pub fn planned_actions(&self, config: &TranscodeConfig) -> Vec<PlannedAction> {
        let mut slots = SlotCounter::default();
        let mut actions: Vec<PlannedAction> = self
            .selected_streams()
            .map(|stream| PlannedAction {
                source: format!("Stream {}", stream.index),
                summary: stream.plan(slots.next(&stream.kind), config).summary,
            })
            .collect();
        actions.extend(self.subtitle_files.iter().map(|subtitle| PlannedAction {
            source: subtitle.file_name.display().to_string(),
            summary: subtitle.option_summary(),
        }));
        actions
    }
}

/// Input stem with the configured output extension
pub fn default_output_name(file_name: &Path, config: &TranscodeConfig) -> String {
    let stem = file_name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}{}", stem, config.output_extension)
}
