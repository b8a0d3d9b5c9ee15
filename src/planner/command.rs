//! ffmpeg argument vector construction

use std::path::Path;

use tracing::debug;

use crate::config::TranscodeConfig;
use crate::domain::model::{Container, SlotCounter, StreamKind};

/// Builds one ffmpeg invocation per container.
///
/// Argument order is fixed: every input declaration comes before every
/// `-map`, and codec options follow the mapping order. ffmpeg ties codec
/// slot options to output position, so reordering would apply options to
/// the wrong stream.
#[derive(Debug, Clone, Copy)]
pub struct CommandBuilder<'a> {
    config: &'a TranscodeConfig,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(config: &'a TranscodeConfig) -> Self {
        Self { config }
    }

    /// Build the full argument vector, program first.
    ///
    /// Records each selected stream's option summary as a side effect.
    pub fn build(&self, container: &mut Container, progress_target: &Path) -> Vec<String> {
        let mut args = self.base_args(container, progress_target);
        let selected = container.selected().to_vec();

        for (position, subtitle) in container.subtitle_files().iter().enumerate() {
            args.push("-sub_charenc".to_string());
            args.push(subtitle.encoding.clone());
            args.push("-i".to_string());
            args.push(subtitle.file_name.display().to_string());
            debug!("Subtitle input {} from {}", position + 1, subtitle.file_name.display());
        }

        for index in &selected {
            args.push("-map".to_string());
            args.push(format!("0:{}", index));
        }
        for position in 0..container.subtitle_files().len() {
            args.push("-map".to_string());
            args.push(format!("{}:0", position + 1));
        }

        let mut slots = SlotCounter::default();
        for index in &selected {
            let Some(stream) = container.stream_mut(*index) else {
                continue;
            };
            let slot = slots.next(&stream.kind);
            if let Some(option) = stream.kind.codec_slot_option(slot) {
                args.push(option);
            }
            args.extend(stream.build_options(slot, self.config));
        }

        for subtitle in container.subtitle_files() {
            let slot = slots.next(&StreamKind::Subtitle);
            if let Some(option) = StreamKind::Subtitle.codec_slot_option(slot) {
                args.push(option);
            }
            args.extend(subtitle.options());
        }

        args.push(container.output_path().display().to_string());
        debug!("Built command for {}: {}", container.file_name().display(), args.join(" "));
        args
    }

    /// Non-interactive, progress to the side channel, errors only, overwrite,
    /// primary input.
    fn base_args(&self, container: &Container, progress_target: &Path) -> Vec<String> {
        vec![
            self.config.ffmpeg_path.display().to_string(),
            "-nostdin".to_string(),
            "-progress".to_string(),
            progress_target.display().to_string(),
            "-v".to_string(),
            "error".to_string(),
            "-y".to_string(),
            "-i".to_string(),
            container.file_name().display().to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Stream, StreamLabel, SubtitleFile};

    fn container(config: &TranscodeConfig) -> Container {
        let label = StreamLabel {
            bitrate: Some(250.0),
            ..StreamLabel::default()
        };
        let streams = vec![
            Stream::new(0, StreamKind::Video, "vp8"),
            Stream::new(1, StreamKind::Audio, "vorbis").with_label(label),
            Stream::new(2, StreamKind::Audio, "aac"),
            Stream::new(3, StreamKind::Subtitle, "subrip"),
        ];
        Container::new("media/clip.ogv", 10.0, streams, config).unwrap()
    }

    #[test]
    fn test_copy_command_layout() {
        let config = TranscodeConfig::default();
        let streams = vec![
            Stream::new(0, StreamKind::Video, "h264"),
            Stream::new(1, StreamKind::Audio, "aac"),
        ];
        let mut container = Container::new("in.mkv", 5.0, streams, &config).unwrap();
        let args = CommandBuilder::new(&config).build(&mut container, Path::new("/tmp/report"));

        assert_eq!(
            args,
            vec![
                "ffmpeg", "-nostdin", "-progress", "/tmp/report", "-v", "error", "-y", "-i",
                "in.mkv", "-map", "0:0", "-map", "0:1", "-c:v:0", "copy", "-c:a:0", "copy",
                "in.mp4",
            ]
        );
    }

    #[test]
    fn test_full_command_with_subtitles() {
        let config = TranscodeConfig::default();
        let mut container = container(&config);
        container.select(&[3, 2, 1, 0]).unwrap();
        container.add_subtitle_file(SubtitleFile::with_encoding("extra.srt", "UTF-8", &config));

        let args = CommandBuilder::new(&config).build(&mut container, Path::new("report.txt"));
        let expected: Vec<String> = [
            "ffmpeg", "-nostdin", "-progress", "report.txt", "-v", "error", "-y", "-i",
            "media/clip.ogv", "-sub_charenc", "UTF-8", "-i", "extra.srt", "-map", "0:0", "-map",
            "0:1", "-map", "0:2", "-map", "0:3", "-map", "1:0", "-c:v:0", "libx264", "-preset",
            "medium", "-crf", "18", "-pix_fmt", "yuv420p", "-c:a:0", "aac", "-b:a:0", "250k",
            "-c:a:1", "copy", "-c:s:0", "mov_text", "-c:s:1", "mov_text", "media/clip.mp4",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(args, expected);

        assert_eq!(
            container.stream(0).unwrap().option_summary(),
            Some("transcode -> h264, crf=18")
        );
        assert_eq!(container.stream(2).unwrap().option_summary(), Some("copy"));
    }

    #[test]
    fn test_one_map_per_output_and_contiguous_slots() {
        let config = TranscodeConfig::default();
        let mut container = container(&config);
        container.select(&[1, 2, 3]).unwrap();
        container.add_subtitle_file(SubtitleFile::with_encoding("a.srt", "ascii", &config));
        container.add_subtitle_file(SubtitleFile::with_encoding("b.srt", "ascii", &config));

        let args = CommandBuilder::new(&config).build(&mut container, Path::new("r"));
        assert_eq!(args.iter().filter(|a| *a == "-map").count(), 5);

        let slots: Vec<&String> = args.iter().filter(|a| a.starts_with("-c:")).collect();
        assert_eq!(slots, vec!["-c:a:0", "-c:a:1", "-c:s:0", "-c:s:1", "-c:s:2"]);

        let first_map = args.iter().position(|a| a == "-map").unwrap();
        let last_input = args.iter().rposition(|a| a == "-i").unwrap();
        assert!(last_input < first_map);
    }

    #[test]
    fn test_empty_selection_still_builds() {
        let config = TranscodeConfig::default();
        let mut container = container(&config);
        container.select(&[]).unwrap();
        let args = CommandBuilder::new(&config).build(&mut container, Path::new("r"));
        assert!(!args.contains(&"-map".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("media/clip.mp4"));
    }

    #[test]
    fn test_custom_program_path() {
        let config = TranscodeConfig {
            ffmpeg_path: "/opt/ffmpeg/bin/ffmpeg".into(),
            ..TranscodeConfig::default()
        };
        let mut container = container(&config);
        let args = CommandBuilder::new(&config).build(&mut container, Path::new("r"));
        assert_eq!(args[0], "/opt/ffmpeg/bin/ffmpeg");
    }
}
