//! Command implementations

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::adapters::FfprobeAdapter;
use crate::cli::args::{ConvertArgs, DisplayArgs};
use crate::cli::display::{render_actions, render_container};
use crate::cli::gate::{AcceptAll, ConversionGate, PromptEach};
use crate::cli::Cli;
use crate::config::TranscodeConfig;
use crate::domain::model::{Container, StreamKind, SubtitleFile};
use crate::engine::{BatchCoordinator, ConsoleProgressSink, JsonProgressSink, ProgressSink};
use crate::planner::CommandBuilder;
use crate::probe::inspector::{ContainerInspector, Inspection};
use crate::utils::path::discover_files;

/// Placeholder shown in dry-run commands where the report file would go
const DRY_RUN_PROGRESS_TARGET: &str = "<progress-report>";

/// Files named by `--file`, or found under `--directory`
pub fn source_files(cli: &Cli) -> Result<Vec<PathBuf>> {
    if let Some(file) = &cli.file {
        if !file.is_file() {
            bail!("File does not exist: {}", file.display());
        }
        return Ok(vec![file.clone()]);
    }
    let directory = cli.directory.clone().unwrap_or_else(|| PathBuf::from("."));
    discover_files(&directory, cli.recursive)
        .with_context(|| format!("Failed to list {}", directory.display()))
}

async fn inspect_sources(cli: &Cli, config: &TranscodeConfig) -> Result<Inspection> {
    let files = source_files(cli)?;
    info!("Probing {} file(s)", files.len());
    let inspector = ContainerInspector::new(
        FfprobeAdapter::new(config.ffprobe_path.clone()),
        config.clone(),
    );
    Ok(inspector.build_containers(&files).await)
}

fn report_probe_failures(inspection: &Inspection) {
    for failure in &inspection.failures {
        eprintln!("Warning: unable to process {}", failure.file_name.display());
        eprintln!("{}", failure.message);
    }
}

/// Execute the display command
pub async fn display(cli: &Cli, args: &DisplayArgs, config: &TranscodeConfig) -> Result<()> {
    let inspection = inspect_sources(cli, config).await?;

    let mut stdout = io::stdout().lock();
    if args.json {
        writeln!(stdout, "{}", serde_json::to_string_pretty(&inspection)?)?;
    } else {
        for container in &inspection.containers {
            write!(stdout, "{}", render_container(container))?;
        }
        report_probe_failures(&inspection);
    }

    if inspection.has_failures() {
        bail!("{} file(s) could not be probed", inspection.failures.len());
    }
    Ok(())
}

/// Apply the non-interactive convert options to one container
pub fn apply_convert_options(
    container: &mut Container,
    args: &ConvertArgs,
    config: &TranscodeConfig,
) -> Result<()> {
    if let Some(streams) = &args.streams {
        container.select(streams)?;
    }

    let selected = container.selected().to_vec();
    for index in selected {
        let Some(stream) = container.stream_mut(index) else {
            continue;
        };
        match stream.kind {
            StreamKind::Video if args.crf.is_some() => stream.set_custom_crf(args.crf)?,
            StreamKind::Audio if args.bitrate.is_some() => {
                stream.set_custom_bitrate(args.bitrate)?
            }
            _ => {}
        }
    }

    for subtitle in &args.subtitles {
        let file = SubtitleFile::open(&subtitle.path, subtitle.encoding.clone(), config)?;
        container.add_subtitle_file(file);
    }
    if let Some(stem) = &args.output_name {
        container.set_output_stem(stem, config);
    }
    Ok(())
}

/// Planned actions and full command for one container
pub fn render_dry_run(container: &Container, config: &TranscodeConfig) -> String {
    let mut container = container.clone();
    let command = CommandBuilder::new(config)
        .build(&mut container, Path::new(DRY_RUN_PROGRESS_TARGET));
    format!(
        "{}{}Command:\n{}\n",
        render_container(&container),
        render_actions(&container, config),
        command.join(" ")
    )
}

/// Execute the convert command
pub async fn convert<F>(
    cli: &Cli,
    args: &ConvertArgs,
    config: TranscodeConfig,
    cancel: F,
) -> Result<()>
where
    F: std::future::Future<Output = ()>,
{
    if cli.file.is_none() && (!args.subtitles.is_empty() || args.output_name.is_some()) {
        bail!("--subtitle and --output-name require --file");
    }

    let inspection = inspect_sources(cli, &config).await?;
    report_probe_failures(&inspection);
    let mut problems = inspection.failures.len();

    let mut containers = Vec::with_capacity(inspection.containers.len());
    for mut container in inspection.containers {
        match apply_convert_options(&mut container, args, &config) {
            Ok(()) => containers.push(container),
            Err(e) => {
                warn!("Skipping {}: {}", container.file_name().display(), e);
                eprintln!("Skipping {}: {}", container.file_name().display(), e);
                problems += 1;
            }
        }
    }

    let containers = if args.interactive {
        let stdin = io::stdin();
        let mut gate = PromptEach::new(stdin.lock(), io::stderr(), config.clone());
        gate.confirm(containers)?
    } else {
        AcceptAll.confirm(containers)?
    };

    if args.dry_run {
        let mut stdout = io::stdout().lock();
        for container in &containers {
            writeln!(stdout, "{}", render_dry_run(container, &config))?;
        }
    } else if containers.is_empty() {
        eprintln!("Nothing to convert");
    } else {
        let sink: Box<dyn ProgressSink> = if args.json_progress {
            Box::new(JsonProgressSink)
        } else {
            Box::new(ConsoleProgressSink::new(args.verbose))
        };
        let coordinator = BatchCoordinator::from_containers(containers, config)?;
        let report = coordinator.run(sink.as_ref(), cancel).await;

        for failure in report.failures() {
            eprintln!("*** {}: {} ***", failure.file_name, failure.status());
            if !failure.diagnostics.trim().is_empty() {
                eprintln!("{}", failure.diagnostics.trim_end());
            }
        }
        if report.cancelled {
            bail!("Conversion cancelled");
        }
        problems += report.failures().count();
    }

    if problems > 0 {
        bail!("{} file(s) failed", problems);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::SubtitleArg;
    use crate::domain::model::Stream;

    fn container(config: &TranscodeConfig) -> Container {
        let streams = vec![
            Stream::new(0, StreamKind::Video, "h264"),
            Stream::new(1, StreamKind::Audio, "aac"),
            Stream::new(2, StreamKind::Audio, "aac"),
        ];
        Container::new("dir/in.mkv", 3.0, streams, config).unwrap()
    }

    #[test]
    fn test_apply_options() {
        let config = TranscodeConfig::default();
        let mut container = container(&config);
        let args = ConvertArgs {
            streams: Some(vec![0, 2]),
            crf: Some(22),
            bitrate: Some(128),
            subtitles: vec![SubtitleArg {
                path: PathBuf::from("dir/in.srt"),
                encoding: Some("UTF-8".to_string()),
            }],
            output_name: Some("out".to_string()),
            ..ConvertArgs::default()
        };

        apply_convert_options(&mut container, &args, &config).unwrap();
        assert_eq!(container.selected(), &[0, 2]);
        assert_eq!(container.stream(0).unwrap().custom_crf(), Some(22));
        assert_eq!(container.stream(1).unwrap().custom_bitrate(), None);
        assert_eq!(container.stream(2).unwrap().custom_bitrate(), Some(128));
        assert_eq!(container.subtitle_files().len(), 1);
        assert_eq!(container.output_path(), PathBuf::from("dir/out.mp4"));
    }

    #[test]
    fn test_apply_bad_selection() {
        let config = TranscodeConfig::default();
        let mut container = container(&config);
        let args = ConvertArgs {
            streams: Some(vec![7]),
            ..ConvertArgs::default()
        };
        assert!(apply_convert_options(&mut container, &args, &config).is_err());
        assert_eq!(container.selected(), &[0, 1]);
    }

    #[test]
    fn test_dry_run_does_not_touch_container() {
        let config = TranscodeConfig::default();
        let container = container(&config);
        let text = render_dry_run(&container, &config);
        assert!(text.contains("Actions:\n  Stream 0: copy\n  Stream 1: copy\n"));
        assert!(text.contains(
            "ffmpeg -nostdin -progress <progress-report> -v error -y -i dir/in.mkv -map 0:0 -map 0:1 -c:v:0 copy -c:a:0 copy dir/in.mp4"
        ));
        assert!(container.stream(0).unwrap().option_summary().is_none());
    }
}
