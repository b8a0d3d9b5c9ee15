//! Text rendering of containers and planned conversions

use std::fmt::Write;

use crate::config::TranscodeConfig;
use crate::domain::model::{Container, Stream, StreamKind};
use crate::utils::Utils;

/// File header, stream list and attached subtitle files
pub fn render_container(container: &Container) -> String {
    let mut out = String::new();
    let label = container.label();
    let _ = writeln!(out, "*** File: {} ***", container.file_name().display());
    if !label.title.is_empty() {
        let _ = writeln!(out, "Title: {}", label.title);
    }

    let length = label
        .length
        .map(Utils::format_length)
        .unwrap_or_else(|| "-".to_string());
    let _ = writeln!(
        out,
        "Length: {} | Size: {} | Bitrate: {} | Container: {}",
        length,
        Utils::format_measure(label.size, "MiB"),
        Utils::format_measure(label.bitrate, "Mib/s"),
        if label.format.is_empty() { "-" } else { label.format.as_str() }
    );

    for stream in container.streams() {
        render_stream(&mut out, stream);
    }
    for subtitle in container.subtitle_files() {
        let _ = writeln!(out, "Subtitle File: {}", subtitle.file_name.display());
        let _ = writeln!(out, "  Encoding: {}", subtitle.encoding);
    }
    out
}

fn render_stream(out: &mut String, stream: &Stream) {
    let label = &stream.label;
    let mut header = vec![stream.kind.to_string(), stream.codec.clone()];
    if !label.language.is_empty() {
        header.push(label.language.clone());
    }
    if label.is_default {
        header.push("default".to_string());
    }
    let _ = writeln!(out, "  Stream {}: {}", stream.index, header.join(" "));
    if !label.title.is_empty() {
        let _ = writeln!(out, "    Title: {}", label.title);
    }

    let specs = match stream.kind {
        StreamKind::Video => Some(format!(
            "Resolution: {} | Bitrate: {}",
            if label.resolution.is_empty() { "-" } else { label.resolution.as_str() },
            Utils::format_measure(label.bitrate, "Mib/s")
        )),
        StreamKind::Audio => Some(format!(
            "Channels: {} | Bitrate: {}",
            if label.channels.is_empty() { "-" } else { label.channels.as_str() },
            Utils::format_measure(label.bitrate, "Kib/s")
        )),
        _ => None,
    };
    if let Some(specs) = specs {
        let _ = writeln!(out, "    {}", specs);
    }
}

/// One line per output stream: source and copy/transcode decision
pub fn render_actions(container: &Container, config: &TranscodeConfig) -> String {
    let mut out = String::from("Actions:\n");
    let actions = container.planned_actions(config);
    if actions.is_empty() {
        out.push_str("  (no streams selected)\n");
    }
    for action in actions {
        let _ = writeln!(out, "  {}: {}", action.source, action.summary);
    }
    out
}
