//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;
use clap_num::number_range;

use crate::config::{MAX_AUDIO_BITRATE, MAX_CRF};

/// Arguments for the display command
#[derive(Args, Debug)]
pub struct DisplayArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the convert command
#[derive(Args, Debug, Default)]
pub struct ConvertArgs {
    /// Stream indexes to output, e.g. 0,1,3 (default: first video and audio)
    #[arg(long, value_delimiter = ',')]
    pub streams: Option<Vec<usize>>,

    /// Constant Rate Factor (0-51) forced on every selected video stream
    #[arg(long, value_parser = crf_in_range)]
    pub crf: Option<u8>,

    /// Bitrate in Kib/s (1-5000) forced on every selected audio stream
    #[arg(long, value_parser = bitrate_in_range)]
    pub bitrate: Option<u32>,

    /// External subtitle file as PATH[:ENCODING] (requires --file)
    #[arg(long = "subtitle", value_parser = parse_subtitle_arg)]
    pub subtitles: Vec<SubtitleArg>,

    /// Output file name without extension (requires --file)
    #[arg(long)]
    pub output_name: Option<String>,

    /// Print the planned commands without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Confirm each file before converting
    #[arg(long)]
    pub interactive: bool,

    /// Emit JSON progress events on stdout
    #[arg(long)]
    pub json_progress: bool,

    /// List every file when the batch starts
    #[arg(short, long)]
    pub verbose: bool,
}

/// `--subtitle` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleArg {
    pub path: PathBuf,
    /// Guessed from the file when absent
    pub encoding: Option<String>,
}

fn crf_in_range(s: &str) -> Result<u8, String> {
    number_range(s, 0, MAX_CRF)
}

fn bitrate_in_range(s: &str) -> Result<u32, String> {
    number_range(s, 1, MAX_AUDIO_BITRATE)
}

/// Split `PATH[:ENCODING]`. A suffix that looks like part of a path stays
/// in the path.
pub fn parse_subtitle_arg(s: &str) -> Result<SubtitleArg, String> {
    if s.is_empty() {
        return Err("subtitle path cannot be empty".to_string());
    }
    if let Some((path, encoding)) = s.rsplit_once(':') {
        let looks_like_encoding = !path.is_empty()
            && !encoding.is_empty()
            && !encoding.contains(['/', '\\']);
        if looks_like_encoding {
            return Ok(SubtitleArg {
                path: PathBuf::from(path),
                encoding: Some(encoding.to_string()),
            });
        }
    }
    Ok(SubtitleArg {
        path: PathBuf::from(s),
        encoding: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtitle_arg_with_encoding() {
        let arg = parse_subtitle_arg("subs/movie.srt:ISO-8859-1").unwrap();
        assert_eq!(arg.path, PathBuf::from("subs/movie.srt"));
        assert_eq!(arg.encoding.as_deref(), Some("ISO-8859-1"));
    }

    #[test]
    fn test_subtitle_arg_without_encoding() {
        let arg = parse_subtitle_arg("movie.srt").unwrap();
        assert_eq!(arg.path, PathBuf::from("movie.srt"));
        assert_eq!(arg.encoding, None);

        let arg = parse_subtitle_arg(r"C:\subs\movie.srt").unwrap();
        assert_eq!(arg.path, PathBuf::from(r"C:\subs\movie.srt"));
        assert_eq!(arg.encoding, None);

        assert!(parse_subtitle_arg("").is_err());
    }

    #[test]
    fn test_ranges() {
        assert_eq!(crf_in_range("0"), Ok(0));
        assert_eq!(crf_in_range("51"), Ok(51));
        assert!(crf_in_range("52").is_err());
        assert!(bitrate_in_range("0").is_err());
        assert_eq!(bitrate_in_range("5000"), Ok(5000));
    }

    #[test]
    fn test_convert_verbose_flag() {
        use crate::cli::{Cli, Commands};
        use clap::Parser;

        let cli = Cli::try_parse_from(["reelcast", "convert", "-v", "--dry-run"]).unwrap();
        match cli.command {
            Commands::Convert(args) => {
                assert!(args.verbose);
                assert!(args.dry_run);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
