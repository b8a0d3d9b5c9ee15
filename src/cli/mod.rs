//! CLI module for Reelcast
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::utils::logging::{LogFormat, LogLevel};

pub mod args;
pub mod commands;
pub mod display;
pub mod gate;

/// Reelcast batch transcoder
///
/// Probes media files, plans a copy-or-transcode ffmpeg command per file,
/// and runs the whole batch with live progress.
#[derive(Parser, Debug)]
#[command(name = "reelcast")]
#[command(about = "Reelcast - batch media transcoding with live progress")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level (RUST_LOG takes precedence)
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,

    /// TOML configuration file (default: ./reelcast.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the ffmpeg binary
    #[arg(long, global = true)]
    pub ffmpeg: Option<PathBuf>,

    /// Path to the ffprobe binary
    #[arg(long, global = true)]
    pub ffprobe: Option<PathBuf>,

    /// Operate on a single file
    #[arg(short, long, conflicts_with_all = ["directory", "recursive"])]
    pub file: Option<PathBuf>,

    /// Operate on the files of a directory (default: current directory)
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the streams of every source file
    Display(args::DisplayArgs),
    /// Transcode every source file
    Convert(args::ConvertArgs),
}
