//! Configuration initialization and hierarchy management

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::TranscodeConfig;
use crate::error::{ReelError, ReelResult};

/// Looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "reelcast.toml";

/// Environment variables and the configuration keys they override
pub const ENV_MAPPINGS: [(&str, &str); 8] = [
    ("REELCAST_FFMPEG", "ffmpeg_path"),
    ("REELCAST_FFPROBE", "ffprobe_path"),
    ("REELCAST_VIDEO_CODEC", "video_codec"),
    ("REELCAST_AUDIO_CODEC", "audio_codec"),
    ("REELCAST_CRF", "crf"),
    ("REELCAST_PRESET", "preset"),
    ("REELCAST_AUDIO_BITRATE", "audio_bitrate"),
    ("REELCAST_OUTPUT_EXTENSION", "output_extension"),
];

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}

/// Build the configuration: CLI > Env > File > Defaults
pub fn initialize_configuration_hierarchy(
    config_path: Option<&Path>,
    overrides: &CliOverrides,
) -> ReelResult<TranscodeConfig> {
    initialize_with_env(config_path, overrides, |key| std::env::var(key).ok())
}

/// Same as [`initialize_configuration_hierarchy`] with an explicit
/// environment lookup
pub fn initialize_with_env<F>(
    config_path: Option<&Path>,
    overrides: &CliOverrides,
    env: F,
) -> ReelResult<TranscodeConfig>
where
    F: Fn(&str) -> Option<String>,
{
    info!("Initializing configuration hierarchy");

    let mut config = load_config_file(config_path)?;
    apply_environment(&mut config, env)?;
    apply_cli_overrides(&mut config, overrides);
    config.validate()?;

    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// An explicit path must exist; the default file is optional
fn load_config_file(config_path: Option<&Path>) -> ReelResult<TranscodeConfig> {
    match config_path {
        Some(path) => {
            if !path.is_file() {
                return Err(ReelError::config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            info!("Loading configuration from: {}", path.display());
            TranscodeConfig::from_file(path)
        }
        None => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            if path.is_file() {
                info!("Loading configuration from: {}", path.display());
                TranscodeConfig::from_file(path)
            } else {
                Ok(TranscodeConfig::default())
            }
        }
    }
}

fn apply_environment<F>(config: &mut TranscodeConfig, env: F) -> ReelResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_overrides = 0;
    for (env_var, key) in ENV_MAPPINGS {
        let Some(value) = env(env_var) else {
            continue;
        };
        info!("Found environment override: {} = {}", env_var, value);
        match key {
            "ffmpeg_path" => config.ffmpeg_path = PathBuf::from(value),
            "ffprobe_path" => config.ffprobe_path = PathBuf::from(value),
            "video_codec" => config.video_codec = value,
            "audio_codec" => config.audio_codec = value,
            "crf" => config.crf = parse_env(env_var, &value)?,
            "preset" => config.preset = value,
            "audio_bitrate" => config.audio_bitrate = parse_env(env_var, &value)?,
            "output_extension" => config.output_extension = value,
            _ => continue,
        }
        env_overrides += 1;
    }

    if env_overrides > 0 {
        info!("Applied {} environment variable overrides", env_overrides);
    }
    Ok(())
}

fn apply_cli_overrides(config: &mut TranscodeConfig, overrides: &CliOverrides) {
    if let Some(path) = &overrides.ffmpeg_path {
        info!("CLI override: ffmpeg_path = {}", path.display());
        config.ffmpeg_path = path.clone();
    }
    if let Some(path) = &overrides.ffprobe_path {
        info!("CLI override: ffprobe_path = {}", path.display());
        config.ffprobe_path = path.clone();
    }
}

fn parse_env<T: std::str::FromStr>(env_var: &str, value: &str) -> ReelResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ReelError::config(format!("Invalid value for {}: {:?}", env_var, value)))
}
