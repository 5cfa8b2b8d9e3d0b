// Run configuration: built-in defaults, an optional read-only TOML file, CLI overrides

use crate::engine::Codec;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub encode: EncodeConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeConfig {
    /// Desired output size per file, in MB (1 MB = 8192 kbit)
    #[serde(default = "default_target_size_mb")]
    pub target_size_mb: f64,

    /// AAC bitrate used whenever the input has an audio stream
    #[serde(default = "default_audio_bitrate_kbps")]
    pub audio_bitrate_kbps: u32,

    /// Video bitrate never drops below this, even if the size target is missed
    #[serde(default = "default_min_video_bitrate_kbps")]
    pub min_video_bitrate_kbps: u32,

    /// x264/x265 speed preset shared by both passes
    #[serde(default = "default_preset")]
    pub preset: String,

    #[serde(default)]
    pub codec: Codec,

    /// Tag HEVC output as hvc1 so Apple players accept it (ignored for h264)
    #[serde(default = "default_true_config")]
    pub hvc1_tag: bool,

    /// Output width is clamped to this; height follows the aspect ratio
    #[serde(default = "default_max_width")]
    pub max_width: u32,

    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Files whose name starts with this prefix are never re-encoded (empty = off)
    #[serde(default = "default_skip_prefix")]
    pub skip_prefix: String,

    /// File extensions picked up by the recursive scan (case-insensitive)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Append ffmpeg command lines and failure output to ./ffshrink.log
    #[serde(default)]
    pub debug_log: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: PathBuf,

    #[serde(default = "default_ffprobe")]
    pub ffprobe: PathBuf,
}

fn default_target_size_mb() -> f64 {
    2.0
}

fn default_audio_bitrate_kbps() -> u32 {
    128
}

fn default_min_video_bitrate_kbps() -> u32 {
    180
}

fn default_preset() -> String {
    "slow".to_string()
}

fn default_true_config() -> bool {
    true
}

fn default_max_width() -> u32 {
    1280
}

fn default_frame_rate() -> u32 {
    30
}

fn default_pixel_format() -> String {
    "yuv420p".to_string()
}

fn default_skip_prefix() -> String {
    "2x".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["mp4".to_string()]
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe() -> PathBuf {
    PathBuf::from("ffprobe")
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            target_size_mb: default_target_size_mb(),
            audio_bitrate_kbps: default_audio_bitrate_kbps(),
            min_video_bitrate_kbps: default_min_video_bitrate_kbps(),
            preset: default_preset(),
            codec: Codec::default(),
            hvc1_tag: true,
            max_width: default_max_width(),
            frame_rate: default_frame_rate(),
            pixel_format: default_pixel_format(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            skip_prefix: default_skip_prefix(),
            extensions: default_extensions(),
            debug_log: false,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
        }
    }
}

/// Settings that make an encode impossible or meaningless
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("target_size_mb must be a positive number, got {0}")]
    TargetSize(f64),

    #[error("frame_rate must be greater than zero")]
    FrameRate,

    #[error("max_width must be at least 2, got {0}")]
    MaxWidth(u32),

    #[error("min_video_bitrate_kbps must be greater than zero")]
    MinVideoBitrate,

    #[error("'{0}' must not be empty")]
    Empty(&'static str),
}

/// Per-run overrides collected from the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub target_size_mb: Option<f64>,
    pub audio_bitrate_kbps: Option<u32>,
    pub min_video_bitrate_kbps: Option<u32>,
    pub preset: Option<String>,
    pub codec: Option<Codec>,
    pub hvc1_tag: Option<bool>,
    pub max_width: Option<u32>,
    pub frame_rate: Option<u32>,
    pub skip_prefix: Option<String>,
    pub debug_log: bool,
}

impl Config {
    /// Default location of the optional config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "macos") {
            dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".config")
                .join("ffshrink")
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("ffshrink")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from `explicit` (must exist), else the default location if present,
    /// else built-in defaults. The file is never written.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::config_path().ok().filter(|p| p.exists()),
        };

        match path {
            Some(path) => Self::from_file(&path),
            None => Ok(Config::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        let encode = &mut self.encode;
        if let Some(mb) = overrides.target_size_mb {
            encode.target_size_mb = mb;
        }
        if let Some(kbps) = overrides.audio_bitrate_kbps {
            encode.audio_bitrate_kbps = kbps;
        }
        if let Some(kbps) = overrides.min_video_bitrate_kbps {
            encode.min_video_bitrate_kbps = kbps;
        }
        if let Some(preset) = &overrides.preset {
            encode.preset = preset.clone();
        }
        if let Some(codec) = overrides.codec {
            encode.codec = codec;
        }
        if let Some(tag) = overrides.hvc1_tag {
            encode.hvc1_tag = tag;
        }
        if let Some(width) = overrides.max_width {
            encode.max_width = width;
        }
        if let Some(fps) = overrides.frame_rate {
            encode.frame_rate = fps;
        }
        if let Some(prefix) = &overrides.skip_prefix {
            self.batch.skip_prefix = prefix.clone();
        }
        if overrides.debug_log {
            self.batch.debug_log = true;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let encode = &self.encode;
        if !(encode.target_size_mb.is_finite() && encode.target_size_mb > 0.0) {
            return Err(ConfigError::TargetSize(encode.target_size_mb));
        }
        if encode.frame_rate == 0 {
            return Err(ConfigError::FrameRate);
        }
        if encode.max_width < 2 {
            return Err(ConfigError::MaxWidth(encode.max_width));
        }
        // A zero floor lets a short budget plan 0 kbps video
        if encode.min_video_bitrate_kbps == 0 {
            return Err(ConfigError::MinVideoBitrate);
        }
        if encode.preset.trim().is_empty() {
            return Err(ConfigError::Empty("preset"));
        }
        if encode.pixel_format.trim().is_empty() {
            return Err(ConfigError::Empty("pixel_format"));
        }
        if self.batch.extensions.is_empty() {
            return Err(ConfigError::Empty("extensions"));
        }
        Ok(())
    }

    /// Effective config rendered as TOML (for `show-config`)
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}
