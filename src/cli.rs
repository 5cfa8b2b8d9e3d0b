use clap::{Args, Parser, Subcommand};
use ffshrink::config::ConfigOverrides;
use ffshrink::engine::Codec;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ffshrink")]
#[command(about = "Shrink videos in place to a target size with a two-pass ffmpeg encode", long_about = None)]
pub struct Cli {
    /// Root directory to scan for video files (defaults to current directory)
    #[arg(value_name = "DIRECTORY")]
    pub directory: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Read settings from this TOML file instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

#[derive(Args, Debug, Default)]
pub struct OverrideArgs {
    /// Target output size per file in MB
    #[arg(long, global = true, value_name = "MB")]
    pub target_size_mb: Option<f64>,

    /// Audio bitrate in kbps (used only when the input has audio)
    #[arg(long, global = true, value_name = "KBPS")]
    pub audio_kbps: Option<u32>,

    /// Minimum video bitrate in kbps
    #[arg(long, global = true, value_name = "KBPS")]
    pub min_video_kbps: Option<u32>,

    /// Encoder speed preset (e.g. slow, medium)
    #[arg(long, global = true)]
    pub preset: Option<String>,

    /// Video codec: h264 or hevc
    #[arg(long, global = true)]
    pub codec: Option<Codec>,

    /// Tag HEVC output as hvc1 (overrides config)
    #[arg(long, global = true, conflicts_with = "no_hvc1_tag")]
    pub hvc1_tag: bool,

    /// Don't tag HEVC output as hvc1 (overrides config)
    #[arg(long, global = true, conflicts_with = "hvc1_tag")]
    pub no_hvc1_tag: bool,

    /// Maximum output width in pixels
    #[arg(long, global = true, value_name = "PIXELS")]
    pub max_width: Option<u32>,

    /// Output frame rate
    #[arg(long, global = true)]
    pub fps: Option<u32>,

    /// Skip files whose name starts with this prefix ("" disables)
    #[arg(long, global = true, value_name = "PREFIX")]
    pub skip_prefix: Option<String>,

    /// Append ffmpeg commands and failures to ./ffshrink.log
    #[arg(long, global = true)]
    pub debug_log: bool,
}

impl OverrideArgs {
    pub fn to_overrides(&self) -> ConfigOverrides {
        let hvc1_tag = if self.hvc1_tag {
            Some(true)
        } else if self.no_hvc1_tag {
            Some(false)
        } else {
            None // Use config default
        };

        ConfigOverrides {
            target_size_mb: self.target_size_mb,
            audio_bitrate_kbps: self.audio_kbps,
            min_video_bitrate_kbps: self.min_video_kbps,
            preset: self.preset.clone(),
            codec: self.codec,
            hvc1_tag,
            max_width: self.max_width,
            frame_rate: self.fps,
            skip_prefix: self.skip_prefix.clone(),
            debug_log: self.debug_log,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check if ffmpeg and ffprobe are installed and the configured encoder exists
    CheckFfmpeg,

    /// Probe a video file for duration and audio
    Probe {
        /// Path to the video file
        file: PathBuf,
    },

    /// Show the bitrate plan for a file without encoding it
    Plan {
        /// Path to the video file
        file: PathBuf,
    },

    /// Scan directory and list candidates without encoding
    Scan {
        /// Directory to scan (defaults to current directory)
        directory: Option<PathBuf>,
    },

    /// Show ffmpeg commands without executing (dry run)
    DryRun {
        /// Directory to scan (defaults to current directory)
        directory: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    ShowConfig,
}

pub fn parse() -> Cli {
    Cli::parse()
}
