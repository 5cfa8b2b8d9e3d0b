use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// What ffprobe told us about an input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediaProbe {
    /// Container duration in seconds (0.0 when ffprobe reports none)
    pub duration_s: f64,
    pub has_audio: bool,
}

/// Bitrates for one encode, all in kbps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitratePlan {
    /// Budget derived from the size target (informational once the floor kicks in)
    pub total_kbps: u32,
    pub video_kbps: u32,
    /// 0 when the input has no audio stream
    pub audio_kbps: u32,
}

impl BitratePlan {
    /// True for the plan produced from an unusable duration
    pub fn is_degenerate(&self) -> bool {
        self.total_kbps == 0 && self.video_kbps == 0
    }
}

impl fmt::Display for BitratePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total {} kbps (video {} kbps, audio {} kbps)",
            self.total_kbps, self.video_kbps, self.audio_kbps
        )
    }
}

/// Why a file was left alone without being treated as a failure
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// ffprobe could not read the file
    UnreadableMedia(String),
    /// Duration at or below the minimum we can plan for
    InvalidDuration(f64),
    /// Name starts with the configured skip prefix
    SkippedByPolicy(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnreadableMedia(reason) => write!(f, "unreadable media: {}", reason),
            SkipReason::InvalidDuration(d) => write!(f, "invalid duration: {:.3}s", d),
            SkipReason::SkippedByPolicy(prefix) => {
                write!(f, "name starts with skip prefix '{}'", prefix)
            }
        }
    }
}

/// Result of a job that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// The original was replaced by the re-encoded file
    Committed {
        input: PathBuf,
        original_bytes: u64,
        output_bytes: u64,
        plan: BitratePlan,
    },
    Skipped(SkipReason),
}

/// Parser for ffmpeg progress output (key=value format)
#[derive(Debug, Default, Clone)]
pub struct ProgressParser {
    pub out_time_us: u64,
    pub fps: Option<f64>,
    pub speed: Option<f64>,
    pub is_complete: bool,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a single line of ffmpeg progress output
    pub fn parse_line(&mut self, line: &str) {
        if let Some((key, value)) = line.split_once('=') {
            match key.trim() {
                "out_time_us" => {
                    if let Ok(us) = value.trim().parse::<u64>() {
                        self.out_time_us = us;
                    }
                }
                "fps" => {
                    if let Ok(f) = value.trim().parse::<f64>() {
                        self.fps = Some(f);
                    }
                }
                "speed" => {
                    // Speed is in format "1.23x", strip the 'x'
                    let speed_str = value.trim().trim_end_matches('x');
                    if let Ok(s) = speed_str.parse::<f64>() {
                        self.speed = Some(s);
                    }
                }
                "progress" => {
                    if value.trim() == "end" {
                        self.is_complete = true;
                    }
                }
                _ => {}
            }
        }
    }

    /// Get output time in seconds
    pub fn out_time_s(&self) -> f64 {
        self.out_time_us as f64 / 1_000_000.0
    }

    /// Calculate progress percentage given total duration
    pub fn progress_pct(&self, duration_s: f64) -> f64 {
        if duration_s > 0.0 {
            (self.out_time_s() / duration_s * 100.0).min(100.0)
        } else {
            0.0
        }
    }
}
