use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FfprobeFormat {
    pub duration: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FfprobeOutput {
    #[serde(default)]
    pub format: FfprobeFormat,
    #[serde(default)]
    pub streams: Vec<serde_json::Value>,
}

impl FfprobeOutput {
    /// Duration in seconds, `None` when absent or not a number
    pub fn duration(&self) -> Option<f64> {
        self.format
            .duration
            .as_deref()
            .and_then(|d| d.trim().parse::<f64>().ok())
    }
}

fn first_version_line(tool: &Path) -> Result<String> {
    let output = Command::new(tool)
        .arg("-version")
        .output()
        .with_context(|| {
            format!(
                "Failed to execute {}. Is it installed and in PATH?",
                tool.display()
            )
        })?;

    if !output.status.success() {
        anyhow::bail!(
            "{} command failed with status: {}",
            tool.display(),
            output.status
        );
    }

    let version_output = String::from_utf8_lossy(&output.stdout);
    let first_line = version_output.lines().next().unwrap_or("Unknown version");

    Ok(first_line.to_string())
}

/// Check if ffmpeg is available and return its version
pub fn ffmpeg_version(ffmpeg: &Path) -> Result<String> {
    first_version_line(ffmpeg)
}

/// Check if ffprobe is available and return its version
pub fn ffprobe_version(ffprobe: &Path) -> Result<String> {
    first_version_line(ffprobe)
}

/// Check if ffmpeg lists `encoder` (e.g. "libx265") among its encoders
pub fn encoder_available(ffmpeg: &Path, encoder: &str) -> bool {
    let output = Command::new(ffmpeg)
        .arg("-hide_banner")
        .arg("-encoders")
        .output();

    match output {
        Ok(out) if out.status.success() => {
            let stdout = String::from_utf8_lossy(&out.stdout);
            stdout
                .lines()
                .any(|line| line.split_whitespace().nth(1) == Some(encoder))
        }
        _ => false,
    }
}
