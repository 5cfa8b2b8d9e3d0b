// Input probing using ffprobe

use super::core::{FfprobeOutput, MediaProbe, ProbeError};
use std::path::Path;
use std::process::Command;

/// Probe duration and audio presence with a single ffprobe run.
///
/// A missing or unparsable duration comes back as 0.0 so the caller can reject it;
/// only a failure to run ffprobe (or a nonzero exit) is an error.
pub fn probe_media(ffprobe: &Path, input_path: &Path) -> Result<MediaProbe, ProbeError> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
            "-select_streams",
            "a:0", // First audio stream only
        ])
        .arg(input_path)
        .output()
        .map_err(|source| ProbeError::Spawn {
            tool: ffprobe.display().to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(ProbeError::Failed {
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    parse_media_probe(&output.stdout)
}

/// Container duration in seconds (0.0 when ffprobe reports none)
pub fn probe_duration(ffprobe: &Path, input_path: &Path) -> Result<f64, ProbeError> {
    probe_media(ffprobe, input_path).map(|probe| probe.duration_s)
}

/// True if the file has an audio stream at audio index 0
pub fn has_audio_stream(ffprobe: &Path, input_path: &Path) -> Result<bool, ProbeError> {
    probe_media(ffprobe, input_path).map(|probe| probe.has_audio)
}

/// Build a MediaProbe from ffprobe's JSON output
pub fn parse_media_probe(json: &[u8]) -> Result<MediaProbe, ProbeError> {
    let probe: FfprobeOutput = serde_json::from_slice(json)?;

    let duration_s = probe
        .duration()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(0.0);

    Ok(MediaProbe {
        duration_s,
        has_audio: !probe.streams.is_empty(),
    })
}
