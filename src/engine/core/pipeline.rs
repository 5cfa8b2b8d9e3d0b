// Per-file state machine: probe, validate, plan, two passes, commit, cleanup

use super::error::JobError;
use super::ffmpeg_cmd::{EncodeParams, build_two_pass_cmds, format_ffmpeg_cmd, run_two_pass};
use super::job::EncodeJob;
use super::log::write_debug_log;
use super::planner::plan;
use super::scan::SkipPolicy;
use super::types::{BitratePlan, JobOutcome, MediaProbe, SkipReason};
use crate::config::Config;
use crate::engine::probe::probe_media;
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use tracing::{debug, info};

/// Durations at or below this many seconds are treated as unreadable
pub const DURATION_EPSILON: f64 = 0.1;

/// What validation and planning decided for a file that can be encoded
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prepared {
    pub probe: MediaProbe,
    pub plan: BitratePlan,
}

/// Probe, validate and plan `input` without touching it.
pub fn prepare(config: &Config, input: &Path) -> Result<Prepared, SkipReason> {
    let policy = SkipPolicy::new(config.batch.skip_prefix.as_str());
    if policy.matches(input) {
        return Err(SkipReason::SkippedByPolicy(policy.prefix().to_string()));
    }

    let probe = probe_media(&config.tools.ffprobe, input)
        .map_err(|e| SkipReason::UnreadableMedia(e.to_string()))?;

    if probe.duration_s <= DURATION_EPSILON {
        return Err(SkipReason::InvalidDuration(probe.duration_s));
    }

    let encode = &config.encode;
    let audio_kbps = if probe.has_audio {
        encode.audio_bitrate_kbps
    } else {
        0
    };
    let plan = plan(
        encode.target_size_mb,
        probe.duration_s,
        audio_kbps,
        encode.min_video_bitrate_kbps,
    );
    if plan.is_degenerate() {
        return Err(SkipReason::InvalidDuration(probe.duration_s));
    }

    Ok(Prepared { probe, plan })
}

/// Job for a prepared file; its artifacts are removed when it is dropped
pub fn build_job(config: &Config, input: &Path, prepared: &Prepared) -> EncodeJob {
    EncodeJob::new(
        input.to_path_buf(),
        prepared.plan,
        EncodeParams::from_config(&config.encode),
    )
}

/// Re-encode one file in place.
///
/// Skips come back as `Ok(JobOutcome::Skipped)`. Any `Err` means the original is
/// unchanged. Temp output and pass logs are gone by the time this returns.
/// Raising `abort` stops the encode with `JobError::Interrupted`.
pub fn process_file(
    config: &Config,
    input: &Path,
    abort: &AtomicBool,
) -> Result<JobOutcome, JobError> {
    let prepared = match prepare(config, input) {
        Ok(prepared) => prepared,
        Err(reason) => return Ok(JobOutcome::Skipped(reason)),
    };

    let original_bytes = fs::metadata(input)?.len();
    let job = build_job(config, input, &prepared);

    debug!(
        file = %input.display(),
        job = %job.id,
        duration_s = prepared.probe.duration_s,
        has_audio = prepared.probe.has_audio,
        "planned {}",
        prepared.plan
    );

    let debug_log = config.batch.debug_log;
    if debug_log {
        let cmd_strings: Vec<String> = build_two_pass_cmds(&config.tools.ffmpeg, &job)
            .iter()
            .map(format_ffmpeg_cmd)
            .collect();
        let _ = write_debug_log(&format!(
            "\n=== Encoding Job ===\n{}\n{}\n",
            input.display(),
            cmd_strings.join("\n&& \\\n")
        ));
    }

    run_two_pass(
        &config.tools.ffmpeg,
        &job,
        prepared.probe.duration_s,
        abort,
        |pass, stderr| {
            if debug_log {
                let _ = write_debug_log(&format!(
                    "✗ Encoding failed (pass {}): {}\nFFmpeg stderr:\n{}\n",
                    pass,
                    input.display(),
                    stderr
                ));
            }
        },
    )?;

    let plan = job.plan;
    let output_bytes = job.commit()?;
    if debug_log {
        let _ = write_debug_log(&format!("✓ Success: {}\n", input.display()));
    }
    info!(
        file = %input.display(),
        before = original_bytes,
        after = output_bytes,
        "replaced original"
    );

    Ok(JobOutcome::Committed {
        input: input.to_path_buf(),
        original_bytes,
        output_bytes,
        plan,
    })
}
