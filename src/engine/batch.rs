// Sequential batch driver: one file at a time, failures stay local to their file

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

use super::{JobError, JobOutcome, SkipPolicy, SkipReason, process_file, scan};
use crate::config::Config;

/// Exit code when the run was stopped by Ctrl+C
pub const EXIT_INTERRUPTED: i32 = 130;

/// Per-run tally of what happened to each candidate
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchReport {
    pub committed: usize,
    pub skipped: usize,
    pub failed: Vec<(PathBuf, String)>,
    pub bytes_before: u64,
    pub bytes_after: u64,
    pub interrupted: bool,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.committed + self.skipped + self.failed.len()
    }

    /// 0 = every non-skipped file committed, 1 = some file failed, 130 = interrupted
    pub fn exit_code(&self) -> i32 {
        if self.interrupted {
            EXIT_INTERRUPTED
        } else if self.failed.is_empty() {
            0
        } else {
            1
        }
    }
}

/// Scan `root` and re-encode every candidate in place.
///
/// Only an unreadable `root` is an error; everything per-file ends up in the report.
pub fn run_batch(config: &Config, root: &Path, abort: &AtomicBool) -> Result<BatchReport> {
    let files = scan(root, config.batch.extensions.as_slice())?;
    info!(root = %root.display(), candidates = files.len(), "scan complete");

    Ok(run_files(config, files, abort, |path| {
        process_file(config, path, abort)
    }))
}

/// Drive `process` over `files` sequentially, applying the skip policy first.
///
/// Stops early (and marks the report interrupted) once `abort` is set or a job
/// reports that ffmpeg was interrupted.
pub fn run_files<F>(
    config: &Config,
    files: Vec<PathBuf>,
    abort: &AtomicBool,
    mut process: F,
) -> BatchReport
where
    F: FnMut(&Path) -> Result<JobOutcome, JobError>,
{
    let policy = SkipPolicy::new(config.batch.skip_prefix.as_str());
    let total = files.len();
    let mut report = BatchReport::default();

    for (idx, path) in files.into_iter().enumerate() {
        if abort.load(Ordering::SeqCst) {
            report.interrupted = true;
            break;
        }

        if policy.matches(&path) {
            report.skipped += 1;
            let reason = SkipReason::SkippedByPolicy(policy.prefix().to_string());
            info!(file = %path.display(), "skipped: {}", reason);
            continue;
        }

        info!(file = %path.display(), "[{}/{}] start", idx + 1, total);
        match process(&path) {
            Ok(JobOutcome::Committed {
                original_bytes,
                output_bytes,
                plan,
                ..
            }) => {
                report.committed += 1;
                report.bytes_before += original_bytes;
                report.bytes_after += output_bytes;
                info!(
                    file = %path.display(),
                    video_kbps = plan.video_kbps,
                    audio_kbps = plan.audio_kbps,
                    "done: {} -> {}",
                    format_size(original_bytes),
                    format_size(output_bytes)
                );
            }
            Ok(JobOutcome::Skipped(reason)) => {
                report.skipped += 1;
                info!(file = %path.display(), "skipped: {}", reason);
            }
            Err(JobError::Interrupted { pass }) => {
                warn!(file = %path.display(), pass, "interrupted, original left untouched");
                report.interrupted = true;
                break;
            }
            Err(e) => {
                error!(file = %path.display(), "failed, original left untouched: {}", e);
                report.failed.push((path, e.to_string()));
            }
        }
    }

    if abort.load(Ordering::SeqCst) {
        report.interrupted = true;
    }

    report
}

/// Human-readable byte count (binary units)
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
