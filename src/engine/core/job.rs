use super::codec::Codec;
use super::error::JobError;
use super::ffmpeg_cmd::EncodeParams;
use super::types::BitratePlan;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Name component shared by every artifact of one job:
/// `<pid>-<hash of absolute input path>-<random token>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn for_input(input: &Path) -> Self {
        let token = Uuid::new_v4().simple().to_string();
        Self::from_parts(std::process::id(), input, &token[..12])
    }

    /// Deterministic id, for command previews and tests
    pub fn from_parts(pid: u32, input: &Path, token: &str) -> Self {
        JobId(format!("{}-{:016x}-{}", pid, path_hash(input), token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn path_hash(input: &Path) -> u64 {
    let absolute = std::path::absolute(input).unwrap_or_else(|_| input.to_path_buf());
    let mut hasher = DefaultHasher::new();
    absolute.hash(&mut hasher);
    hasher.finish()
}

/// One file's encode: owns the temp output and the pass-log files.
///
/// Everything the job may have created is removed when it is dropped, whether the
/// encode committed, failed, or unwound. The original is only ever touched by
/// [`EncodeJob::commit`], as a single rename from the same directory.
#[derive(Debug)]
pub struct EncodeJob {
    pub id: JobId,
    pub input_path: PathBuf,
    pub temp_output_path: PathBuf,
    pub passlog_prefix: PathBuf,
    pub plan: BitratePlan,
    pub params: EncodeParams,
    cleaned: bool,
}

impl EncodeJob {
    pub fn new(input_path: PathBuf, plan: BitratePlan, params: EncodeParams) -> Self {
        let id = JobId::for_input(&input_path);
        Self::with_id(id, input_path, plan, params, &std::env::temp_dir())
    }

    pub fn with_id(
        id: JobId,
        input_path: PathBuf,
        plan: BitratePlan,
        params: EncodeParams,
        passlog_dir: &Path,
    ) -> Self {
        let temp_output_path = temp_output_path(&input_path, &id);
        let passlog_prefix = passlog_dir.join(format!("ffshrink2pass-{}", id));

        Self {
            id,
            input_path,
            temp_output_path,
            passlog_prefix,
            plan,
            params,
            cleaned: false,
        }
    }

    /// Every path this job may leave behind (temp output plus both codecs' stats files)
    pub fn artifacts(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.temp_output_path.clone()];
        paths.extend(Codec::all_stats_artifacts(&self.passlog_prefix));
        paths
    }

    /// Replace the original with the finished temp output. Returns the new size in bytes.
    pub fn commit(self) -> Result<u64, JobError> {
        let size = match fs::metadata(&self.temp_output_path) {
            Ok(meta) if meta.is_file() && meta.len() > 0 => meta.len(),
            _ => {
                return Err(JobError::MissingOutput {
                    path: self.temp_output_path.clone(),
                });
            }
        };

        fs::rename(&self.temp_output_path, &self.input_path).map_err(|source| {
            JobError::Commit {
                from: self.temp_output_path.clone(),
                to: self.input_path.clone(),
                source,
            }
        })?;

        debug!(file = %self.input_path.display(), bytes = size, "committed");
        Ok(size)
    }

    /// Remove temp output and pass logs. Runs once; later calls are no-ops.
    pub fn cleanup(&mut self) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;

        for path in self.artifacts() {
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed job artifact"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove job artifact"),
            }
        }
    }
}

impl Drop for EncodeJob {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Hidden sibling of the input, so the final rename never crosses a filesystem
fn temp_output_path(input: &Path, id: &JobId) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    let name = format!(".{}.ffshrink-{}.part", stem, id);

    match input.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}
