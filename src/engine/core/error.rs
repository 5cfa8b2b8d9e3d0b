use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// ffprobe could not answer for a file. Never fatal: the file is skipped.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("ffprobe exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("unparsable ffprobe output: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A job that got past validation but could not be committed.
/// The original file is untouched in every case.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("failed to launch {tool} for pass {pass}: {source}")]
    Spawn {
        tool: String,
        pass: u8,
        #[source]
        source: std::io::Error,
    },

    #[error("encoding failed (pass {pass}) with {status}\n\nFFmpeg error:\n{stderr_tail}")]
    Encode {
        pass: u8,
        status: ExitStatus,
        stderr_tail: String,
    },

    #[error("ffmpeg was interrupted during pass {pass}")]
    Interrupted { pass: u8 },

    #[error("pass 2 reported success but {} is missing or empty", path.display())]
    MissingOutput { path: PathBuf },

    #[error("failed to replace {} with {}: {source}", to.display(), from.display())]
    Commit {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl JobError {
    /// Which encode pass failed, if the failure came from ffmpeg
    pub fn failed_pass(&self) -> Option<u8> {
        match self {
            JobError::Spawn { pass, .. }
            | JobError::Encode { pass, .. }
            | JobError::Interrupted { pass } => Some(*pass),
            _ => None,
        }
    }
}
