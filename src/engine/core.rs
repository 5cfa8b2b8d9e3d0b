mod codec;
mod error;
mod ffmpeg_cmd;
mod ffmpeg_info;
mod job;
mod log;
mod pipeline;
mod planner;
mod scan;
mod types;

pub use codec::Codec;
pub use error::{JobError, ProbeError};
pub use ffmpeg_cmd::{
    EncodeParams, build_pass_cmd, build_two_pass_cmds, format_ffmpeg_cmd, pass_args,
    run_two_pass, scale_filter,
};
pub(crate) use ffmpeg_info::FfprobeOutput;
pub use ffmpeg_info::{encoder_available, ffmpeg_version, ffprobe_version};
pub use job::{EncodeJob, JobId};
pub use log::{DEBUG_LOG_FILE, init_tracing, write_debug_log};
pub use pipeline::{DURATION_EPSILON, Prepared, build_job, prepare, process_file};
pub use planner::{KBITS_PER_MB, plan};
pub use scan::{SkipPolicy, is_video_file, scan, scan_streaming};
pub use types::{BitratePlan, JobOutcome, MediaProbe, ProgressParser, SkipReason};
