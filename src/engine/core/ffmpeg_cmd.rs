use super::codec::Codec;
use super::error::JobError;
use super::job::EncodeJob;
use super::types::ProgressParser;
use crate::config::EncodeConfig;
use std::ffi::OsString;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Lines of ffmpeg stderr kept in error messages
const STDERR_TAIL_LINES: usize = 10;

/// How often a running pass checks the abort flag
const ABORT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Codec settings for both passes, resolved once from the config
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeParams {
    pub codec: Codec,
    pub preset: String,
    pub max_width: u32,
    pub frame_rate: u32,
    pub pixel_format: String,
    /// `-tag:v` value for pass 2, if any
    pub compat_tag: Option<&'static str>,
}

impl EncodeParams {
    pub fn from_config(config: &EncodeConfig) -> Self {
        let compat_tag = if config.hvc1_tag {
            config.codec.compat_tag()
        } else {
            None
        };

        Self {
            codec: config.codec,
            preset: config.preset.clone(),
            max_width: config.max_width,
            frame_rate: config.frame_rate,
            pixel_format: config.pixel_format.clone(),
            compat_tag,
        }
    }
}

/// Check if FFmpeg was stopped by a user signal (SIGTERM, SIGINT, SIGQUIT)
///
/// FFmpeg catches signals and exits gracefully, printing "Exiting normally, received signal X"
/// So we check both the process signal status AND the stderr for this message.
#[cfg(unix)]
fn was_user_cancelled(status: &ExitStatus, stderr: &str) -> bool {
    use std::os::unix::process::ExitStatusExt;

    if let Some(signal) = status.signal() {
        if matches!(signal, 2 | 3 | 15) {
            return true;
        }
    }

    stderr.contains("received signal 2")
        || stderr.contains("received signal 3")
        || stderr.contains("received signal 15")
}

#[cfg(not(unix))]
fn was_user_cancelled(_status: &ExitStatus, stderr: &str) -> bool {
    stderr.contains("received signal")
}

fn null_output_target() -> &'static str {
    if cfg!(windows) { "NUL" } else { "/dev/null" }
}

/// Clamp width to `max_width`, keep aspect ratio, force even dimensions
pub fn scale_filter(max_width: u32) -> String {
    format!("scale='trunc(min({},iw)/2)*2':-2", max_width)
}

/// Arguments for one pass, program name excluded
pub fn pass_args(job: &EncodeJob, pass: u8) -> Vec<OsString> {
    let params = &job.params;
    let with_audio = pass == 2 && job.plan.audio_kbps > 0;
    let mut args: Vec<OsString> = Vec::new();

    args.extend(["-hide_banner", "-nostdin", "-y"].map(OsString::from));
    args.push("-i".into());
    args.push(job.input_path.as_os_str().to_os_string());

    // Progress output (structured key=value to stdout)
    args.extend(["-progress", "-", "-nostats"].map(OsString::from));

    args.extend(["-map", "0:v:0"].map(OsString::from));
    if with_audio {
        args.extend(["-map", "0:a:0"].map(OsString::from));
    }

    args.push("-vf".into());
    args.push(scale_filter(params.max_width).into());
    args.push("-r".into());
    args.push(params.frame_rate.to_string().into());
    args.push("-pix_fmt".into());
    args.push(params.pixel_format.clone().into());

    args.push("-c:v".into());
    args.push(params.codec.encoder().into());
    args.push("-preset".into());
    args.push(params.preset.clone().into());
    args.push("-b:v".into());
    args.push(format!("{}k", job.plan.video_kbps).into());
    args.extend(params.codec.pass_args(pass, &job.passlog_prefix));

    if pass == 1 {
        // Pass 1 emits stats only; write to null muxer regardless of OS path conventions.
        args.push("-an".into());
        args.extend(["-f", "null"].map(OsString::from));
        args.push(null_output_target().into());
        return args;
    }

    if let Some(tag) = params.compat_tag {
        args.push("-tag:v".into());
        args.push(tag.into());
    }

    if with_audio {
        args.extend(["-c:a", "aac"].map(OsString::from));
        args.push("-b:a".into());
        args.push(format!("{}k", job.plan.audio_kbps).into());
    } else {
        args.push("-an".into());
    }

    args.extend(["-movflags", "+faststart", "-f", "mp4"].map(OsString::from));
    args.push(job.temp_output_path.as_os_str().to_os_string());
    args
}

/// Build the ffmpeg command for pass 1 (analysis) or pass 2 (final encode)
pub fn build_pass_cmd(ffmpeg: &Path, job: &EncodeJob, pass: u8) -> Command {
    let mut cmd = Command::new(ffmpeg);
    cmd.args(pass_args(job, pass));
    cmd
}

/// Both passes, in order
pub fn build_two_pass_cmds(ffmpeg: &Path, job: &EncodeJob) -> [Command; 2] {
    [build_pass_cmd(ffmpeg, job, 1), build_pass_cmd(ffmpeg, job, 2)]
}

/// Format a command as a shell-safe-looking string for display and logs
pub fn format_ffmpeg_cmd(cmd: &Command) -> String {
    let args = cmd
        .get_args()
        .map(|arg| {
            let s = arg.to_string_lossy();
            if s.contains(' ') || s.contains('\'') {
                format!("\"{}\"", s)
            } else {
                s.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    format!("{} {}", cmd.get_program().to_string_lossy(), args)
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().collect();
    if lines.len() > STDERR_TAIL_LINES {
        lines[lines.len() - STDERR_TAIL_LINES..].join("\n")
    } else {
        stderr.trim_end().to_string()
    }
}

/// Output of one finished ffmpeg process
#[derive(Debug)]
pub struct PassOutput {
    pub status: ExitStatus,
    pub parser: ProgressParser,
    pub stderr: String,
    /// The abort flag was raised and the process was killed
    pub cancelled: bool,
}

fn run_ffmpeg_once(
    mut cmd: Command,
    pass: u8,
    duration_s: f64,
    abort: &AtomicBool,
) -> Result<PassOutput, JobError> {
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let tool = cmd.get_program().to_string_lossy().to_string();
    let mut child = cmd
        .spawn()
        .map_err(|source| JobError::Spawn { tool, pass, source })?;

    let stderr = child.stderr.take();
    let stderr_thread = thread::spawn(move || {
        let mut stderr_output = String::new();
        if let Some(stderr) = stderr {
            let reader = BufReader::new(stderr);
            for line in reader.lines().map_while(Result::ok) {
                stderr_output.push_str(&line);
                stderr_output.push('\n');
            }
        }
        stderr_output
    });

    let stdout = child.stdout.take();
    let progress_thread = thread::spawn(move || {
        let mut parser = ProgressParser::new();
        if let Some(stdout) = stdout {
            // Pass 1 shows 0..50; pass 2 shows 50..100
            let offset = if pass == 1 { 0.0 } else { 50.0 };
            let mut last_step = -1i64;

            for line in BufReader::new(stdout).lines().map_while(Result::ok) {
                parser.parse_line(&line);

                let pct = offset + parser.progress_pct(duration_s) * 0.5;
                let step = (pct / 10.0) as i64;
                if step > last_step {
                    last_step = step;
                    debug!(
                        pass,
                        pct = pct as u32,
                        fps = ?parser.fps,
                        speed = ?parser.speed,
                        "encoding"
                    );
                }
            }
        }
        parser
    });

    let mut cancelled = false;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if abort.load(Ordering::SeqCst) {
            debug!(pass, pid = child.id(), "abort requested, killing ffmpeg");
            // Fails only if the child already exited; wait() reaps it either way
            let _ = child.kill();
            cancelled = true;
            break child.wait()?;
        }
        thread::sleep(ABORT_POLL_INTERVAL);
    };

    let parser = progress_thread.join().unwrap_or_default();
    let stderr = stderr_thread
        .join()
        .unwrap_or_else(|_| "Failed to capture stderr".to_string());

    Ok(PassOutput {
        status,
        parser,
        stderr,
        cancelled,
    })
}

/// Run pass 1 then pass 2 for `job`, stopping at the first failure.
///
/// On success the temp output is complete and ready to commit. On failure the error
/// names the pass and carries the end of ffmpeg's stderr; `on_failure` receives the
/// full stderr for the debug log. Raising `abort` kills the running pass, and a pass
/// that has not started yet never starts.
pub fn run_two_pass(
    ffmpeg: &Path,
    job: &EncodeJob,
    duration_s: f64,
    abort: &AtomicBool,
    on_failure: impl FnMut(u8, &str),
) -> Result<(), JobError> {
    drive_passes(
        build_two_pass_cmds(ffmpeg, job),
        abort,
        |cmd, pass| run_ffmpeg_once(cmd, pass, duration_s, abort),
        on_failure,
    )
}

fn drive_passes(
    cmds: [Command; 2],
    abort: &AtomicBool,
    mut run: impl FnMut(Command, u8) -> Result<PassOutput, JobError>,
    mut on_failure: impl FnMut(u8, &str),
) -> Result<(), JobError> {
    for (idx, cmd) in cmds.into_iter().enumerate() {
        let pass = idx as u8 + 1;
        if abort.load(Ordering::SeqCst) {
            debug!(pass, "abort requested before pass started");
            return Err(JobError::Interrupted { pass });
        }
        debug!(pass, cmd = %format_ffmpeg_cmd(&cmd), "starting ffmpeg");

        let output = run(cmd, pass)?;
        if output.status.success() && !output.cancelled {
            debug!(
                pass,
                complete = output.parser.is_complete,
                out_time_s = output.parser.out_time_s(),
                "ffmpeg pass finished"
            );
            continue;
        }

        on_failure(pass, &output.stderr);
        if output.cancelled || was_user_cancelled(&output.status, &output.stderr) {
            return Err(JobError::Interrupted { pass });
        }
        return Err(JobError::Encode {
            pass,
            status: output.status,
            stderr_tail: stderr_tail(&output.stderr),
        });
    }

    Ok(())
}
