// Encoding engine - probing, planning, two-pass ffmpeg runs and the batch driver

pub mod batch;
pub mod core;
pub mod probe;

pub use batch::{BatchReport, run_batch, run_files};
pub use self::core::*;
pub use probe::{has_audio_stream, probe_duration, probe_media};
