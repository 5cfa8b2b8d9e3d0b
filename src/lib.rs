//! Batch two-pass recompression of video files to an approximate target size.
//!
//! Each candidate is probed with ffprobe, given a video/audio bitrate split from
//! its duration and the size budget, encoded twice with ffmpeg into a hidden
//! sibling file, and only then renamed over the original.

pub mod config;
pub mod engine;
