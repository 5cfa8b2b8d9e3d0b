use super::types::BitratePlan;

/// Kilobits in one megabyte (1 MB = 1024 KB = 1024 * 8 kbit)
pub const KBITS_PER_MB: f64 = 8192.0;

/// Split a size budget into video and audio bitrates.
///
/// `total = target_size_mb * 8192 / duration_s`, rounded to whole kbps. Audio keeps
/// its fixed rate and video gets the remainder, but never less than `min_video_kbps`,
/// so short clips can overshoot the target. A non-positive duration yields the
/// degenerate plan `{0, 0, audio_kbps}`, which callers must treat as unencodable.
pub fn plan(
    target_size_mb: f64,
    duration_s: f64,
    audio_kbps: u32,
    min_video_kbps: u32,
) -> BitratePlan {
    if !(duration_s.is_finite() && duration_s > 0.0) {
        return BitratePlan {
            total_kbps: 0,
            video_kbps: 0,
            audio_kbps,
        };
    }

    let total = (target_size_mb * KBITS_PER_MB / duration_s).round().max(0.0);
    let video = (total - f64::from(audio_kbps)).max(f64::from(min_video_kbps));

    BitratePlan {
        total_kbps: saturate(total),
        video_kbps: saturate(video),
        audio_kbps,
    }
}

fn saturate(kbps: f64) -> u32 {
    if kbps >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        kbps as u32
    }
}
