// Command-line shape of both passes for each codec and audio layout

use ffshrink::config::EncodeConfig;
use ffshrink::engine::{Codec, build_pass_cmd, build_two_pass_cmds, format_ffmpeg_cmd};
use insta::assert_snapshot;
use std::path::Path;

use crate::common::assertions::*;
use crate::common::helpers::*;

fn hevc(hvc1_tag: bool) -> EncodeConfig {
    EncodeConfig {
        codec: Codec::Hevc,
        hvc1_tag,
        ..EncodeConfig::default()
    }
}

#[cfg(unix)]
#[test]
fn snapshot_h264_two_pass() {
    let job = test_job("/videos/clip.mp4", &EncodeConfig::default(), fixed_plan(180, 128));
    let cmds = build_two_pass_cmds(Path::new("ffmpeg"), &job);

    assert_snapshot!(
        redact_id(&job, &cmd_to_string(&cmds[0])),
        @"ffmpeg -hide_banner -nostdin -y -i /videos/clip.mp4 -progress - -nostats -map 0:v:0 -vf scale='trunc(min(1280,iw)/2)*2':-2 -r 30 -pix_fmt yuv420p -c:v libx264 -preset slow -b:v 180k -pass 1 -passlogfile /tmp/ffshrink2pass-<id> -an -f null /dev/null"
    );
    assert_snapshot!(
        redact_id(&job, &cmd_to_string(&cmds[1])),
        @"ffmpeg -hide_banner -nostdin -y -i /videos/clip.mp4 -progress - -nostats -map 0:v:0 -map 0:a:0 -vf scale='trunc(min(1280,iw)/2)*2':-2 -r 30 -pix_fmt yuv420p -c:v libx264 -preset slow -b:v 180k -pass 2 -passlogfile /tmp/ffshrink2pass-<id> -c:a aac -b:a 128k -movflags +faststart -f mp4 /videos/.clip.ffshrink-<id>.part"
    );
}

#[cfg(unix)]
#[test]
fn snapshot_hevc_pass2() {
    let job = test_job("/videos/clip.mp4", &hevc(true), fixed_plan(691, 128));
    let cmd = build_pass_cmd(Path::new("ffmpeg"), &job, 2);

    assert_snapshot!(
        redact_id(&job, &cmd_to_string(&cmd)),
        @"ffmpeg -hide_banner -nostdin -y -i /videos/clip.mp4 -progress - -nostats -map 0:v:0 -map 0:a:0 -vf scale='trunc(min(1280,iw)/2)*2':-2 -r 30 -pix_fmt yuv420p -c:v libx265 -preset slow -b:v 691k -x265-params pass=2:stats=/tmp/ffshrink2pass-<id>.x265.log -tag:v hvc1 -c:a aac -b:a 128k -movflags +faststart -f mp4 /videos/.clip.ffshrink-<id>.part"
    );
}

#[test]
fn test_video_bitrate_matches_plan_in_both_passes() {
    let job = test_job("/videos/clip.mp4", &EncodeConfig::default(), fixed_plan(691, 128));
    for cmd in build_two_pass_cmds(Path::new("ffmpeg"), &job) {
        let s = cmd_to_string(&cmd);
        assert_eq!(get_flag_value(&s, "-b:v"), Some("691k"));
        assert_eq!(get_flag_value(&s, "-c:v"), Some("libx264"));
    }
}

#[test]
fn test_pass1_never_writes_temp_output() {
    for encode in [EncodeConfig::default(), hevc(true)] {
        let job = test_job("/videos/clip.mp4", &encode, fixed_plan(180, 128));
        let pass1 = cmd_to_string(&build_pass_cmd(Path::new("ffmpeg"), &job, 1));

        assert_cmd_contains(&pass1, "-an -f null");
        assert_cmd_not_contains(&pass1, ".part");
        assert_cmd_not_contains(&pass1, "-c:a");
        assert_cmd_not_contains(&pass1, "-tag:v");
    }
}

#[test]
fn test_no_audio_plan_drops_audio_in_pass2() {
    let job = test_job("/videos/silent.mp4", &EncodeConfig::default(), fixed_plan(691, 0));
    let pass2 = cmd_to_string(&build_pass_cmd(Path::new("ffmpeg"), &job, 2));

    assert_cmd_not_contains(&pass2, "0:a:0");
    assert_cmd_not_contains(&pass2, "-c:a");
    assert_cmd_not_contains(&pass2, "-b:a");
    assert_flag_order(&pass2, "-an", "-movflags +faststart");
}

#[test]
fn test_hevc_tag_only_when_enabled() {
    let tagged = test_job("/videos/clip.mp4", &hevc(true), fixed_plan(691, 128));
    let untagged = test_job("/videos/clip.mp4", &hevc(false), fixed_plan(691, 128));

    let tagged = cmd_to_string(&build_pass_cmd(Path::new("ffmpeg"), &tagged, 2));
    let untagged = cmd_to_string(&build_pass_cmd(Path::new("ffmpeg"), &untagged, 2));

    assert_cmd_contains(&tagged, "-tag:v hvc1");
    assert_cmd_not_contains(&untagged, "-tag:v");
    assert_cmd_not_contains(&tagged, "-passlogfile");
}

#[test]
fn test_output_options_precede_output_path() {
    let job = test_job("/videos/clip.mp4", &EncodeConfig::default(), fixed_plan(180, 128));
    let pass2 = cmd_to_string(&build_pass_cmd(Path::new("ffmpeg"), &job, 2));

    assert_flag_order(&pass2, "-i /videos/clip.mp4", "-map 0:v:0");
    assert_flag_order(&pass2, "-b:v 180k", "-pass 2");
    assert_flag_order(&pass2, "-movflags +faststart", ".part");
    assert!(pass2.ends_with(".part"));
}

#[test]
fn test_custom_encode_settings_flow_into_args() {
    let encode = EncodeConfig {
        preset: "veryfast".to_string(),
        max_width: 640,
        frame_rate: 24,
        pixel_format: "yuv420p10le".to_string(),
        ..EncodeConfig::default()
    };
    let job = test_job("/videos/clip.mp4", &encode, fixed_plan(300, 96));
    let pass2 = cmd_to_string(&build_pass_cmd(Path::new("ffmpeg"), &job, 2));

    assert_eq!(get_flag_value(&pass2, "-preset"), Some("veryfast"));
    assert_eq!(get_flag_value(&pass2, "-r"), Some("24"));
    assert_eq!(get_flag_value(&pass2, "-pix_fmt"), Some("yuv420p10le"));
    assert_eq!(get_flag_value(&pass2, "-b:a"), Some("96k"));
    assert_cmd_contains(&pass2, "min(640,iw)");
}

#[test]
fn test_format_ffmpeg_cmd_is_display_form() {
    let job = test_job("/videos/my clip.mp4", &EncodeConfig::default(), fixed_plan(180, 128));
    let shown = format_ffmpeg_cmd(&build_pass_cmd(Path::new("ffmpeg"), &job, 1));

    assert!(shown.starts_with("ffmpeg -hide_banner"));
    assert_cmd_contains(&shown, "-i \"/videos/my clip.mp4\"");
}
