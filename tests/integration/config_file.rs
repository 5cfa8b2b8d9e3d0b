// Loading settings from a TOML file and layering CLI overrides on top

use ffshrink::config::{Config, ConfigError, ConfigOverrides};
use ffshrink::engine::Codec;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_partial_file_keeps_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[encode]
target_size_mb = 8.0
codec = "hevc"

[batch]
extensions = ["mp4", "mov"]
"#,
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.encode.target_size_mb, 8.0);
    assert_eq!(config.encode.codec, Codec::Hevc);
    assert_eq!(config.encode.audio_bitrate_kbps, 128);
    assert_eq!(config.encode.preset, "slow");
    assert_eq!(config.batch.extensions, vec!["mp4", "mov"]);
    assert_eq!(config.batch.skip_prefix, "2x");
    assert_eq!(config.tools.ffprobe, PathBuf::from("ffprobe"));
}

#[test]
fn test_load_never_writes_the_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    let contents = "[encode]\npreset = \"medium\"\n";
    fs::write(&path, contents).unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.encode.preset, "medium");
    assert_eq!(fs::read_to_string(&path).unwrap(), contents);
}

#[test]
fn test_explicit_missing_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    assert!(Config::load(Some(&temp_dir.path().join("missing.toml"))).is_err());
}

#[test]
fn test_malformed_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "[encode\ntarget_size_mb = ").unwrap();

    let err = Config::load(Some(&path)).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse config file"));
}

#[test]
fn test_unknown_codec_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "[encode]\ncodec = \"vp9\"\n").unwrap();

    assert!(Config::load(Some(&path)).is_err());
}

#[test]
fn test_overrides_beat_file_values() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "[encode]\ntarget_size_mb = 8.0\nhvc1_tag = true\n").unwrap();

    let mut config = Config::load(Some(&path)).unwrap();
    config.apply_overrides(&ConfigOverrides {
        target_size_mb: Some(3.5),
        hvc1_tag: Some(false),
        skip_prefix: Some(String::new()),
        ..ConfigOverrides::default()
    });

    assert_eq!(config.encode.target_size_mb, 3.5);
    assert!(!config.encode.hvc1_tag);
    assert_eq!(config.batch.skip_prefix, "");
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_target_size_fails_validation() {
    let mut config = Config::default();
    config.apply_overrides(&ConfigOverrides {
        target_size_mb: Some(0.0),
        ..ConfigOverrides::default()
    });
    assert_eq!(config.validate(), Err(ConfigError::TargetSize(0.0)));
}

#[test]
fn test_zero_video_floor_fails_validation() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "[encode]\nmin_video_bitrate_kbps = 0\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.validate(), Err(ConfigError::MinVideoBitrate));

    let mut config = Config::default();
    config.apply_overrides(&ConfigOverrides {
        min_video_bitrate_kbps: Some(0),
        ..ConfigOverrides::default()
    });
    assert!(config.validate().is_err());
}

#[test]
fn test_show_config_output_reloads() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");

    let mut config = Config::default();
    config.encode.codec = Codec::Hevc;
    config.tools.ffmpeg = PathBuf::from("/opt/ffmpeg/bin/ffmpeg");
    fs::write(&path, config.to_toml().unwrap()).unwrap();

    let reloaded = Config::load(Some(&path)).unwrap();
    assert_eq!(reloaded.encode.codec, Codec::Hevc);
    assert_eq!(reloaded.tools.ffmpeg, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
}
