use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Every file either codec may leave next to a pass-log prefix.
/// Cleanup removes all of them regardless of which codec ran.
const H264_STATS_SUFFIXES: &[&str] = &["-0.log", "-0.log.mbtree", "-0.log.temp", "-0.log.mbtree.temp"];
const HEVC_STATS_SUFFIXES: &[&str] = &[
    ".x265.log",
    ".x265.log.cutree",
    ".x265.log.temp",
    ".x265.log.cutree.temp",
];

/// Video codec family used for the two-pass encode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    /// libx264: plays everywhere
    #[default]
    H264,
    /// libx265: smaller files, optional hvc1 tag for Apple players
    Hevc,
}

impl Codec {
    /// ffmpeg encoder identifier
    pub fn encoder(&self) -> &'static str {
        match self {
            Codec::H264 => "libx264",
            Codec::Hevc => "libx265",
        }
    }

    /// Container tag applied when the compatibility toggle is on
    pub fn compat_tag(&self) -> Option<&'static str> {
        match self {
            Codec::H264 => None,
            Codec::Hevc => Some("hvc1"),
        }
    }

    /// Arguments that select `pass` and point the encoder at its statistics file.
    ///
    /// x264 goes through ffmpeg's generic `-pass`/`-passlogfile`; x265 ignores those
    /// and takes its own `stats=` option instead.
    pub fn pass_args(&self, pass: u8, passlog_prefix: &Path) -> Vec<OsString> {
        match self {
            Codec::H264 => vec![
                "-pass".into(),
                pass.to_string().into(),
                "-passlogfile".into(),
                passlog_prefix.as_os_str().to_os_string(),
            ],
            Codec::Hevc => {
                let mut params = OsString::from(format!("pass={}:stats=", pass));
                params.push(escape_x265_value(self.stats_file(passlog_prefix).as_os_str()));
                vec!["-x265-params".into(), params]
            }
        }
    }

    /// The main statistics file this codec writes for `passlog_prefix`
    pub fn stats_file(&self, passlog_prefix: &Path) -> PathBuf {
        let suffix = match self {
            Codec::H264 => H264_STATS_SUFFIXES[0],
            Codec::Hevc => HEVC_STATS_SUFFIXES[0],
        };
        with_suffix(passlog_prefix, suffix)
    }

    /// Known statistics artifacts of both codecs for `passlog_prefix`
    pub fn all_stats_artifacts(passlog_prefix: &Path) -> Vec<PathBuf> {
        H264_STATS_SUFFIXES
            .iter()
            .chain(HEVC_STATS_SUFFIXES)
            .map(|suffix| with_suffix(passlog_prefix, suffix))
            .collect()
    }
}

/// ffmpeg splits `-x265-params` on `:` and unescapes `\` and `'`, so those are
/// backslash-escaped. Non-UTF-8 paths are passed through as is.
fn escape_x265_value(value: &OsStr) -> OsString {
    let Some(s) = value.to_str() else {
        return value.to_os_string();
    };
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, ':' | '\\' | '\'') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.into()
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Codec::H264 => write!(f, "h264"),
            Codec::Hevc => write!(f, "hevc"),
        }
    }
}

impl FromStr for Codec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "h264" | "x264" | "avc" => Ok(Codec::H264),
            "hevc" | "h265" | "x265" => Ok(Codec::Hevc),
            other => Err(format!("unknown codec '{}' (expected h264 or hevc)", other)),
        }
    }
}
