use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Check if a path has one of `extensions` (case-insensitive, without the dot)
pub fn is_video_file<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    if let Some(ext) = path.extension() {
        if let Some(ext_str) = ext.to_str() {
            return extensions
                .iter()
                .any(|e| e.as_ref().trim_start_matches('.').eq_ignore_ascii_case(ext_str));
        }
    }
    false
}

/// Scan a directory recursively for video files and invoke a callback for each file found
pub fn scan_streaming<S, F>(root: &Path, extensions: &[S], mut on_file: F) -> Result<()>
where
    S: AsRef<str>,
    F: FnMut(PathBuf),
{
    // The root itself must be readable; problems below it only drop those entries
    std::fs::read_dir(root)
        .with_context(|| format!("Cannot read directory {}", root.display()))?;

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if entry.file_type().is_file() && is_video_file(path, extensions) {
            on_file(path.to_path_buf());
        }
    }

    Ok(())
}

/// Scan a directory recursively for video files, in a stable order
pub fn scan<S: AsRef<str>>(root: &Path, extensions: &[S]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    scan_streaming(root, extensions, |path| files.push(path))?;
    Ok(files)
}

/// Excludes files whose name starts with a prefix (typically output of an earlier run)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipPolicy {
    prefix: String,
}

impl SkipPolicy {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// True if the base name of `path` starts with the prefix. An empty prefix matches nothing.
    pub fn matches(&self, path: &Path) -> bool {
        if self.prefix.is_empty() {
            return false;
        }
        path.file_name()
            .map(|name| name.to_string_lossy().starts_with(&self.prefix))
            .unwrap_or(false)
    }
}
