//! Path validation and normalization utilities.
//!
//! Every path that enters the graph is root-relative, forward-slash separated,
//! and free of `.`/`..` components. Archive entries and import specifiers are
//! untrusted input, so anything that would climb above the root is rejected
//! here rather than silently clamped.

use camino::{Utf8Path, Utf8PathBuf};
use std::path::Path;

/// Error types for path validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathValidationError {
    /// Path is empty after normalization
    #[error("empty path")]
    Empty,

    /// Path is absolute where a root-relative path was expected
    #[error("absolute path not allowed: {0}")]
    Absolute(String),

    /// Resolved path escapes the project root
    #[error("path escapes project root: {0}")]
    OutsideRoot(String),

    /// Path is not valid UTF-8
    #[error("path is not valid UTF-8: {0}")]
    NonUtf8(String),
}

/// Normalize a root-relative path
///
/// Converts backslashes to forward slashes, drops empty and `.` segments and
/// resolves `..`. Fails if the result is empty or would leave the root.
///
/// # Example
/// ```rust
/// use meridian::validation::normalize_path;
/// assert_eq!(normalize_path("./src\\util/../a.ts").unwrap(), "src/a.ts");
/// assert!(normalize_path("../etc/passwd").is_err());
/// ```
pub fn normalize_path(path: &str) -> Result<String, PathValidationError> {
    let unified = path.replace('\\', "/");
    if unified.starts_with('/') || has_drive_prefix(&unified) {
        return Err(PathValidationError::Absolute(path.to_string()));
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(PathValidationError::OutsideRoot(path.to_string()));
                }
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Err(PathValidationError::Empty);
    }
    Ok(segments.join("/"))
}

/// Resolve `relative` against the directory `dir` (both root-relative)
///
/// `dir` may be empty for the root. Returns None when the result would
/// escape the root or is empty.
pub fn join_relative(dir: &str, relative: &str) -> Option<String> {
    let joined = if dir.is_empty() {
        relative.to_string()
    } else {
        format!("{}/{}", dir, relative)
    };
    normalize_path(&joined).ok()
}

/// Directory part of a normalized path ("" for top-level entries)
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Express a filesystem path found under `root` as a normalized relative path
pub fn relative_to_root(path: &Path, root: &Path) -> Result<String, PathValidationError> {
    let utf8 = Utf8Path::from_path(path)
        .ok_or_else(|| PathValidationError::NonUtf8(path.to_string_lossy().to_string()))?;
    let utf8_root = Utf8Path::from_path(root)
        .ok_or_else(|| PathValidationError::NonUtf8(root.to_string_lossy().to_string()))?;

    let relative: Utf8PathBuf = utf8
        .strip_prefix(utf8_root)
        .map_err(|_| PathValidationError::OutsideRoot(utf8.to_string()))?
        .to_path_buf();

    normalize_path(relative.as_str())
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
