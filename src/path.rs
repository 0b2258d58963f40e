//! Path suffix policy and path joining
//!
//! Keys ending in `_dir`, `_path`, `_file` or `_link` name remote (posix) paths; keys
//! ending in `_ldir` or `_lpath` name paths on the machine running the deployment.
//! A list value under such a key is joined into a single normalized path string.

use crate::error::ResolveError;
use crate::value::Value;
use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

const REMOTE_SUFFIXES: [&str; 4] = ["_dir", "_path", "_file", "_link"];
const LOCAL_SUFFIXES: [&str; 2] = ["_ldir", "_lpath"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Remote,
    Local,
    Plain,
}

impl PathKind {
    pub fn of(key: &str) -> Self {
        if LOCAL_SUFFIXES.iter().any(|s| key.ends_with(s)) {
            PathKind::Local
        } else if REMOTE_SUFFIXES.iter().any(|s| key.ends_with(s)) {
            PathKind::Remote
        } else {
            PathKind::Plain
        }
    }
}

/// Normalize a path string without filesystem access: NFC, no trailing separators
/// (the root itself is preserved).
pub fn normalize_path_string(path: &str) -> String {
    let mut result: String = path.nfc().collect();
    while result.len() > 1 && (result.ends_with('/') || result.ends_with('\\')) {
        result.pop();
    }
    result
}

/// Join segments with posix semantics. An absolute segment restarts the path and an
/// empty segment contributes only a separator.
pub fn join_remote<S: AsRef<str>>(segments: &[S]) -> String {
    let mut joined = String::new();
    for segment in segments {
        let segment = segment.as_ref();
        if segment.starts_with('/') {
            joined = segment.to_string();
        } else if joined.is_empty() || joined.ends_with('/') {
            joined.push_str(segment);
        } else {
            joined.push('/');
            joined.push_str(segment);
        }
    }
    normalize_path_string(&joined)
}

/// Lexically resolve `.` and `..` components.
fn normalize_components(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Join segments with local filesystem semantics and make the result absolute.
pub fn join_local<S: AsRef<str>>(segments: &[S]) -> Result<String, ResolveError> {
    let mut joined = PathBuf::new();
    for segment in segments {
        joined.push(segment.as_ref());
    }
    let absolute = if joined.is_absolute() {
        joined
    } else {
        std::env::current_dir()
            .map_err(|e| {
                ResolveError::LocalPath(format!("Failed to read current directory: {}", e))
            })?
            .join(joined)
    };
    let normalized = normalize_components(&absolute);
    let simplified = dunce::simplified(&normalized);
    Ok(normalize_path_string(&simplified.to_string_lossy()))
}

/// Apply the suffix policy to an interpolated value.
///
/// `always_join` is set for values declared as path segments, which are joined even
/// when the key carries no path suffix.
pub fn apply_policy(key: &str, value: Value, always_join: bool) -> Result<Value, ResolveError> {
    let kind = PathKind::of(key);
    let items = match value {
        Value::List(items) if always_join || kind != PathKind::Plain => items,
        other => return Ok(other),
    };
    let segments: Vec<String> = items.iter().map(|v| v.to_string()).collect();
    let joined = match kind {
        PathKind::Local => join_local(&segments)?,
        PathKind::Remote | PathKind::Plain => join_remote(&segments),
    };
    Ok(Value::Str(joined))
}
