//! Lexical normalization of caller-supplied paths

use std::path::PathBuf;

use crate::error::{HatchError, Result};

/// Normalize an untrusted slash-separated path into a relative path made only
/// of normal components.
///
/// Empty and `.` segments are dropped, so redundant separators and a leading
/// `/` collapse away. Each `..` removes the previous segment; one that would
/// climb above the start fails with `PathEscape`. A NUL byte cannot name
/// anything on the host and also fails with `PathEscape`, as does a backslash
/// or drive separator on Windows. No filesystem access.
pub fn normalize(relative: &str) -> Result<PathBuf> {
    let mut segments: Vec<&str> = Vec::new();

    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(HatchError::PathEscape(relative.to_string()));
                }
            }
            s if s.contains('\0') => {
                return Err(HatchError::PathEscape(format!("{:?}: NUL byte in path", relative)));
            }
            // On Windows a backslash or drive prefix inside a segment would
            // turn it into more than one component.
            #[cfg(windows)]
            s if s.contains('\\') || s.contains(':') => {
                return Err(HatchError::PathEscape(relative.to_string()));
            }
            s => segments.push(s),
        }
    }

    Ok(segments.iter().collect())
}
