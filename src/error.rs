//! Error types for Hatch

use serde::Serialize;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HatchError {
    #[error("Unknown container: {0}")]
    UnknownContainer(String),

    #[error("Path escapes container root: {0}")]
    PathEscape(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    #[error("IO failure: {0}")]
    IoFailure(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification of a [`HatchError`], suitable for mapping onto a
/// transport status or a structured error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownContainer,
    PathEscape,
    NotFound,
    AccessDenied,
    InvalidDestination,
    IoFailure,
    Config,
}

impl HatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HatchError::UnknownContainer(_) => ErrorKind::UnknownContainer,
            HatchError::PathEscape(_) => ErrorKind::PathEscape,
            HatchError::NotFound(_) => ErrorKind::NotFound,
            HatchError::AccessDenied(_) => ErrorKind::AccessDenied,
            HatchError::InvalidDestination(_) => ErrorKind::InvalidDestination,
            HatchError::IoFailure(_) => ErrorKind::IoFailure,
            HatchError::Config(_) => ErrorKind::Config,
        }
    }

    /// Classify an I/O error raised while opening or reading a source file.
    ///
    /// A missing file and a path running through a regular file are both
    /// reported as `NotFound`.
    pub fn from_read_io(err: io::Error, what: &str) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => HatchError::NotFound(what.to_string()),
            io::ErrorKind::PermissionDenied => HatchError::AccessDenied(what.to_string()),
            _ if is_not_a_directory(&err) => HatchError::NotFound(what.to_string()),
            _ => HatchError::IoFailure(format!("{}: {}", what, err)),
        }
    }

    /// Classify an I/O error raised while preparing or writing a destination.
    pub fn from_write_io(err: io::Error, what: &str) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => HatchError::AccessDenied(what.to_string()),
            _ if is_not_a_directory(&err) => HatchError::InvalidDestination(format!(
                "{}: a path component is not a directory",
                what
            )),
            _ => HatchError::IoFailure(format!("{}: {}", what, err)),
        }
    }
}

/// True when the OS reported that a path component is not a directory.
pub(crate) fn is_not_a_directory(err: &io::Error) -> bool {
    #[cfg(unix)]
    {
        err.raw_os_error() == Some(libc::ENOTDIR)
    }
    #[cfg(not(unix))]
    {
        // ERROR_DIRECTORY
        err.raw_os_error() == Some(267)
    }
}

pub type Result<T> = std::result::Result<T, HatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_snake_case() {
        let err = HatchError::InvalidDestination("a/b".to_string());
        let json = serde_json::to_string(&err.kind()).unwrap();
        assert_eq!(json, "\"invalid_destination\"");
    }

    #[test]
    fn test_read_io_classification() {
        let err = HatchError::from_read_io(io::Error::from(io::ErrorKind::NotFound), "x");
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = HatchError::from_read_io(io::Error::from(io::ErrorKind::PermissionDenied), "x");
        assert_eq!(err.kind(), ErrorKind::AccessDenied);

        let err = HatchError::from_read_io(io::Error::from(io::ErrorKind::UnexpectedEof), "x");
        assert_eq!(err.kind(), ErrorKind::IoFailure);
    }

    #[cfg(unix)]
    #[test]
    fn test_not_a_directory_maps_per_direction() {
        let read = HatchError::from_read_io(io::Error::from_raw_os_error(libc::ENOTDIR), "x");
        assert_eq!(read.kind(), ErrorKind::NotFound);

        let write = HatchError::from_write_io(io::Error::from_raw_os_error(libc::ENOTDIR), "x");
        assert_eq!(write.kind(), ErrorKind::InvalidDestination);
    }
}
