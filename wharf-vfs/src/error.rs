//! VFS error types

use std::io;
use std::path::Path;
use thiserror::Error;

/// Result type for VFS operations
pub type VfsResult<T> = Result<T, VfsError>;

/// Error type for VFS operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VfsError {
    /// File or directory not found
    #[error("path not found: {path}")]
    NotFound { path: String },

    /// A file operation hit a directory
    #[error("not a file: {path}")]
    NotAFile { path: String },

    /// A path component that must be a directory is a file
    #[error("not a directory: {path}")]
    NotADirectory { path: String },

    /// Permission denied
    #[error("permission denied: {path}")]
    PermissionDenied { path: String },

    /// Invalid path
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// IO error
    #[error("IO error: {message}")]
    Io { message: String },

    /// Custom error message
    #[error("{message}")]
    Custom { message: String },
}

impl VfsError {
    /// Map an IO error for `path`, keeping the not-found and permission cases apart.
    pub fn from_io(err: io::Error, path: &Path) -> Self {
        let path = path.to_string_lossy().to_string();
        match err.kind() {
            io::ErrorKind::NotFound => VfsError::NotFound { path },
            io::ErrorKind::PermissionDenied => VfsError::PermissionDenied { path },
            _ => VfsError::Io {
                message: format!("{}: {}", path, err),
            },
        }
    }

    /// Whether this error means the path does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, VfsError::NotFound { .. })
    }

    pub(crate) fn poisoned() -> Self {
        VfsError::Custom {
            message: String::from("Lock poisoned"),
        }
    }
}

impl From<io::Error> for VfsError {
    fn from(err: io::Error) -> Self {
        VfsError::Io {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_keeps_not_found() {
        let err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let mapped = VfsError::from_io(err, Path::new("/dist/a.js"));
        assert_eq!(
            mapped,
            VfsError::NotFound {
                path: "/dist/a.js".to_string()
            }
        );
        assert!(mapped.is_not_found());
    }

    #[test]
    fn test_display() {
        let err = VfsError::InvalidPath {
            path: "/../x".to_string(),
            reason: "escapes root".to_string(),
        };
        assert_eq!(err.to_string(), "invalid path '/../x': escapes root");
    }
}
