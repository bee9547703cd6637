//! Errors raised by compiler collaborators

use thiserror::Error;
use wharf_vfs::VfsError;

/// Error reported by a compiler or its watch loop
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("watch failed: {0}")]
    Watch(String),

    #[error("close failed: {0}")]
    Close(String),

    #[error("invalid target '{name}': {reason}")]
    InvalidTarget { name: String, reason: String },

    #[error("output file system error: {0}")]
    Vfs(#[from] VfsError),
}
