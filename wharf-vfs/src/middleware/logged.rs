//! Logging middleware for VFS operations

use super::{Middleware, Next, Stage};
use crate::VfsResult;
use std::path::Path;
use tracing::debug;

/// Middleware that traces reads, writes and removals at debug level
pub struct LoggedLayer;

impl LoggedLayer {
    /// Create a new logging layer
    pub fn new() -> Self {
        Self
    }
}

impl Default for LoggedLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for LoggedLayer {
    fn stage(&self) -> Stage {
        Stage::Outer
    }

    fn read_file(&self, path: &Path, next: &dyn Next) -> VfsResult<Vec<u8>> {
        let result = next.read_file(path);
        match &result {
            Ok(content) => debug!(
                target: "wharf::vfs",
                path = %path.display(),
                bytes = content.len(),
                "read_file"
            ),
            Err(e) => debug!(target: "wharf::vfs", path = %path.display(), error = %e, "read_file failed"),
        }
        result
    }

    fn write_file(&self, path: &Path, content: &[u8], next: &dyn Next) -> VfsResult<()> {
        debug!(
            target: "wharf::vfs",
            path = %path.display(),
            bytes = content.len(),
            "write_file"
        );
        next.write_file(path, content)
    }

    fn remove_file(&self, path: &Path, next: &dyn Next) -> VfsResult<()> {
        debug!(target: "wharf::vfs", path = %path.display(), "remove_file");
        next.remove_file(path)
    }
}
