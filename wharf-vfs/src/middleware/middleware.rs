//! Middleware trait definition

use super::Stage;
use crate::{Metadata, VfsResult};
use std::path::Path;

/// Middleware trait for VFS operations
///
/// Middleware can intercept and transform VFS operations.
/// Each middleware declares its stage for automatic ordering.
/// Operations a middleware does not override go straight to `next`.
pub trait Middleware: Send + Sync {
    /// Get the execution stage for this middleware
    fn stage(&self) -> Stage;

    /// Intercept read_file operation
    fn read_file(&self, path: &Path, next: &dyn Next) -> VfsResult<Vec<u8>> {
        next.read_file(path)
    }

    /// Intercept write_file operation
    fn write_file(&self, path: &Path, content: &[u8], next: &dyn Next) -> VfsResult<()> {
        next.write_file(path, content)
    }

    /// Intercept stat operation
    fn stat(&self, path: &Path, next: &dyn Next) -> VfsResult<Metadata> {
        next.stat(path)
    }

    /// Intercept create_dir_all operation
    fn create_dir_all(&self, path: &Path, next: &dyn Next) -> VfsResult<()> {
        next.create_dir_all(path)
    }

    /// Intercept remove_file operation
    fn remove_file(&self, path: &Path, next: &dyn Next) -> VfsResult<()> {
        next.remove_file(path)
    }

    /// Intercept read_dir operation
    fn read_dir(&self, path: &Path, next: &dyn Next) -> VfsResult<Vec<String>> {
        next.read_dir(path)
    }
}

/// Handle to the next middleware in chain
pub trait Next {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>>;

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()>;

    fn stat(&self, path: &Path) -> VfsResult<Metadata>;

    fn create_dir_all(&self, path: &Path) -> VfsResult<()>;

    fn remove_file(&self, path: &Path) -> VfsResult<()>;

    fn read_dir(&self, path: &Path) -> VfsResult<Vec<String>>;
}
