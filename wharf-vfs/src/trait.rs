//! VirtualFileSystem trait definition

use crate::error::VfsResult;
use std::path::Path;
use std::time::SystemTime;

/// Kind of a file system entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Directory,
}

/// Metadata returned by [`VirtualFileSystem::stat`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Entry kind
    pub kind: FileKind,
    /// Size in bytes (0 for directories)
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
}

impl Metadata {
    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }
}

/// Virtual File System trait
///
/// Provides a unified interface for file operations, decoupling the compiler's
/// output from where artifacts actually live.
///
/// # Implementations
/// - `MemoryFileSystem`: In-memory artifact tree
/// - `NativeFileSystem`: Native OS file system, optionally rooted at a base directory
/// - `LayeredVFS`: A backend wrapped in a middleware chain
pub trait VirtualFileSystem: Send + Sync {
    /// Read file contents
    ///
    /// # Returns
    /// File contents as bytes, or `VfsError::NotFound`
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>>;

    /// Write file contents
    ///
    /// Creates the file and any missing parent directories if needed,
    /// truncates it if it exists.
    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()>;

    /// Stat a path
    fn stat(&self, path: &Path) -> VfsResult<Metadata>;

    /// Create a directory and all of its missing parents
    fn create_dir_all(&self, path: &Path) -> VfsResult<()>;

    /// Remove a file
    fn remove_file(&self, path: &Path) -> VfsResult<()>;

    /// List the entry names of a directory, sorted
    fn read_dir(&self, path: &Path) -> VfsResult<Vec<String>>;

    /// Check if path exists
    fn exists(&self, path: &Path) -> bool {
        self.stat(path).is_ok()
    }

    /// Check if path exists and is a file
    fn is_file(&self, path: &Path) -> bool {
        self.stat(path).map(|m| m.is_file()).unwrap_or(false)
    }

    /// Check if path exists and is a directory
    fn is_dir(&self, path: &Path) -> bool {
        self.stat(path).map(|m| m.is_dir()).unwrap_or(false)
    }
}
