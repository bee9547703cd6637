//! Native file system implementation

use crate::error::{VfsError, VfsResult};
use crate::path::normalize_path;
use crate::r#trait::{FileKind, Metadata, VirtualFileSystem};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A native OS file system implementation.
///
/// This wraps `std::fs` operations and provides the `VirtualFileSystem`
/// interface for local file access. With a base directory, every path is
/// normalized and re-rooted below it, so `/dist/app.js` lands in
/// `<base>/dist/app.js`.
///
/// # Example
/// ```
/// use wharf_vfs::{NativeFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let dir = tempfile::tempdir().unwrap();
/// let fs = NativeFileSystem::with_base(dir.path());
/// fs.write_file(Path::new("/dist/app.js"), b"hello").unwrap();
/// assert_eq!(std::fs::read(dir.path().join("dist/app.js")).unwrap(), b"hello");
/// ```
#[derive(Debug, Clone, Default)]
pub struct NativeFileSystem {
    base: Option<PathBuf>,
}

impl NativeFileSystem {
    /// Create a native file system operating on paths as given.
    pub fn new() -> Self {
        Self { base: None }
    }

    /// Create a native file system rooted at `base`.
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }

    /// The base directory, if any
    pub fn base(&self) -> Option<&Path> {
        self.base.as_deref()
    }

    /// Map a VFS path to the physical path it is stored at.
    pub fn physical_path(&self, path: &Path) -> VfsResult<PathBuf> {
        match &self.base {
            Some(base) => {
                let normalized = normalize_path(path)?;
                Ok(base.join(normalized.trim_start_matches('/')))
            }
            None => Ok(path.to_path_buf()),
        }
    }
}

impl VirtualFileSystem for NativeFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let physical = self.physical_path(path)?;
        std::fs::read(&physical).map_err(|e| VfsError::from_io(e, path))
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        let physical = self.physical_path(path)?;
        if let Some(parent) = physical.parent() {
            std::fs::create_dir_all(parent).map_err(|e| VfsError::from_io(e, parent))?;
        }
        std::fs::write(&physical, content).map_err(|e| VfsError::from_io(e, path))
    }

    fn stat(&self, path: &Path) -> VfsResult<Metadata> {
        let physical = self.physical_path(path)?;
        let meta = std::fs::metadata(&physical).map_err(|e| VfsError::from_io(e, path))?;
        let kind = if meta.is_dir() {
            FileKind::Directory
        } else {
            FileKind::File
        };
        Ok(Metadata {
            kind,
            size: if meta.is_dir() { 0 } else { meta.len() },
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        })
    }

    fn create_dir_all(&self, path: &Path) -> VfsResult<()> {
        let physical = self.physical_path(path)?;
        std::fs::create_dir_all(&physical).map_err(|e| VfsError::from_io(e, path))
    }

    fn remove_file(&self, path: &Path) -> VfsResult<()> {
        let physical = self.physical_path(path)?;
        std::fs::remove_file(&physical).map_err(|e| VfsError::from_io(e, path))
    }

    fn read_dir(&self, path: &Path) -> VfsResult<Vec<String>> {
        let physical = self.physical_path(path)?;
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&physical).map_err(|e| VfsError::from_io(e, path))? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        Ok(names)
    }
}
