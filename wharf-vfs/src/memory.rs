//! In-memory file system implementation

use crate::error::{VfsError, VfsResult};
use crate::path::{ancestors, normalize_path};
use crate::r#trait::{FileKind, Metadata, VirtualFileSystem};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;

#[derive(Debug, Clone)]
enum Entry {
    File {
        content: Arc<[u8]>,
        modified: SystemTime,
    },
    Directory {
        modified: SystemTime,
    },
}

impl Entry {
    fn metadata(&self) -> Metadata {
        match self {
            Entry::File { content, modified } => Metadata {
                kind: FileKind::File,
                size: content.len() as u64,
                modified: *modified,
            },
            Entry::Directory { modified } => Metadata {
                kind: FileKind::Directory,
                size: 0,
                modified: *modified,
            },
        }
    }
}

/// An in-memory file system implementation.
///
/// Entries live in a `BTreeMap` keyed by normalized path; every ancestor of a
/// file is materialized as a directory entry, so the map is a tree flattened
/// in path order. A single `RwLock` guards the map: a write replaces the whole
/// content of one path while holding the write lock, so readers observe either
/// the previous bytes or the new ones, never a mix.
///
/// # Example
/// ```
/// use wharf_vfs::{MemoryFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::new();
/// fs.write_file(Path::new("/dist/app.js"), b"hello").unwrap();
/// assert_eq!(fs.read_file(Path::new("/dist/app.js")).unwrap(), b"hello");
/// assert!(fs.is_dir(Path::new("/dist")));
/// ```
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    entries: Arc<RwLock<BTreeMap<String, Entry>>>,
}

impl MemoryFileSystem {
    /// Create a new empty memory file system.
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            String::from("/"),
            Entry::Directory {
                modified: SystemTime::now(),
            },
        );
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    /// Create a new memory file system pre-populated with files.
    ///
    /// # Arguments
    /// * `files` - Iterator of (path, content) tuples
    pub fn with_files<I, S>(files: I) -> VfsResult<Self>
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: AsRef<str>,
    {
        let fs = Self::new();
        for (path, content) in files {
            fs.write_file(Path::new(path.as_ref()), &content)?;
        }
        Ok(fs)
    }

    /// Number of files (directories excluded)
    pub fn file_count(&self) -> usize {
        self.read_entries()
            .map(|entries| {
                entries
                    .values()
                    .filter(|e| matches!(e, Entry::File { .. }))
                    .count()
            })
            .unwrap_or(0)
    }

    fn read_entries(&self) -> VfsResult<RwLockReadGuard<'_, BTreeMap<String, Entry>>> {
        self.entries.read().map_err(|_| VfsError::poisoned())
    }

    fn write_entries(&self) -> VfsResult<RwLockWriteGuard<'_, BTreeMap<String, Entry>>> {
        self.entries.write().map_err(|_| VfsError::poisoned())
    }

    /// Ensure every strict ancestor of `normalized` is (or can become) a directory.
    fn check_ancestors(entries: &BTreeMap<String, Entry>, normalized: &str) -> VfsResult<()> {
        for ancestor in ancestors(normalized) {
            if let Some(Entry::File { .. }) = entries.get(ancestor) {
                return Err(VfsError::NotADirectory {
                    path: ancestor.to_string(),
                });
            }
        }
        Ok(())
    }

    fn create_ancestors(entries: &mut BTreeMap<String, Entry>, normalized: &str, now: SystemTime) {
        for ancestor in ancestors(normalized) {
            entries
                .entry(ancestor.to_string())
                .or_insert(Entry::Directory { modified: now });
        }
    }
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualFileSystem for MemoryFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let normalized = normalize_path(path)?;
        let entries = self.read_entries()?;

        match entries.get(&normalized) {
            Some(Entry::File { content, .. }) => Ok(content.to_vec()),
            Some(Entry::Directory { .. }) => Err(VfsError::NotAFile { path: normalized }),
            None => Err(VfsError::NotFound { path: normalized }),
        }
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        let normalized = normalize_path(path)?;
        let content: Arc<[u8]> = Arc::from(content);
        let now = SystemTime::now();
        let mut entries = self.write_entries()?;

        if let Some(Entry::Directory { .. }) = entries.get(&normalized) {
            return Err(VfsError::NotAFile { path: normalized });
        }
        Self::check_ancestors(&entries, &normalized)?;
        Self::create_ancestors(&mut entries, &normalized, now);
        entries.insert(
            normalized,
            Entry::File {
                content,
                modified: now,
            },
        );
        Ok(())
    }

    fn stat(&self, path: &Path) -> VfsResult<Metadata> {
        let normalized = normalize_path(path)?;
        let entries = self.read_entries()?;
        entries
            .get(&normalized)
            .map(Entry::metadata)
            .ok_or(VfsError::NotFound { path: normalized })
    }

    fn create_dir_all(&self, path: &Path) -> VfsResult<()> {
        let normalized = normalize_path(path)?;
        let now = SystemTime::now();
        let mut entries = self.write_entries()?;

        if let Some(Entry::File { .. }) = entries.get(&normalized) {
            return Err(VfsError::NotADirectory { path: normalized });
        }
        Self::check_ancestors(&entries, &normalized)?;
        Self::create_ancestors(&mut entries, &normalized, now);
        entries
            .entry(normalized)
            .or_insert(Entry::Directory { modified: now });
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> VfsResult<()> {
        let normalized = normalize_path(path)?;
        let mut entries = self.write_entries()?;

        match entries.get(&normalized) {
            Some(Entry::File { .. }) => {
                entries.remove(&normalized);
                Ok(())
            }
            Some(Entry::Directory { .. }) => Err(VfsError::NotAFile { path: normalized }),
            None => Err(VfsError::NotFound { path: normalized }),
        }
    }

    fn read_dir(&self, path: &Path) -> VfsResult<Vec<String>> {
        let normalized = normalize_path(path)?;
        let entries = self.read_entries()?;

        match entries.get(&normalized) {
            Some(Entry::Directory { .. }) => {}
            Some(Entry::File { .. }) => {
                return Err(VfsError::NotADirectory { path: normalized })
            }
            None => return Err(VfsError::NotFound { path: normalized }),
        }

        let prefix = if normalized == "/" {
            normalized.clone()
        } else {
            format!("{}/", normalized)
        };

        // Children share the prefix and carry no further separator.
        let names = entries
            .range::<str, _>((Bound::Excluded(prefix.as_str()), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(&prefix))
            .map(|(key, _)| &key[prefix.len()..])
            .filter(|rest| !rest.is_empty() && !rest.contains('/'))
            .map(str::to_string)
            .collect();
        Ok(names)
    }
}
