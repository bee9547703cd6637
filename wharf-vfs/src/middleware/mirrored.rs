//! Disk mirroring middleware
//!
//! Duplicates every accepted write onto a second file system (normally a
//! [`NativeFileSystem`](crate::NativeFileSystem) rooted at the output directory)
//! so external tooling can see the artifacts. The layer below stays
//! authoritative: a failed mirror write is logged and the caller still gets
//! the result of the in-memory write.

use super::{Middleware, Next, Stage};
use crate::{VfsResult, VirtualFileSystem};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Counters shared between a [`MirroredLayer`] and whoever wants to observe it
#[derive(Debug, Default)]
pub struct MirrorStats {
    written: AtomicU64,
    failed: AtomicU64,
}

impl MirrorStats {
    /// Mirror writes that succeeded
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    /// Mirror writes that failed and were swallowed
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Middleware that mirrors writes to a physical target
pub struct MirroredLayer {
    target: Arc<dyn VirtualFileSystem>,
    extensions: Vec<String>,
    stats: Arc<MirrorStats>,
}

impl MirroredLayer {
    /// Mirror every write into `target`
    pub fn new(target: impl VirtualFileSystem + 'static) -> Self {
        Self {
            target: Arc::new(target),
            extensions: Vec::new(),
            stats: Arc::new(MirrorStats::default()),
        }
    }

    /// Only mirror files with one of these extensions (without the dot).
    /// An empty list mirrors everything.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.into().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// Handle to the mirror counters
    pub fn stats(&self) -> Arc<MirrorStats> {
        self.stats.clone()
    }

    fn accepts(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .map(|ext| self.extensions.iter().any(|allowed| *allowed == ext))
            .unwrap_or(false)
    }
}

impl Middleware for MirroredLayer {
    fn stage(&self) -> Stage {
        Stage::Mirroring
    }

    fn write_file(&self, path: &Path, content: &[u8], next: &dyn Next) -> VfsResult<()> {
        next.write_file(path, content)?;

        if !self.accepts(path) {
            return Ok(());
        }
        match self.target.write_file(path, content) {
            Ok(()) => {
                self.stats.written.fetch_add(1, Ordering::Relaxed);
                debug!(target: "wharf::vfs", path = %path.display(), "asset written to disk");
            }
            Err(e) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                warn!(
                    target: "wharf::vfs",
                    path = %path.display(),
                    error = %e,
                    "unable to write asset to disk"
                );
            }
        }
        Ok(())
    }

    fn remove_file(&self, path: &Path, next: &dyn Next) -> VfsResult<()> {
        next.remove_file(path)?;
        if self.accepts(path) {
            if let Err(e) = self.target.remove_file(path) {
                debug!(target: "wharf::vfs", path = %path.display(), error = %e, "mirror removal skipped");
            }
        }
        Ok(())
    }
}
