//! VFS Builder for constructing middleware chains

use super::{LayeredVFS, Middleware};
use crate::VirtualFileSystem;
use std::sync::Arc;

/// Builder for constructing a VFS with middleware chain
///
/// # Example
/// ```rust
/// use wharf_vfs::middleware::{LoggedLayer, MirroredLayer, VfsBuilder};
/// use wharf_vfs::{MemoryFileSystem, NativeFileSystem};
///
/// let vfs = VfsBuilder::new(MemoryFileSystem::new())
///     .with(LoggedLayer::new())
///     .with(MirroredLayer::new(NativeFileSystem::with_base("/tmp/wharf-mirror")))
///     .build();
/// ```
pub struct VfsBuilder {
    backend: Arc<dyn VirtualFileSystem>,
    middlewares: Vec<Box<dyn Middleware>>,
}

impl VfsBuilder {
    /// Create a new VFS builder with the given backend
    pub fn new(backend: impl VirtualFileSystem + 'static) -> Self {
        Self::from_shared(Arc::new(backend))
    }

    /// Create a builder over a backend that is also held elsewhere
    pub fn from_shared(backend: Arc<dyn VirtualFileSystem>) -> Self {
        Self {
            backend,
            middlewares: Vec::new(),
        }
    }

    /// Add a middleware to the chain
    ///
    /// Middlewares are automatically sorted by stage when built.
    pub fn with(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middlewares.push(Box::new(middleware));
        self
    }

    /// Number of middlewares added so far
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Build the final VFS with middleware chain
    ///
    /// Middlewares are sorted by stage (lower priority first); the sort is
    /// stable, so layers of the same stage keep insertion order.
    pub fn build(self) -> LayeredVFS {
        let mut middlewares = self.middlewares;
        middlewares.sort_by_key(|m| m.stage().priority());
        LayeredVFS::new(self.backend, middlewares)
    }
}
