//! Layered VFS that executes middleware chain

use super::{Middleware, Next};
use crate::{Metadata, VfsResult, VirtualFileSystem};
use std::path::Path;
use std::sync::Arc;

/// VFS implementation that executes a middleware chain
pub struct LayeredVFS {
    backend: Arc<dyn VirtualFileSystem>,
    middlewares: Vec<Box<dyn Middleware>>,
}

impl LayeredVFS {
    pub(crate) fn new(
        backend: Arc<dyn VirtualFileSystem>,
        middlewares: Vec<Box<dyn Middleware>>,
    ) -> Self {
        Self {
            backend,
            middlewares,
        }
    }

    /// The backend at the bottom of the chain
    pub fn backend(&self) -> &Arc<dyn VirtualFileSystem> {
        &self.backend
    }

    fn executor(&self) -> ChainExecutor<'_> {
        ChainExecutor::new(&*self.backend, &self.middlewares, 0)
    }
}

/// Chain executor for a specific operation
struct ChainExecutor<'a> {
    backend: &'a dyn VirtualFileSystem,
    middlewares: &'a [Box<dyn Middleware>],
    index: usize,
}

impl<'a> ChainExecutor<'a> {
    fn new(
        backend: &'a dyn VirtualFileSystem,
        middlewares: &'a [Box<dyn Middleware>],
        index: usize,
    ) -> Self {
        Self {
            backend,
            middlewares,
            index,
        }
    }

    /// The middleware at this position and the executor for the rest of the chain
    fn split(&self) -> Option<(&'a dyn Middleware, ChainExecutor<'a>)> {
        let middleware = self.middlewares.get(self.index)?;
        let next = ChainExecutor::new(self.backend, self.middlewares, self.index + 1);
        Some((middleware.as_ref(), next))
    }
}

impl<'a> Next for ChainExecutor<'a> {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        match self.split() {
            Some((middleware, next)) => middleware.read_file(path, &next),
            None => self.backend.read_file(path),
        }
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        match self.split() {
            Some((middleware, next)) => middleware.write_file(path, content, &next),
            None => self.backend.write_file(path, content),
        }
    }

    fn stat(&self, path: &Path) -> VfsResult<Metadata> {
        match self.split() {
            Some((middleware, next)) => middleware.stat(path, &next),
            None => self.backend.stat(path),
        }
    }

    fn create_dir_all(&self, path: &Path) -> VfsResult<()> {
        match self.split() {
            Some((middleware, next)) => middleware.create_dir_all(path, &next),
            None => self.backend.create_dir_all(path),
        }
    }

    fn remove_file(&self, path: &Path) -> VfsResult<()> {
        match self.split() {
            Some((middleware, next)) => middleware.remove_file(path, &next),
            None => self.backend.remove_file(path),
        }
    }

    fn read_dir(&self, path: &Path) -> VfsResult<Vec<String>> {
        match self.split() {
            Some((middleware, next)) => middleware.read_dir(path, &next),
            None => self.backend.read_dir(path),
        }
    }
}

impl VirtualFileSystem for LayeredVFS {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        self.executor().read_file(path)
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        self.executor().write_file(path, content)
    }

    fn stat(&self, path: &Path) -> VfsResult<Metadata> {
        self.executor().stat(path)
    }

    fn create_dir_all(&self, path: &Path) -> VfsResult<()> {
        self.executor().create_dir_all(path)
    }

    fn remove_file(&self, path: &Path) -> VfsResult<()> {
        self.executor().remove_file(path)
    }

    fn read_dir(&self, path: &Path) -> VfsResult<Vec<String>> {
        self.executor().read_dir(path)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Stage, VfsBuilder};
    use super::*;
    use crate::MemoryFileSystem;
    use std::sync::Mutex;

    /// Records the order in which layers see a write
    struct Recorder {
        name: &'static str,
        stage: Stage,
        seen: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Middleware for Recorder {
        fn stage(&self) -> Stage {
            self.stage
        }

        fn write_file(&self, path: &Path, content: &[u8], next: &dyn Next) -> VfsResult<()> {
            self.seen.lock().unwrap().push(self.name);
            next.write_file(path, content)
        }
    }

    #[test]
    fn test_layers_run_in_stage_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let vfs = VfsBuilder::new(MemoryFileSystem::new())
            .with(Recorder {
                name: "mirror",
                stage: Stage::Mirroring,
                seen: seen.clone(),
            })
            .with(Recorder {
                name: "outer",
                stage: Stage::Outer,
                seen: seen.clone(),
            })
            .build();

        vfs.write_file(Path::new("/a.txt"), b"a").unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["outer", "mirror"]);
        assert_eq!(vfs.read_file(Path::new("/a.txt")).unwrap(), b"a");
    }

    #[test]
    fn test_empty_chain_delegates_to_backend() {
        let backend = Arc::new(MemoryFileSystem::new());
        let vfs = VfsBuilder::from_shared(backend.clone()).build();

        vfs.write_file(Path::new("/dist/x.js"), b"x").unwrap();

        assert!(backend.is_file(Path::new("/dist/x.js")));
        assert_eq!(vfs.read_dir(Path::new("/dist")).unwrap(), vec!["x.js"]);
        assert!(vfs.stat(Path::new("/dist")).unwrap().is_dir());
    }
}
