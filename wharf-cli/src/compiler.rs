//! A compiler that "builds" by copying source directories into the output
//! file system

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::debug;
use wharf_config::WatchOptions;
use wharf_core::{
    BuildStats, CloseCallback, Compiler, CompilerError, LifecycleListener, TargetConfig,
    WatchErrorHandler, Watching,
};
use wharf_vfs::{NativeFileSystem, VfsResult, VirtualFileSystem};

/// One target: a source directory and where its copy goes
#[derive(Debug, Clone)]
pub struct DirectoryTarget {
    pub config: TargetConfig,
    pub source: PathBuf,
}

#[derive(Default)]
struct State {
    output: Option<Arc<dyn VirtualFileSystem>>,
    listeners: Vec<Arc<dyn LifecycleListener>>,
    builds: u64,
}

struct Inner {
    targets: Vec<DirectoryTarget>,
    state: Mutex<State>,
}

/// Copies every target's source directory into the output file system
#[derive(Clone)]
pub struct DirectoryCompiler {
    inner: Arc<Inner>,
}

impl DirectoryCompiler {
    pub fn new(targets: Vec<DirectoryTarget>) -> Self {
        Self {
            inner: Arc::new(Inner {
                targets,
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Number of builds run so far
    pub fn builds(&self) -> u64 {
        self.inner.lock().builds
    }
}

impl Inner {
    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners(&self) -> Vec<Arc<dyn LifecycleListener>> {
        self.lock().listeners.clone()
    }

    /// Run one build; `rebuild` marks a watch-triggered run
    fn build(&self, rebuild: bool) {
        for listener in self.listeners() {
            if rebuild {
                listener.on_watch_run_started();
            } else {
                listener.on_build_started();
            }
        }

        let started = Instant::now();
        let output = self.lock().output.clone();
        let mut stats = BuildStats::new();
        let mut hasher = DefaultHasher::new();

        match output {
            Some(output) => {
                for target in &self.targets {
                    let source = NativeFileSystem::with_base(&target.source);
                    let dest = Path::new(&target.config.output_path);
                    match copy_tree(&source, Path::new("/"), &*output, dest, &mut hasher) {
                        Ok(assets) => stats.assets.extend(assets),
                        Err(err) => {
                            stats = stats.with_error(format!("{}: {}", target.config.name, err));
                        }
                    }
                }
            }
            None => stats = stats.with_error("no output file system configured"),
        }

        stats.assets.hash(&mut hasher);
        let stats = stats
            .with_hash(format!("{:016x}", hasher.finish()))
            .with_duration(started.elapsed());

        self.lock().builds += 1;
        debug!(target: "wharf::cli", assets = stats.assets.len(), "build done");
        for listener in self.listeners() {
            listener.on_build_finished(stats.clone());
        }
    }
}

/// Copy `from` (a directory in `source`) to `to` in `dest`; returns the
/// destination paths of the copied files
fn copy_tree(
    source: &dyn VirtualFileSystem,
    from: &Path,
    dest: &dyn VirtualFileSystem,
    to: &Path,
    hasher: &mut DefaultHasher,
) -> VfsResult<Vec<String>> {
    let mut copied = Vec::new();
    dest.create_dir_all(to)?;

    for name in source.read_dir(from)? {
        let src = from.join(&name);
        let dst = to.join(&name);
        if source.is_dir(&src) {
            copied.extend(copy_tree(source, &src, dest, &dst, hasher)?);
        } else {
            let content = source.read_file(&src)?;
            content.hash(hasher);
            dest.write_file(&dst, &content)?;
            copied.push(dst.to_string_lossy().into_owned());
        }
    }
    Ok(copied)
}

impl Compiler for DirectoryCompiler {
    fn targets(&self) -> Vec<TargetConfig> {
        self.inner
            .targets
            .iter()
            .map(|target| target.config.clone())
            .collect()
    }

    fn set_output_file_system(&self, fs: Arc<dyn VirtualFileSystem>) {
        self.inner.lock().output = Some(fs);
    }

    fn subscribe(&self, listener: Arc<dyn LifecycleListener>) {
        self.inner.lock().listeners.push(listener);
    }

    fn watch(
        &self,
        options: Vec<WatchOptions>,
        on_error: WatchErrorHandler,
    ) -> Result<Box<dyn Watching>, CompilerError> {
        if options.len() != self.inner.targets.len() {
            return Err(CompilerError::Watch(format!(
                "expected {} watch option sets, got {}",
                self.inner.targets.len(),
                options.len()
            )));
        }
        for target in &self.inner.targets {
            if !target.source.is_dir() {
                let err = CompilerError::InvalidTarget {
                    name: target.config.name.clone(),
                    reason: format!("'{}' is not a directory", target.source.display()),
                };
                on_error(&err);
                return Err(err);
            }
        }

        self.inner.build(false);
        Ok(Box::new(DirectoryWatching {
            inner: self.inner.clone(),
        }))
    }
}

/// Watch handle; every invalidation copies the sources again
struct DirectoryWatching {
    inner: Arc<Inner>,
}

impl Watching for DirectoryWatching {
    fn invalidate(&mut self) {
        self.inner.build(true);
    }

    fn close(self: Box<Self>, done: CloseCallback) {
        done(Ok(()))
    }
}
