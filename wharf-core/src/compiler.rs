//! The compiler collaborator
//!
//! wharf never compiles anything itself. A [`Compiler`] owns the build; wharf
//! hands it an output file system, listens to its lifecycle and drives its
//! watch loop through a [`Watching`] handle.

use crate::error::CompilerError;
use crate::stats::BuildStats;
use std::sync::Arc;
use wharf_config::WatchOptions;
use wharf_vfs::VirtualFileSystem;

/// One independently configured compilation unit
#[derive(Debug, Clone, PartialEq)]
pub struct TargetConfig {
    /// Display name
    pub name: String,
    /// Directory inside the output file system the target emits into
    pub output_path: String,
    /// URL prefix of this target's artifacts
    pub public_path: Option<String>,
    /// Watch options for this target; the middleware default applies otherwise
    pub watch_options: Option<WatchOptions>,
}

impl TargetConfig {
    pub fn new(name: impl Into<String>, output_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            output_path: output_path.into(),
            public_path: None,
            watch_options: None,
        }
    }

    pub fn with_public_path(mut self, public_path: impl Into<String>) -> Self {
        self.public_path = Some(public_path.into());
        self
    }

    pub fn with_watch_options(mut self, watch_options: WatchOptions) -> Self {
        self.watch_options = Some(watch_options);
        self
    }
}

/// Typed lifecycle notifications emitted by a compiler
pub trait LifecycleListener: Send + Sync {
    /// A one-off build started
    fn on_build_started(&self);

    /// The watch loop noticed changes and is about to rebuild
    fn on_watch_run_started(&self);

    /// A build finished, successfully or not
    fn on_build_finished(&self, stats: BuildStats);
}

/// Called for errors the watch loop cannot attach to a build
pub type WatchErrorHandler = Box<dyn Fn(&CompilerError) + Send + Sync>;

/// Called once a watch loop has shut down
pub type CloseCallback = Box<dyn FnOnce(Result<(), CompilerError>) + Send>;

/// A running watch loop
pub trait Watching: Send {
    /// Ask for a rebuild; advisory
    fn invalidate(&mut self);

    /// Stop watching and report when done
    fn close(self: Box<Self>, done: CloseCallback);
}

/// A watching compiler with one or more targets
pub trait Compiler: Send + Sync {
    /// The targets, in configuration order
    fn targets(&self) -> Vec<TargetConfig>;

    /// File system every target writes its artifacts into
    fn set_output_file_system(&self, fs: Arc<dyn VirtualFileSystem>);

    /// Register a lifecycle listener
    fn subscribe(&self, listener: Arc<dyn LifecycleListener>);

    /// Start the watch loop, one options entry per target
    fn watch(
        &self,
        options: Vec<WatchOptions>,
        on_error: WatchErrorHandler,
    ) -> Result<Box<dyn Watching>, CompilerError>;
}
