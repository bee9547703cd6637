//! Test helpers
//!
//! A compiler driven by hand, so tests decide exactly when builds start and
//! finish.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use wharf::api::{Coordinator, MiddlewareConfig, Request, Response};
use wharf::core::{
    BuildStats, CloseCallback, Compiler, CompilerError, LifecycleListener, ReportState,
    Reporter, TargetConfig, WatchErrorHandler, Watching,
};
use wharf::config::WatchOptions;
use wharf::vfs::VirtualFileSystem;

#[derive(Default)]
struct State {
    output: Option<Arc<dyn VirtualFileSystem>>,
    listeners: Vec<Arc<dyn LifecycleListener>>,
    watch_options: Vec<WatchOptions>,
    invalidations: usize,
    watching: bool,
    closed: bool,
    close_error: Option<CompilerError>,
}

/// Compiler whose lifecycle is driven by the test
#[derive(Clone)]
pub struct ManualCompiler {
    targets: Vec<TargetConfig>,
    state: Arc<Mutex<State>>,
}

impl ManualCompiler {
    pub fn new(targets: Vec<TargetConfig>) -> Self {
        Self {
            targets,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// One target writing to `/dist`
    pub fn single() -> Self {
        Self::new(vec![TargetConfig::new("main", "/dist")])
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn listeners(&self) -> Vec<Arc<dyn LifecycleListener>> {
        self.lock().listeners.clone()
    }

    pub fn output(&self) -> Arc<dyn VirtualFileSystem> {
        self.lock().output.clone().expect("output file system not set")
    }

    /// Write an artifact the way a build would
    pub fn emit(&self, path: &str, content: &str) {
        self.output()
            .write_file(Path::new(path), content.as_bytes())
            .unwrap();
    }

    pub fn start_build(&self) {
        for listener in self.listeners() {
            listener.on_build_started();
        }
    }

    pub fn start_watch_run(&self) {
        for listener in self.listeners() {
            listener.on_watch_run_started();
        }
    }

    pub fn finish_build(&self, stats: BuildStats) {
        for listener in self.listeners() {
            listener.on_build_finished(stats.clone());
        }
    }

    /// How often the watch loop was asked to rebuild
    pub fn invalidations(&self) -> usize {
        self.lock().invalidations
    }

    pub fn watch_options(&self) -> Vec<WatchOptions> {
        self.lock().watch_options.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Make the next close report `err`
    pub fn fail_close(&self, err: CompilerError) {
        self.lock().close_error = Some(err);
    }
}

impl Compiler for ManualCompiler {
    fn targets(&self) -> Vec<TargetConfig> {
        self.targets.clone()
    }

    fn set_output_file_system(&self, fs: Arc<dyn VirtualFileSystem>) {
        self.lock().output = Some(fs);
    }

    fn subscribe(&self, listener: Arc<dyn LifecycleListener>) {
        self.lock().listeners.push(listener);
    }

    fn watch(
        &self,
        options: Vec<WatchOptions>,
        _on_error: WatchErrorHandler,
    ) -> Result<Box<dyn Watching>, CompilerError> {
        let mut state = self.lock();
        state.watch_options = options;
        state.watching = true;
        Ok(Box::new(ManualWatching {
            state: self.state.clone(),
        }))
    }
}

struct ManualWatching {
    state: Arc<Mutex<State>>,
}

impl Watching for ManualWatching {
    fn invalidate(&mut self) {
        self.state.lock().unwrap().invalidations += 1;
    }

    fn close(self: Box<Self>, done: CloseCallback) {
        let result = {
            let mut state = self.state.lock().unwrap();
            state.watching = false;
            state.closed = true;
            state.close_error.take()
        };
        done(match result {
            Some(err) => Err(err),
            None => Ok(()),
        })
    }
}

/// Reporter remembering every transition
#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<ReportState>>,
}

impl RecordingReporter {
    pub fn validity(&self) -> Vec<bool> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.is_valid)
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, state: &ReportState) {
        self.reports.lock().unwrap().push(state.clone());
    }
}

/// Coordinator over `compiler` with a recording reporter
pub fn start(
    compiler: &ManualCompiler,
    config: MiddlewareConfig,
) -> (Coordinator, Arc<RecordingReporter>) {
    let reporter = Arc::new(RecordingReporter::default());
    let coordinator = Coordinator::builder(Arc::new(compiler.clone()))
        .config(config)
        .reporter(reporter.clone())
        .start()
        .unwrap();
    (coordinator, reporter)
}

/// Slot a response callback writes into
pub type ResponseSlot = Arc<Mutex<Option<Response>>>;

/// Offer `request`; the response lands in the returned slot
pub fn request(coordinator: &Coordinator, request: Request) -> (wharf::api::Handled, ResponseSlot) {
    let slot: ResponseSlot = Arc::new(Mutex::new(None));
    let sink = slot.clone();
    let handled = coordinator.handle(request, move |response| {
        *sink.lock().unwrap() = Some(response);
    });
    (handled, slot)
}

/// Record the hash of every stats a callback receives
pub fn hash_recorder() -> (
    Arc<Mutex<Vec<Option<String>>>>,
    impl Fn() -> Box<dyn FnOnce(&BuildStats) + Send>,
) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    let make = move || {
        let sink = sink.clone();
        Box::new(move |stats: &BuildStats| sink.lock().unwrap().push(stats.hash.clone()))
            as Box<dyn FnOnce(&BuildStats) + Send>
    };
    (log, make)
}
