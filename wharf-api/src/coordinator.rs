//! The coordinator: one watching compiler, one build context, one request
//! front end.

use crate::error::WharfError;
use crate::handler::{serve_artifact, Handled, Request, Response};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};
use wharf_config::{MiddlewareConfig, WatchOptions};
use wharf_core::{
    ArtifactPath, BuildContext, BuildState, BuildStateMachine, BuildStats, Compiler,
    CompilerError, FilenameResolver, LogReporter, PendingRequest, Reporter, Resolution, Scheduler,
    TickQueue, WatchTarget, Watching,
};
use wharf_vfs::middleware::{LoggedLayer, MirrorStats, MirroredLayer, VfsBuilder};
use wharf_vfs::{MemoryFileSystem, NativeFileSystem, VirtualFileSystem};

type WatchSlot = Arc<Mutex<Option<Box<dyn Watching>>>>;

fn lock_watching(
    slot: &Mutex<Option<Box<dyn Watching>>>,
) -> MutexGuard<'_, Option<Box<dyn Watching>>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Builder for [`Coordinator`]
pub struct CoordinatorBuilder {
    compiler: Arc<dyn Compiler>,
    config: MiddlewareConfig,
    reporter: Arc<dyn Reporter>,
    scheduler: Option<Arc<dyn Scheduler>>,
}

impl CoordinatorBuilder {
    pub fn new(compiler: Arc<dyn Compiler>) -> Self {
        Self {
            compiler,
            config: MiddlewareConfig::default(),
            reporter: Arc::new(LogReporter),
            scheduler: None,
        }
    }

    pub fn config(mut self, config: MiddlewareConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the default [`LogReporter`]
    pub fn reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Defer work onto an external event loop instead of the coordinator's
    /// own [`TickQueue`]
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Wire everything up and start the compiler's watch loop
    pub fn start(self) -> Result<Coordinator, WharfError> {
        Coordinator::start(self)
    }
}

struct Shared {
    compiler: Arc<dyn Compiler>,
    config: MiddlewareConfig,
    machine: BuildStateMachine,
    resolver: FilenameResolver,
    fs: Arc<dyn VirtualFileSystem>,
    mirror: Option<Arc<MirrorStats>>,
    queue: Option<TickQueue>,
    watching: WatchSlot,
}

/// Serves a watching compiler's in-memory output
///
/// Cloning yields another handle to the same coordinator.
#[derive(Clone)]
pub struct Coordinator {
    shared: Arc<Shared>,
}

impl Coordinator {
    pub fn builder(compiler: Arc<dyn Compiler>) -> CoordinatorBuilder {
        CoordinatorBuilder::new(compiler)
    }

    fn start(builder: CoordinatorBuilder) -> Result<Self, WharfError> {
        let CoordinatorBuilder {
            compiler,
            config,
            reporter,
            scheduler,
        } = builder;

        let target_configs = compiler.targets();
        if target_configs.is_empty() {
            return Err(WharfError::Config(String::from("compiler has no targets")));
        }
        let targets = target_configs
            .iter()
            .map(|target| {
                WatchTarget::from_config(target).ok_or_else(|| CompilerError::InvalidTarget {
                    name: target.name.clone(),
                    reason: format!("output path '{}' escapes the root", target.output_path),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let (fs, mirror) = output_file_system(&config);
        compiler.set_output_file_system(fs.clone());

        let (scheduler, queue): (Arc<dyn Scheduler>, _) = match scheduler {
            Some(scheduler) => (scheduler, None),
            None => {
                let queue = TickQueue::new();
                (Arc::new(queue.clone()), Some(queue))
            }
        };
        let machine = BuildStateMachine::new(BuildContext::shared(), scheduler, reporter);
        compiler.subscribe(Arc::new(machine.clone()));

        let options: Vec<WatchOptions> = target_configs
            .iter()
            .map(|target| {
                target
                    .watch_options
                    .clone()
                    .unwrap_or_else(|| config.watch_options.clone())
            })
            .collect();

        let watching = compiler.watch(
            options,
            Box::new(|err: &CompilerError| {
                error!(target: "wharf::state", error = %err, "watch error")
            }),
        )?;
        let watching: WatchSlot = Arc::new(Mutex::new(Some(watching)));

        let slot = watching.clone();
        machine.set_rebuild_trigger(Arc::new(move || {
            if let Some(watching) = lock_watching(&slot).as_mut() {
                watching.invalidate();
            }
        }));

        info!(
            target: "wharf::state",
            targets = targets.len(),
            public_path = %config.public_path,
            "watching"
        );

        let resolver = FilenameResolver::new(targets, &config);
        Ok(Self {
            shared: Arc::new(Shared {
                compiler,
                config,
                machine,
                resolver,
                fs,
                mirror,
                queue,
                watching,
            }),
        })
    }

    /// Run `callback` once the artifact set is valid and settled.
    ///
    /// Does not start a build. There is no timeout: if no build ever
    /// finishes, the callback waits until [`close`](Self::close) aborts it.
    /// After `close` it runs immediately, with aborted stats unless the
    /// last build had settled.
    pub fn wait_until_valid(&self, callback: impl FnOnce(&BuildStats) + Send + 'static) {
        self.shared
            .machine
            .gate()
            .await_ready(PendingRequest::new(callback));
    }

    /// Force a rebuild and run `callback` once its result has settled.
    ///
    /// A build already running is not interrupted; another build starts as
    /// soon as it finishes and `callback` waits for that one.
    pub fn invalidate(&self, callback: impl FnOnce(&BuildStats) + Send + 'static) {
        if !self.is_watching() {
            let stats = self
                .shared
                .machine
                .last_stats()
                .unwrap_or_else(|| Arc::new(BuildStats::aborted()));
            callback(&stats);
            return;
        }

        self.wait_until_valid(callback);
        if self.shared.machine.request_rebuild() {
            debug!(target: "wharf::state", "invalidating watch loop");
            if let Some(watching) = lock_watching(&self.shared.watching).as_mut() {
                watching.invalidate();
            }
        }
    }

    /// Stop the watch loop.
    ///
    /// `callback` gets the teardown result; every request still waiting is
    /// released afterwards with aborted stats. Callers arriving after this
    /// point are answered at once instead of queueing.
    pub fn close(&self, callback: impl FnOnce(Result<(), WharfError>) + Send + 'static) {
        let watching = lock_watching(&self.shared.watching).take();
        self.shared.machine.clear_rebuild_trigger();
        let gate = self.shared.machine.gate().clone();
        gate.close();

        let Some(watching) = watching else {
            callback(Ok(()));
            gate.abort_pending();
            return;
        };

        watching.close(Box::new(move |result| {
            match &result {
                Ok(()) => info!(target: "wharf::state", "watch loop closed"),
                Err(err) => warn!(target: "wharf::state", error = %err, "watch loop closed with error"),
            }
            callback(result.map_err(WharfError::Teardown));
            gate.abort_pending();
        }));
    }

    /// Offer a request. Resolved requests are answered through `respond`
    /// once the artifact set is settled; everything else passes through.
    pub fn handle(
        &self,
        request: Request,
        respond: impl FnOnce(Response) + Send + 'static,
    ) -> Handled {
        if !self.shared.config.serves_method(&request.method) {
            return Handled::PassThrough;
        }
        let Some(resolution) = self.shared.resolver.resolve(&request.url) else {
            return Handled::PassThrough;
        };

        let origin = request.url.clone();
        let shared = self.shared.clone();
        let pending = PendingRequest::new(move |stats: &BuildStats| {
            let response = if stats.is_aborted() {
                debug!(target: "wharf::serve", url = %request.url, "shutting down");
                Response::unavailable()
            } else {
                serve_artifact(&*shared.fs, &shared.config, &request, &resolution.path)
            };
            respond(response)
        })
        .with_origin(origin);

        self.shared.machine.gate().await_ready(pending);
        Handled::Accepted
    }

    /// Resolve `url` without serving it
    pub fn resolve_filename_from_url(&self, url: &str) -> Option<ArtifactPath> {
        self.resolve(url).map(|resolution| resolution.path)
    }

    /// Resolve `url`, reporting the target that owns it
    pub fn resolve(&self, url: &str) -> Option<Resolution> {
        self.shared.resolver.resolve(url)
    }

    /// The output file system handed to the compiler
    pub fn file_system(&self) -> Arc<dyn VirtualFileSystem> {
        self.shared.fs.clone()
    }

    pub fn state(&self) -> BuildState {
        self.shared.machine.state()
    }

    pub fn last_stats(&self) -> Option<Arc<BuildStats>> {
        self.shared.machine.last_stats()
    }

    pub fn config(&self) -> &MiddlewareConfig {
        &self.shared.config
    }

    pub fn compiler(&self) -> &Arc<dyn Compiler> {
        &self.shared.compiler
    }

    /// Whether the watch loop is still running
    pub fn is_watching(&self) -> bool {
        lock_watching(&self.shared.watching).is_some()
    }

    /// Disk mirror counters, when writing to disk is enabled
    pub fn mirror_stats(&self) -> Option<Arc<MirrorStats>> {
        self.shared.mirror.clone()
    }

    /// Drain the coordinator's own tick queue.
    ///
    /// Returns the number of tasks run; always 0 with an external scheduler.
    pub fn run_until_idle(&self) -> usize {
        self.shared
            .queue
            .as_ref()
            .map_or(0, |queue| queue.run_until_idle())
    }
}

fn output_file_system(
    config: &MiddlewareConfig,
) -> (Arc<dyn VirtualFileSystem>, Option<Arc<MirrorStats>>) {
    let builder = VfsBuilder::new(MemoryFileSystem::new()).with(LoggedLayer::new());
    let disk = &config.write_to_disk;
    if !disk.enabled {
        return (Arc::new(builder.build()), None);
    }

    let native = match &disk.root {
        Some(root) => NativeFileSystem::with_base(root.clone()),
        None => NativeFileSystem::new(),
    };
    let layer = MirroredLayer::new(native).with_extensions(disk.extensions.iter().cloned());
    let stats = layer.stats();
    debug!(
        target: "wharf::vfs",
        root = ?disk.root,
        extensions = ?disk.extensions,
        "mirroring artifacts to disk"
    );
    (Arc::new(builder.with(layer).build()), Some(stats))
}
