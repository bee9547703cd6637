//! wharf Core
//!
//! Coordination between a watching compiler and the requests that want its
//! output:
//!
//! - [`BuildStateMachine`]: valid/invalid tracking driven by compiler events
//! - [`ReadinessGate`]: holds callers until the artifact set is settled
//! - [`FilenameResolver`]: maps request URLs to artifact paths
//! - [`Compiler`] / [`Watching`]: the compiler collaborator interface
//! - [`TickQueue`]: the deferred-work queue the state machine schedules on

mod compiler;
mod context;
mod error;
mod gate;
mod pattern;
mod reporter;
mod resolver;
mod scheduler;
mod state;
mod stats;

pub use compiler::{
    CloseCallback, Compiler, LifecycleListener, TargetConfig, WatchErrorHandler, Watching,
};
pub use context::{lock, BuildContext, BuildState, PendingRequest, ReadyCallback, SharedContext};
pub use error::CompilerError;
pub use gate::ReadinessGate;
pub use pattern::FilenamePattern;
pub use reporter::{LogReporter, ReportState, Reporter};
pub use resolver::{ArtifactPath, FilenameResolver, Resolution, WatchTarget};
pub use scheduler::{Scheduler, Task, TickQueue};
pub use state::{BuildStateMachine, RebuildTrigger};
pub use stats::BuildStats;
