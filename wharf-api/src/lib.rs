//! wharf API - serving a watching compiler's in-memory output
//!
//! [`Coordinator`] is the entry point: it owns the output file system, tracks
//! build validity and answers requests for artifacts once the latest build
//! has settled.
//!
//! ```ignore
//! let coordinator = Coordinator::builder(compiler)
//!     .config(MiddlewareConfig::from_json(json)?)
//!     .start()?;
//!
//! coordinator.handle(Request::get("/app/main.js"), |response| {
//!     println!("{} ({} bytes)", response.status, response.body.len());
//! });
//! coordinator.run_until_idle();
//! ```

mod coordinator;
mod handler;
mod mime;
mod range;

pub mod error;
pub mod logging;

pub use coordinator::{Coordinator, CoordinatorBuilder};
pub use error::WharfError;
pub use handler::{Handled, Request, Response};
pub use mime::content_type;
pub use range::ByteRange;

pub use wharf_config::{LogLevel, MiddlewareConfig, WatchOptions, WriteToDiskConfig};
pub use wharf_core::{
    ArtifactPath, BuildState, BuildStats, Compiler, CompilerError, LifecycleListener,
    ReportState, Reporter, Scheduler, TargetConfig, TickQueue, Watching,
};
pub use wharf_vfs::{MemoryFileSystem, NativeFileSystem, VirtualFileSystem};
