//! VFS Middleware System
//!
//! Provides a composable middleware layer for the Virtual File System.

mod builder;
mod layered;
mod middleware;
mod stage;

pub use builder::VfsBuilder;
pub use layered::LayeredVFS;
pub use middleware::{Middleware, Next};
pub use stage::Stage;

// Built-in middlewares
pub mod logged;
pub mod mirrored;

pub use logged::LoggedLayer;
pub use mirrored::{MirrorStats, MirroredLayer};
