//! wharf Virtual File System
//!
//! The output file system a watching compiler writes its artifacts into, with
//! interchangeable backends.
//!
//! - [`MemoryFileSystem`]: the authoritative in-memory artifact tree
//! - [`NativeFileSystem`]: `std::fs`, optionally rooted at a base directory
//! - [`middleware`]: a stage-ordered chain wrapping any backend, used for
//!   tracing and disk mirroring
//!
//! # Usage
//! ```rust
//! use wharf_vfs::{VirtualFileSystem, MemoryFileSystem};
//! use std::path::Path;
//!
//! let fs = MemoryFileSystem::new();
//! fs.write_file(Path::new("/dist/index.html"), b"<html></html>").unwrap();
//! let content = fs.read_file(Path::new("/dist/index.html")).unwrap();
//! assert_eq!(content, b"<html></html>");
//! ```

mod error;
mod memory;
mod native;
mod path;
mod r#trait;

pub mod middleware;

pub use error::{VfsError, VfsResult};
pub use memory::MemoryFileSystem;
pub use native::NativeFileSystem;
pub use path::normalize_path;
pub use r#trait::{FileKind, Metadata, VirtualFileSystem};
