//! wharf - serve a watching compiler's output from memory
//!
//! # Architecture
//!
//! ```text
//! wharf-vfs/     - output file system: memory/native backends, middleware chain
//! wharf-config/  - configuration data structures
//! wharf-core/    - build state machine, readiness gate, URL resolution
//! wharf-api/     - Coordinator, request handling, logging setup
//! wharf-cli/     - `wharf` binary
//! ```

pub use wharf_api as api;
pub use wharf_config as config;
pub use wharf_core as core;
pub use wharf_vfs as vfs;

pub use wharf_api::{Coordinator, Handled, Request, Response, WharfError};
