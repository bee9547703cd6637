//! Build result snapshot

use std::time::Duration;

/// Result of one build, as reported by the compiler
///
/// A failed build is still a finished build: its errors travel here and the
/// artifacts it left behind stay servable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildStats {
    /// Compilation hash, if the compiler computes one
    pub hash: Option<String>,
    /// Error messages
    pub errors: Vec<String>,
    /// Warning messages
    pub warnings: Vec<String>,
    /// Emitted artifact paths
    pub assets: Vec<String>,
    /// Wall time of the build
    pub duration: Duration,
    aborted: bool,
}

impl BuildStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stats handed to waiters released by teardown instead of a build
    pub fn aborted() -> Self {
        Self {
            aborted: true,
            ..Self::default()
        }
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.errors.push(error.into());
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_asset(mut self, asset: impl Into<String>) -> Self {
        self.assets.push(asset.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
