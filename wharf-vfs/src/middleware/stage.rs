//! Middleware execution stage

/// Execution stage for middleware
///
/// Stages are ordered by priority. Lower numbers execute first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Stage {
    /// Outer layer: logging, tracing
    #[default]
    Outer = 100,
    /// Side channels fed after the backend accepted a write
    Mirroring = 300,
}

impl Stage {
    /// Get stage priority (lower = earlier)
    pub fn priority(&self) -> u32 {
        *self as u32
    }
}
