//! API error types

use thiserror::Error;
use wharf_core::CompilerError;

/// wharf error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WharfError {
    /// The compiler refused to start or misbehaved
    #[error("compiler error: {0}")]
    Compiler(#[from] CompilerError),

    /// The watch loop failed to shut down cleanly
    #[error("teardown failed: {0}")]
    Teardown(CompilerError),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The log subscriber could not be installed
    #[error("logging setup failed: {0}")]
    Logging(String),
}

impl WharfError {
    /// Short name of the failing area, for log fields
    pub fn phase(&self) -> &'static str {
        match self {
            WharfError::Compiler(_) => "compiler",
            WharfError::Teardown(_) => "teardown",
            WharfError::Config(_) => "config",
            WharfError::Logging(_) => "logging",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = WharfError::Teardown(CompilerError::Close("watcher busy".into()));
        assert_eq!(err.to_string(), "teardown failed: close failed: watcher busy");
        assert_eq!(err.phase(), "teardown");
    }

    #[test]
    fn test_from_conversions() {
        let err: WharfError = CompilerError::Watch("no such dir".into()).into();
        assert!(matches!(err, WharfError::Compiler(CompilerError::Watch(_))));
        assert_eq!(err.phase(), "compiler");
        assert_eq!(WharfError::Config("no targets".into()).phase(), "config");
    }
}
