//! Build state reporting

use crate::stats::BuildStats;
use std::sync::Arc;
use tracing::{error, info, warn};

/// What a reporter is told on each valid/invalid transition
#[derive(Debug, Clone)]
pub struct ReportState {
    pub is_valid: bool,
    pub stats: Option<Arc<BuildStats>>,
}

impl ReportState {
    pub fn valid(stats: Arc<BuildStats>) -> Self {
        Self {
            is_valid: true,
            stats: Some(stats),
        }
    }

    pub fn invalid() -> Self {
        Self {
            is_valid: false,
            stats: None,
        }
    }
}

/// Observer of build state transitions
pub trait Reporter: Send + Sync {
    fn report(&self, state: &ReportState);
}

/// Default reporter: one log line per transition
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, state: &ReportState) {
        if !state.is_valid {
            info!(target: "wharf::report", "Compiling...");
            return;
        }

        let Some(stats) = &state.stats else {
            info!(target: "wharf::report", "Compiled successfully.");
            return;
        };

        if stats.has_errors() {
            for message in &stats.errors {
                error!(target: "wharf::report", "{}", message);
            }
            error!(target: "wharf::report", errors = stats.errors.len(), "Failed to compile.");
        } else if stats.has_warnings() {
            for message in &stats.warnings {
                warn!(target: "wharf::report", "{}", message);
            }
            warn!(target: "wharf::report", warnings = stats.warnings.len(), "Compiled with warnings.");
        } else {
            info!(
                target: "wharf::report",
                hash = stats.hash.as_deref().unwrap_or("-"),
                assets = stats.assets.len(),
                elapsed_ms = stats.duration.as_millis() as u64,
                "Compiled successfully."
            );
        }
    }
}
