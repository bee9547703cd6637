//! wharf Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all wharf crates,
//! and every type deserializes from the camelCase JSON a project file uses.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Options controlling how artifacts are served
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MiddlewareConfig {
    /// URL prefix artifacts are served under
    pub public_path: String,
    /// Index artifact for directory requests; `None` disables index serving
    pub index: Option<String>,
    /// Request methods that are served; everything else passes through
    pub methods: Vec<String>,
    /// Extra headers added to every served response
    pub headers: BTreeMap<String, String>,
    /// Extension (without dot) to content type overrides
    pub mime_types: BTreeMap<String, String>,
    /// Filter pattern gating which artifact paths are served at all
    pub filename: Option<String>,
    /// Disk mirroring
    pub write_to_disk: WriteToDiskConfig,
    /// Watch options used for targets that do not carry their own
    pub watch_options: WatchOptions,
    /// Log verbosity
    pub log_level: LogLevel,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            public_path: String::from("/"),
            index: Some(String::from("index.html")),
            methods: vec![String::from("GET"), String::from("HEAD")],
            headers: BTreeMap::new(),
            mime_types: BTreeMap::new(),
            filename: None,
            write_to_disk: WriteToDiskConfig::default(),
            watch_options: WatchOptions::default(),
            log_level: LogLevel::Info,
        }
    }
}

impl MiddlewareConfig {
    /// Parse a config from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Whether requests with `method` are served
    pub fn serves_method(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m.eq_ignore_ascii_case(method))
    }
}

/// Disk mirroring of in-memory artifacts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WriteToDiskConfig {
    /// Whether to mirror at all
    pub enabled: bool,
    /// Directory the artifact tree is mirrored into; `None` writes at the
    /// artifacts' own absolute paths
    pub root: Option<PathBuf>,
    /// Only mirror these extensions (empty = everything)
    pub extensions: Vec<String>,
}

/// Options handed to the compiler's watch loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WatchOptions {
    /// Delay before rebuilding once the first change arrives
    pub aggregate_timeout_ms: u64,
    /// Poll interval; `None` lets the compiler use native events
    pub poll_interval_ms: Option<u64>,
    /// Glob patterns excluded from watching
    pub ignored: Vec<String>,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            aggregate_timeout_ms: 200,
            poll_interval_ms: None,
            ignored: Vec::new(),
        }
    }
}

/// Log verbosity
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Silent,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Get the string name of the level
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Silent => "silent",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "silent" => Ok(LogLevel::Silent),
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}
