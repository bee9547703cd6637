//! Log subscriber setup
//!
//! Every wharf crate logs through `tracing` under `wharf::*` targets; this
//! installs a `tracing-subscriber` registry that prints them.

use crate::error::WharfError;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    fmt,
    fmt::MakeWriter,
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    Layer, Registry,
};
use wharf_config::LogLevel;

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line, colored
    Pretty,
    /// One line per event
    #[default]
    Compact,
    /// Newline-delimited JSON
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

/// Map a configured level onto a `tracing` filter
pub fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Silent => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    }
}

/// Filter for wharf's own targets; other crates only get warnings through
pub fn targets(level: LogLevel) -> Targets {
    let level = level_filter(level);
    Targets::new()
        .with_default(level.min(LevelFilter::WARN))
        .with_target("wharf", level)
}

/// Install the global subscriber, printing to stdout
pub fn init(level: LogLevel, format: LogFormat) -> Result<(), WharfError> {
    init_with_file(level, format, None::<&Path>)
}

/// Install the global subscriber, printing to stdout and, if given,
/// appending plain-text lines to `file`
pub fn init_with_file<P: AsRef<Path>>(
    level: LogLevel,
    format: LogFormat,
    file: Option<P>,
) -> Result<(), WharfError> {
    let filter = targets(level);
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = vec![
        format_layer::<Registry, _>(format, io::stdout)
            .with_filter(filter.clone())
            .boxed(),
    ];

    if let Some(path) = file {
        let path = path.as_ref();
        let handle = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                WharfError::Logging(format!("cannot open log file '{}': {}", path.display(), e))
            })?;
        layers.push(
            fmt::layer::<Registry>()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(handle))
                .with_filter(filter)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| WharfError::Logging(e.to_string()))
}

fn format_layer<S, W>(format: LogFormat, make_writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
    }
}
