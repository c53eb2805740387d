//! Subscriber setup for applications embedding fedql.
//!
//! The engine only emits `tracing` events. Applications that already install a
//! subscriber can ignore this module; everyone else calls [`LogConfig::init`] once
//! at startup.
//!
//! | Event                               | Level |
//! |-------------------------------------|-------|
//! | source registered / removed         | info  |
//! | query names an unknown source       | warn  |
//! | bad match pattern                   | warn  |
//! | query start / finish                | debug |
//! | trailing statements discarded       | debug |
//! | rows kept by residual filtering     | trace |

use fedql_core::{Error, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Environment variable holding a filter directive, e.g. `fedql=debug`
pub const FILTER_ENV: &str = "FEDQL_LOG";
/// Environment variable naming a log file; when set, events go to stdout and the file
pub const FILE_ENV: &str = "FEDQL_LOG_FILE";

const FALLBACK_FILE_NAME: &str = "fedql.log";

/// Where events are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    /// Standard output
    Stdout,
    /// Daily-rolled file
    File(PathBuf),
    /// Stdout plus a daily-rolled file
    Tee(PathBuf),
}

impl LogSink {
    fn file(&self) -> Option<&Path> {
        match self {
            LogSink::Stdout => None,
            LogSink::File(path) | LogSink::Tee(path) => Some(path),
        }
    }

    fn stdout(&self) -> bool {
        !matches!(self, LogSink::File(_))
    }
}

/// Line layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStyle {
    /// Multi-line with field lists
    Pretty,
    /// One line per event
    Compact,
}

/// Subscriber settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// `EnvFilter` directive
    pub filter: String,
    /// Destination
    pub sink: LogSink,
    /// Line layout
    pub style: LogStyle,
    /// Print the module path of each event
    pub show_targets: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            filter: "info".to_string(),
            sink: LogSink::Stdout,
            style: LogStyle::Pretty,
            show_targets: false,
        }
    }
}

impl LogConfig {
    /// Info and above, pretty, to stdout
    pub fn info() -> Self {
        Self::default()
    }

    /// Debug and above; shows each executed query
    pub fn debug() -> Self {
        Self::default().with_filter("debug")
    }

    /// Everything, including residual filtering counts
    pub fn trace() -> Self {
        Self::default().with_filter("trace")
    }

    /// Read [`FILTER_ENV`] and [`FILE_ENV`]; unset variables keep the defaults
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var(FILTER_ENV).ok(),
            std::env::var(FILE_ENV).ok(),
        )
    }

    fn from_vars(filter: Option<String>, file: Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(filter) = filter.filter(|f| !f.trim().is_empty()) {
            config.filter = filter;
        }
        if let Some(file) = file.filter(|f| !f.trim().is_empty()) {
            config.sink = LogSink::Tee(file.into());
        }
        config
    }

    /// Replace the filter directive
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Write only to a daily-rolled file
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sink = LogSink::File(path.into());
        self
    }

    /// Write to stdout and a daily-rolled file
    pub fn with_tee(mut self, path: impl Into<PathBuf>) -> Self {
        self.sink = LogSink::Tee(path.into());
        self
    }

    /// One line per event
    pub fn compact(mut self) -> Self {
        self.style = LogStyle::Compact;
        self
    }

    /// Toggle module paths in output
    pub fn with_targets(mut self, show: bool) -> Self {
        self.show_targets = show;
        self
    }

    /// Install the global subscriber.
    ///
    /// `RUST_LOG` overrides the configured filter, and a filter that does not
    /// parse falls back to `info`. With a file sink the returned guard owns the
    /// background writer: keep it alive until shutdown or buffered events are lost.
    ///
    /// # Errors
    ///
    /// `Error::InvalidInput` if a global subscriber is already set.
    ///
    /// ```rust,no_run
    /// use fedql::logging::LogConfig;
    ///
    /// let _guard = LogConfig::from_env().compact().init()?;
    /// # Ok::<(), fedql::Error>(())
    /// ```
    pub fn init(self) -> Result<Option<WorkerGuard>> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.filter))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

        if self.sink.stdout() {
            layers.push(self.layer(std::io::stdout, true));
        }

        let guard = match self.sink.file() {
            Some(path) => {
                let (dir, name) = split_log_path(path);
                let (writer, guard) =
                    tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, name));
                layers.push(self.layer(writer, false));
                Some(guard)
            }
            None => None,
        };

        tracing_subscriber::registry()
            .with(layers)
            .with(filter)
            .try_init()
            .map_err(|e| Error::InvalidInput(format!("cannot install log subscriber: {}", e)))?;

        Ok(guard)
    }

    fn layer<W>(&self, writer: W, ansi: bool) -> Box<dyn Layer<Registry> + Send + Sync>
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(self.show_targets);
        match self.style {
            LogStyle::Pretty => layer.pretty().boxed(),
            LogStyle::Compact => layer.compact().boxed(),
        }
    }
}

/// Directory and file name for the rolling appender
fn split_log_path(path: &Path) -> (&Path, &str) {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(FALLBACK_FILE_NAME);
    (dir, name)
}
