//! Subscriber setup for processes hosting event buses.
//!
//! Bus diagnostics are emitted under the [`BUS_TARGET`] target, so a host can
//! run its own code at one level and the bus at another:
//!
//! ```rust
//! use typebus_telemetry::LogConfig;
//!
//! let config = LogConfig::new("warn").with_bus_level("debug");
//! assert_eq!(config.filter_directives(), "warn,typebus=debug");
//! ```

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, MakeWriter, TestWriter, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Target under which the bus crate logs.
pub const BUS_TARGET: &str = "typebus";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Line layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, indented fields.
    #[default]
    Pretty,
    /// One short line per event.
    Compact,
    /// One JSON object per line.
    Json,
    /// The `tracing-subscriber` default layout.
    Full,
}

/// Where lines are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    /// Standard output.
    Stdout,
    /// Standard error.
    #[default]
    Stderr,
    /// Appended to a file; the parent directory is created if missing.
    File(PathBuf),
    /// The test harness's captured output.
    Test,
}

/// Per-line metadata toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct LogFields {
    /// Timestamp prefix.
    pub timestamps: bool,
    /// Source file and line.
    pub source_location: bool,
    /// Numeric thread id.
    pub thread_ids: bool,
    /// Thread name. Serial schedulers name their worker after themselves,
    /// so this shows which scheduler ran a routed callback.
    pub thread_names: bool,
    /// Span open/close lines.
    pub span_events: bool,
}

impl Default for LogFields {
    fn default() -> Self {
        Self {
            timestamps: true,
            source_location: false,
            thread_ids: false,
            thread_names: false,
            span_events: false,
        }
    }
}

/// Logging configuration, embeddable in a host's own config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Base filter (a level such as `info`, or a full directive list).
    pub level: String,
    /// Level for [`BUS_TARGET`]; falls back to `level` when unset.
    pub bus_level: Option<String>,
    /// Line layout.
    pub format: LogFormat,
    /// Output.
    pub target: LogTarget,
    /// Per-line metadata.
    pub fields: LogFields,
    /// ANSI colors.
    pub ansi: bool,
    /// Extra directives, applied last.
    pub directives: Vec<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            bus_level: None,
            format: LogFormat::default(),
            target: LogTarget::default(),
            fields: LogFields::default(),
            ansi: true,
            directives: Vec::new(),
        }
    }
}

impl LogConfig {
    /// Config with the given base filter and defaults otherwise.
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Self::default()
        }
    }

    /// Compact lines on stderr with the bus at `debug` and thread names
    /// shown, for watching dispatch in a running host.
    #[must_use]
    pub fn bus_debug() -> Self {
        Self::new("info")
            .with_bus_level("debug")
            .with_format(LogFormat::Compact)
            .with_thread_names()
    }

    /// Captured test output: compact, untimed, uncolored, thread names on.
    #[must_use]
    pub fn for_tests(filter: impl Into<String>) -> Self {
        let mut config = Self::new(filter)
            .with_format(LogFormat::Compact)
            .with_target(LogTarget::Test)
            .with_thread_names();
        config.fields.timestamps = false;
        config.ansi = false;
        config
    }

    /// Set the line layout.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the output.
    #[must_use]
    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    /// Append to `path`, without colors.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.target = LogTarget::File(path.into());
        self.ansi = false;
        self
    }

    /// Filter the bus's own diagnostics at `level`.
    #[must_use]
    pub fn with_bus_level(mut self, level: impl Into<String>) -> Self {
        self.bus_level = Some(level.into());
        self
    }

    /// Add a directive such as `my_app::orders=trace`.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Replace the per-line metadata toggles.
    #[must_use]
    pub fn with_fields(mut self, fields: LogFields) -> Self {
        self.fields = fields;
        self
    }

    /// Show thread names, which identify serial scheduler workers.
    #[must_use]
    pub fn with_thread_names(mut self) -> Self {
        self.fields.thread_names = true;
        self
    }

    /// Turn colors off.
    #[must_use]
    pub fn without_ansi(mut self) -> Self {
        self.ansi = false;
        self
    }

    /// The complete filter string: base level, bus level, then extra
    /// directives.
    #[must_use]
    pub fn filter_directives(&self) -> String {
        let bus = self
            .bus_level
            .as_ref()
            .map(|level| format!("{BUS_TARGET}={level}"));

        std::iter::once(self.level.clone())
            .chain(bus)
            .chain(self.directives.iter().cloned())
            .filter(|directive| !directive.trim().is_empty())
            .collect::<Vec<_>>()
            .join(",")
    }

    fn env_filter(&self) -> TelemetryResult<EnvFilter> {
        EnvFilter::try_new(self.filter_directives())
            .map_err(|e| TelemetryError::ConfigError(e.to_string()))
    }

    fn layer(&self) -> TelemetryResult<BoxedLayer> {
        let layer = match &self.target {
            LogTarget::Stdout => self.format_layer(std::io::stdout),
            LogTarget::Stderr => self.format_layer(std::io::stderr),
            LogTarget::Test => self.format_layer(TestWriter::new),
            LogTarget::File(path) => self.format_layer(Mutex::new(open_log_file(path)?)),
        };
        Ok(layer.with_filter(self.env_filter()?).boxed())
    }

    fn format_layer<W>(&self, writer: W) -> BoxedLayer
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let fields = self.fields;
        let spans = if fields.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let base = fmt::layer()
            .with_writer(writer)
            .with_ansi(self.ansi)
            .with_file(fields.source_location)
            .with_line_number(fields.source_location)
            .with_thread_ids(fields.thread_ids)
            .with_thread_names(fields.thread_names)
            .with_span_events(spans);

        match (self.format, fields.timestamps) {
            (LogFormat::Pretty, true) => base.pretty().boxed(),
            (LogFormat::Pretty, false) => base.pretty().without_time().boxed(),
            (LogFormat::Compact, true) => base.compact().boxed(),
            (LogFormat::Compact, false) => base.compact().without_time().boxed(),
            (LogFormat::Json, true) => base.json().boxed(),
            (LogFormat::Json, false) => base.json().without_time().boxed(),
            (LogFormat::Full, true) => base.boxed(),
            (LogFormat::Full, false) => base.without_time().boxed(),
        }
    }
}

fn open_log_file(path: &Path) -> TelemetryResult<std::fs::File> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Install the global subscriber described by `config`.
///
/// # Errors
///
/// [`TelemetryError::ConfigError`] for an unparsable filter,
/// [`TelemetryError::IoError`] if the log file cannot be opened, and
/// [`TelemetryError::InitError`] if a global subscriber is already set.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    tracing_subscriber::registry()
        .with(config.layer()?)
        .try_init()
        .map_err(|e| TelemetryError::InitError(e.to_string()))
}

/// Install [`LogConfig::default`]: `info`, pretty, stderr.
///
/// # Errors
///
/// [`TelemetryError::InitError`] if a global subscriber is already set.
pub fn setup_default_logging() -> TelemetryResult<()> {
    setup_logging(&LogConfig::default())
}
