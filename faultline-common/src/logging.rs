//! Logging setup shared by the Faultline binaries.
//!
//! Console output goes through a `fmt` layer (human or JSON); an optional file
//! sink is written through a non-blocking `tracing-appender` worker whose guard
//! must be held by `main` until exit.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{EnvParser, Sourced};

/// Console log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level directive used when `RUST_LOG` is not set, and where it came from.
    pub level: Sourced<String>,
    pub format: LogFormat,
    /// Optional JSON log file.
    pub file: Option<PathBuf>,
    /// Write console output to stderr instead of stdout.
    pub stderr: bool,
    /// Problems found while reading the environment, reported once logging is up.
    pub warnings: Vec<String>,
}

impl LogConfig {
    /// Read `FAULTLINE_LOG_LEVEL`, `FAULTLINE_LOG_FORMAT` and `FAULTLINE_LOG_FILE`.
    pub fn from_env(default_level: &str) -> Self {
        let mut parser = EnvParser::new();
        let level = parser.get_log_level("LOG_LEVEL", default_level);
        let format = parser
            .get_choice("LOG_FORMAT", &["pretty", "json"], "pretty")
            .into_inner();
        let file = parser.get_optional_path("LOG_FILE").into_inner();
        let warnings = parser
            .take_errors()
            .into_iter()
            .map(|e| e.to_string())
            .collect();

        Self {
            level,
            format: LogFormat::parse(&format),
            file,
            stderr: false,
            warnings,
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Sourced::from_cli(level.into());
        self
    }

    pub fn with_stderr(mut self) -> Self {
        self.stderr = true;
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level.value))
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Sourced::default_value("info".to_string()),
            format: LogFormat::Pretty,
            file: None,
            stderr: false,
            warnings: Vec::new(),
        }
    }
}

/// Keeps non-blocking writers alive; drop to flush.
#[must_use = "dropping the guards stops file logging"]
pub struct LoggingGuards {
    _guards: Vec<WorkerGuard>,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber described by `config`.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<LoggingGuards> {
    let mut layers: Vec<BoxedLayer> = vec![console_layer(config)];
    let mut guards = Vec::new();

    if let Some(path) = &config.file {
        let (layer, guard) = file_layer(path)?;
        layers.push(layer);
        guards.push(guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(config.filter())
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    debug!(
        level = %config.level.value,
        source = %config.level.origin(),
        "logging initialized"
    );
    for warning in &config.warnings {
        warn!("{}", warning);
    }

    Ok(LoggingGuards { _guards: guards })
}

fn console_layer(config: &LogConfig) -> BoxedLayer {
    match (config.format, config.stderr) {
        (LogFormat::Pretty, true) => fmt::layer().with_target(false).with_writer(std::io::stderr).boxed(),
        (LogFormat::Pretty, false) => fmt::layer().with_target(false).boxed(),
        (LogFormat::Json, true) => fmt::layer().json().with_writer(std::io::stderr).boxed(),
        (LogFormat::Json, false) => fmt::layer().json().boxed(),
    }
}

fn file_layer(path: &Path) -> anyhow::Result<(BoxedLayer, WorkerGuard)> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Log file path has no file name: {}", path.display()))?;
    std::fs::create_dir_all(dir)?;

    let appender = tracing_appender::rolling::never(dir, name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(writer)
        .boxed();
    Ok((layer, guard))
}
