use crate::error::LoggerError;
use crate::filter::env_filter;
use crate::format::ConsoleFormat;
use crate::Logger;
use private::Sealed;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::{env, fs};
use tracing::Subscriber;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, fmt};

const DEFAULT_MAX_FILES: usize = 10;
const LOG_FILE_SUFFIX: &str = "log";

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

#[derive(Debug)]
pub(crate) struct LoggerConfig {
    console: bool,
    console_format: ConsoleFormat,
    path: Option<PathBuf>,
    level: LevelFilter,
    rotation: Rotation,
    max_files: usize,
    json: bool,
    env_filter: Option<String>,
    #[cfg(feature = "opentelemetry")]
    opentelemetry: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            console: true,
            console_format: ConsoleFormat::Compact,
            path: None,
            level: LevelFilter::INFO,
            rotation: Rotation::DAILY,
            max_files: DEFAULT_MAX_FILES,
            json: false,
            env_filter: None,
            #[cfg(feature = "opentelemetry")]
            opentelemetry: false,
        }
    }
}

impl LoggerConfig {
    fn validate(&self, name: &str) -> Result<(), LoggerError> {
        let problem = if name.trim().is_empty() {
            "Logger name cannot be empty"
        } else if self.max_files == 0 {
            "max_files must be greater than zero"
        } else {
            return Ok(());
        };
        Err(LoggerError::InvalidConfiguration { message: problem.into(), context: None })
    }

    /// Rolling file output under `dir`, named `<name>.<date>.log`.
    fn file_layer<S>(&self, dir: &Path, name: &str) -> Result<(BoxedLayer<S>, WorkerGuard), LoggerError>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        fs::create_dir_all(dir).map_err(|e| LoggerError::Internal {
            message: e.to_string().into(),
            context: Some(format!("Creating log directory {}", dir.display()).into()),
        })?;

        let appender = RollingFileAppender::builder()
            .rotation(self.rotation.clone())
            .filename_prefix(name)
            .filename_suffix(LOG_FILE_SUFFIX)
            .max_log_files(self.max_files)
            .build(dir)?;

        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer().with_writer(writer).with_ansi(false);
        let layer = if self.json { layer.json().boxed() } else { layer.boxed() };
        Ok((layer, guard))
    }
}

/// Typestate: no name yet.
#[derive(Debug)]
pub struct NoName;
/// Typestate: named; the name prefixes log files.
#[derive(Debug)]
pub struct WithName(String);
/// Typestate: console only.
#[derive(Debug)]
pub struct NoFile;
/// Typestate: file output configured.
#[derive(Debug)]
pub struct WithFile;

mod private {
    pub trait Sealed {}
}
impl Sealed for NoName {}
impl Sealed for WithName {}
impl Sealed for NoFile {}
impl Sealed for WithFile {}

/// A builder for configuring and initializing the global tracing subscriber.
///
/// [`LoggerBuilder::init`] is only available once a name is set; file settings
/// only once a directory is set.
#[derive(Debug)]
pub struct LoggerBuilder<N: Sealed = NoName, F: Sealed = NoFile> {
    config: LoggerConfig,
    name: N,
    file: PhantomData<F>,
}

impl LoggerBuilder {
    pub(crate) fn new() -> Self {
        Self { config: LoggerConfig::default(), name: NoName, file: PhantomData }
    }
}

impl<F: Sealed> LoggerBuilder<NoName, F> {
    pub fn name(self, name: impl Into<String>) -> LoggerBuilder<WithName, F> {
        LoggerBuilder { config: self.config, name: WithName(name.into()), file: PhantomData }
    }
}

impl LoggerBuilder<WithName, WithFile> {
    /// Rotated files kept on disk.
    #[must_use]
    pub const fn max_files(mut self, max: usize) -> Self {
        self.config.max_files = max;
        self
    }

    #[must_use]
    pub const fn rotation(mut self, rotation: Rotation) -> Self {
        self.config.rotation = rotation;
        self
    }

    /// Writes JSON lines to the log files.
    #[must_use]
    pub const fn json(mut self) -> Self {
        self.config.json = true;
        self
    }
}

impl<F: Sealed> LoggerBuilder<WithName, F> {
    #[must_use]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.config.level = level;
        self
    }

    /// Explicit filter (e.g. `lovebird_identity=debug`); replaces both `RUST_LOG`
    /// and the transport caps. Invalid filters fail [`LoggerBuilder::init`].
    #[must_use]
    pub fn env_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.env_filter = Some(filter.into());
        self
    }

    #[must_use]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.config.console = enabled;
        self
    }

    #[must_use]
    pub const fn console_format(mut self, format: ConsoleFormat) -> Self {
        self.config.console_format = format;
        self
    }

    /// Attach a `tracing-opentelemetry` layer backed by the global tracer.
    ///
    /// Install a tracer provider before calling [`LoggerBuilder::init`].
    #[cfg(feature = "opentelemetry")]
    #[must_use]
    pub const fn opentelemetry(mut self, enabled: bool) -> Self {
        self.config.opentelemetry = enabled;
        self
    }

    /// Directory for rolling log files.
    pub fn path(self, path: impl Into<PathBuf>) -> LoggerBuilder<WithName, WithFile> {
        let mut config = self.config;
        config.path = Some(path.into());
        LoggerBuilder { config, name: self.name, file: PhantomData }
    }

    /// Install the global subscriber.
    ///
    /// The returned [`Logger`] owns the file writer guard and must outlive all logging.
    ///
    /// # Errors
    /// * [`LoggerError::InvalidConfiguration`] for a blank name, zero `max_files`, an
    ///   invalid filter or no enabled output
    /// * [`LoggerError::Subscriber`] if a global subscriber is already installed
    pub fn init(self) -> Result<Logger, LoggerError> {
        let Self { config, name: WithName(name), .. } = self;
        config.validate(&name)?;

        let filter = env_filter(config.level, config.env_filter.as_deref(), env::var_os("RUST_LOG").is_some())?;

        let mut layers = Vec::new();
        if config.console {
            layers.push(config.console_format.layer());
        }

        #[cfg(feature = "opentelemetry")]
        if config.opentelemetry {
            let tracer = opentelemetry::global::tracer(name.clone());
            layers.push(tracing_opentelemetry::layer().with_tracer(tracer).boxed());
        }

        let guard = match &config.path {
            Some(dir) => {
                let (layer, guard) = config.file_layer(dir, &name)?;
                layers.push(layer);
                Some(guard)
            },
            None => None,
        };

        if layers.is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "No logging layers enabled. Enable console or file output.".into(),
                context: None,
            });
        }

        tracing_subscriber::registry().with(filter).with(layers).try_init()?;

        Ok(Logger { guard })
    }
}
