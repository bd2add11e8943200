use std::{
    fs, io,
    path::{Path, PathBuf},
};

use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    filter::LevelFilter,
    fmt::{self, MakeWriter, time::OffsetTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::{
    logger::{
        config::{LoggerConfig, RotationPolicy},
        error::LoggerError,
        format::LoggerFormat,
        rotate::RotatingFile,
    },
    redact::{RedactingMakeWriter, SensitiveFilter},
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// A fully assembled subscriber that has not been installed yet.
pub struct LoggerHandle {
    subscriber: Box<dyn Subscriber + Send + Sync + 'static>,
    log_file: Option<PathBuf>,
    error_file: Option<PathBuf>,
}

impl LoggerHandle {
    /// Full log (`<name>.log`), if a log directory was configured.
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// Error-only log (`<name>.err`), if a log directory was configured.
    pub fn error_file(&self) -> Option<&Path> {
        self.error_file.as_deref()
    }

    /// The subscriber, for scoped use with `tracing::subscriber::with_default`.
    pub fn into_subscriber(self) -> Box<dyn Subscriber + Send + Sync + 'static> {
        self.subscriber
    }

    /// Installs the subscriber process-wide and returns the full log path.
    pub fn init(self) -> Result<Option<PathBuf>, LoggerError> {
        let log_file = self.log_file;
        init_with(self.subscriber)?;
        Ok(log_file)
    }
}

/// Assembles console, full-log and error-log layers; every sink is redacted.
pub fn logger_build(name: &str, cfg: &LoggerConfig) -> Result<LoggerHandle, LoggerError> {
    logger_build_with_console(name, cfg, io::stdout as fn() -> io::Stdout)
}

/// Same as [`logger_build`], with console output sent to `console` instead of stdout.
pub fn logger_build_with_console<C>(
    name: &str,
    cfg: &LoggerConfig,
    console: C,
) -> Result<LoggerHandle, LoggerError>
where
    C: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    if name.trim().is_empty() {
        return Err(LoggerError::InitializationFailed("logger name is empty".into()));
    }

    let redactor = SensitiveFilter::default();
    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(3);

    if !cfg.disable_console {
        let console = RedactingMakeWriter::new(console, redactor.clone());
        layers.push(
            mk_layer(cfg, console, cfg.use_color)
                .with_filter(mk_filter(&cfg.level)?)
                .boxed(),
        );
    }

    let mut log_file = None;
    let mut error_file = None;
    if let Some(dir) = &cfg.log_dir {
        fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;

        let full = open_rotating(dir.join(format!("{name}.log")), cfg.rotation)?;
        let errors = open_rotating(dir.join(format!("{name}.err")), cfg.rotation)?;
        log_file = Some(full.path().to_path_buf());
        error_file = Some(errors.path().to_path_buf());

        layers.push(
            mk_layer(cfg, RedactingMakeWriter::new(full, redactor.clone()), false)
                .with_filter(mk_filter(&cfg.level)?)
                .boxed(),
        );
        layers.push(
            mk_layer(cfg, RedactingMakeWriter::new(errors, redactor), false)
                .with_filter(LevelFilter::ERROR)
                .boxed(),
        );
    }

    let subscriber = tracing_subscriber::registry().with(layers);
    Ok(LoggerHandle {
        subscriber: Box::new(subscriber),
        log_file,
        error_file,
    })
}

fn mk_layer<W>(cfg: &LoggerConfig, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match cfg.format {
        LoggerFormat::Text => fmt::layer()
            .with_ansi(ansi)
            .with_target(cfg.with_targets)
            .with_timer(mk_timer())
            .with_writer(writer)
            .boxed(),
        LoggerFormat::Json => fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(cfg.with_targets)
            .with_timer(mk_timer())
            .with_writer(writer)
            .boxed(),
    }
}

fn mk_filter(level: &str) -> Result<EnvFilter, LoggerError> {
    EnvFilter::try_new(level).map_err(|_| LoggerError::InvalidLogLevel(level.to_string()))
}

fn mk_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

fn open_rotating(path: PathBuf, policy: RotationPolicy) -> Result<RotatingFile, LoggerError> {
    RotatingFile::open(&path, policy).map_err(|e| io_error(&path, e))
}

fn io_error(path: &Path, source: io::Error) -> LoggerError {
    LoggerError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn as_error(e: impl std::fmt::Display) -> LoggerError {
    let s = e.to_string();
    if s.contains("global default") || s.contains("SetGlobalDefaultError") {
        LoggerError::AlreadyInitialized
    } else {
        LoggerError::InitializationFailed(s)
    }
}

fn init_with<S>(subscriber: S) -> Result<(), LoggerError>
where
    S: Subscriber + Send + Sync + 'static,
{
    subscriber.try_init().map_err(as_error)
}
