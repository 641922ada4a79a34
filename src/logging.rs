use std::{
    fmt::Write as _,
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Mutex, OnceLock},
};

use chrono::Local;
use thiserror::Error;
use tracing::{Dispatch, Event, Subscriber};
use tracing_subscriber::{
    fmt::{self, format, FmtContext, FormatEvent, FormatFields, MakeWriter},
    layer::SubscriberExt,
    registry::LookupSpan,
    EnvFilter,
};

use crate::{
    LOG_APP_DIR_NAME, LOG_BACKUP_COUNT, LOG_FILE_PREFIX, LOG_FILTER_ENV, LOG_MAX_BYTES,
};

const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static PROCESS_LOGGING: OnceLock<LoggingContext> = OnceLock::new();

#[derive(Debug, Error)]
pub(crate) enum LoggingError {
    #[error("no application data directory is available for log files")]
    MissingDataDir,

    #[error("failed to prepare log file {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct LogSettings {
    pub(crate) log_file: PathBuf,
    pub(crate) max_bytes: u64,
    pub(crate) backup_count: usize,
}

impl LogSettings {
    pub(crate) fn for_data_dir(data_dir: &Path) -> Self {
        let file_name = format!(
            "{LOG_FILE_PREFIX}_{}.log",
            Local::now().format("%Y%m%d")
        );
        Self {
            log_file: data_dir.join(LOG_APP_DIR_NAME).join("logs").join(file_name),
            max_bytes: LOG_MAX_BYTES,
            backup_count: LOG_BACKUP_COUNT,
        }
    }
}

/// Handle to the process log sinks.
///
/// Components receive a clone instead of reaching for a global logger.
#[derive(Clone)]
pub(crate) struct LoggingContext {
    dispatch: Dispatch,
    log_file: Option<PathBuf>,
}

impl std::fmt::Debug for LoggingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingContext")
            .field("log_file", &self.log_file)
            .finish_non_exhaustive()
    }
}

impl LoggingContext {
    /// Builds console and rotating file sinks from explicit settings.
    pub(crate) fn with_settings(settings: &LogSettings) -> Result<Self, LoggingError> {
        let rotating_file =
            RotatingFile::open(&settings.log_file, settings.max_bytes, settings.backup_count)
                .map_err(|source| LoggingError::LogFile {
                    path: settings.log_file.clone(),
                    source,
                })?;

        let subscriber = tracing_subscriber::registry()
            .with(env_filter())
            .with(console_layer())
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .event_format(LogLineFormat { timestamped: true })
                    .with_writer(Mutex::new(rotating_file)),
            );

        Ok(Self {
            dispatch: Dispatch::new(subscriber),
            log_file: Some(settings.log_file.clone()),
        })
    }

    pub(crate) fn console_only() -> Self {
        let subscriber = tracing_subscriber::registry()
            .with(env_filter())
            .with(console_layer());
        Self {
            dispatch: Dispatch::new(subscriber),
            log_file: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn disabled() -> Self {
        Self {
            dispatch: Dispatch::none(),
            log_file: None,
        }
    }

    pub(crate) fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    pub(crate) fn info(&self, message: &str) {
        tracing::dispatcher::with_default(&self.dispatch, || tracing::info!("{message}"));
    }

    pub(crate) fn warn(&self, message: &str) {
        tracing::dispatcher::with_default(&self.dispatch, || tracing::warn!("{message}"));
    }

    pub(crate) fn error(&self, message: &str) {
        tracing::dispatcher::with_default(&self.dispatch, || tracing::error!("{message}"));
    }
}

/// Initializes process logging once; later calls return the same context.
pub(crate) fn init_process_logging() -> LoggingContext {
    init_once(&PROCESS_LOGGING, || {
        let context = process_context(dirs::data_dir().as_deref());
        if tracing::dispatcher::set_global_default(context.dispatch.clone()).is_err() {
            context.warn("a global tracing subscriber was already installed");
        }

        context.info("Logging initialized");
        if let Some(path) = context.log_file() {
            context.info(&format!("Log file: {}", path.display()));
        }
        context
    })
}

/// Sinks are built inside the cell's initializer so racing callers share one.
fn init_once(
    cell: &OnceLock<LoggingContext>,
    build: impl FnOnce() -> LoggingContext,
) -> LoggingContext {
    cell.get_or_init(build).clone()
}

/// File and console logging under `data_dir`, or console only when that fails.
fn process_context(data_dir: Option<&Path>) -> LoggingContext {
    match data_dir {
        Some(data_dir) => LoggingContext::with_settings(&LogSettings::for_data_dir(data_dir)),
        None => Err(LoggingError::MissingDataDir),
    }
    .unwrap_or_else(|error| {
        let fallback = LoggingContext::console_only();
        fallback.warn(&format!("file logging disabled: {error}"));
        fallback
    })
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn console_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    console_layer_with(io::stderr)
}

fn console_layer_with<S, W>(make_writer: W) -> impl tracing_subscriber::Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    fmt::layer()
        .with_writer(make_writer)
        .event_format(LogLineFormat { timestamped: false })
}

/// `2026-01-01 12:00:00 [INFO] message` for files, bare message for the console.
struct LogLineFormat {
    timestamped: bool,
}

impl<S, N> FormatEvent<S, N> for LogLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        if self.timestamped {
            write!(
                writer,
                "{} [{}] ",
                Local::now().format(LOG_TIMESTAMP_FORMAT),
                event.metadata().level()
            )?;
        }
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Append-only log file rolled over by size into `<name>.1` .. `<name>.N`.
pub(crate) struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backup_count: usize,
    file: Option<File>,
    written: u64,
}

impl RotatingFile {
    pub(crate) fn open(path: &Path, max_bytes: u64, backup_count: usize) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = open_append(path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path: path.to_path_buf(),
            max_bytes,
            backup_count,
            file: Some(file),
            written,
        })
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    fn should_rotate(&self, incoming: usize) -> bool {
        self.max_bytes > 0 && self.written > 0 && self.written + incoming as u64 >= self.max_bytes
    }

    fn rotate(&mut self) -> io::Result<()> {
        // Windows refuses to rename an open file.
        self.file = None;

        if self.backup_count > 0 {
            for index in (1..self.backup_count).rev() {
                let source = self.backup_path(index);
                if source.exists() {
                    let target = self.backup_path(index + 1);
                    remove_if_exists(&target)?;
                    fs::rename(&source, &target)?;
                }
            }
            let first_backup = self.backup_path(1);
            remove_if_exists(&first_backup)?;
            if self.path.exists() {
                fs::rename(&self.path, &first_backup)?;
            }
            self.file = Some(open_append(&self.path)?);
        } else {
            self.file = Some(
                OpenOptions::new()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(&self.path)?,
            );
        }

        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.should_rotate(buf.len()) || self.file.is_none() {
            self.rotate()?;
        }
        let Some(file) = self.file.as_mut() else {
            return Err(io::Error::other("log file is not open"));
        };
        let written = file.write(buf)?;
        self.written += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(error),
    }
}
