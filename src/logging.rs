//! Logging set-up.
//!
//! Everything in the crate logs through the `log` facade. [`init_logging`]
//! installs an `env_logger` backend once, formatting every record as
//!
//! ```text
//! <timestamp> [<LEVEL>]: <file>:<line> <message>
//! ```
//!
//! and writing it to stderr and, when configured, appending it to a log file.

use std::{
    fmt::Display,
    fs::{File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Arc, Once},
};

use log::{Level, Record};
use parking_lot::Mutex;
use serde::Deserialize;

use crate::errors::Result;

/// Logger configuration (`[logging]` table of the config file).
///
/// `filter` follows the `env_logger` filter syntax (e.g. "info",
/// "flow_cube=debug,wgpu=warn"). When unset `RUST_LOG` is used, then `info`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: Option<String>,
    /// Append-only log file. `None` disables file logging.
    pub file: Option<PathBuf>,
    /// Echo records to stderr as well.
    pub echo: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            file: Some(PathBuf::from("flow-cube.log")),
            echo: true,
        }
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once.
///
/// Subsequent calls are ignored and return `Ok(())`.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let mut result = Ok(());
    INIT.call_once(|| result = install(config));
    result
}

fn install(config: &LoggingConfig) -> Result<()> {
    let sink = LogSink::open(config.file.as_deref(), config.echo)?;

    let mut builder = env_logger::Builder::new();
    if let Some(filter) = &config.filter {
        builder.parse_filters(filter);
    } else if let Ok(filter) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    } else {
        builder.filter_level(log::LevelFilter::Info);
    }

    builder
        .format(|buf, record| {
            let timestamp = buf.timestamp_seconds();
            write_record(buf, timestamp, record)
        })
        .write_style(env_logger::WriteStyle::Never)
        .target(env_logger::Target::Pipe(Box::new(sink)))
        .try_init()?;

    log::debug!("logging initialized");
    Ok(())
}

/// Level names as they appear between the brackets.
pub fn level_name(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARNING",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

/// Writes one formatted log line (including the trailing newline).
pub fn write_record<W: Write + ?Sized>(
    out: &mut W,
    timestamp: impl Display,
    record: &Record,
) -> io::Result<()> {
    writeln!(
        out,
        "{} [{}]: {}:{} {}",
        timestamp,
        level_name(record.level()),
        record.file().unwrap_or("<unknown>"),
        record.line().unwrap_or(0),
        record.args()
    )
}

/// Destination of formatted log lines.
///
/// Clones share the same file handle; every write goes through one mutex so
/// lines from different callers never interleave.
#[derive(Clone, Debug)]
pub struct LogSink {
    file: Option<Arc<Mutex<File>>>,
    echo: bool,
}

impl LogSink {
    /// Opens (or creates) `path` in append mode.
    pub fn open(path: Option<&Path>, echo: bool) -> io::Result<Self> {
        let file = match path {
            Some(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Some(Arc::new(Mutex::new(file)))
            }
            None => None,
        };
        Ok(Self { file, echo })
    }
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.echo {
            io::stderr().write_all(buf)?;
        }
        if let Some(file) = &self.file {
            file.lock().write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(file) = &self.file {
            file.lock().flush()?;
        }
        Ok(())
    }
}
