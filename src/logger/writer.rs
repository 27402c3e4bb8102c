//! Log writer module
//!
//! Process-wide log sinks. Info and debug lines go to the access sink,
//! warnings and errors to the error sink; each sink is stdout/stderr or an
//! append-only file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use chrono::{Local, SecondsFormat};

use crate::config::{LogLevel, LoggingConfig};

static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Level applied before `init()` has run (tests, early startup)
const FALLBACK_LEVEL: LogLevel = LogLevel::Info;

enum Sink {
    Stdout,
    Stderr,
    File(Mutex<File>),
}

impl Sink {
    fn open(path: Option<&str>, console: Self) -> io::Result<Self> {
        match path {
            Some(p) => Ok(Self::File(Mutex::new(open_log_file(p)?))),
            None => Ok(console),
        }
    }

    fn write_line(&self, line: &str) {
        match self {
            Self::Stdout => println!("{line}"),
            Self::Stderr => eprintln!("{line}"),
            Self::File(file) => {
                if let Ok(mut f) = file.lock() {
                    let _ = writeln!(f, "{line}");
                }
            }
        }
    }
}

pub struct LogWriter {
    level: LogLevel,
    access: Sink,
    error: Sink,
}

impl LogWriter {
    fn new(config: &LoggingConfig) -> io::Result<Self> {
        Ok(Self {
            level: config.level,
            access: Sink::open(config.access_log_file.as_deref(), Sink::Stdout)?,
            error: Sink::open(config.error_log_file.as_deref(), Sink::Stderr)?,
        })
    }

    fn sink_for(&self, level: LogLevel) -> &Sink {
        if level <= LogLevel::Warn {
            &self.error
        } else {
            &self.access
        }
    }
}

/// Open or create a log file for appending, creating parent directories
fn open_log_file(path: &str) -> io::Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Prefix a message with local time and level
pub fn format_line(level: LogLevel, message: &str) -> String {
    format!(
        "{} [{level}] {message}",
        Local::now().to_rfc3339_opts(SecondsFormat::Millis, false)
    )
}

/// Initialize the global log writer
///
/// Returns error if log files cannot be opened or if called twice.
pub fn init(config: &LoggingConfig) -> io::Result<()> {
    let writer = LogWriter::new(config)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })
}

pub fn enabled(level: LogLevel) -> bool {
    let max = LOG_WRITER.get().map_or(FALLBACK_LEVEL, |w| w.level);
    level <= max
}

/// Write a leveled line, dropping it when below the configured level
pub fn write(level: LogLevel, message: &str) {
    if !enabled(level) {
        return;
    }
    let line = format_line(level, message);
    match LOG_WRITER.get() {
        Some(writer) => writer.sink_for(level).write_line(&line),
        None if level <= LogLevel::Warn => eprintln!("{line}"),
        None => println!("{line}"),
    }
}

/// Write an access log line verbatim (no level prefix)
pub fn write_access(line: &str) {
    match LOG_WRITER.get() {
        Some(writer) => writer.access.write_line(line),
        None => println!("{line}"),
    }
}
