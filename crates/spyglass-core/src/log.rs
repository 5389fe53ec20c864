//! Diagnostic channel: an append-only log file that rolls over by size.
//!
//! Lines go to `~/.config/spyglass/logs/spyglass.log`; once the file
//! passes `max_file_mb` it is renamed to `spyglass.log.1`, replacing any
//! older backup. Until [`init`] succeeds the macros do nothing.
//!
//! A write failure after startup is reported once on stderr and ends
//! logging for the rest of the run.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::SpyResult;

static SINK: OnceLock<Mutex<LogFile>> = OnceLock::new();

const LOG_FILE_NAME: &str = "spyglass.log";
const BYTES_PER_MB: u64 = 1024 * 1024;

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Whether file logging is enabled. Defaults to `false`.
    pub enabled: bool,
    /// Minimum log level: "debug", "info", "warn", or "error".
    pub level: String,
    /// Size in megabytes at which the file rolls over.
    pub max_file_mb: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".into(),
            max_file_mb: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!("unknown log level {s:?}")),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        })
    }
}

/// Opens the log file named by `config`. Call once at startup.
///
/// Disabled logging is not an error. Everything else that keeps the file
/// from opening is, and the macros stay silent in that case.
pub fn init(config: &LogConfig) -> SpyResult<()> {
    if !config.enabled {
        return Ok(());
    }
    let level: Level = config.level.parse()?;
    let dir = crate::config::config_dir()
        .ok_or("could not determine home directory")?
        .join("logs");
    let file = LogFile::open(&dir, level, config.max_file_mb.saturating_mul(BYTES_PER_MB))
        .map_err(|e| format!("{}: {e}", dir.display()))?;
    SINK.set(Mutex::new(file)).map_err(|_| "logging was already started")?;
    Ok(())
}

/// Appends one line if `level` passes the configured minimum.
pub fn write(level: Level, args: fmt::Arguments<'_>) {
    let Some(sink) = SINK.get() else {
        return;
    };
    let Ok(mut log) = sink.lock() else {
        return;
    };
    if log.stopped || level < log.min_level {
        return;
    }
    let line = format!("{} {level:<5} {args}\n", timestamp());
    if let Err(e) = log.append(&line) {
        log.stopped = true;
        eprintln!("Warning: logging stopped, {}: {e}", log.path.display());
    }
}

struct LogFile {
    path: PathBuf,
    file: File,
    min_level: Level,
    /// Roll over at this many bytes; zero never rolls.
    limit: u64,
    size: u64,
    stopped: bool,
}

impl LogFile {
    fn open(dir: &Path, min_level: Level, limit: u64) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(LOG_FILE_NAME);
        let file = open_append(&path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            path,
            file,
            min_level,
            limit,
            size,
            stopped: false,
        })
    }

    fn append(&mut self, line: &str) -> io::Result<()> {
        self.file.write_all(line.as_bytes())?;
        self.size += line.len() as u64;
        if self.limit > 0 && self.size >= self.limit {
            self.roll_over()?;
        }
        Ok(())
    }

    fn roll_over(&mut self) -> io::Result<()> {
        let mut backup = self.path.clone().into_os_string();
        backup.push(".1");
        fs::rename(&self.path, backup)?;
        self.file = open_append(&self.path)?;
        self.size = 0;
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// UTC time of day with milliseconds, `HH:MM:SS.mmm`.
fn timestamp() -> String {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let secs = since_epoch.as_secs() % 86_400;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        secs / 3600,
        secs / 60 % 60,
        secs % 60,
        since_epoch.subsec_millis()
    )
}

/// Logs at DEBUG level.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::log::write($crate::log::Level::Debug, format_args!($($arg)*)) };
}

/// Logs at INFO level.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::log::write($crate::log::Level::Info, format_args!($($arg)*)) };
}

/// Logs at WARN level.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::log::write($crate::log::Level::Warn, format_args!($($arg)*)) };
}

/// Logs at ERROR level.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::log::write($crate::log::Level::Error, format_args!($($arg)*)) };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("spyglass-log-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn levels_parse_case_insensitively() {
        assert_eq!("DEBUG".parse::<Level>(), Ok(Level::Debug));
        assert_eq!("warning".parse::<Level>(), Ok(Level::Warn));
        assert_eq!("error".parse::<Level>(), Ok(Level::Error));
        assert!("verbose".parse::<Level>().is_err());
    }

    #[test]
    fn disabled_logging_starts_without_touching_disk() {
        let config = LogConfig::default();

        assert!(init(&config).is_ok());
    }

    #[test]
    fn unknown_level_fails_to_start() {
        // Arrange
        let config = LogConfig {
            enabled: true,
            level: "verbose".into(),
            ..LogConfig::default()
        };

        // Act
        let result = init(&config);

        // Assert
        let message = result.unwrap_err().to_string();
        assert!(message.contains("verbose"), "{message}");
    }

    #[test]
    fn open_reports_a_directory_that_cannot_be_created() {
        // Arrange: a plain file where the log directory should go.
        let dir = scratch_dir("blocked");
        fs::create_dir_all(&dir).unwrap();
        let blocker = dir.join("logs");
        fs::write(&blocker, b"").unwrap();

        // Act
        let result = LogFile::open(&blocker, Level::Info, 0);

        // Assert
        assert!(result.is_err());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn append_rolls_over_at_the_limit() {
        // Arrange
        let dir = scratch_dir("roll");
        let mut log = LogFile::open(&dir, Level::Info, 16).unwrap();

        // Act
        log.append("first line, long\n").unwrap();
        log.append("second\n").unwrap();

        // Assert
        let backup = fs::read_to_string(dir.join("spyglass.log.1")).unwrap();
        let current = fs::read_to_string(dir.join(LOG_FILE_NAME)).unwrap();
        assert_eq!(backup, "first line, long\n");
        assert_eq!(current, "second\n");
        assert_eq!(log.size, 7);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn reopening_continues_the_size_count() {
        let dir = scratch_dir("reopen");
        LogFile::open(&dir, Level::Info, 0)
            .unwrap()
            .append("kept\n")
            .unwrap();

        let log = LogFile::open(&dir, Level::Info, 0).unwrap();

        assert_eq!(log.size, 5);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn level_pads_to_column_width() {
        assert_eq!(format!("[{:<5}]", Level::Warn), "[WARN ]");
    }

    #[test]
    fn timestamp_is_clock_formatted() {
        let ts = timestamp();

        assert_eq!(ts.len(), 12);
        assert_eq!(&ts[2..3], ":");
        assert_eq!(&ts[5..6], ":");
        assert_eq!(&ts[8..9], ".");
    }
}
