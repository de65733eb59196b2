//! Engine logging
//!
//! Components never print directly: they emit `LogEntry` values through the
//! `engine_*!` macros, which forward to the logger installed on `Engine`.
//! Every entry names its component (`"lumen::ShaderCache"`, ...). Error
//! entries also carry the file and line that produced them.

use std::time::SystemTime;

use chrono::{DateTime, Local};
use colored::{ColoredString, Colorize};

/// Destination of engine log entries
///
/// ```no_run
/// use lumen_engine::lumen::log::{Logger, LogEntry};
///
/// struct EditorConsole;
///
/// impl Logger for EditorConsole {
///     fn log(&self, entry: &LogEntry) {
///         // append to the console panel
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    fn log(&self, entry: &LogEntry);
}

/// One log record
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,
    pub timestamp: SystemTime,
    /// Emitting component, `lumen::<Component>`
    pub source: String,
    pub message: String,
    /// Set for error entries only
    pub file: Option<&'static str>,
    /// Set for error entries only
    pub line: Option<u32>,
}

impl LogEntry {
    /// Entry stamped with the current time, without location
    pub fn new(severity: LogSeverity, source: &str, message: String) -> Self {
        Self {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: None,
            line: None,
        }
    }

    /// Attach the emitting file and line
    pub fn at(mut self, file: &'static str, line: u32) -> Self {
        self.file = Some(file);
        self.line = Some(line);
        self
    }

    /// `file:line` when the entry carries a location
    pub fn location(&self) -> Option<String> {
        match (self.file, self.line) {
            (Some(file), Some(line)) => Some(format!("{}:{}", file, line)),
            _ => None,
        }
    }
}

/// Severity, ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Cache lookups, context object lifecycles
    Trace,
    /// Reflection listings, timings
    Debug,
    Info,
    /// Recoverable problems (cache write failures, unresolved uniforms)
    Warn,
    Error,
}

impl LogSeverity {
    /// Five-character label used by the default logger
    pub fn label(&self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }

    fn colored_label(&self) -> ColoredString {
        let label = self.label();
        match self {
            LogSeverity::Trace => label.dimmed(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        }
    }
}

/// Console logger: `[time] [LEVEL] [source] message (file:line)`
///
/// Warnings and errors go to stderr, everything else to stdout.
pub struct DefaultLogger;

impl DefaultLogger {
    /// Uncolored rendering of an entry
    pub fn format_plain(entry: &LogEntry) -> String {
        let mut line = format!(
            "[{}] [{}] [{}] {}",
            Self::timestamp(entry),
            entry.severity.label(),
            entry.source,
            entry.message
        );
        if let Some(location) = entry.location() {
            line.push_str(&format!(" ({})", location));
        }
        line
    }

    fn timestamp(entry: &LogEntry) -> String {
        let local: DateTime<Local> = entry.timestamp.into();
        local.format("%H:%M:%S%.3f").to_string()
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let location = entry
            .location()
            .map(|location| format!(" ({})", location).dimmed().to_string())
            .unwrap_or_default();
        let line = format!(
            "[{}] [{}] [{}] {}{}",
            Self::timestamp(entry),
            entry.severity.colored_label(),
            entry.source.bright_blue(),
            entry.message,
            location
        );
        if entry.severity >= LogSeverity::Warn {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

// ===== LOGGING MACROS =====

/// Shared expansion of the leveled macros
#[doc(hidden)]
#[macro_export]
macro_rules! engine_log {
    ($severity:ident, $source:expr, $($arg:tt)*) => {
        $crate::lumen::Engine::log(
            $crate::lumen::log::LogSeverity::$severity,
            $source,
            format!($($arg)*),
        )
    };
}

/// `engine_trace!("lumen::ShaderCache", "Cache hit '{}'", path.display())`
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => { $crate::engine_log!(Trace, $source, $($arg)*) };
}

#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => { $crate::engine_log!(Debug, $source, $($arg)*) };
}

#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => { $crate::engine_log!(Info, $source, $($arg)*) };
}

#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => { $crate::engine_log!(Warn, $source, $($arg)*) };
}

/// Error entry, stamped with the calling file and line
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::lumen::Engine::log_detailed(
            $crate::lumen::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!(),
        )
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
