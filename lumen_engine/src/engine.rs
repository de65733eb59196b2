/// Lumen Engine - process-wide logging hub
///
/// Graphics state is never global: contexts, linkers and frame coordinators are
/// constructed explicitly and passed around. The only process-wide state kept
/// here is the logger and its severity threshold.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{OnceLock, RwLock};

use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};

type SharedLogger = RwLock<Box<dyn Logger>>;

/// Installed on first use
static SINK: OnceLock<SharedLogger> = OnceLock::new();

/// `LogSeverity` discriminant of the threshold
static THRESHOLD: AtomicU8 = AtomicU8::new(LogSeverity::Trace as u8);

fn sink() -> &'static SharedLogger {
    SINK.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

fn install(logger: Box<dyn Logger>) {
    if let Ok(mut slot) = sink().write() {
        *slot = logger;
    }
}

/// Logging facade behind the `engine_*!` macros
///
/// ```no_run
/// use lumen_engine::lumen::{Engine, log::{Logger, LogEntry, LogSeverity}};
///
/// struct BuildLog(std::sync::Mutex<Vec<String>>);
///
/// impl Logger for BuildLog {
///     fn log(&self, entry: &LogEntry) {
///         self.0.lock().unwrap().push(entry.message.clone());
///     }
/// }
///
/// Engine::set_logger(BuildLog(Default::default()));
/// Engine::set_min_severity(LogSeverity::Info);
/// ```
pub struct Engine;

impl Engine {
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        install(Box::new(logger));
    }

    /// Back to `DefaultLogger`, threshold back to Trace
    pub fn reset_logger() {
        install(Box::new(DefaultLogger));
        THRESHOLD.store(LogSeverity::Trace as u8, Ordering::Relaxed);
    }

    /// Drop every entry below `severity`
    pub fn set_min_severity(severity: LogSeverity) {
        THRESHOLD.store(severity as u8, Ordering::Relaxed);
    }

    pub fn min_severity() -> LogSeverity {
        match THRESHOLD.load(Ordering::Relaxed) {
            0 => LogSeverity::Trace,
            1 => LogSeverity::Debug,
            2 => LogSeverity::Info,
            3 => LogSeverity::Warn,
            _ => LogSeverity::Error,
        }
    }

    /// Entry point of the leveled macros; `source` is `lumen::<Component>`
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        Self::dispatch(severity, source, message, None, None);
    }

    /// Same as `log`, with the emitting location (used by `engine_error!`)
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        Self::dispatch(severity, source, message, Some(file), Some(line));
    }

    fn dispatch(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: Option<&'static str>,
        line: Option<u32>,
    ) {
        if severity < Self::min_severity() {
            return;
        }
        let mut entry = LogEntry::new(severity, source, message);
        if let (Some(file), Some(line)) = (file, line) {
            entry = entry.at(file, line);
        }
        if let Ok(logger) = sink().read() {
            logger.log(&entry);
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
