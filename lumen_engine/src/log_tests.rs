//! Unit tests for log.rs

use std::sync::Mutex;
use std::time::{Duration, UNIX_EPOCH};

use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};

const ALL: [LogSeverity; 5] = [
    LogSeverity::Trace,
    LogSeverity::Debug,
    LogSeverity::Info,
    LogSeverity::Warn,
    LogSeverity::Error,
];

#[test]
fn test_severities_are_ordered_by_verbosity() {
    for pair in ALL.windows(2) {
        assert!(pair[0] < pair[1], "{:?} should sort before {:?}", pair[0], pair[1]);
    }
    assert_eq!(ALL.iter().max(), Some(&LogSeverity::Error));
}

#[test]
fn test_labels_line_up() {
    let labels: Vec<&str> = ALL.iter().map(LogSeverity::label).collect();
    assert_eq!(labels, vec!["TRACE", "DEBUG", "INFO ", "WARN ", "ERROR"]);
}

#[test]
fn test_new_entry_has_no_location() {
    let entry = LogEntry::new(LogSeverity::Debug, "lumen::Reflector", "2 resources".to_string());

    assert_eq!(entry.source, "lumen::Reflector");
    assert_eq!(entry.message, "2 resources");
    assert_eq!(entry.location(), None);
}

#[test]
fn test_at_sets_file_and_line() {
    let entry = LogEntry::new(LogSeverity::Error, "lumen::ProgramLinker", "link failed".to_string())
        .at("src/shader/linker.rs", 88);

    assert_eq!(entry.file, Some("src/shader/linker.rs"));
    assert_eq!(entry.line, Some(88));
    assert_eq!(entry.location().as_deref(), Some("src/shader/linker.rs:88"));
}

#[test]
fn test_location_needs_both_parts() {
    let mut entry = LogEntry::new(LogSeverity::Error, "lumen::Test", String::new());
    entry.file = Some("half.rs");
    assert_eq!(entry.location(), None);
}

#[test]
fn test_format_plain_layout() {
    let mut entry = LogEntry::new(LogSeverity::Warn, "lumen::ShaderCache", "write failed".to_string());
    entry.timestamp = UNIX_EPOCH + Duration::from_millis(1_250);

    let line = DefaultLogger::format_plain(&entry);

    // Time of day depends on the local zone; only the millis are fixed
    assert!(line.starts_with('['));
    assert!(line.contains(".250] "), "{}", line);
    assert!(line.ends_with("[WARN ] [lumen::ShaderCache] write failed"), "{}", line);
}

#[test]
fn test_format_plain_appends_location() {
    let entry = LogEntry::new(LogSeverity::Error, "lumen::Splitter", "bad marker".to_string())
        .at("splitter.rs", 12);

    assert!(DefaultLogger::format_plain(&entry).ends_with("bad marker (splitter.rs:12)"));
}

#[test]
fn test_default_logger_accepts_every_severity() {
    for severity in ALL {
        DefaultLogger.log(&LogEntry::new(severity, "lumen::log_test", "plain".to_string()));
        DefaultLogger.log(&LogEntry::new(severity, "lumen::log_test", "located".to_string()).at("log.rs", 1));
    }
}

struct Recorder(Mutex<Vec<LogSeverity>>);

impl Logger for Recorder {
    fn log(&self, entry: &LogEntry) {
        self.0.lock().unwrap().push(entry.severity);
    }
}

#[test]
fn test_logger_usable_as_trait_object() {
    let recorder = Recorder(Mutex::new(Vec::new()));
    {
        let sink: &dyn Logger = &recorder;
        sink.log(&LogEntry::new(LogSeverity::Info, "a", String::new()));
        sink.log(&LogEntry::new(LogSeverity::Error, "b", String::new()));
    }
    assert_eq!(*recorder.0.lock().unwrap(), vec![LogSeverity::Info, LogSeverity::Error]);

    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DefaultLogger>();
    assert_send_sync::<Box<dyn Logger>>();
}
