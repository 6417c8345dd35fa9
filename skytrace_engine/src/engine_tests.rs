//! Unit tests for engine.rs (global logger slot)

use crate::log::{Logger, LogEntry, LogSeverity};
use crate::skytrace::Engine;
use serial_test::serial;
use std::sync::{Arc, Mutex};

const SOURCE: &str = "skytrace::engine_test";

/// Keeps only entries from this module; other tests may log concurrently
#[derive(Clone, Default)]
struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CaptureLogger {
    fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        if entry.source == SOURCE {
            self.entries.lock().unwrap().push(entry.clone());
        }
    }
}

#[test]
#[serial]
fn test_log_has_no_location() {
    let capture = CaptureLogger::default();
    Engine::set_logger(capture.clone());

    Engine::log(LogSeverity::Info, SOURCE, "plain".to_string());
    Engine::reset_logger();

    let entries = capture.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Info);
    assert_eq!(entries[0].message, "plain");
    assert!(entries[0].file.is_none());
    assert!(entries[0].line.is_none());
}

#[test]
#[serial]
fn test_log_detailed_keeps_location() {
    let capture = CaptureLogger::default();
    Engine::set_logger(capture.clone());

    Engine::log_detailed(LogSeverity::Error, SOURCE, "broken".to_string(), "engine.rs", 42);
    Engine::reset_logger();

    let entries = capture.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].file, Some("engine.rs"));
    assert_eq!(entries[0].line, Some(42));
}

#[test]
#[serial]
fn test_reset_logger_detaches_custom_logger() {
    let capture = CaptureLogger::default();
    Engine::set_logger(capture.clone());
    Engine::reset_logger();

    Engine::log(LogSeverity::Debug, SOURCE, "after reset".to_string());

    assert!(capture.entries().is_empty());
}
