//! Unit tests for log.rs
//!
//! Tests touching the global logger slot run with #[serial].

use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use crate::skytrace::{Engine, Error, Result};
use serial_test::serial;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

// ============================================================================
// TEST HELPERS
// ============================================================================

/// Test logger that captures log entries for verification
#[derive(Clone)]
struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CaptureLogger {
    fn new() -> Self {
        Self { entries: Arc::new(Mutex::new(Vec::new())) }
    }

    fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn entry(severity: LogSeverity, file: Option<&'static str>, line: Option<u32>) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "skytrace::test".to_string(),
        message: "hello".to_string(),
        file,
        line,
    }
}

// ============================================================================
// SEVERITY AND FORMAT
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_labels_are_fixed_width() {
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        assert_eq!(severity.label().len(), 5);
    }
}

#[test]
fn test_format_plain_without_location() {
    let line = DefaultLogger::format_plain(&entry(LogSeverity::Info, None, None));
    assert!(line.contains("[INFO ]"));
    assert!(line.contains("[skytrace::test] hello"));
    assert!(!line.ends_with(')'));
}

#[test]
fn test_format_plain_with_location() {
    let line = DefaultLogger::format_plain(&entry(LogSeverity::Error, Some("frame.rs"), Some(42)));
    assert!(line.contains("[ERROR]"));
    assert!(line.ends_with("hello (frame.rs:42)"));
}

// ============================================================================
// ENGINE LOGGER ROUTING
// ============================================================================

#[test]
#[serial]
fn test_macros_route_through_custom_logger() {
    let capture = CaptureLogger::new();
    Engine::set_logger(capture.clone());

    crate::engine_info!("skytrace::test", "value = {}", 7);
    crate::engine_error!("skytrace::test", "broken {}", "thing");

    let entries = capture.entries();
    Engine::reset_logger();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].severity, LogSeverity::Info);
    assert_eq!(entries[0].message, "value = 7");
    assert!(entries[0].file.is_none());
    assert_eq!(entries[1].severity, LogSeverity::Error);
    assert_eq!(entries[1].message, "broken thing");
    assert!(entries[1].file.is_some());
    assert!(entries[1].line.is_some());
}

#[test]
#[serial]
fn test_engine_err_logs_and_builds_variant() {
    let capture = CaptureLogger::new();
    Engine::set_logger(capture.clone());

    let err = crate::engine_err!("skytrace::test", ResourceFailed, "no memory type for {:#x}", 0x6);

    let entries = capture.entries();
    Engine::reset_logger();

    match err {
        Error::ResourceFailed(msg) => assert_eq!(msg, "no memory type for 0x6"),
        other => panic!("unexpected variant: {:?}", other),
    }
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].source, "skytrace::test");
}

#[test]
#[serial]
fn test_engine_bail_returns_early() {
    let capture = CaptureLogger::new();
    Engine::set_logger(capture.clone());

    fn fails(flag: bool) -> Result<u32> {
        if flag {
            crate::engine_bail!("skytrace::test", FrameFailed, "bail {}", 1);
        }
        Ok(5)
    }

    let failed = fails(true);
    let passed = fails(false);
    let entries = capture.entries();
    Engine::reset_logger();

    assert!(matches!(failed, Err(Error::FrameFailed(_))));
    assert_eq!(passed.unwrap(), 5);
    assert_eq!(entries.len(), 1);
}
