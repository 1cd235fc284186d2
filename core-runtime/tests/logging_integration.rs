//! Integration tests for logging system

use bridge_traits::logging::{LogPriority, LogRecord, LoggerSink};
use core_runtime::logging::{
    init_logging, redact_if_sensitive, strip_path, LogFormat, LoggingConfig,
};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingSink {
    records: Mutex<Vec<LogRecord>>,
}

impl LoggerSink for RecordingSink {
    fn log(&self, record: LogRecord) {
        self.records.lock().unwrap().push(record);
    }
}

#[test]
fn test_logging_config_builder() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogPriority::Debug)
        .with_pii_redaction(true)
        .with_spans(true);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogPriority::Debug);
    assert!(config.redact_pii);
    assert!(config.enable_spans);
    assert_eq!(
        config.sink_excluded_targets,
        vec!["core_logtree".to_string(), "bridge_desktop".to_string()]
    );
}

// The global subscriber can only be installed once per process, so every
// assertion that depends on it lives in this one test.
#[test]
fn test_init_logging_mirrors_events_into_sink() {
    let sink = Arc::new(RecordingSink::default());
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogPriority::Debug)
        .with_logger_sink(sink.clone());

    init_logging(config).unwrap();

    tracing::info!(target: "core_service", tag = "Relay", "relay started");
    tracing::info!(target: "core_logtree::flush", "flushed buffer");
    tracing::warn!(target: "core_service", password = "hunter2", "settings applied");
    tracing::trace!(target: "core_service", "below level");

    {
        let records = sink.records.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "relay started");
        assert_eq!(records[0].tag.as_deref(), Some("Relay"));
        assert_eq!(records[1].priority, LogPriority::Warn);
        assert_eq!(
            records[1].fields.get("password"),
            Some(&"[REDACTED]".to_string())
        );
    }

    let second = init_logging(LoggingConfig::default());
    assert!(second.is_err());
}

#[test]
fn test_invalid_filter_is_rejected() {
    let config = LoggingConfig::default().with_filter("core_logtree=loud");
    assert!(init_logging(config).is_err());
}

#[test]
fn test_pii_redaction_tokens() {
    assert_eq!(redact_if_sensitive("access_token", "abc"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("refresh_token", "abc"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("password", "my_password"), "[REDACTED]");
}

#[test]
fn test_pii_redaction_emails() {
    let redacted = redact_if_sensitive("email", "user@example.com");
    assert!(redacted.starts_with('u'));
    assert!(redacted.contains("[REDACTED]"));
    assert!(!redacted.contains("example.com"));
}

#[test]
fn test_pii_redaction_normal_values() {
    assert_eq!(redact_if_sensitive("size", "12345"), "12345");
    assert_eq!(redact_if_sensitive("status", "RUNNING"), "RUNNING");
}

#[test]
fn test_path_stripping() {
    assert_eq!(strip_path("/storage/emulated/0/DCIM/IMG_1.jpg"), "IMG_1.jpg");
    assert_eq!(strip_path("C:\\Users\\John\\Pictures\\a.png"), "a.png");
    assert_eq!(strip_path("filename.txt"), "filename.txt");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_format_selection() {
    #[cfg(debug_assertions)]
    assert_eq!(LogFormat::default(), LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(LogFormat::default(), LogFormat::Compact);
}
