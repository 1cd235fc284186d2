//! The log dispatcher.

use crate::chunk::chunks;
use crate::error::{LogTreeError, Result};
use crate::flush::{FlushEngine, FlushOutcome, FlushStats};
use crate::tag::{resolve_tag, CallStack};

use bridge_traits::logging::{LogPriority, LogRecord, LoggerSink, PlatformLog};
use core_runtime::config::{LocalLogSettings, LogTreeConfig};

use std::error::Error as StdError;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::warn;

/// Routes log calls to the platform log and the local log buffer.
///
/// Every line goes out under the facility tag. Short messages are prefixed
/// with a tag resolved from the call context (`"<tag> - <message>"`); long
/// messages are split into chunks that carry no prefix. `Assert` records go
/// to the fatal sink and are never buffered.
///
/// Logging never fails: flush failures and tag resolution problems are
/// reported on the platform log at `Error` under the facility tag.
///
/// ```ignore
/// use core_logtree::{d, LogTree};
///
/// let tree = LogTree::new(config)?;
/// d!(tree, "scan found {} files", count);
/// tree.log(LogPriority::Warn, None, "storage not mounted", None);
/// ```
pub struct LogTree {
    facility_tag: String,
    max_chunk_length: usize,
    call_stack_depth: usize,
    min_priority: LogPriority,
    platform_log: Arc<dyn PlatformLog>,
    engine: FlushEngine,
}

impl LogTree {
    pub fn new(config: LogTreeConfig) -> core_runtime::Result<Self> {
        config.validate()?;

        Ok(Self {
            facility_tag: config.facility_tag,
            max_chunk_length: config.max_chunk_length,
            call_stack_depth: config.call_stack_depth,
            min_priority: config.min_priority,
            platform_log: config.platform_log,
            engine: FlushEngine::new(config.local, config.storage, config.clock),
        })
    }

    pub fn facility_tag(&self) -> &str {
        &self.facility_tag
    }

    /// Log a message from the calling source file.
    ///
    /// The supplied tag is accepted for call-site compatibility and ignored:
    /// lines always go out under the facility tag.
    #[track_caller]
    pub fn log(
        &self,
        priority: LogPriority,
        _tag: Option<&str>,
        message: &str,
        cause: Option<&(dyn StdError + 'static)>,
    ) {
        if priority < self.min_priority {
            return;
        }

        let cause = cause.map(render_cause);
        self.dispatch(priority, &CallStack::caller(), message, cause.as_deref());
    }

    /// Log with an explicit call-context snapshot.
    pub fn log_with_stack(
        &self,
        priority: LogPriority,
        stack: &CallStack,
        message: &str,
        cause: Option<&(dyn StdError + 'static)>,
    ) {
        if priority < self.min_priority {
            return;
        }

        let cause = cause.map(render_cause);
        self.dispatch(priority, stack, message, cause.as_deref());
    }

    /// Log a structured record, e.g. one forwarded from `tracing`.
    ///
    /// Fields are appended to the message as ` key=value` pairs.
    pub fn log_record(&self, record: &LogRecord) {
        if record.priority < self.min_priority {
            return;
        }

        let mut message = record.message.clone();
        for (key, value) in &record.fields {
            let _ = write!(message, " {}={}", key, value);
        }

        let stack = record
            .caller
            .as_deref()
            .map(CallStack::from_module)
            .unwrap_or_default();

        self.dispatch(record.priority, &stack, &message, record.cause.as_deref());
    }

    /// Apply new local logging settings.
    pub fn configure(&self, settings: LocalLogSettings) {
        self.engine.configure(settings);
    }

    /// Write buffered lines now, ignoring the flush policy.
    ///
    /// Failures are also reported on the platform log.
    pub fn flush(&self) -> Result<FlushOutcome> {
        let outcome = self.engine.flush();
        if let Err(err) = &outcome {
            self.report_flush_failure(err);
        }
        outcome
    }

    pub fn settings(&self) -> LocalLogSettings {
        self.engine.settings()
    }

    pub fn stats(&self) -> FlushStats {
        self.engine.stats()
    }

    pub fn buffered_len(&self) -> usize {
        self.engine.buffered_len()
    }

    fn dispatch(&self, priority: LogPriority, stack: &CallStack, message: &str, cause: Option<&str>) {
        let message = compose_message(message, cause);

        if message.chars().count() < self.max_chunk_length {
            if priority.is_fatal() {
                self.platform_log.wtf(&self.facility_tag, &message);
                return;
            }

            let prefix = self.resolve_prefix(stack);
            self.platform_log.println(
                priority,
                &self.facility_tag,
                &format!("{} - {}", prefix, message),
            );
            self.buffer(&message);
            return;
        }

        for chunk in chunks(&message, self.max_chunk_length) {
            if priority.is_fatal() {
                self.platform_log.wtf(&self.facility_tag, chunk.text);
            } else {
                self.platform_log
                    .println(priority, &self.facility_tag, chunk.text);
                self.buffer(chunk.text);
            }
        }
    }

    fn resolve_prefix(&self, stack: &CallStack) -> String {
        let enforce = self.platform_log.enforces_tag_limit();
        match resolve_tag(stack, self.call_stack_depth, enforce) {
            Ok(tag) => tag,
            Err(err) => {
                self.platform_log.println(
                    LogPriority::Error,
                    &self.facility_tag,
                    &format!("can't resolve log tag - e:{}", err),
                );
                self.facility_tag.clone()
            }
        }
    }

    fn buffer(&self, line: &str) {
        if let Err(err) = self.engine.append(line) {
            self.report_flush_failure(&err);
        }
    }

    fn report_flush_failure(&self, err: &LogTreeError) {
        self.platform_log.println(
            LogPriority::Error,
            &self.facility_tag,
            &format!("can't save log locally - e:{}", err),
        );
        warn!(error = %err, "Reported local log failure to platform log");
    }
}

impl LoggerSink for LogTree {
    fn log(&self, record: LogRecord) {
        self.log_record(&record);
    }

    fn flush(&self) {
        let _ = LogTree::flush(self);
    }

    fn min_priority(&self) -> LogPriority {
        self.min_priority
    }
}

impl std::fmt::Debug for LogTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogTree")
            .field("facility_tag", &self.facility_tag)
            .field("max_chunk_length", &self.max_chunk_length)
            .field("call_stack_depth", &self.call_stack_depth)
            .field("min_priority", &self.min_priority)
            .field("engine", &self.engine)
            .finish()
    }
}

/// Render an error with its `source()` chain, one `Caused by:` line each.
pub fn render_cause(err: &(dyn StdError + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let _ = write!(rendered, "\nCaused by: {}", inner);
        source = inner.source();
    }
    rendered
}

fn compose_message(message: &str, cause: Option<&str>) -> String {
    match cause {
        None => message.to_string(),
        Some(cause) if message.is_empty() => cause.to_string(),
        Some(cause) => format!("{}\n{}", message, cause),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::StackFrame;
    use bridge_traits::error::BridgeError;
    use bridge_traits::storage::LogStorage;
    use bridge_traits::time::ManualClock;
    use chrono::{TimeZone, Utc};
    use mockall::mock;
    use std::path::Path;
    use std::sync::Mutex;

    mock! {
        pub PlatformLog {}

        impl PlatformLog for PlatformLog {
            fn println(&self, priority: LogPriority, tag: &str, message: &str);
            fn wtf(&self, tag: &str, message: &str);
            fn enforces_tag_limit(&self) -> bool;
        }
    }

    mock! {
        pub Storage {}

        impl LogStorage for Storage {
            fn create_dir_all(&self, path: &Path) -> bridge_traits::error::Result<()>;
            fn append_file(&self, path: &Path, data: &[u8]) -> bridge_traits::error::Result<()>;
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Line {
        Print(LogPriority, String, String),
        Fatal(String, String),
    }

    #[derive(Default)]
    struct RecordingLog {
        lines: Mutex<Vec<Line>>,
        enforce_tag_limit: bool,
    }

    impl RecordingLog {
        fn lines(&self) -> Vec<Line> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl PlatformLog for RecordingLog {
        fn println(&self, priority: LogPriority, tag: &str, message: &str) {
            self.lines
                .lock()
                .unwrap()
                .push(Line::Print(priority, tag.to_string(), message.to_string()));
        }

        fn wtf(&self, tag: &str, message: &str) {
            self.lines
                .lock()
                .unwrap()
                .push(Line::Fatal(tag.to_string(), message.to_string()));
        }

        fn enforces_tag_limit(&self) -> bool {
            self.enforce_tag_limit
        }
    }

    fn idle_storage() -> Arc<dyn LogStorage> {
        Arc::new(MockStorage::new())
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 5, 14, 0, 0).unwrap(),
        ))
    }

    fn tree_with(log: Arc<dyn PlatformLog>, storage: Arc<dyn LogStorage>, local: LocalLogSettings) -> LogTree {
        let config = LogTreeConfig::builder()
            .platform_log(log)
            .storage(storage)
            .clock(clock())
            .local_settings(local)
            .build()
            .unwrap();
        LogTree::new(config).unwrap()
    }

    fn scanner_stack() -> CallStack {
        CallStack::from_frames(vec![StackFrame::new("com.opacity.Scanner$1")])
    }

    #[test]
    fn test_short_message_gets_prefix_and_facility_tag() {
        let log = Arc::new(RecordingLog::default());
        let tree = tree_with(log.clone(), idle_storage(), LocalLogSettings::default());

        tree.log_with_stack(LogPriority::Info, &scanner_stack(), "scan started", None);

        assert_eq!(
            log.lines(),
            vec![Line::Print(
                LogPriority::Info,
                "OpacityAndroid".to_string(),
                "Scanner - scan started".to_string()
            )]
        );
    }

    #[test]
    fn test_supplied_tag_is_ignored() {
        let mut log = MockPlatformLog::new();
        log.expect_enforces_tag_limit().return_const(false);
        log.expect_println()
            .withf(|priority, tag, message| {
                *priority == LogPriority::Warn && tag == "OpacityAndroid" && message == "tree - low space"
            })
            .times(1)
            .return_const(());
        log.expect_wtf().never();

        let tree = tree_with(Arc::new(log), idle_storage(), LocalLogSettings::default());
        tree.log(LogPriority::Warn, Some("Custom"), "low space", None);
    }

    #[test]
    fn test_assert_goes_to_fatal_sink_unbuffered() {
        let log = Arc::new(RecordingLog::default());
        let mut storage = MockStorage::new();
        storage.expect_create_dir_all().never();
        storage.expect_append_file().never();
        let local = LocalLogSettings::default()
            .with_local_log(true)
            .with_log_directory("/logs");
        let tree = tree_with(log.clone(), Arc::new(storage), local);

        tree.log_with_stack(LogPriority::Assert, &scanner_stack(), "invariant broken", None);

        assert_eq!(
            log.lines(),
            vec![Line::Fatal(
                "OpacityAndroid".to_string(),
                "invariant broken".to_string()
            )]
        );
        assert_eq!(tree.buffered_len(), 0);
    }

    #[test]
    fn test_long_message_is_chunked_without_prefix() {
        let log = Arc::new(RecordingLog::default());
        let tree = tree_with(log.clone(), idle_storage(), LocalLogSettings::default());
        let message = format!("{}\n{}", "a".repeat(4_500), "b".repeat(10));

        tree.log_with_stack(LogPriority::Debug, &scanner_stack(), &message, None);

        let texts: Vec<String> = log
            .lines()
            .into_iter()
            .map(|line| match line {
                Line::Print(LogPriority::Debug, tag, text) => {
                    assert_eq!(tag, "OpacityAndroid");
                    text
                }
                other => panic!("unexpected line: {other:?}"),
            })
            .collect();

        assert_eq!(texts.len(), 3);
        assert_eq!(texts[0].len(), 4_000);
        assert_eq!(texts[1].len(), 500);
        assert_eq!(texts[2], "b".repeat(10));
        assert!(texts.iter().all(|t| !t.contains(" - ")));
    }

    #[test]
    fn test_long_assert_is_chunked_to_fatal_sink() {
        let log = Arc::new(RecordingLog::default());
        let tree = tree_with(log.clone(), idle_storage(), LocalLogSettings::default());

        tree.log_with_stack(LogPriority::Assert, &scanner_stack(), &"x".repeat(8_000), None);

        let lines = log.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| matches!(l, Line::Fatal(_, t) if t.len() == 4_000)));
    }

    #[test]
    fn test_message_at_limit_is_chunked() {
        let log = Arc::new(RecordingLog::default());
        let tree = tree_with(log.clone(), idle_storage(), LocalLogSettings::default());

        tree.log_with_stack(LogPriority::Info, &scanner_stack(), &"c".repeat(4_000), None);

        assert_eq!(
            log.lines(),
            vec![Line::Print(
                LogPriority::Info,
                "OpacityAndroid".to_string(),
                "c".repeat(4_000)
            )]
        );
    }

    #[derive(Debug)]
    struct Outer(BridgeError);

    impl std::fmt::Display for Outer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "scan aborted")
        }
    }

    impl StdError for Outer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_cause_is_appended_with_chain() {
        let log = Arc::new(RecordingLog::default());
        let tree = tree_with(log.clone(), idle_storage(), LocalLogSettings::default());
        let err = Outer(BridgeError::NotAvailable("storage".to_string()));

        tree.log_with_stack(LogPriority::Error, &scanner_stack(), "scan failed", Some(&err));

        assert_eq!(
            log.lines(),
            vec![Line::Print(
                LogPriority::Error,
                "OpacityAndroid".to_string(),
                "Scanner - scan failed\nscan aborted\nCaused by: Bridge capability not available: storage"
                    .to_string()
            )]
        );
    }

    #[test]
    fn test_empty_message_with_cause_is_cause() {
        assert_eq!(compose_message("", Some("boom")), "boom");
        assert_eq!(compose_message("msg", None), "msg");
    }

    #[test]
    fn test_below_min_priority_is_dropped() {
        let mut log = MockPlatformLog::new();
        log.expect_println().never();
        log.expect_wtf().never();

        let config = LogTreeConfig::builder()
            .platform_log(Arc::new(log))
            .storage(idle_storage())
            .clock(clock())
            .min_priority(LogPriority::Info)
            .build()
            .unwrap();
        let tree = LogTree::new(config).unwrap();

        tree.log(LogPriority::Debug, None, "noise", None);
        tree.log_record(&LogRecord::new(LogPriority::Verbose, "more noise"));
    }

    #[test]
    fn test_stack_depth_violation_falls_back_to_facility_tag() {
        let log = Arc::new(RecordingLog::default());
        let tree = tree_with(log.clone(), idle_storage(), LocalLogSettings::default());

        tree.log_with_stack(LogPriority::Info, &CallStack::new(), "hello", None);

        let lines = log.lines();
        assert_eq!(lines.len(), 2);
        assert!(matches!(
            &lines[0],
            Line::Print(LogPriority::Error, _, m) if m.starts_with("can't resolve log tag")
        ));
        assert_eq!(
            lines[1],
            Line::Print(
                LogPriority::Info,
                "OpacityAndroid".to_string(),
                "OpacityAndroid - hello".to_string()
            )
        );
    }

    #[test]
    fn test_tag_truncated_when_platform_enforces_limit() {
        let log = Arc::new(RecordingLog {
            enforce_tag_limit: true,
            ..RecordingLog::default()
        });
        let tree = tree_with(log.clone(), idle_storage(), LocalLogSettings::default());
        let stack = CallStack::from_module("com.opacity.AVeryLongClassNameForTagTesting");

        tree.log_with_stack(LogPriority::Info, &stack, "hi", None);

        assert!(matches!(
            &log.lines()[0],
            Line::Print(_, _, m) if m == "AVeryLongClassNameForTa - hi"
        ));
    }

    #[test]
    fn test_flush_failure_reported_on_fault_channel() {
        let log = Arc::new(RecordingLog::default());
        let mut storage = MockStorage::new();
        storage.expect_create_dir_all().returning(|_| Ok(()));
        storage
            .expect_append_file()
            .returning(|_, _| Err(BridgeError::OperationFailed("disk full".to_string())));
        let local = LocalLogSettings::default()
            .with_local_log(true)
            .with_log_directory("/logs");
        let tree = tree_with(log.clone(), Arc::new(storage), local);

        tree.log_with_stack(LogPriority::Info, &scanner_stack(), "kept", None);

        let lines = log.lines();
        assert_eq!(lines.len(), 2);
        assert!(matches!(
            &lines[1],
            Line::Print(LogPriority::Error, tag, m)
                if tag == "OpacityAndroid" && m.starts_with("can't save log locally - e:")
        ));
        assert!(tree.buffered_len() > 0);
        assert_eq!(tree.stats().failed_flushes, 1);
    }

    #[test]
    fn test_log_record_renders_fields_and_caller() {
        let log = Arc::new(RecordingLog::default());
        let tree = tree_with(log.clone(), idle_storage(), LocalLogSettings::default());
        let record = LogRecord::new(LogPriority::Info, "relay started")
            .with_caller("core_service::relay")
            .with_field("subscribers", "2");

        LoggerSink::log(&tree, record);

        assert_eq!(
            log.lines(),
            vec![Line::Print(
                LogPriority::Info,
                "OpacityAndroid".to_string(),
                "relay - relay started subscribers=2".to_string()
            )]
        );
    }

    #[test]
    fn test_sink_min_priority_matches_config() {
        let tree = tree_with(
            Arc::new(RecordingLog::default()),
            idle_storage(),
            LocalLogSettings::default(),
        );
        assert_eq!(LoggerSink::min_priority(&tree), LogPriority::Verbose);
    }
}
