//! Logging Abstractions
//!
//! Two directions meet here:
//!
//! - [`PlatformLog`] is the host's own leveled log primitive (Logcat on
//!   Android, `os_log` on iOS, stderr/tracing on desktop). The core writes to
//!   it; it never reads back.
//! - [`LoggerSink`] is what the core exposes to producers of log records. The
//!   log tree implements it, and the tracing bridge in `core-runtime` feeds it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Log priority, ordered from least to most severe.
///
/// Discriminants match the Android `android.util.Log` constants so a JNI shell
/// can pass them through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LogPriority {
    Verbose = 2,
    Debug = 3,
    Info = 4,
    Warn = 5,
    Error = 6,
    /// "What a terrible failure": routed to the fatal sink.
    Assert = 7,
}

impl LogPriority {
    /// Single-letter code used by Logcat style output.
    pub fn as_char(self) -> char {
        match self {
            LogPriority::Verbose => 'V',
            LogPriority::Debug => 'D',
            LogPriority::Info => 'I',
            LogPriority::Warn => 'W',
            LogPriority::Error => 'E',
            LogPriority::Assert => 'A',
        }
    }

    pub fn is_fatal(self) -> bool {
        self == LogPriority::Assert
    }
}

impl fmt::Display for LogPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogPriority::Verbose => "VERBOSE",
            LogPriority::Debug => "DEBUG",
            LogPriority::Info => "INFO",
            LogPriority::Warn => "WARN",
            LogPriority::Error => "ERROR",
            LogPriority::Assert => "ASSERT",
        };
        f.write_str(name)
    }
}

/// A single log call as handed to a [`LoggerSink`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub priority: LogPriority,
    /// Tag supplied by the caller, if any
    pub tag: Option<String>,
    pub message: String,
    /// Rendered error cause
    pub cause: Option<String>,
    /// Fully qualified path of the calling module or type
    pub caller: Option<String>,
    /// Structured fields, rendered after the message
    pub fields: BTreeMap<String, String>,
}

impl LogRecord {
    pub fn new(priority: LogPriority, message: impl Into<String>) -> Self {
        Self {
            priority,
            tag: None,
            message: message.into(),
            cause: None,
            caller: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_caller(mut self, caller: impl Into<String>) -> Self {
        self.caller = Some(caller.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Host log primitive.
///
/// Implementations are infallible by contract: the host log is the channel of
/// last resort, there is nowhere to report its own failures.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::logging::{LogPriority, PlatformLog};
///
/// fn report(log: &dyn PlatformLog) {
///     log.println(LogPriority::Warn, "OpacityAndroid", "Scanner - storage not mounted");
/// }
/// ```
pub trait PlatformLog: Send + Sync {
    /// Write one line at `priority` under `tag`.
    fn println(&self, priority: LogPriority, tag: &str, message: &str);

    /// Fatal diagnostic sink. Must emit in every build flavor.
    fn wtf(&self, tag: &str, message: &str);

    /// Whether the host truncates tags longer than 23 characters.
    ///
    /// Android before API 24 rejects longer tags; newer hosts do not care.
    fn enforces_tag_limit(&self) -> bool {
        false
    }
}

/// Receiver of structured log records.
pub trait LoggerSink: Send + Sync {
    fn log(&self, record: LogRecord);

    /// Flush any buffered logs
    fn flush(&self) {}

    /// Records below this priority may be dropped at the source.
    fn min_priority(&self) -> LogPriority {
        LogPriority::Verbose
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(LogPriority::Verbose < LogPriority::Debug);
        assert!(LogPriority::Error < LogPriority::Assert);
        assert_eq!(LogPriority::Assert as u8, 7);
        assert!(LogPriority::Assert.is_fatal());
        assert!(!LogPriority::Error.is_fatal());
    }

    #[test]
    fn test_priority_char() {
        assert_eq!(LogPriority::Warn.as_char(), 'W');
        assert_eq!(LogPriority::Assert.to_string(), "ASSERT");
    }

    #[test]
    fn test_log_record_builder() {
        let record = LogRecord::new(LogPriority::Info, "scan started")
            .with_tag("Scanner")
            .with_caller("core_service::service")
            .with_field("files", "12");

        assert_eq!(record.priority, LogPriority::Info);
        assert_eq!(record.tag.as_deref(), Some("Scanner"));
        assert_eq!(record.caller.as_deref(), Some("core_service::service"));
        assert_eq!(record.fields.get("files"), Some(&"12".to_string()));
        assert!(record.cause.is_none());
    }

    #[test]
    fn test_priority_serde() {
        let json = serde_json::to_string(&LogPriority::Debug).unwrap();
        assert_eq!(json, "\"Debug\"");
        let back: LogPriority = serde_json::from_str(&json).unwrap();
        assert_eq!(back, LogPriority::Debug);
    }
}
