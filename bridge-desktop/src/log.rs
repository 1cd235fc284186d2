//! Desktop `PlatformLog` implementations.

use bridge_traits::logging::{LogPriority, PlatformLog};
use chrono::Local;

/// Forwards platform log lines to the `tracing` subscriber.
///
/// The host tag is recorded as the `tag` field. Fatal lines are emitted at
/// `ERROR` with `fatal = true` so they survive any level filter that lets
/// errors through.
#[derive(Debug, Clone, Default)]
pub struct TracingPlatformLog;

impl TracingPlatformLog {
    pub fn new() -> Self {
        Self
    }
}

impl PlatformLog for TracingPlatformLog {
    fn println(&self, priority: LogPriority, tag: &str, message: &str) {
        match priority {
            LogPriority::Verbose => tracing::trace!(tag, "{}", message),
            LogPriority::Debug => tracing::debug!(tag, "{}", message),
            LogPriority::Info => tracing::info!(tag, "{}", message),
            LogPriority::Warn => tracing::warn!(tag, "{}", message),
            LogPriority::Error => tracing::error!(tag, "{}", message),
            LogPriority::Assert => self.wtf(tag, message),
        }
    }

    fn wtf(&self, tag: &str, message: &str) {
        tracing::error!(tag, fatal = true, "{}", message);
    }
}

/// Logcat-style stderr logger for development.
#[derive(Debug, Clone)]
pub struct ConsoleLog {
    pub min_priority: LogPriority,
    /// Emulate hosts that cap tag length
    pub enforce_tag_limit: bool,
}

impl Default for ConsoleLog {
    fn default() -> Self {
        Self {
            min_priority: LogPriority::Verbose,
            enforce_tag_limit: false,
        }
    }
}

impl ConsoleLog {
    fn format_line(priority: LogPriority, tag: &str, message: &str) -> String {
        format!(
            "{} {}/{}: {}",
            Local::now().format("%m-%d %H:%M:%S%.3f"),
            priority.as_char(),
            tag,
            message
        )
    }
}

impl PlatformLog for ConsoleLog {
    fn println(&self, priority: LogPriority, tag: &str, message: &str) {
        if priority >= self.min_priority {
            eprintln!("{}", Self::format_line(priority, tag, message));
        }
    }

    fn wtf(&self, tag: &str, message: &str) {
        eprintln!("{}", Self::format_line(LogPriority::Assert, tag, message));
    }

    fn enforces_tag_limit(&self) -> bool {
        self.enforce_tag_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_line_format() {
        let line = ConsoleLog::format_line(LogPriority::Warn, "OpacityAndroid", "disk low");
        assert!(line.ends_with(" W/OpacityAndroid: disk low"));
    }

    #[test]
    fn test_console_tag_limit_flag() {
        let log = ConsoleLog::default();
        assert!(!log.enforces_tag_limit());

        let legacy = ConsoleLog {
            enforce_tag_limit: true,
            ..ConsoleLog::default()
        };
        assert!(legacy.enforces_tag_limit());
    }

    #[test]
    fn test_tracing_log_does_not_panic_without_subscriber() {
        let log = TracingPlatformLog::new();
        log.println(LogPriority::Info, "OpacityAndroid", "hello");
        log.wtf("OpacityAndroid", "boom");
        assert!(!log.enforces_tag_limit());
    }
}
