//! # Logging & Tracing Infrastructure
//!
//! Provides structured logging with `tracing` crate, supporting:
//! - JSON and pretty-print output formats
//! - Module-level filtering
//! - Forwarding into the log tree via `LoggerSink`
//! - PII redaction of forwarded fields (tokens, emails)
//!
//! ## Overview
//!
//! This module configures the `tracing-subscriber` infrastructure for the
//! core's own diagnostics. When a [`LoggerSink`] is configured (normally the
//! log tree), every event that survives filtering is mirrored into it, so
//! events raised by Rust code end up in the host log and in the local log
//! files next to the host's own lines.
//!
//! Events whose target starts with one of
//! [`LoggingConfig::sink_excluded_targets`] are not mirrored. The defaults
//! exclude the log tree and the desktop bridges: they run while the tree holds
//! its buffer lock, and mirroring them would re-enter the tree.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//! use bridge_traits::LogPriority;
//! use std::sync::Arc;
//!
//! let config = LoggingConfig::default()
//!     .with_format(LogFormat::Pretty)
//!     .with_level(LogPriority::Debug)
//!     .with_logger_sink(log_tree.clone());
//!
//! init_logging(config).expect("Failed to initialize logging");
//!
//! tracing::info!(files = 12, "Scan finished");
//! ```

use crate::error::{Error, Result};

use bridge_traits::logging::{LogPriority, LogRecord, LoggerSink};

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::{
    filter::EnvFilter,
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    Layer,
};

/// Targets never mirrored into the logger sink by default.
pub const DEFAULT_SINK_EXCLUDED_TARGETS: &[&str] = &["core_logtree", "bridge_desktop"];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format with colors
    Pretty,
    /// Structured JSON format for machine parsing
    Json,
    /// Compact format for production
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Compact;
    }
}

/// Logging configuration
#[derive(Clone)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Minimum log level
    pub level: LogPriority,
    /// Redact sensitive fields before they reach the logger sink
    pub redact_pii: bool,
    /// Custom filter string (e.g., "core_logtree=debug,core_service=trace")
    pub filter: Option<String>,
    /// Optional logger sink events are mirrored into
    pub logger_sink: Option<Arc<dyn LoggerSink>>,
    /// Target prefixes that are never mirrored into the logger sink
    pub sink_excluded_targets: Vec<String>,
    /// Enable span contexts
    pub enable_spans: bool,
    /// Display target module in logs
    pub display_target: bool,
    /// Display thread info
    pub display_thread_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogPriority::Info,
            redact_pii: true,
            filter: None,
            logger_sink: None,
            sink_excluded_targets: DEFAULT_SINK_EXCLUDED_TARGETS
                .iter()
                .map(|t| t.to_string())
                .collect(),
            enable_spans: true,
            display_target: true,
            display_thread_info: false,
        }
    }
}

impl fmt::Debug for LoggingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingConfig")
            .field("format", &self.format)
            .field("level", &self.level)
            .field("redact_pii", &self.redact_pii)
            .field("filter", &self.filter)
            .field(
                "logger_sink",
                &self.logger_sink.as_ref().map(|_| "LoggerSink { ... }"),
            )
            .field("sink_excluded_targets", &self.sink_excluded_targets)
            .field("enable_spans", &self.enable_spans)
            .field("display_target", &self.display_target)
            .field("display_thread_info", &self.display_thread_info)
            .finish()
    }
}

impl LoggingConfig {
    /// Set log format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set minimum log level
    pub fn with_level(mut self, level: LogPriority) -> Self {
        self.level = level;
        self
    }

    /// Enable or disable PII redaction
    pub fn with_pii_redaction(mut self, redact: bool) -> Self {
        self.redact_pii = redact;
        self
    }

    /// Set custom filter string
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Mirror events into `sink`
    pub fn with_logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    /// Never mirror events whose target starts with `prefix`
    pub fn exclude_sink_target(mut self, prefix: impl Into<String>) -> Self {
        self.sink_excluded_targets.push(prefix.into());
        self
    }

    /// Enable or disable span contexts
    pub fn with_spans(mut self, enable: bool) -> Self {
        self.enable_spans = enable;
        self
    }

    /// Enable or disable target display
    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    /// Enable or disable thread info
    pub fn with_thread_info(mut self, display: bool) -> Self {
        self.display_thread_info = display;
        self
    }
}

/// Initialize the logging system
///
/// This should be called once during application startup. Subsequent calls
/// will return an error.
///
/// # Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - The filter string is invalid
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;

    match config.format {
        LogFormat::Pretty => init_pretty_logging(config, filter),
        LogFormat::Json => init_json_logging(config, filter),
        LogFormat::Compact => init_compact_logging(config, filter),
    }
}

fn level_directive(level: LogPriority) -> &'static str {
    match level {
        LogPriority::Verbose => "trace",
        LogPriority::Debug => "debug",
        LogPriority::Info => "info",
        LogPriority::Warn => "warn",
        LogPriority::Error | LogPriority::Assert => "error",
    }
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let base_level = level_directive(config.level);

    let filter_string = if let Some(custom_filter) = &config.filter {
        custom_filter.clone()
    } else {
        // Default filter: our crates at specified level, dependencies at warn
        format!(
            "{base},core_runtime={base},core_logtree={base},core_service={base},\
             bridge_desktop={base},tokio=warn,mio=warn",
            base = base_level
        )
    };

    EnvFilter::try_new(filter_string)
        .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))
}

fn sink_layer(config: &LoggingConfig) -> LoggerSinkLayer {
    LoggerSinkLayer::new(config.logger_sink.clone())
        .with_excluded_targets(config.sink_excluded_targets.clone())
        .with_redaction(config.redact_pii)
}

fn init_pretty_logging(config: LoggingConfig, filter: EnvFilter) -> Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .pretty()
        .with_target(config.display_target)
        .with_thread_ids(config.display_thread_info)
        .with_thread_names(config.display_thread_info)
        .with_span_events(if config.enable_spans {
            tracing_subscriber::fmt::format::FmtSpan::ACTIVE
        } else {
            tracing_subscriber::fmt::format::FmtSpan::NONE
        })
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(sink_layer(&config))
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

fn init_json_logging(config: LoggingConfig, filter: EnvFilter) -> Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(config.enable_spans)
        .with_span_list(config.enable_spans)
        .with_target(config.display_target)
        .with_thread_ids(config.display_thread_info)
        .with_thread_names(config.display_thread_info)
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(sink_layer(&config))
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

fn init_compact_logging(config: LoggingConfig, filter: EnvFilter) -> Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(config.display_target)
        .with_thread_ids(config.display_thread_info)
        .with_thread_names(config.display_thread_info)
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(sink_layer(&config))
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

/// Layer that forwards events to a `LoggerSink` implementation.
///
/// The sink is called synchronously on the thread that emitted the event.
/// A `tag` field becomes the record's tag and an `error` field its cause;
/// all other fields travel as record fields.
pub struct LoggerSinkLayer {
    sink: Option<Arc<dyn LoggerSink>>,
    excluded_targets: Vec<String>,
    redact_pii: bool,
}

impl LoggerSinkLayer {
    /// Layer excluding [`DEFAULT_SINK_EXCLUDED_TARGETS`], without redaction.
    pub fn new(sink: Option<Arc<dyn LoggerSink>>) -> Self {
        Self {
            sink,
            excluded_targets: DEFAULT_SINK_EXCLUDED_TARGETS
                .iter()
                .map(|t| t.to_string())
                .collect(),
            redact_pii: false,
        }
    }

    pub fn with_excluded_targets(mut self, targets: Vec<String>) -> Self {
        self.excluded_targets = targets;
        self
    }

    pub fn with_redaction(mut self, redact: bool) -> Self {
        self.redact_pii = redact;
        self
    }

    fn is_excluded(&self, target: &str) -> bool {
        self.excluded_targets
            .iter()
            .any(|prefix| target.starts_with(prefix.as_str()))
    }
}

impl<S> Layer<S> for LoggerSinkLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };

        let metadata = event.metadata();
        if self.is_excluded(metadata.target()) {
            return;
        }

        let priority = tracing_level_to_priority(*metadata.level());
        if priority < sink.min_priority() {
            return;
        }

        let mut visitor = SinkVisitor::default();
        event.record(&mut visitor);

        let message = visitor
            .message
            .unwrap_or_else(|| metadata.name().to_string());

        let mut record = LogRecord::new(priority, message)
            .with_caller(metadata.module_path().unwrap_or_else(|| metadata.target()));
        record.tag = visitor.tag;
        record.cause = visitor.error;

        for (key, value) in visitor.fields {
            let value = if self.redact_pii {
                redact_if_sensitive(&key, &value)
            } else {
                value
            };
            record = record.with_field(key, value);
        }

        if let Some(span) = ctx.lookup_current() {
            record = record.with_field("span", span.name());
        }

        sink.log(record);
    }
}

#[derive(Default)]
struct SinkVisitor {
    message: Option<String>,
    tag: Option<String>,
    error: Option<String>,
    fields: BTreeMap<String, String>,
}

impl SinkVisitor {
    fn record_value(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            "tag" => self.tag = Some(value),
            "error" => self.error = Some(value),
            name => {
                self.fields.insert(name.to_string(), value);
            }
        }
    }
}

impl Visit for SinkVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, value.to_string());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record_value(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record_value(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_value(field, format!("{:?}", value));
    }
}

fn tracing_level_to_priority(level: tracing::Level) -> LogPriority {
    match level {
        tracing::Level::TRACE => LogPriority::Verbose,
        tracing::Level::DEBUG => LogPriority::Debug,
        tracing::Level::INFO => LogPriority::Info,
        tracing::Level::WARN => LogPriority::Warn,
        tracing::Level::ERROR => LogPriority::Error,
    }
}

/// Helper function to redact sensitive field values
///
/// Applied to every forwarded field when redaction is enabled; also usable
/// when building messages by hand:
///
/// ```ignore
/// use tracing::info;
/// use core_runtime::logging::redact_if_sensitive;
///
/// info!(token = %redact_if_sensitive("token", token), "Account handle refreshed");
/// ```
pub fn redact_if_sensitive(field_name: &str, value: &str) -> String {
    const SENSITIVE_FIELDS: &[&str] = &[
        "token",
        "password",
        "secret",
        "api_key",
        "authorization",
        "bearer",
        "handle",
        "phrase",
    ];

    let field_lower = field_name.to_lowercase();
    if SENSITIVE_FIELDS.iter().any(|&f| field_lower.contains(f)) {
        "[REDACTED]".to_string()
    } else if value.contains('@') && value.contains('.') {
        // Likely an email - redact domain but keep first char
        let first = value.chars().next().filter(|&c| c != '@');
        match first {
            Some(c) => format!("{}***@[REDACTED]", c),
            None => "***@[REDACTED]".to_string(),
        }
    } else {
        value.to_string()
    }
}

/// Strip full file paths to basename only for privacy
///
/// Useful when logging file operations:
///
/// ```ignore
/// use tracing::info;
/// use core_runtime::logging::strip_path;
///
/// info!(file = %strip_path("/storage/emulated/0/DCIM/IMG_1.jpg"), "File changed");
/// // Logs: file="IMG_1.jpg"
/// ```
pub fn strip_path(path: &str) -> &str {
    path.rsplit('/')
        .next()
        .unwrap_or(path)
        .rsplit('\\')
        .next()
        .unwrap_or(path)
}
