//! # Log Tree Configuration
//!
//! Provides configuration management for the diagnostic log tree.
//!
//! ## Overview
//!
//! Two kinds of settings meet here:
//!
//! - [`LogTreeConfig`] is assembled once by the embedding shell with a builder.
//!   It carries the bridge implementations (host log, storage, clock) and the
//!   fixed facility parameters (tag, chunk length, call-context depth). The
//!   builder fails fast when a required bridge is missing.
//! - [`LocalLogSettings`] are the toggles the JavaScript host sends through
//!   `setConfig` at any time during the process lifetime. They arrive as a JSON
//!   map and are applied to a running tree.
//!
//! ## Required Dependencies
//!
//! - `PlatformLog` - the host's leveled log primitive
//! - `LogStorage` - append-only file writes for local persistence
//!
//! When the `desktop-shims` feature is enabled, `ConsoleLog` and
//! `StdFileSystem` from `bridge-desktop` are injected if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{LocalLogSettings, LogTreeConfig};
//! use std::sync::Arc;
//!
//! let config = LogTreeConfig::builder()
//!     .platform_log(Arc::new(MyLogcat))
//!     .storage(Arc::new(MyScopedStorage))
//!     .local_settings(
//!         LocalLogSettings::default()
//!             .with_local_log(true)
//!             .with_log_directory("/storage/emulated/0/OpacitySDKLog")
//!             .with_app_identifier("com.opacity"),
//!     )
//!     .build()?;
//! ```
//!
//! ## Host settings
//!
//! ```
//! use core_runtime::config::LocalLogSettings;
//!
//! let settings = LocalLogSettings::from_json_str(
//!     r#"{"localLog": true, "logDirectory": "/tmp/logs", "appIdentifier": "com.opacity"}"#,
//! ).unwrap();
//! assert!(settings.local_root().is_some());
//! assert_eq!(settings.buffer_byte_limit, 22_000);
//! ```

use crate::error::{Error, Result};
use bridge_traits::{Clock, LogPriority, LogStorage, PlatformLog, SystemClock};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Tag every line is emitted under, regardless of the caller's tag.
pub const DEFAULT_FACILITY_TAG: &str = "OpacityAndroid";

/// Longest message the host log accepts in a single call.
pub const DEFAULT_MAX_CHUNK_LENGTH: usize = 4_000;

/// Buffered bytes above which a flush is forced.
pub const DEFAULT_BUFFER_BYTE_LIMIT: usize = 22_000;

/// Minimum time between two time-triggered flushes.
pub const DEFAULT_MIN_FLUSH_INTERVAL_MS: u64 = 1_000;

/// Settings pushed by the JavaScript host.
///
/// Every field is optional on the wire; missing fields take their defaults.
/// No validation is applied beyond the JSON types: a missing or null
/// `logDirectory` simply disables local persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocalLogSettings {
    /// Remote log shipping toggle. Accepted for wire compatibility; remote
    /// shipping is not implemented by the core.
    pub cloud_log: bool,

    /// Persist log lines to local files
    pub local_log: bool,

    /// Root directory for log files
    pub log_directory: Option<PathBuf>,

    /// Host application identifier, used as a path segment under the root
    pub app_identifier: String,

    /// Flush as soon as the buffer holds more than this many bytes
    pub buffer_byte_limit: usize,

    /// Flush when at least this long has passed since the last flush
    pub min_flush_interval_ms: u64,

    /// Upper bound on buffered bytes while flushes keep failing. Oldest lines
    /// are dropped first. `None` keeps everything.
    pub hard_cap_bytes: Option<usize>,
}

impl Default for LocalLogSettings {
    fn default() -> Self {
        Self {
            cloud_log: false,
            local_log: false,
            log_directory: None,
            app_identifier: String::new(),
            buffer_byte_limit: DEFAULT_BUFFER_BYTE_LIMIT,
            min_flush_interval_ms: DEFAULT_MIN_FLUSH_INTERVAL_MS,
            hard_cap_bytes: None,
        }
    }
}

impl LocalLogSettings {
    /// Parse settings from the host's JSON map.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Parse settings from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Root directory to persist under, if local persistence is active.
    pub fn local_root(&self) -> Option<&Path> {
        if self.local_log {
            self.log_directory.as_deref()
        } else {
            None
        }
    }

    pub fn with_local_log(mut self, enabled: bool) -> Self {
        self.local_log = enabled;
        self
    }

    pub fn with_log_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_directory = Some(dir.into());
        self
    }

    pub fn with_app_identifier(mut self, app_identifier: impl Into<String>) -> Self {
        self.app_identifier = app_identifier.into();
        self
    }

    pub fn with_buffer_byte_limit(mut self, limit: usize) -> Self {
        self.buffer_byte_limit = limit;
        self
    }

    pub fn with_min_flush_interval_ms(mut self, interval_ms: u64) -> Self {
        self.min_flush_interval_ms = interval_ms;
        self
    }

    pub fn with_hard_cap_bytes(mut self, cap: usize) -> Self {
        self.hard_cap_bytes = Some(cap);
        self
    }
}

/// Configuration of a log tree instance.
///
/// Use [`LogTreeConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct LogTreeConfig {
    /// Tag used for every host log call
    pub facility_tag: String,

    /// Messages at or above this length (in characters) are chunked
    pub max_chunk_length: usize,

    /// Index of the frame in the call context used for the tag prefix
    pub call_stack_depth: usize,

    /// Records below this priority are dropped
    pub min_priority: LogPriority,

    /// Initial host settings
    pub local: LocalLogSettings,

    /// Host log primitive (required)
    pub platform_log: Arc<dyn PlatformLog>,

    /// Log file storage (required)
    pub storage: Arc<dyn LogStorage>,

    /// Time source
    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for LogTreeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogTreeConfig")
            .field("facility_tag", &self.facility_tag)
            .field("max_chunk_length", &self.max_chunk_length)
            .field("call_stack_depth", &self.call_stack_depth)
            .field("min_priority", &self.min_priority)
            .field("local", &self.local)
            .field("platform_log", &"PlatformLog { ... }")
            .field("storage", &"LogStorage { ... }")
            .field("clock", &"Clock { ... }")
            .finish()
    }
}

impl LogTreeConfig {
    /// Creates a new builder for constructing a `LogTreeConfig`.
    pub fn builder() -> LogTreeConfigBuilder {
        LogTreeConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.facility_tag.is_empty() {
            return Err(Error::Config("Facility tag cannot be empty".to_string()));
        }

        if self.max_chunk_length == 0 {
            return Err(Error::Config(
                "Max chunk length must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn platform_log_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "PlatformLog".to_string(),
        message: "PlatformLog implementation is required to emit log lines. \
                 Desktop: enable the 'desktop-shims' feature to use the default ConsoleLog. \
                 Android: inject a Logcat adapter. iOS: inject an os_log adapter."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn storage_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "LogStorage".to_string(),
        message: "LogStorage implementation is required for local log files. \
                 Desktop: enable the 'desktop-shims' feature to use the default StdFileSystem. \
                 Mobile: inject storage backed by the app's external cache or documents directory."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_platform_log() -> Result<Arc<dyn PlatformLog>> {
    use bridge_desktop::ConsoleLog;

    let log: Arc<dyn PlatformLog> = Arc::new(ConsoleLog::default());
    Ok(log)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_platform_log() -> Result<Arc<dyn PlatformLog>> {
    Err(platform_log_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_storage() -> Result<Arc<dyn LogStorage>> {
    use bridge_desktop::StdFileSystem;

    let storage: Arc<dyn LogStorage> = Arc::new(StdFileSystem::new());
    Ok(storage)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_storage() -> Result<Arc<dyn LogStorage>> {
    Err(storage_missing_error())
}

/// Builder for [`LogTreeConfig`].
#[derive(Default)]
pub struct LogTreeConfigBuilder {
    facility_tag: Option<String>,
    max_chunk_length: Option<usize>,
    call_stack_depth: Option<usize>,
    min_priority: Option<LogPriority>,
    local: Option<LocalLogSettings>,
    platform_log: Option<Arc<dyn PlatformLog>>,
    storage: Option<Arc<dyn LogStorage>>,
    clock: Option<Arc<dyn Clock>>,
}

impl LogTreeConfigBuilder {
    /// Sets the tag all host log calls are made under.
    ///
    /// Default: `OpacityAndroid`
    pub fn facility_tag(mut self, tag: impl Into<String>) -> Self {
        self.facility_tag = Some(tag.into());
        self
    }

    /// Sets the chunking threshold in characters.
    ///
    /// Default: 4000
    pub fn max_chunk_length(mut self, length: usize) -> Self {
        self.max_chunk_length = Some(length);
        self
    }

    /// Sets which call-context frame names the tag prefix.
    ///
    /// Default: 0 (the direct caller)
    pub fn call_stack_depth(mut self, depth: usize) -> Self {
        self.call_stack_depth = Some(depth);
        self
    }

    pub fn min_priority(mut self, priority: LogPriority) -> Self {
        self.min_priority = Some(priority);
        self
    }

    pub fn local_settings(mut self, settings: LocalLogSettings) -> Self {
        self.local = Some(settings);
        self
    }

    pub fn platform_log(mut self, log: Arc<dyn PlatformLog>) -> Self {
        self.platform_log = Some(log);
        self
    }

    pub fn storage(mut self, storage: Arc<dyn LogStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds the final `LogTreeConfig` instance.
    ///
    /// Returns an error if a required bridge is missing and no desktop default
    /// is compiled in, or if a value is out of range.
    pub fn build(self) -> Result<LogTreeConfig> {
        let platform_log = match self.platform_log {
            Some(log) => log,
            None => provide_default_platform_log()?,
        };

        let storage = match self.storage {
            Some(storage) => storage,
            None => provide_default_storage()?,
        };

        let config = LogTreeConfig {
            facility_tag: self
                .facility_tag
                .unwrap_or_else(|| DEFAULT_FACILITY_TAG.to_string()),
            max_chunk_length: self.max_chunk_length.unwrap_or(DEFAULT_MAX_CHUNK_LENGTH),
            call_stack_depth: self.call_stack_depth.unwrap_or(0),
            min_priority: self.min_priority.unwrap_or(LogPriority::Verbose),
            local: self.local.unwrap_or_default(),
            platform_log,
            storage,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;

    struct NullLog;

    impl PlatformLog for NullLog {
        fn println(&self, _priority: LogPriority, _tag: &str, _message: &str) {}
        fn wtf(&self, _tag: &str, _message: &str) {}
    }

    struct NullStorage;

    impl LogStorage for NullStorage {
        fn create_dir_all(&self, _path: &Path) -> BridgeResult<()> {
            Ok(())
        }

        fn append_file(&self, _path: &Path, _data: &[u8]) -> BridgeResult<()> {
            Ok(())
        }
    }

    fn builder_with_bridges() -> LogTreeConfigBuilder {
        LogTreeConfig::builder()
            .platform_log(Arc::new(NullLog))
            .storage(Arc::new(NullStorage))
    }

    #[test]
    fn test_builder_defaults() {
        let config = builder_with_bridges().build().unwrap();

        assert_eq!(config.facility_tag, DEFAULT_FACILITY_TAG);
        assert_eq!(config.max_chunk_length, DEFAULT_MAX_CHUNK_LENGTH);
        assert_eq!(config.call_stack_depth, 0);
        assert_eq!(config.min_priority, LogPriority::Verbose);
        assert_eq!(config.local, LocalLogSettings::default());
    }

    #[test]
    fn test_builder_overrides() {
        let config = builder_with_bridges()
            .facility_tag("OpacityIOS")
            .max_chunk_length(1024)
            .call_stack_depth(2)
            .min_priority(LogPriority::Info)
            .local_settings(LocalLogSettings::default().with_local_log(true))
            .build()
            .unwrap();

        assert_eq!(config.facility_tag, "OpacityIOS");
        assert_eq!(config.max_chunk_length, 1024);
        assert_eq!(config.call_stack_depth, 2);
        assert_eq!(config.min_priority, LogPriority::Info);
        assert!(config.local.local_log);
    }

    #[test]
    fn test_validate_rejects_zero_chunk_length() {
        let result = builder_with_bridges().max_chunk_length(0).build();

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Max chunk length"));
    }

    #[test]
    fn test_validate_rejects_empty_tag() {
        let result = builder_with_bridges().facility_tag("").build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_platform_log() {
        let result = LogTreeConfig::builder()
            .storage(Arc::new(NullStorage))
            .build();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("PlatformLog"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_storage() {
        let result = LogTreeConfig::builder()
            .platform_log(Arc::new(NullLog))
            .build();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("LogStorage"));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_build_with_desktop_defaults() {
        let config = LogTreeConfig::builder().build().unwrap();
        assert!(!config.platform_log.enforces_tag_limit());
    }

    #[test]
    fn test_settings_from_partial_json() {
        let settings =
            LocalLogSettings::from_json(serde_json::json!({ "localLog": true })).unwrap();

        assert!(settings.local_log);
        assert!(settings.log_directory.is_none());
        assert!(settings.local_root().is_none());
        assert_eq!(settings.buffer_byte_limit, DEFAULT_BUFFER_BYTE_LIMIT);
        assert_eq!(settings.min_flush_interval_ms, DEFAULT_MIN_FLUSH_INTERVAL_MS);
    }

    #[test]
    fn test_settings_full_json() {
        let settings = LocalLogSettings::from_json_str(
            r#"{
                "cloudLog": true,
                "localLog": true,
                "logDirectory": "/storage/emulated/0/OpacitySDKLog",
                "appIdentifier": "com.opacity",
                "bufferByteLimit": 100,
                "minFlushIntervalMs": 60000,
                "hardCapBytes": 4096
            }"#,
        )
        .unwrap();

        assert!(settings.cloud_log);
        assert_eq!(
            settings.local_root(),
            Some(Path::new("/storage/emulated/0/OpacitySDKLog"))
        );
        assert_eq!(settings.app_identifier, "com.opacity");
        assert_eq!(settings.buffer_byte_limit, 100);
        assert_eq!(settings.min_flush_interval_ms, 60_000);
        assert_eq!(settings.hard_cap_bytes, Some(4096));
    }

    #[test]
    fn test_settings_null_directory_disables_local_root() {
        let settings = LocalLogSettings::from_json_str(
            r#"{"localLog": true, "logDirectory": null}"#,
        )
        .unwrap();
        assert!(settings.local_root().is_none());
    }

    #[test]
    fn test_settings_local_log_off_hides_root() {
        let settings = LocalLogSettings::default().with_log_directory("/tmp/logs");
        assert!(settings.local_root().is_none());
    }

    #[test]
    fn test_settings_rejects_wrong_types() {
        let result = LocalLogSettings::from_json_str(r#"{"bufferByteLimit": "lots"}"#);
        assert!(matches!(result, Err(Error::Settings(_))));
    }

    #[test]
    fn test_config_is_cloneable() {
        let config = builder_with_bridges().build().unwrap();
        let cloned = config.clone();
        assert_eq!(cloned.facility_tag, config.facility_tag);
        assert!(format!("{:?}", cloned).contains("PlatformLog { ... }"));
    }
}
