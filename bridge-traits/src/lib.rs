//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the Rust core and the native shell
//! that embeds it (Android, iOS, desktop). Each trait represents a capability
//! the core requires but that every platform provides differently.
//!
//! ## Traits
//!
//! ### Logging
//! - [`PlatformLog`](logging::PlatformLog) - Leveled host log primitive plus the fatal sink
//! - [`LoggerSink`](logging::LoggerSink) - Receiver of structured [`LogRecord`](logging::LogRecord)s
//!
//! ### Storage
//! - [`LogStorage`](storage::LogStorage) - Directory creation and append-only file writes
//!
//! ### Host Integration
//! - [`HostEventEmitter`](events::HostEventEmitter) - Delivers named events to the JavaScript host
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Available |
//! | Android  | host shell (JNI)    | 📋 Planned |
//! | iOS      | host shell (Swift)  | 📋 Planned |
//!
//! ## Error Handling
//!
//! All fallible bridge operations use [`BridgeError`](error::BridgeError).
//! Implementations should convert platform errors into it and keep the
//! offending path or event name in the message.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync`: the log tree is called from any
//! thread of the host application.

pub mod error;
pub mod events;
pub mod logging;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use events::HostEventEmitter;
pub use logging::{LogPriority, LogRecord, LoggerSink, PlatformLog};
pub use storage::LogStorage;
pub use time::{Clock, ManualClock, SystemClock};
