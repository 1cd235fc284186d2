//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux), used when running the core outside a mobile shell
//! (tests, tooling, the desktop build of the app).
//!
//! ## Overview
//!
//! - `PlatformLog` via `tracing` ([`TracingPlatformLog`]) or plain stderr ([`ConsoleLog`])
//! - `LogStorage` using `std::fs` ([`StdFileSystem`])
//! - `HostEventEmitter` writing JSON lines ([`JsonLinesEmitter`])
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{default_log_root, ConsoleLog, StdFileSystem};
//! use std::sync::Arc;
//!
//! let platform_log = Arc::new(ConsoleLog::default());
//! let storage = Arc::new(StdFileSystem::new());
//! let root = default_log_root();
//! ```

mod events;
mod filesystem;
mod log;

pub use events::JsonLinesEmitter;
pub use filesystem::{default_log_root, StdFileSystem};
pub use log::{ConsoleLog, TracingPlatformLog};
