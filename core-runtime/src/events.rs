//! # Event Bus System
//!
//! Carries SDK broadcast events (scan status changes, file changes) from the
//! file-sync SDK to whoever relays them to the host, using
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: [`SdkEvent`] and the [`ScanStatus`] values the SDK reports
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Receiver wrapper used by the host relay
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     emit      ┌───────────┐     subscribe    ┌─────────────┐
//! │ SDK scanner ├──────────────>│ EventBus  ├─────────────────>│ Host relay  │
//! └─────────────┘               │ (broadcast│                  └─────────────┘
//! ┌─────────────┐     emit      │  channel) │     subscribe    ┌─────────────┐
//! │ SDK watcher ├──────────────>│           ├─────────────────>│ Diagnostics │
//! └─────────────┘               └───────────┘                  └─────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, ScanStatus, SdkEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(SdkEvent::ScanStatus { status: ScanStatus::Running })
//!     .ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert_eq!(event.host_event_name(), "ScanStatus");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   This is non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Host event name for scan status changes.
pub const SCAN_STATUS_EVENT: &str = "ScanStatus";

/// Host event name for file changes.
pub const FILE_CHANGE_EVENT: &str = "FileChange";

// ============================================================================
// SDK Event Types
// ============================================================================

/// Scan status values reported by the SDK.
///
/// Serialized in the host's upper snake case form (`NO_ACCESS`, `RUNNING`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanStatus {
    /// Storage permission not granted
    NoAccess,
    /// Scan in progress
    Running,
    /// Scan completed
    Finished,
    /// No scan has been run
    NoScan,
    /// A new file was discovered
    NewFile,
    /// A known file was modified
    FileModified,
}

impl ScanStatus {
    /// The wire value sent to the host.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::NoAccess => "NO_ACCESS",
            ScanStatus::Running => "RUNNING",
            ScanStatus::Finished => "FINISHED",
            ScanStatus::NoScan => "NO_SCAN",
            ScanStatus::NewFile => "NEW_FILE",
            ScanStatus::FileModified => "FILE_MODIFIED",
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events broadcast by the file-sync SDK.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum SdkEvent {
    /// Scan status changed.
    ScanStatus {
        /// New status
        status: ScanStatus,
    },
    /// A file was added or modified.
    FileChanged {
        /// Absolute path of the file
        path: String,
        /// Size in bytes
        size: u64,
    },
}

impl SdkEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            SdkEvent::ScanStatus { status } => match status {
                ScanStatus::NoAccess => "Storage access not granted",
                ScanStatus::Running => "Scan started",
                ScanStatus::Finished => "Scan finished",
                ScanStatus::NoScan => "No scan run",
                ScanStatus::NewFile => "New file found",
                ScanStatus::FileModified => "File modified",
            },
            SdkEvent::FileChanged { .. } => "File changed",
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            SdkEvent::ScanStatus {
                status: ScanStatus::NoAccess,
            } => EventSeverity::Warning,
            SdkEvent::ScanStatus {
                status: ScanStatus::Running | ScanStatus::Finished,
            } => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }

    /// Name of the event as the host subscribes to it.
    pub fn host_event_name(&self) -> &'static str {
        match self {
            SdkEvent::ScanStatus { .. } => SCAN_STATUS_EVENT,
            SdkEvent::FileChanged { .. } => FILE_CHANGE_EVENT,
        }
    }

    /// Payload in the shape the host expects.
    pub fn host_payload(&self) -> Value {
        match self {
            SdkEvent::ScanStatus { status } => json!({ "status": status.as_str() }),
            SdkEvent::FileChanged { path, size } => json!({ "path": path, "size": size }),
        }
    }
}

/// Severity the relay logs a delivered event at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to SDK events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SdkEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event.
    /// Returns an error if there are no active subscribers.
    pub fn emit(&self, event: SdkEvent) -> Result<usize, SendError<SdkEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<SdkEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    ///
    /// ```rust
    /// use core_runtime::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.subscriber_count(), 0);
    ///
    /// let _subscriber = event_bus.subscribe();
    /// assert_eq!(event_bus.subscriber_count(), 1);
    /// ```
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// A wrapper around `broadcast::Receiver` owned by one consumer.
pub struct EventStream {
    receiver: Receiver<SdkEvent>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<SdkEvent>) -> Self {
        Self { receiver }
    }

    /// Receives the next event.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<SdkEvent, RecvError> {
        self.receiver.recv().await
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream").finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
