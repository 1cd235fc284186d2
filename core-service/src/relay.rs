//! Relay of SDK events to the JavaScript host.

use crate::error::Result;

use bridge_traits::events::HostEventEmitter;
use core_runtime::events::{EventSeverity, EventStream, RecvError, ScanStatus, SdkEvent};

use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Forwards SDK events to the host emitter.
///
/// While the last delivered event is a `RUNNING` scan status, `NEW_FILE`
/// status events and file changes are dropped: the running scan reports them
/// itself when it finishes. Dropped events do not count as delivered.
pub struct EventRelay {
    emitter: Arc<dyn HostEventEmitter>,
    scan_running: bool,
}

impl EventRelay {
    pub fn new(emitter: Arc<dyn HostEventEmitter>) -> Self {
        Self {
            emitter,
            scan_running: false,
        }
    }

    /// Deliver `event` unless it is suppressed.
    ///
    /// Returns whether the event reached the emitter. A failed delivery
    /// leaves the suppression state untouched.
    pub fn relay(&mut self, event: &SdkEvent) -> Result<bool> {
        if self.is_suppressed(event) {
            debug!(
                event = event.host_event_name(),
                "Scan running, not relaying new file event"
            );
            return Ok(false);
        }

        self.emitter
            .emit(event.host_event_name(), event.host_payload())?;

        self.scan_running = matches!(
            event,
            SdkEvent::ScanStatus {
                status: ScanStatus::Running
            }
        );
        Ok(true)
    }

    fn is_suppressed(&self, event: &SdkEvent) -> bool {
        self.scan_running
            && matches!(
                event,
                SdkEvent::ScanStatus {
                    status: ScanStatus::NewFile
                } | SdkEvent::FileChanged { .. }
            )
    }

    /// Relay events from `stream` until the bus closes.
    pub async fn run(mut self, mut stream: EventStream) {
        info!("SDK event relay started");
        loop {
            match stream.recv().await {
                Ok(event) => match self.relay(&event) {
                    Ok(true) => log_delivered(&event),
                    Ok(false) => {}
                    Err(err) => warn!(
                        error = %err,
                        event = event.host_event_name(),
                        "Failed to deliver SDK event to host"
                    ),
                },
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "SDK event relay fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
        info!("SDK event relay stopped");
    }
}

fn log_delivered(event: &SdkEvent) {
    let name = event.host_event_name();
    let description = event.description();
    match event.severity() {
        EventSeverity::Debug => debug!(event = name, "{}", description),
        EventSeverity::Info => info!(event = name, "{}", description),
        EventSeverity::Warning => warn!(event = name, "{}", description),
        EventSeverity::Error => error!(event = name, "{}", description),
    }
}

impl std::fmt::Debug for EventRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRelay")
            .field("scan_running", &self.scan_running)
            .finish_non_exhaustive()
    }
}
