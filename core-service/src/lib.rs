//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (platform log,
//! storage, clock, event emitter) into the shared Rust core. It owns the
//! diagnostic log tree, applies the logging settings the host sends through
//! `setConfig`, and relays SDK events back to the host. Desktop apps
//! typically enable the `desktop-shims` feature (which depends on
//! `bridge-desktop`) to get console logging, `std::fs` storage and a JSON
//! lines event emitter.

pub mod error;
pub mod relay;

pub use error::{CoreError, Result};
pub use relay::EventRelay;

use std::sync::{Arc, Mutex};

use bridge_traits::events::HostEventEmitter;
use core_logtree::{FlushOutcome, LogTree};
use core_runtime::config::{LocalLogSettings, LogTreeConfig};
use core_runtime::events::{EventBus, EventStream, DEFAULT_EVENT_BUFFER_SIZE};
use core_runtime::logging::{init_logging, LoggingConfig};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    log_tree: Arc<LogTree>,
    events: EventBus,
    emitter: Arc<dyn HostEventEmitter>,
    relay: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl CoreService {
    pub fn builder() -> CoreServiceBuilder {
        CoreServiceBuilder::default()
    }

    /// Create a new service from a log tree configuration and an emitter.
    pub fn new(config: LogTreeConfig, emitter: Arc<dyn HostEventEmitter>) -> Result<Self> {
        Self::builder()
            .log_tree_config(config)
            .event_emitter(emitter)
            .build()
    }

    /// The diagnostic log tree.
    pub fn log_tree(&self) -> Arc<LogTree> {
        Arc::clone(&self.log_tree)
    }

    /// Bus the SDK publishes its events on.
    pub fn event_bus(&self) -> EventBus {
        self.events.clone()
    }

    /// Install the global `tracing` subscriber, mirroring core events into
    /// the log tree.
    pub fn install_tracing(&self, config: LoggingConfig) -> Result<()> {
        init_logging(config.with_logger_sink(self.log_tree.clone()))?;
        Ok(())
    }

    /// Apply the logging settings the host sent through `setConfig`.
    ///
    /// Missing fields take their defaults. Returns the settings now in
    /// effect.
    pub fn apply_settings(&self, config: serde_json::Value) -> Result<LocalLogSettings> {
        let settings = LocalLogSettings::from_json(config)?;
        info!(
            local_log = settings.local_log,
            cloud_log = settings.cloud_log,
            has_directory = settings.log_directory.is_some(),
            "Applying host log settings"
        );
        self.log_tree.configure(settings.clone());
        Ok(settings)
    }

    /// Start relaying SDK events to the host emitter.
    ///
    /// Must be called from within a tokio runtime. Events published before
    /// this call are not relayed. Calling it again while a relay is running
    /// is a no-op.
    pub fn spawn_event_relay(&self) {
        let mut relay = self.relay.lock().unwrap_or_else(|e| e.into_inner());
        if relay.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let stream = EventStream::new(self.events.subscribe());
        let event_relay = EventRelay::new(Arc::clone(&self.emitter));
        *relay = Some(tokio::spawn(event_relay.run(stream)));
    }

    /// Stop the event relay and flush buffered log lines.
    ///
    /// The flush is best effort: a failure has already been reported on the
    /// platform log and is returned for callers that care.
    pub fn shutdown(&self) -> Result<FlushOutcome> {
        if let Some(handle) = self
            .relay
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            handle.abort();
        }

        self.log_tree.flush().map_err(|err| {
            warn!(error = %err, "Final log flush failed");
            CoreError::from(err)
        })
    }
}

impl std::fmt::Debug for CoreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreService")
            .field("log_tree", &self.log_tree)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

/// Builder for [`CoreService`].
#[derive(Default)]
pub struct CoreServiceBuilder {
    log_tree_config: Option<LogTreeConfig>,
    event_emitter: Option<Arc<dyn HostEventEmitter>>,
    event_buffer_size: Option<usize>,
}

impl CoreServiceBuilder {
    /// Log tree configuration. Defaults to `LogTreeConfig::builder().build()`.
    pub fn log_tree_config(mut self, config: LogTreeConfig) -> Self {
        self.log_tree_config = Some(config);
        self
    }

    pub fn event_emitter(mut self, emitter: Arc<dyn HostEventEmitter>) -> Self {
        self.event_emitter = Some(emitter);
        self
    }

    /// Per-subscriber event buffer. Default: 100
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    pub fn build(self) -> Result<CoreService> {
        let config = match self.log_tree_config {
            Some(config) => config,
            None => LogTreeConfig::builder().build()?,
        };

        let emitter = match self.event_emitter {
            Some(emitter) => emitter,
            None => provide_default_emitter()?,
        };

        let buffer_size = self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE);
        if buffer_size == 0 {
            return Err(CoreError::InitializationFailed(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(CoreService {
            log_tree: Arc::new(LogTree::new(config)?),
            events: EventBus::new(buffer_size),
            emitter,
            relay: Arc::new(Mutex::new(None)),
        })
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_emitter() -> Result<Arc<dyn HostEventEmitter>> {
    let emitter: Arc<dyn HostEventEmitter> = Arc::new(bridge_desktop::JsonLinesEmitter::stdout());
    Ok(emitter)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_emitter() -> Result<Arc<dyn HostEventEmitter>> {
    Err(CoreError::CapabilityMissing {
        capability: "HostEventEmitter".to_string(),
        message: "HostEventEmitter implementation is required to deliver SDK events. \
                 Desktop: enable the 'desktop-shims' feature to use the JSON lines emitter. \
                 Mobile: inject the React Native device event emitter."
            .to_string(),
    })
}
