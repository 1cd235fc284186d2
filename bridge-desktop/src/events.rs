//! Host event emitter writing one JSON object per line.

use bridge_traits::{error::Result, events::HostEventEmitter};
use serde_json::{json, Value};
use std::io::{self, Write};
use std::sync::Mutex;
use tracing::debug;

/// Emits `{"event": <name>, "payload": <payload>}` lines to a writer.
///
/// Stands in for the React Native device event emitter when the core runs on
/// desktop.
pub struct JsonLinesEmitter<W: Write + Send> {
    writer: Mutex<W>,
}

impl JsonLinesEmitter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> JsonLinesEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consume the emitter and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write + Send> HostEventEmitter for JsonLinesEmitter<W> {
    fn emit(&self, event_name: &str, payload: Value) -> Result<()> {
        let line = serde_json::to_string(&json!({
            "event": event_name,
            "payload": payload,
        }))?;

        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        writeln!(writer, "{}", line)?;
        writer.flush()?;

        debug!(event = event_name, "Emitted host event");
        Ok(())
    }
}
