//! Host Event Emission
//!
//! The JavaScript host listens for named events (`ScanStatus`, `FileChange`)
//! carrying a JSON object payload. The shell implements this trait on top of
//! its native event emitter.

use serde_json::Value;

use crate::error::Result;

/// Delivers events to the host application.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::events::HostEventEmitter;
/// use serde_json::json;
///
/// fn notify(emitter: &dyn HostEventEmitter) -> Result<()> {
///     emitter.emit("ScanStatus", json!({ "status": "FINISHED" }))
/// }
/// ```
pub trait HostEventEmitter: Send + Sync {
    /// Emit `payload` under `event_name`.
    fn emit(&self, event_name: &str, payload: Value) -> Result<()>;
}
