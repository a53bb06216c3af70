//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! A future CAN telemetry adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::CommandDropped { dropped_total } => {
                warn!(
                    "QUEUE | oldest pending command evicted ({} dropped since boot)",
                    dropped_total
                );
            }
            AppEvent::ResponseTimeout { cmd, retries } => {
                warn!("LINK  | '{}' unanswered after {} retries, dropped", cmd, retries);
            }
            AppEvent::ParamChanged { key, value } => {
                info!("PARAM | {}=\"{}\"", key, value);
            }
            AppEvent::SocketsChanged { active } => {
                info!("SOCK  | active handles {:?}", active);
            }
            AppEvent::ProvisioningComplete => {
                info!("PROV  | factory provisioning complete");
            }
            AppEvent::PassthroughEntered => {
                info!("MODE  | serial passthrough engaged (reset to exit)");
            }
        }
    }
}
