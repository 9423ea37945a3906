//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the ESP-IDF
//! logger (UART / USB-CDC in production). Each event is one line.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, UpdateOutcome};

/// Adapter that logs every [`AppEvent`] to the serial console.
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
            AppEvent::IdentityLoaded { from_store } => {
                let source = if *from_store { "store" } else { "defaults" };
                info!("BOOT  | identity from {}", source);
            }
            AppEvent::StoreUnavailable { error } => {
                warn!("STORE | unavailable: {}", error);
            }
            AppEvent::LinkSettled(state) => {
                info!("LINK  | {:?}", state);
            }
            AppEvent::CommandHandled { command, reply_len } => {
                info!("CMD   | {:?} ({}) -> {} bytes", command, command.code(), reply_len);
            }
            AppEvent::IdentitySaved => {
                info!("STORE | identity saved");
            }
            AppEvent::ControllerSaved { pin } => {
                info!("STORE | pin {} saved", pin);
            }
            AppEvent::ControllerSaveDeferred { pin } => {
                info!("STORE | pin {} save deferred", pin);
            }
            AppEvent::FirmwareResult { outcome, error_code } => match outcome {
                UpdateOutcome::Failed => warn!("FW    | failed, code {}", error_code),
                other => info!("FW    | {:?}", other),
            },
        }
    }
}
