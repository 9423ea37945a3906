//! Outbound application events.
//!
//! The [`DeviceService`](super::service::DeviceService) emits these through
//! the [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them.

use super::commands::Command;
use super::ports::UpdateOutcome;
use crate::connectivity::LinkState;
use crate::error::Error;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Identity was read from the store (`true`) or initialised on first boot (`false`).
    IdentityLoaded { from_store: bool },

    /// The store could not be read or written during boot; the in-memory
    /// identity is used as is.
    StoreUnavailable { error: Error },

    /// The connectivity machine settled.
    LinkSettled(LinkState),

    /// A command was handled; `reply_len` bytes are ready to send.
    CommandHandled { command: Command, reply_len: usize },

    /// Identity/network fields changed and were persisted.
    IdentitySaved,

    /// A controller's values were written to the store.
    ControllerSaved { pin: u8 },

    /// A controller save was postponed by the debounce interval.
    ControllerSaveDeferred { pin: u8 },

    /// A firmware replacement attempt finished.
    FirmwareResult { outcome: UpdateOutcome, error_code: i32 },
}
