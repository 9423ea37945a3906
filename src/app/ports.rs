//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DeviceService (domain)
//! ```
//!
//! Driven adapters (EEPROM, WiFi radio, clock, indicator LED, firmware
//! fetcher, output drivers) implement these traits. The
//! [`DeviceService`](super::service::DeviceService) consumes them via
//! generics, so the domain core never touches hardware directly.

use crate::capability::Controller;
use crate::error::{ConnectivityError, StoreError};
use crate::identity::MacAddress;

// ───────────────────────────────────────────────────────────────
// Persistent store port (driven adapter: domain ↔ EEPROM / flash)
// ───────────────────────────────────────────────────────────────

/// Byte-addressable non-volatile store with EEPROM-emulation semantics.
///
/// Access happens inside a session: [`begin`](Self::begin) loads the
/// working copy, [`update`](Self::update) edits it, [`commit`](Self::commit)
/// writes it back, [`end`](Self::end) releases it and drops anything not
/// committed. The store has no locking; callers serialise sessions.
pub trait PersistentStore {
    /// Addressable bytes.
    fn capacity(&self) -> usize;

    /// Open a session.
    fn begin(&mut self) -> Result<(), StoreError>;

    /// Copy `buf.len()` bytes starting at `addr` into `buf`.
    fn read(&self, addr: usize, buf: &mut [u8]) -> Result<(), StoreError>;

    /// Overwrite bytes starting at `addr`. Implementations should skip bytes
    /// that already hold the requested value.
    fn update(&mut self, addr: usize, data: &[u8]) -> Result<(), StoreError>;

    /// Make every update of this session durable.
    fn commit(&mut self) -> Result<(), StoreError>;

    /// Close the session. Must be safe to call on every exit path.
    fn end(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Network port (driven adapter: domain → WiFi radio)
// ───────────────────────────────────────────────────────────────

pub trait NetworkPort {
    /// Factory hardware address of the radio.
    fn mac_address(&self) -> MacAddress;

    /// Start joining `ssid` as a station. Returns once the attempt is under way.
    fn begin_join(&mut self, ssid: &str, key: &str) -> Result<(), ConnectivityError>;

    /// Whether the station is associated and has an address.
    fn is_joined(&mut self) -> bool;

    /// Advertise a network of our own.
    fn start_access_point(&mut self, ssid: &str, key: &str) -> Result<(), ConnectivityError>;
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

pub trait Clock {
    /// Monotonic milliseconds since boot.
    fn now_ms(&self) -> u64;

    /// Block for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Indicator port (readiness LED)
// ───────────────────────────────────────────────────────────────

pub trait Indicator {
    /// Drive the indicator at `level` (0 = off, higher = brighter).
    fn set_level(&mut self, level: u8);
}

// ───────────────────────────────────────────────────────────────
// Actuator port (per-device-variant output behaviour)
// ───────────────────────────────────────────────────────────────

/// How a device variant turns capability values into output state.
///
/// Called once per controller on every service tick; implementations may
/// keep their own timing state (blinking, fades).
pub trait Actuator {
    fn apply(&mut self, controller: &Controller, now_ms: u64);
}

// ───────────────────────────────────────────────────────────────
// Firmware updater port
// ───────────────────────────────────────────────────────────────

/// Result classification of a firmware replacement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UpdateOutcome {
    Failed = 0,
    NoUpdates = 1,
    Applied = 2,
}

impl UpdateOutcome {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// What the updater reports back to the command dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareReport {
    pub outcome: UpdateOutcome,
    /// Updater-specific error number (0 when there is none).
    pub error_code: i32,
    pub message: heapless::String<64>,
}

impl FirmwareReport {
    pub fn new(outcome: UpdateOutcome, error_code: i32, message: &str) -> Self {
        let mut m = heapless::String::new();
        for ch in message.chars() {
            if m.push(ch).is_err() {
                break;
            }
        }
        Self {
            outcome,
            error_code,
            message: m,
        }
    }
}

/// Fetches and installs a firmware image.
///
/// Runs to completion; there is no cancellation. When `reboot_on_success`
/// is set and the image is applied, the implementation may restart the
/// device instead of returning.
pub trait FirmwareUpdater {
    fn update(&mut self, location: &str, current_version: &str, reboot_on_success: bool) -> FirmwareReport;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
