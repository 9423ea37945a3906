//! System configuration parameters
//!
//! Every timing and layout constant of the controller core lives here.
//! These values are shared with devices already deployed in the field, so
//! they are compile-time constants rather than runtime settings.

use serde::{Deserialize, Serialize};

// --- Persistent store layout ---

/// Bytes of emulated EEPROM available to the core.
pub const STORE_CAPACITY: usize = 1024;
/// Address of the global "configured" flag byte (0 = new device, 1 = configured).
pub const CONFIGURED_FLAG_ADDR: usize = 0;
/// First byte of the identity/network record, right after the flag.
pub const IDENTITY_RECORD_ADDR: usize = CONFIGURED_FLAG_ADDR + 1;

// --- Field capacities (bytes, terminator included) ---

pub const SSID_CAPACITY: usize = 24;
pub const NAME_CAPACITY: usize = 16;
pub const MAC_LEN: usize = 6;

/// Capabilities per controller (the store layout encodes the count in one byte).
pub const MAX_CAPABILITIES: usize = 16;
/// Controllers hosted by one device.
pub const MAX_CONTROLLERS: usize = 4;

// --- Timing ---

/// Total time allowed for joining the configured network (milliseconds).
pub const JOIN_BUDGET_MS: u32 = 10_000;
/// Half of one indicator blink while waiting for the join (milliseconds).
pub const JOIN_POLL_MS: u32 = 500;
/// Minimum interval between two stored writes of the same controller (milliseconds).
pub const SAVE_DEBOUNCE_MS: u64 = 4_000;

// --- Network ---

/// UDP port the command listener binds to.
pub const COMMAND_PORT: u16 = 2390;
/// Prefix of the access-point name advertised when self-hosting.
pub const SELF_HOST_PREFIX: &str = "RCSLEDS";
/// Access-point key used when self-hosting (open network).
pub const SELF_HOST_KEY: &str = "";

/// Largest firmware-update descriptor returned to a client.
pub const ERROR_DESCRIPTOR_CAPACITY: usize = 100;

/// Firmware image name baked in at build time.
///
/// Format: `<4-char device code>.<yymmdd>.bin`, e.g. `rgbc.200217.bin`
/// for the RGB LED controller.
pub const FIRMWARE_VERSION: &str = match option_env!("RCS_FIRMWARE_VERSION") {
    Some(v) => v,
    None => "rgbc.200217.bin",
};

/// Identity values used on first boot, before anything is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryDefaults {
    /// Display name of the device, e.g. "Controller".
    pub device_name: heapless::String<NAME_CAPACITY>,
    /// Free-text location, e.g. "HR-FBD-21C-510".
    pub device_location: heapless::String<NAME_CAPACITY>,
    /// Network to join; empty means self-host from the start.
    pub network_ssid: heapless::String<SSID_CAPACITY>,
    pub network_key: heapless::String<SSID_CAPACITY>,
    pub firmware_version: heapless::String<NAME_CAPACITY>,
}

impl FactoryDefaults {
    /// Defaults with a caller-chosen device name and location.
    pub fn named(device_name: &str, device_location: &str) -> Self {
        Self {
            device_name: truncated(device_name),
            device_location: truncated(device_location),
            ..Self::default()
        }
    }
}

impl Default for FactoryDefaults {
    fn default() -> Self {
        Self {
            device_name: truncated("Controller"),
            device_location: truncated("Unknown"),
            network_ssid: heapless::String::new(),
            network_key: heapless::String::new(),
            firmware_version: truncated(FIRMWARE_VERSION),
        }
    }
}

/// Copy as much of `s` as fits, leaving room for the stored terminator.
fn truncated<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for ch in s.chars() {
        if out.len() + ch.len_utf8() > N - 1 || out.push(ch).is_err() {
            break;
        }
    }
    out
}
