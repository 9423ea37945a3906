//! Device identity and network configuration.
//!
//! One instance per device. Built from [`FactoryDefaults`] at boot, then
//! either replaced from the store (configured device) or written to it
//! (first boot). The MAC address and firmware version never reach the store.

use serde::Serialize;

use crate::bounded::{NameStr, SsidStr};
use crate::config::{FactoryDefaults, MAC_LEN};

pub type MacAddress = [u8; MAC_LEN];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceIdentity {
    pub configured: bool,
    #[serde(serialize_with = "serialize_mac")]
    pub mac: MacAddress,
    pub network_ssid: SsidStr,
    #[serde(skip)]
    pub network_key: SsidStr,
    pub device_name: NameStr,
    pub device_location: NameStr,
    pub firmware_version: NameStr,
}

impl DeviceIdentity {
    pub fn new(defaults: &FactoryDefaults, mac: MacAddress) -> Self {
        Self {
            configured: false,
            mac,
            network_ssid: SsidStr::from(defaults.network_ssid.as_str()),
            network_key: SsidStr::from(defaults.network_key.as_str()),
            device_name: NameStr::from(defaults.device_name.as_str()),
            device_location: NameStr::from(defaults.device_location.as_str()),
            firmware_version: NameStr::from(defaults.firmware_version.as_str()),
        }
    }

    /// Both network name and key are present, so a join can be attempted.
    pub fn has_credentials(&self) -> bool {
        !self.network_ssid.is_empty() && !self.network_key.is_empty()
    }

    /// Blank the credentials so the next evaluation self-hosts.
    pub fn clear_credentials(&mut self) {
        self.network_ssid.clear();
        self.network_key.clear();
    }
}

fn serialize_mac<S: serde::Serializer>(mac: &MacAddress, s: S) -> Result<S::Ok, S::Error> {
    let mut text = heapless::String::<17>::new();
    for (i, b) in mac.iter().enumerate() {
        use core::fmt::Write;
        let sep = if i == 0 { "" } else { ":" };
        write!(text, "{sep}{b:02X}").map_err(serde::ser::Error::custom)?;
    }
    s.serialize_str(&text)
}
