//! Names derived from the factory MAC address.
//!
//! The self-hosted network name is `RCSLEDS` followed by the last three MAC
//! bytes in uppercase hex (`RCSLEDSABCDEF`). It is stable across reboots,
//! so clients can find an unconfigured device again.

use core::fmt::Write;

use crate::config::SELF_HOST_PREFIX;
use crate::identity::MacAddress;

/// Self-hosted network name: prefix + 6 hex digits.
pub type SelfHostSsid = heapless::String<24>;

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: a fixed MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0x5C, 0xCF, 0x7F, 0xAB, 0xCD, 0xEF]
}

pub fn self_host_ssid(mac: &MacAddress) -> SelfHostSsid {
    let mut ssid = SelfHostSsid::new();
    let _ = write!(ssid, "{}{:02X}{:02X}{:02X}", SELF_HOST_PREFIX, mac[3], mac[4], mac[5]);
    ssid
}
