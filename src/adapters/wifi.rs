//! WiFi adapter.
//!
//! Implements [`NetworkPort`]: non-blocking station join plus access-point
//! mode for self-hosting.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::EspWifi`.
//! - **all other targets**: a simulated radio whose join completes after a
//!   configurable number of status polls, for host-side tests.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::NetworkPort;
use crate::error::ConnectivityError;
use crate::identity::MacAddress;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// Radio state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Idle,
    Joining,
    Joined,
    AccessPoint,
}

const SSID_MAX: usize = 32;
const KEY_MAX: usize = 64;

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > SSID_MAX || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::JoinRejected);
    }
    Ok(())
}

fn auth_for(key: &str) -> Result<bool, ConnectivityError> {
    match key.len() {
        0 => Ok(false),
        8..=KEY_MAX => Ok(true),
        _ => Err(ConnectivityError::JoinRejected),
    }
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    mac: MacAddress,
    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,
    /// Simulation: status polls before the join completes; `None` never joins.
    #[cfg(not(target_os = "espidf"))]
    sim_join_after: Option<u32>,
    #[cfg(not(target_os = "espidf"))]
    sim_polls: u32,
    #[cfg(not(target_os = "espidf"))]
    sim_ap_ssid: heapless::String<SSID_MAX>,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: EspWifi<'static>) -> Self {
        Self {
            state: WifiState::Idle,
            mac: super::device_id::read_mac(),
            wifi,
        }
    }

    /// Simulated radio that joins on the first status poll.
    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self::with_join_after(Some(0))
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn with_join_after(polls: Option<u32>) -> Self {
        Self {
            state: WifiState::Idle,
            mac: super::device_id::read_mac(),
            sim_join_after: polls,
            sim_polls: 0,
            sim_ap_ssid: heapless::String::new(),
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    /// Simulation: name of the network advertised in access-point mode.
    #[cfg(not(target_os = "espidf"))]
    pub fn access_point_ssid(&self) -> &str {
        &self.sim_ap_ssid
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_join(&mut self, ssid: &str, key: &str, secured: bool) -> Result<(), ConnectivityError> {
        let conf = Configuration::Client(ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| ConnectivityError::JoinRejected)?,
            password: key.try_into().map_err(|_| ConnectivityError::JoinRejected)?,
            auth_method: if secured { AuthMethod::WPAWPA2Personal } else { AuthMethod::None },
            ..Default::default()
        });
        self.wifi.set_configuration(&conf).map_err(|e| {
            warn!("WiFi: station config rejected: {:?}", e);
            ConnectivityError::JoinRejected
        })?;
        self.wifi.start().map_err(|_| ConnectivityError::DriverUnavailable)?;
        self.wifi.connect().map_err(|e| {
            warn!("WiFi: connect failed: {:?}", e);
            ConnectivityError::JoinRejected
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_join(&mut self, ssid: &str, _key: &str, secured: bool) -> Result<(), ConnectivityError> {
        self.sim_polls = 0;
        info!("WiFi(sim): joining '{}' (secured={})", ssid, secured);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_joined(&mut self) -> bool {
        self.wifi.is_connected().unwrap_or(false) && self.wifi.sta_netif().is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_joined(&mut self) -> bool {
        self.sim_polls = self.sim_polls.saturating_add(1);
        self.sim_join_after.is_some_and(|n| self.sim_polls > n)
    }

    #[cfg(target_os = "espidf")]
    fn platform_access_point(&mut self, ssid: &str, key: &str) -> Result<(), ConnectivityError> {
        let _ = self.wifi.disconnect();
        let _ = self.wifi.stop();
        let conf = Configuration::AccessPoint(AccessPointConfiguration {
            ssid: ssid.try_into().map_err(|_| ConnectivityError::AccessPointFailed)?,
            password: key.try_into().map_err(|_| ConnectivityError::AccessPointFailed)?,
            auth_method: if key.is_empty() { AuthMethod::None } else { AuthMethod::WPA2Personal },
            channel: 1,
            ..Default::default()
        });
        self.wifi
            .set_configuration(&conf)
            .and_then(|()| self.wifi.start())
            .map_err(|e| {
                warn!("WiFi: access point failed: {:?}", e);
                ConnectivityError::AccessPointFailed
            })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_access_point(&mut self, ssid: &str, _key: &str) -> Result<(), ConnectivityError> {
        self.sim_ap_ssid.clear();
        self.sim_ap_ssid
            .push_str(ssid)
            .map_err(|()| ConnectivityError::AccessPointFailed)
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// NetworkPort
// ───────────────────────────────────────────────────────────────

impl NetworkPort for WifiAdapter {
    fn mac_address(&self) -> MacAddress {
        self.mac
    }

    fn begin_join(&mut self, ssid: &str, key: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        let secured = auth_for(key)?;
        self.platform_join(ssid, key, secured)?;
        self.state = WifiState::Joining;
        Ok(())
    }

    fn is_joined(&mut self) -> bool {
        match self.state {
            WifiState::Joined => true,
            WifiState::Joining => {
                if !self.platform_is_joined() {
                    return false;
                }
                info!("WiFi: joined");
                self.state = WifiState::Joined;
                true
            }
            _ => false,
        }
    }

    fn start_access_point(&mut self, ssid: &str, key: &str) -> Result<(), ConnectivityError> {
        if ssid.is_empty() || ssid.len() > SSID_MAX {
            return Err(ConnectivityError::AccessPointFailed);
        }
        if !key.is_empty() && auth_for(key).is_err() {
            return Err(ConnectivityError::AccessPointFailed);
        }
        self.platform_access_point(ssid, key)?;
        self.state = WifiState::AccessPoint;
        info!("WiFi: access point '{}' up", ssid);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
