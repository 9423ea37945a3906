//! Mock adapters for integration tests.
//!
//! Every mock records what the service asked of it so tests can assert on
//! the full call history without touching flash, radio or PWM registers.

use rcs_controller::app::events::AppEvent;
use rcs_controller::app::ports::{
    Actuator, Clock, EventSink, FirmwareReport, FirmwareUpdater, Indicator, NetworkPort, PersistentStore,
    UpdateOutcome,
};
use rcs_controller::capability::{Capability, Controller};
use rcs_controller::error::{ConnectivityError, StoreError};
use rcs_controller::identity::MacAddress;

pub const MAC: MacAddress = [0x24, 0x0A, 0xC4, 0x12, 0x9B, 0x0F];

// ── MockStore ─────────────────────────────────────────────────

/// Byte-array store with failure injection.
pub struct MockStore {
    pub cells: Vec<u8>,
    working: Option<Vec<u8>>,
    pub commits: u32,
    pub sessions_open: i32,
    pub fail_begin: bool,
    pub fail_commit: bool,
}

#[allow(dead_code)]
impl MockStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            cells: vec![0xFF; capacity],
            working: None,
            commits: 0,
            sessions_open: 0,
            fail_begin: false,
            fail_commit: false,
        }
    }
}

impl PersistentStore for MockStore {
    fn capacity(&self) -> usize {
        self.cells.len()
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        if self.fail_begin {
            return Err(StoreError::Io);
        }
        self.working = Some(self.cells.clone());
        self.sessions_open += 1;
        Ok(())
    }

    fn read(&self, addr: usize, buf: &mut [u8]) -> Result<(), StoreError> {
        let w = self.working.as_ref().ok_or(StoreError::NotOpen)?;
        let src = w.get(addr..addr + buf.len()).ok_or(StoreError::OutOfRange)?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn update(&mut self, addr: usize, data: &[u8]) -> Result<(), StoreError> {
        let w = self.working.as_mut().ok_or(StoreError::NotOpen)?;
        let dst = w.get_mut(addr..addr + data.len()).ok_or(StoreError::OutOfRange)?;
        dst.copy_from_slice(data);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.fail_commit {
            return Err(StoreError::Io);
        }
        let w = self.working.as_ref().ok_or(StoreError::NotOpen)?;
        self.cells.clone_from(w);
        self.commits += 1;
        Ok(())
    }

    fn end(&mut self) {
        if self.working.take().is_some() {
            self.sessions_open -= 1;
        }
    }
}

// ── MockNet ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetCall {
    Join { ssid: String, key: String },
    AccessPoint { ssid: String, key: String },
}

pub struct MockNet {
    pub calls: Vec<NetCall>,
    /// Polls until the join succeeds; `None` never joins.
    pub join_after: Option<u32>,
    pub reject_join: bool,
    pub fail_ap: bool,
    polls: u32,
}

#[allow(dead_code)]
impl MockNet {
    pub fn joining_after(polls: u32) -> Self {
        Self {
            calls: Vec::new(),
            join_after: Some(polls),
            reject_join: false,
            fail_ap: false,
            polls: 0,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            join_after: None,
            ..Self::joining_after(0)
        }
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }

    pub fn access_point(&self) -> Option<&str> {
        self.calls.iter().rev().find_map(|c| match c {
            NetCall::AccessPoint { ssid, .. } => Some(ssid.as_str()),
            NetCall::Join { .. } => None,
        })
    }
}

impl NetworkPort for MockNet {
    fn mac_address(&self) -> MacAddress {
        MAC
    }

    fn begin_join(&mut self, ssid: &str, key: &str) -> Result<(), ConnectivityError> {
        self.calls.push(NetCall::Join {
            ssid: ssid.to_owned(),
            key: key.to_owned(),
        });
        self.polls = 0;
        if self.reject_join {
            return Err(ConnectivityError::JoinRejected);
        }
        Ok(())
    }

    fn is_joined(&mut self) -> bool {
        let joined = self.join_after.is_some_and(|n| self.polls >= n);
        self.polls += 1;
        joined
    }

    fn start_access_point(&mut self, ssid: &str, key: &str) -> Result<(), ConnectivityError> {
        self.calls.push(NetCall::AccessPoint {
            ssid: ssid.to_owned(),
            key: key.to_owned(),
        });
        if self.fail_ap {
            return Err(ConnectivityError::AccessPointFailed);
        }
        Ok(())
    }
}

// ── MockClock / MockIndicator ─────────────────────────────────

#[derive(Default)]
pub struct MockClock {
    pub now: u64,
    pub slept_ms: u64,
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now
    }

    fn delay_ms(&mut self, ms: u32) {
        self.now += u64::from(ms);
        self.slept_ms += u64::from(ms);
    }
}

#[derive(Default)]
pub struct MockIndicator {
    pub levels: Vec<u8>,
}

#[allow(dead_code)]
impl MockIndicator {
    pub fn last(&self) -> Option<u8> {
        self.levels.last().copied()
    }
}

impl Indicator for MockIndicator {
    fn set_level(&mut self, level: u8) {
        self.levels.push(level);
    }
}

// ── MockActuator ──────────────────────────────────────────────

/// Records `(pin, values)` for each apply.
#[derive(Default)]
pub struct MockActuator {
    pub applied: Vec<(u8, Vec<u16>)>,
}

impl Actuator for MockActuator {
    fn apply(&mut self, controller: &Controller, _now_ms: u64) {
        let values = controller.capabilities().iter().map(Capability::value).collect();
        self.applied.push((controller.pin(), values));
    }
}

// ── MockUpdater ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub location: String,
    pub current_version: String,
    pub reboot: bool,
}

pub struct MockUpdater {
    pub requests: Vec<UpdateRequest>,
    pub report: FirmwareReport,
}

#[allow(dead_code)]
impl MockUpdater {
    pub fn answering(outcome: UpdateOutcome, code: i32, message: &str) -> Self {
        Self {
            requests: Vec::new(),
            report: FirmwareReport::new(outcome, code, message),
        }
    }
}

impl Default for MockUpdater {
    fn default() -> Self {
        Self::answering(UpdateOutcome::NoUpdates, 0, "No updates")
    }
}

impl FirmwareUpdater for MockUpdater {
    fn update(&mut self, location: &str, current_version: &str, reboot_on_success: bool) -> FirmwareReport {
        self.requests.push(UpdateRequest {
            location: location.to_owned(),
            current_version: current_version.to_owned(),
            reboot: reboot_on_success,
        });
        self.report.clone()
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Fixtures ──────────────────────────────────────────────────

pub const LAMP_PIN: u8 = 12;
pub const LAMP_ADDR: u16 = 200;

/// Warm/cool white lamp with a brightness channel.
pub fn lamp() -> Controller {
    Controller::new(
        LAMP_PIN,
        "Lamp",
        LAMP_ADDR,
        &[
            Capability::new("bright", 0, 1023, 0).unwrap(),
            Capability::new("warm", 0, 255, 128).unwrap(),
        ],
    )
    .unwrap()
}

/// Padded 16-byte name field.
pub fn name16(s: &str) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[..s.len()].copy_from_slice(s.as_bytes());
    out
}

/// Inbound partial form `[pin][count]{[name:16][value:2]}`.
pub fn partial(pin: u8, pairs: &[(&str, u16)]) -> Vec<u8> {
    let mut out = vec![pin, pairs.len() as u8];
    for (name, value) in pairs {
        out.extend_from_slice(&name16(name));
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}
