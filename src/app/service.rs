//! Application service, the hexagonal core.
//!
//! [`DeviceService`] owns the device identity, the controllers and the
//! store manager. All I/O flows through port traits injected at call
//! sites, so the whole service runs against mock adapters on the host.
//!
//! ```text
//!  NetworkPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!        Clock ──▶ │      DeviceService        │ ──▶ Actuator
//!    Indicator ◀── │ identity · controllers    │ ──▶ FirmwareUpdater
//!                  │ store · link state        │
//!                  └──────────────────────────┘
//! ```

use core::fmt::{self, Write};

use log::{debug, info, warn};
use serde::Serialize;

use crate::bounded::{NameStr, SsidStr};
use crate::capability::Controller;
use crate::codec::controller::{self as ctrl_codec, DecodeOutcome};
use crate::codec::identity as id_codec;
use crate::codec::ByteReader;
use crate::config::{ERROR_DESCRIPTOR_CAPACITY, FactoryDefaults, MAX_CONTROLLERS, NAME_CAPACITY, SSID_CAPACITY};
use crate::connectivity::{Connectivity, LEVEL_WAITING, LinkState};
use crate::error::{CodecError, Error, Result};
use crate::identity::{DeviceIdentity, MacAddress};
use crate::persist::{SaveOutcome, StoreManager, validate_layout};

use super::commands::{Command, NO_OUTCOME};
use super::events::AppEvent;
use super::ports::{
    Actuator, Clock, EventSink, FirmwareReport, FirmwareUpdater, Indicator, NetworkPort, PersistentStore,
    UpdateOutcome,
};

/// Error number reported when a firmware request carries no usable location.
pub const BAD_LOCATION_CODE: i32 = -2;

// ───────────────────────────────────────────────────────────────
// DeviceService
// ───────────────────────────────────────────────────────────────

pub struct DeviceService<S: PersistentStore> {
    identity: DeviceIdentity,
    controllers: heapless::Vec<Controller, MAX_CONTROLLERS>,
    store: StoreManager<S>,
    link: Connectivity,
}

impl<S: PersistentStore> DeviceService<S> {
    /// Build the service. Controller store ranges are validated here.
    ///
    /// Nothing is read from the store until [`start`](Self::start).
    pub fn new(
        defaults: &FactoryDefaults,
        mac: MacAddress,
        controllers: impl IntoIterator<Item = Controller>,
        store: S,
    ) -> Result<Self> {
        let mut list = heapless::Vec::new();
        for ctrl in controllers {
            list.push(ctrl)
                .map_err(|_| Error::Config("too many controllers"))?;
        }
        validate_layout(store.capacity(), &list)?;
        Ok(Self {
            identity: DeviceIdentity::new(defaults, mac),
            controllers: list,
            store: StoreManager::new(store),
            link: Connectivity::new(),
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load (or, on first boot, initialise and persist) the identity, load
    /// controller values, then settle the network link.
    ///
    /// A store failure does not stop the boot: it is reported as
    /// [`AppEvent::StoreUnavailable`] and the device carries on with
    /// whatever identity it has in memory.
    pub fn start<N, C, I, E>(&mut self, net: &mut N, clock: &mut C, indicator: &mut I, sink: &mut E) -> Result<LinkState>
    where
        N: NetworkPort,
        C: Clock,
        I: Indicator,
        E: EventSink,
    {
        indicator.set_level(LEVEL_WAITING);
        if let Err(error) = self.restore(sink) {
            warn!("store unavailable at boot: {}", error);
            sink.emit(&AppEvent::StoreUnavailable { error });
        }
        self.link.mark_configured();
        self.evaluate_link(net, clock, indicator, sink)
    }

    fn restore<E: EventSink>(&mut self, sink: &mut E) -> Result<()> {
        let from_store = self.store.load_identity(&mut self.identity)?;
        sink.emit(&AppEvent::IdentityLoaded { from_store });
        if from_store {
            for ctrl in &mut self.controllers {
                self.store.load_controller(ctrl)?;
            }
        } else {
            info!("first boot: persisting factory identity");
            self.store.save_identity(&mut self.identity)?;
        }
        Ok(())
    }

    /// Re-run the join decision against the current identity.
    pub fn evaluate_link<N, C, I, E>(
        &mut self,
        net: &mut N,
        clock: &mut C,
        indicator: &mut I,
        sink: &mut E,
    ) -> Result<LinkState>
    where
        N: NetworkPort,
        C: Clock,
        I: Indicator,
        E: EventSink,
    {
        let state = self.link.evaluate(&self.identity, net, clock, indicator)?;
        sink.emit(&AppEvent::LinkSettled(state));
        Ok(state)
    }

    /// Periodic work: drive outputs, then flush deferred controller saves.
    pub fn tick<A: Actuator, E: EventSink>(&mut self, actuator: &mut A, sink: &mut E, now_ms: u64) -> Result<()> {
        for ctrl in &mut self.controllers {
            actuator.apply(ctrl, now_ms);
            if ctrl.is_dirty() && ctrl.save_allowed(now_ms) {
                Self::persist(&mut self.store, ctrl, sink, now_ms)?;
            }
        }
        Ok(())
    }

    /// Fill the store with 0xFF. The next boot starts from factory defaults.
    pub fn factory_reset(&mut self) -> Result<()> {
        self.store.reset()?;
        self.identity.configured = false;
        warn!("factory reset: store erased");
        Ok(())
    }

    // ── Command dispatch ──────────────────────────────────────

    /// Handle one command. Returns the number of reply bytes written to
    /// `reply` (0 = nothing to send).
    ///
    /// Unknown codes and payloads that do not address a known controller
    /// produce an empty reply, never an error. Errors are store failures
    /// or a `reply` buffer too small for the answer.
    pub fn dispatch<F, E>(
        &mut self,
        code: u8,
        payload: &[u8],
        reply: &mut [u8],
        updater: &mut F,
        sink: &mut E,
        now_ms: u64,
    ) -> Result<usize>
    where
        F: FirmwareUpdater,
        E: EventSink,
    {
        let command = match Command::try_from(code) {
            Ok(c) => c,
            Err(e) => {
                warn!("dispatch: {}", e);
                return Ok(0);
            }
        };
        debug!("dispatch: {:?} with {} payload bytes", command, payload.len());

        let len = match command {
            Command::Discover => id_codec::encode_status(&self.identity, reply)?,
            Command::SetConfiguration => self.set_configuration(payload, reply, updater, sink)?,
            Command::SetDeviceName
            | Command::SetNetwork
            | Command::ForceSelfHosting
            | Command::SetDeviceLocation
            | Command::FirmwareUpdate => self.identity_command(command, payload, reply, updater, sink)?,
            Command::GetCapability => self.get_capability(payload, reply)?,
            Command::SetCapability => self.set_capability(payload, reply, sink, now_ms)?,
            Command::GetAllCapabilities => self.get_all(payload, reply)?,
            Command::SetAllCapabilities => self.set_all(payload, reply, sink, now_ms)?,
        };
        sink.emit(&AppEvent::CommandHandled { command, reply_len: len });
        Ok(len)
    }

    fn set_configuration<F: FirmwareUpdater, E: EventSink>(
        &mut self,
        payload: &[u8],
        reply: &mut [u8],
        updater: &mut F,
        sink: &mut E,
    ) -> Result<usize> {
        let Some((&config_type, rest)) = payload.split_first() else {
            warn!("set configuration: empty payload");
            return Ok(0);
        };
        if config_type == 0 {
            let fields = id_codec::decode_record(&mut self.identity, rest);
            info!("set configuration: {} identity fields replaced", fields);
            return self.finish_identity(None, reply, sink);
        }
        match Command::try_from(config_type) {
            Ok(cmd) if cmd.is_identity() => self.identity_command(cmd, rest, reply, updater, sink),
            _ => {
                warn!("set configuration: unsupported type {}", config_type);
                Ok(0)
            }
        }
    }

    fn identity_command<F: FirmwareUpdater, E: EventSink>(
        &mut self,
        command: Command,
        payload: &[u8],
        reply: &mut [u8],
        updater: &mut F,
        sink: &mut E,
    ) -> Result<usize> {
        let mut report = None;
        match command {
            Command::SetDeviceName => {
                self.identity.device_name = NameStr::from_bytes(payload);
                info!("device name set to '{}'", self.identity.device_name);
            }
            Command::SetNetwork => {
                let mut r = ByteReader::new(payload);
                let ssid = r.take(SSID_CAPACITY).unwrap_or_else(|| r.rest());
                let key = r.take(SSID_CAPACITY).unwrap_or_else(|| r.rest());
                self.identity.network_ssid = SsidStr::from_bytes(ssid);
                self.identity.network_key = SsidStr::from_bytes(key);
                info!("network set to '{}'", self.identity.network_ssid);
            }
            Command::ForceSelfHosting => {
                self.identity.clear_credentials();
                info!("network credentials cleared");
            }
            Command::SetDeviceLocation => {
                self.identity.device_location = NameStr::from_bytes(payload);
                info!("device location set to '{}'", self.identity.device_location);
            }
            Command::FirmwareUpdate => {
                let r = self.firmware_update(payload, updater);
                sink.emit(&AppEvent::FirmwareResult {
                    outcome: r.outcome,
                    error_code: r.error_code,
                });
                report = Some(r);
            }
            other => {
                warn!("{:?} is not an identity command", other);
                return Ok(0);
            }
        }
        self.finish_identity(report.as_ref(), reply, sink)
    }

    /// `[reboot:1][location_len:2][location]`; the length is clamped to
    /// the bytes present.
    fn firmware_update<F: FirmwareUpdater>(&mut self, payload: &[u8], updater: &mut F) -> FirmwareReport {
        let mut r = ByteReader::new(payload);
        let reboot = r.u8().unwrap_or(0) != 0;
        let declared = r.u16().unwrap_or(0) as usize;
        let n = declared.min(r.remaining());
        if n < declared {
            debug!("firmware: location length {} clamped to {}", declared, n);
        }
        let bytes = r.take(n).unwrap_or_default();
        match core::str::from_utf8(bytes).map(|s| s.trim_end_matches('\0').trim()) {
            Ok(location) if !location.is_empty() => {
                updater.update(location, self.identity.firmware_version.as_str(), reboot)
            }
            _ => {
                warn!("firmware: no usable location in request");
                FirmwareReport::new(UpdateOutcome::Failed, BAD_LOCATION_CODE, "Invalid location")
            }
        }
    }

    /// Persist the identity and answer `[outcome][descriptor]`.
    fn finish_identity<E: EventSink>(
        &mut self,
        report: Option<&FirmwareReport>,
        reply: &mut [u8],
        sink: &mut E,
    ) -> Result<usize> {
        self.store.save_identity(&mut self.identity)?;
        sink.emit(&AppEvent::IdentitySaved);
        Ok(encode_identity_reply(report, reply)?)
    }

    fn get_capability(&self, payload: &[u8], reply: &mut [u8]) -> Result<usize> {
        let mut r = ByteReader::new(payload);
        let (Some(pin), Some(name)) = (r.u8(), r.fixed::<NAME_CAPACITY>()) else {
            return Ok(0);
        };
        let Some(ctrl) = self.controller(pin) else {
            debug!("get capability: no controller on pin {}", pin);
            return Ok(0);
        };
        Ok(ctrl_codec::encode_single(ctrl, name.as_str(), reply)?.unwrap_or(0))
    }

    fn set_capability<E: EventSink>(&mut self, payload: &[u8], reply: &mut [u8], sink: &mut E, now_ms: u64) -> Result<usize> {
        let Some(&pin) = payload.first() else {
            return Ok(0);
        };
        let Some(status) = reply.first_mut() else {
            return Err(CodecError::BufferTooSmall { needed: 1, available: 0 }.into());
        };
        *status = 0;
        if let Some(ctrl) = self.controllers.iter_mut().find(|c| c.pin() == pin) {
            let outcome = ctrl_codec::decode_values(ctrl, payload);
            Self::persist(&mut self.store, ctrl, sink, now_ms)?;
            let accepted = matches!(outcome, DecodeOutcome::Applied { entries, accepted } if entries > 0 && entries == accepted);
            *status = u8::from(accepted);
        } else {
            debug!("set capability: no controller on pin {}", pin);
        }
        Ok(1)
    }

    fn get_all(&self, payload: &[u8], reply: &mut [u8]) -> Result<usize> {
        let Some(ctrl) = payload.first().and_then(|&pin| self.controller(pin)) else {
            return Ok(0);
        };
        Ok(ctrl_codec::encode_full(ctrl, reply)?)
    }

    fn set_all<E: EventSink>(&mut self, payload: &[u8], reply: &mut [u8], sink: &mut E, now_ms: u64) -> Result<usize> {
        let Some(&pin) = payload.first() else {
            return Ok(0);
        };
        let Some(ctrl) = self.controllers.iter_mut().find(|c| c.pin() == pin) else {
            debug!("set all: no controller on pin {}", pin);
            return Ok(0);
        };
        let outcome = ctrl_codec::decode_values(ctrl, payload);
        debug!("set all: pin {} {:?}", pin, outcome);
        Self::persist(&mut self.store, ctrl, sink, now_ms)?;
        Ok(ctrl_codec::encode_full(ctrl, reply)?)
    }

    fn persist<E: EventSink>(store: &mut StoreManager<S>, ctrl: &mut Controller, sink: &mut E, now_ms: u64) -> Result<()> {
        if !ctrl.is_dirty() {
            return Ok(());
        }
        let pin = ctrl.pin();
        match store.save_controller(ctrl, now_ms)? {
            SaveOutcome::Written => sink.emit(&AppEvent::ControllerSaved { pin }),
            SaveOutcome::Deferred => sink.emit(&AppEvent::ControllerSaveDeferred { pin }),
            SaveOutcome::NotStored => {}
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn controllers(&self) -> &[Controller] {
        &self.controllers
    }

    pub fn controller(&self, pin: u8) -> Option<&Controller> {
        self.controllers.iter().find(|c| c.pin() == pin)
    }

    /// Local changes made here are persisted by the next [`tick`](Self::tick).
    pub fn controller_mut(&mut self, pin: u8) -> Option<&mut Controller> {
        self.controllers.iter_mut().find(|c| c.pin() == pin)
    }

    pub fn link_state(&self) -> LinkState {
        self.link.state()
    }

    pub fn self_host_ssid(&self) -> Option<&str> {
        self.link.self_host_ssid()
    }

    pub fn store(&self) -> &S {
        self.store.store()
    }

    pub fn store_mut(&mut self) -> &mut S {
        self.store.store_mut()
    }

    /// JSON snapshot for diagnostics. The network key is omitted.
    pub fn status_json(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct Status<'a> {
            identity: &'a DeviceIdentity,
            link: LinkState,
            controllers: &'a [Controller],
        }
        serde_json::to_string(&Status {
            identity: &self.identity,
            link: self.link.state(),
            controllers: &self.controllers,
        })
    }
}

// ───────────────────────────────────────────────────────────────
// Identity reply
// ───────────────────────────────────────────────────────────────

/// Copies as much as fits. `write_str` always returns `Ok`, so overflow is
/// silent truncation rather than an error.
struct Truncating<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl fmt::Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let n = s.len().min(self.buf.len() - self.len);
        self.buf[self.len..self.len + n].copy_from_slice(&s.as_bytes()[..n]);
        self.len += n;
        Ok(())
    }
}

fn encode_identity_reply(report: Option<&FirmwareReport>, reply: &mut [u8]) -> core::result::Result<usize, CodecError> {
    let Some((outcome, descriptor)) = reply.split_first_mut() else {
        return Err(CodecError::BufferTooSmall { needed: 1, available: 0 });
    };
    let Some(report) = report else {
        *outcome = NO_OUTCOME;
        return Ok(1);
    };
    *outcome = report.outcome.code();
    let cap = descriptor.len().min(ERROR_DESCRIPTOR_CAPACITY);
    let mut w = Truncating {
        buf: &mut descriptor[..cap],
        len: 0,
    };
    // Infallible: `Truncating` never reports an error.
    write!(w, "{}, code: {}", report.message, report.error_code).ok();
    Ok(1 + w.len)
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
