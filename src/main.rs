//! RCS controller firmware entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  EepromAdapter     WifiAdapter     HttpUpdater   SystemClock   │
//! │  (PersistentStore) (NetworkPort)   (Firmware)    (Clock)       │
//! │  PwmIndicator      PwmActuator     LogEventSink                │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            DeviceService (pure logic)                  │    │
//! │  │  identity · capabilities · store · link state          │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  UDP command listener (port 2390) · periodic tick              │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::net::UdpSocket;
use std::time::Duration;

use anyhow::Result;
use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver, config::TimerConfig};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::FromValueType;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::wifi::EspWifi;
use log::{error, info, warn};

use rcs_controller::adapters::device_id;
use rcs_controller::adapters::eeprom::EepromAdapter;
use rcs_controller::adapters::http_update::{self, HttpUpdater};
use rcs_controller::adapters::indicator::PwmIndicator;
use rcs_controller::adapters::log_sink::LogEventSink;
use rcs_controller::adapters::pwm_actuator::PwmActuator;
use rcs_controller::adapters::time::SystemClock;
use rcs_controller::adapters::wifi::WifiAdapter;
use rcs_controller::app::ports::Clock;
use rcs_controller::app::service::DeviceService;
use rcs_controller::capability::{Capability, Controller};
use rcs_controller::config::{COMMAND_PORT, FIRMWARE_VERSION, FactoryDefaults, STORE_CAPACITY};

// ── Device layout ─────────────────────────────────────────────

/// Logical pin of the RGB strip controller.
const RGB_PIN: u8 = 4;
/// Store address of its value record.
const RGB_STORE_ADDR: u16 = 100;
const RGB_CHANNELS: [&str; 3] = ["red", "green", "blue"];

/// `[size:2][command:1]` ahead of every payload.
const HEADER_LEN: usize = 3;
const DATAGRAM_MAX: usize = 512;
const LOOP_PERIOD_MS: u64 = 50;

fn rgb_controller() -> Result<Controller> {
    let mut caps = heapless::Vec::<Capability, 3>::new();
    for name in RGB_CHANNELS {
        caps.push(Capability::new(name, 0, 255, 0)?)
            .map_err(|_| anyhow::anyhow!("capability table full"))?;
    }
    Ok(Controller::new(RGB_PIN, "RGB LED", RGB_STORE_ADDR, &caps)?)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  RCS Controller {}      ║", FIRMWARE_VERSION);
    info!("╚══════════════════════════════════════╝");

    http_update::check_rollback();

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;

    // ── 2. Outputs ────────────────────────────────────────────
    let timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::default().frequency(5.kHz().into()),
    )?;
    let mut indicator = PwmIndicator::new(LedcDriver::new(
        peripherals.ledc.channel0,
        &timer,
        peripherals.pins.gpio2,
    )?);

    let mut actuator: PwmActuator<LedcDriver<'_>, 3> = PwmActuator::new();
    let outputs = [
        LedcDriver::new(peripherals.ledc.channel1, &timer, peripherals.pins.gpio25)?,
        LedcDriver::new(peripherals.ledc.channel2, &timer, peripherals.pins.gpio26)?,
        LedcDriver::new(peripherals.ledc.channel3, &timer, peripherals.pins.gpio27)?,
    ];
    for (name, output) in RGB_CHANNELS.into_iter().zip(outputs) {
        if actuator.bind(RGB_PIN, name, output).is_err() {
            warn!("pwm: no free channel for {}", name);
        }
    }

    // ── 3. Adapters ───────────────────────────────────────────
    let mac = device_id::read_mac();
    info!("MAC {:02X?}", mac);

    let store = EepromAdapter::new(STORE_CAPACITY)?;
    let mut wifi = WifiAdapter::new(EspWifi::new(peripherals.modem, sysloop, None)?);
    let mut clock = SystemClock::new();
    let mut updater = HttpUpdater::new();
    let mut log_sink = LogEventSink::new();

    // ── 4. Application service ────────────────────────────────
    let mut app = DeviceService::new(&FactoryDefaults::default(), mac, [rgb_controller()?], store)?;
    match app.start(&mut wifi, &mut clock, &mut indicator, &mut log_sink) {
        Ok(state) => info!("link settled: {:?}", state),
        Err(e) => error!("startup incomplete: {}", e),
    }
    match app.status_json() {
        Ok(json) => info!("status {}", json),
        Err(e) => warn!("status dump failed: {}", e),
    }

    // ── 5. Command listener ───────────────────────────────────
    let socket = UdpSocket::bind(("0.0.0.0", COMMAND_PORT))?;
    socket.set_read_timeout(Some(Duration::from_millis(LOOP_PERIOD_MS)))?;
    info!("listening on udp/{}", COMMAND_PORT);

    let mut rx = [0u8; DATAGRAM_MAX];
    let mut tx = [0u8; DATAGRAM_MAX];

    loop {
        if let Ok((n, peer)) = socket.recv_from(&mut rx) {
            if n < HEADER_LEN {
                warn!("udp: {} byte datagram from {} dropped", n, peer);
            } else {
                let declared = u16::from_le_bytes([rx[0], rx[1]]) as usize;
                let payload = &rx[HEADER_LEN..n.min(HEADER_LEN + declared)];
                let now = clock.now_ms();
                match app.dispatch(rx[2], payload, &mut tx[HEADER_LEN..], &mut updater, &mut log_sink, now) {
                    Ok(0) => {}
                    Ok(len) => {
                        tx[..2].copy_from_slice(&(len as u16).to_le_bytes());
                        tx[2] = rx[2];
                        if let Err(e) = socket.send_to(&tx[..HEADER_LEN + len], peer) {
                            warn!("udp: reply to {} failed: {}", peer, e);
                        }
                    }
                    Err(e) => error!("command {} failed: {}", rx[2], e),
                }
            }
        }

        if let Err(e) = app.tick(&mut actuator, &mut log_sink, clock.now_ms()) {
            error!("tick: {}", e);
        }
    }
}
