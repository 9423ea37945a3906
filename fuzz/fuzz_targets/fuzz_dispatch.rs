//! Fuzz target: `DeviceService::dispatch`
//!
//! The first input byte selects the command, the rest is the payload. The
//! reply must fit the buffer and the store must stay within its layout.
//!
//! cargo fuzz run fuzz_dispatch

#![no_main]

use libfuzzer_sys::fuzz_target;
use rcs_controller::adapters::eeprom::EepromAdapter;
use rcs_controller::adapters::http_update::HttpUpdater;
use rcs_controller::app::events::AppEvent;
use rcs_controller::app::ports::EventSink;
use rcs_controller::app::service::DeviceService;
use rcs_controller::capability::{Capability, Controller};
use rcs_controller::config::{FactoryDefaults, STORE_CAPACITY};

struct Discard;
impl EventSink for Discard {
    fn emit(&mut self, _: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let Some((&code, payload)) = data.split_first() else {
        return;
    };
    let lamp = Controller::new(
        12,
        "Lamp",
        200,
        &[
            Capability::new("bright", 0, 1023, 0).unwrap(),
            Capability::new("warm", 0, 255, 128).unwrap(),
        ],
    )
    .unwrap();
    let store = EepromAdapter::new(STORE_CAPACITY).unwrap();
    let mut svc = DeviceService::new(&FactoryDefaults::default(), [0; 6], [lamp], store).unwrap();

    let mut reply = [0u8; 512];
    let n = svc
        .dispatch(code, payload, &mut reply, &mut HttpUpdater::new(), &mut Discard, 0)
        .unwrap();
    assert!(n <= reply.len());
    assert!(svc.identity().device_name.len() < 16);
    assert!(svc.identity().network_ssid.len() < 24);
});
