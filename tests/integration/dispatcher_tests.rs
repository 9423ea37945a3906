//! Command dispatch: reply layouts and side effects for every command code.

use rcs_controller::app::commands::NO_OUTCOME;
use rcs_controller::app::events::AppEvent;
use rcs_controller::app::ports::UpdateOutcome;
use rcs_controller::app::service::{BAD_LOCATION_CODE, DeviceService};
use rcs_controller::config::{ERROR_DESCRIPTOR_CAPACITY, FIRMWARE_VERSION, FactoryDefaults, STORE_CAPACITY};
use rcs_controller::error::{CodecError, Error};

use crate::mock_hw::{
    LAMP_PIN, MAC, MockClock, MockIndicator, MockNet, MockStore, MockUpdater, RecordingSink, lamp, name16,
    partial,
};

struct Rig {
    svc: DeviceService<MockStore>,
    fw: MockUpdater,
    sink: RecordingSink,
}

impl Rig {
    fn new() -> Self {
        let mut svc =
            DeviceService::new(&FactoryDefaults::named("Lamp", "Hall"), MAC, [lamp()], MockStore::new(STORE_CAPACITY))
                .unwrap();
        svc.start(
            &mut MockNet::joining_after(0),
            &mut MockClock::default(),
            &mut MockIndicator::default(),
            &mut RecordingSink::default(),
        )
        .unwrap();
        Self {
            svc,
            fw: MockUpdater::default(),
            sink: RecordingSink::default(),
        }
    }

    fn send(&mut self, code: u8, payload: &[u8]) -> Vec<u8> {
        let mut reply = [0u8; 512];
        let n = self
            .svc
            .dispatch(code, payload, &mut reply, &mut self.fw, &mut self.sink, 0)
            .unwrap();
        reply[..n].to_vec()
    }
}

fn firmware_payload(reboot: bool, location: &str) -> Vec<u8> {
    let mut p = vec![u8::from(reboot)];
    p.extend_from_slice(&(location.len() as u16).to_le_bytes());
    p.extend_from_slice(location.as_bytes());
    p
}

// ── Discovery ─────────────────────────────────────────────────

#[test]
fn discover_reports_full_state() {
    let mut rig = Rig::new();
    let r = rig.send(1, &[]);
    assert_eq!(r.len(), 103);
    assert_eq!(r[0], 1);
    assert_eq!(&r[1..7], &MAC);
    assert_eq!(&r[55..71], &name16("Lamp"));
    assert_eq!(&r[71..87], &name16("Hall"));
    assert_eq!(&r[87..87 + FIRMWARE_VERSION.len().min(15)], &FIRMWARE_VERSION.as_bytes()[..FIRMWARE_VERSION.len().min(15)]);
    assert!(rig.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::CommandHandled { reply_len: 103, .. }
    )));
}

#[test]
fn reserved_and_unknown_codes_reply_nothing() {
    let mut rig = Rig::new();
    for code in [0u8, 2, 3, 4, 10, 11, 12, 13, 14, 20, 255] {
        assert!(rig.send(code, &[1, 2, 3]).is_empty(), "code {}", code);
    }
    assert!(rig.sink.events.is_empty());
}

// ── Identity commands ─────────────────────────────────────────

#[test]
fn identity_commands_reply_no_outcome_and_persist() {
    let mut rig = Rig::new();
    let mut net = name16("").to_vec();
    net.extend_from_slice(&[0u8; 8]);
    net[..6].copy_from_slice(b"Office");
    net.extend_from_slice(b"correct-horse\0\0\0\0\0\0\0\0\0\0\0");

    for (code, payload) in [(6u8, b"Desk".to_vec()), (9, b"Floor 2".to_vec()), (7, net)] {
        assert_eq!(rig.send(code, &payload), vec![NO_OUTCOME], "code {}", code);
    }
    let id = rig.svc.identity();
    assert_eq!(id.device_name, "Desk");
    assert_eq!(id.device_location, "Floor 2");
    assert_eq!(id.network_ssid, "Office");
    assert_eq!(id.network_key, "correct-horse");
    assert_eq!(rig.sink.count(|e| *e == AppEvent::IdentitySaved), 3);
    assert_eq!(&rig.svc.store().cells[1..7], b"Office");
}

#[test]
fn long_names_are_truncated_and_terminated() {
    let mut rig = Rig::new();
    rig.send(6, b"An extremely long device name");
    assert_eq!(rig.svc.identity().device_name.len(), 15);
    let status = rig.send(1, &[]);
    assert_eq!(status[55 + 15], 0);
}

#[test]
fn short_network_payload_uses_what_is_present() {
    let mut rig = Rig::new();
    rig.send(7, b"Tiny");
    assert_eq!(rig.svc.identity().network_ssid, "Tiny");
    assert!(rig.svc.identity().network_key.is_empty());
}

#[test]
fn set_configuration_type_zero_replaces_all_fields() {
    let mut rig = Rig::new();
    let mut p = vec![0u8];
    let mut ssid = [0u8; 24];
    ssid[..3].copy_from_slice(b"Lab");
    let mut key = [0u8; 24];
    key[..10].copy_from_slice(b"0123456789");
    p.extend_from_slice(&ssid);
    p.extend_from_slice(&key);
    p.extend_from_slice(&name16("Bench"));
    p.extend_from_slice(&name16("Basement"));

    assert_eq!(rig.send(5, &p), vec![NO_OUTCOME]);
    let id = rig.svc.identity();
    assert_eq!(id.network_ssid, "Lab");
    assert_eq!(id.network_key, "0123456789");
    assert_eq!(id.device_name, "Bench");
    assert_eq!(id.device_location, "Basement");
}

#[test]
fn set_configuration_forwards_identity_sub_commands() {
    let mut rig = Rig::new();
    let mut p = vec![6u8];
    p.extend_from_slice(b"Porch");
    assert_eq!(rig.send(5, &p), vec![NO_OUTCOME]);
    assert_eq!(rig.svc.identity().device_name, "Porch");

    assert!(rig.send(5, &[16, LAMP_PIN]).is_empty());
    assert!(rig.send(5, &[]).is_empty());
}

// ── Firmware replacement ──────────────────────────────────────

#[test]
fn firmware_request_is_forwarded_with_current_version() {
    let mut rig = Rig::new();
    rig.fw = MockUpdater::answering(UpdateOutcome::Applied, 0, "Update ok");
    let r = rig.send(19, &firmware_payload(true, "http://10.0.0.2/fw.bin"));

    assert_eq!(r[0], UpdateOutcome::Applied.code());
    assert_eq!(&r[1..], b"Update ok, code: 0");
    let req = &rig.fw.requests[0];
    assert_eq!(req.location, "http://10.0.0.2/fw.bin");
    assert!(req.reboot);
    assert_eq!(req.current_version, rig.svc.identity().firmware_version.as_str());
    assert!(rig.sink.events.contains(&AppEvent::FirmwareResult {
        outcome: UpdateOutcome::Applied,
        error_code: 0
    }));
    assert!(rig.sink.events.contains(&AppEvent::IdentitySaved));
}

#[test]
fn firmware_failure_descriptor() {
    let mut rig = Rig::new();
    rig.fw = MockUpdater::answering(UpdateOutcome::Failed, -102, "File Not Found (404)");
    let r = rig.send(19, &firmware_payload(false, "http://10.0.0.2/missing.bin"));
    assert_eq!(r[0], 0);
    assert_eq!(&r[1..], b"File Not Found (404), code: -102");
}

#[test]
fn firmware_no_updates() {
    let mut rig = Rig::new();
    let r = rig.send(19, &firmware_payload(false, "http://10.0.0.2/fw.bin"));
    assert_eq!(r[0], UpdateOutcome::NoUpdates.code());
}

#[test]
fn firmware_location_length_is_clamped() {
    let mut rig = Rig::new();
    let mut p = firmware_payload(false, "http://h/f.bin");
    p[1] = 0xFF;
    p[2] = 0x7F;
    rig.send(19, &p);
    assert_eq!(rig.fw.requests[0].location, "http://h/f.bin");
}

#[test]
fn firmware_without_location_fails_without_fetching() {
    let mut rig = Rig::new();
    let r = rig.send(19, &[0]);
    assert_eq!(r[0], UpdateOutcome::Failed.code());
    assert!(rig.fw.requests.is_empty());
    let descriptor = core::str::from_utf8(&r[1..]).unwrap();
    assert!(descriptor.ends_with(&format!("code: {}", BAD_LOCATION_CODE)));
}

#[test]
fn firmware_descriptor_is_bounded() {
    let mut rig = Rig::new();
    let long = "x".repeat(64);
    rig.fw = MockUpdater::answering(UpdateOutcome::Failed, -1, &long);
    let r = rig.send(19, &firmware_payload(false, "http://h/f.bin"));
    assert!(r.len() - 1 <= ERROR_DESCRIPTOR_CAPACITY);
}

// ── Capability commands ───────────────────────────────────────

#[test]
fn get_single_capability() {
    let mut rig = Rig::new();
    let mut q = vec![LAMP_PIN];
    q.extend_from_slice(&name16("warm"));
    let r = rig.send(15, &q);
    assert_eq!(r.len(), 2 + 16 + 22);
    assert_eq!(r[0], LAMP_PIN);
    assert_eq!(r[1], 1);
    assert_eq!(&r[2..18], &name16("Lamp"));
    assert_eq!(&r[18..34], &name16("warm"));
    assert_eq!(&r[34..40], &[0, 0, 255, 0, 128, 0]);
}

#[test]
fn get_single_unknown_is_empty() {
    let mut rig = Rig::new();
    let mut q = vec![LAMP_PIN];
    q.extend_from_slice(&name16("hue"));
    assert!(rig.send(15, &q).is_empty());
    q[0] = 99;
    assert!(rig.send(15, &q).is_empty());
    assert!(rig.send(15, &[LAMP_PIN]).is_empty());
}

#[test]
fn set_single_reports_acceptance() {
    let mut rig = Rig::new();
    assert_eq!(rig.send(16, &partial(LAMP_PIN, &[("bright", 1023)])), vec![1]);
    assert_eq!(rig.send(16, &partial(LAMP_PIN, &[("bright", 1024)])), vec![0]);
    assert_eq!(rig.send(16, &partial(LAMP_PIN, &[("nope", 1)])), vec![0]);
    assert_eq!(rig.send(16, &partial(LAMP_PIN + 1, &[("bright", 1)])), vec![0]);
    assert_eq!(rig.svc.controller(LAMP_PIN).unwrap().get("bright"), Some(1023));
}

#[test]
fn mixed_batch_applies_valid_entries() {
    let mut rig = Rig::new();
    let r = rig.send(16, &partial(LAMP_PIN, &[("bright", 5000), ("warm", 7)]));
    assert_eq!(r, vec![0]);
    let c = rig.svc.controller(LAMP_PIN).unwrap();
    assert_eq!(c.get("bright"), Some(0));
    assert_eq!(c.get("warm"), Some(7));
}

#[test]
fn truncated_batch_stops_at_buffer_end() {
    let mut rig = Rig::new();
    let mut p = partial(LAMP_PIN, &[("bright", 9), ("warm", 9)]);
    p.truncate(p.len() - 5);
    rig.send(16, &p);
    let c = rig.svc.controller(LAMP_PIN).unwrap();
    assert_eq!(c.get("bright"), Some(9));
    assert_eq!(c.get("warm"), Some(128));
}

#[test]
fn get_all_dumps_every_capability() {
    let mut rig = Rig::new();
    let r = rig.send(17, &[LAMP_PIN]);
    assert_eq!(r.len(), 2 + 16 + 2 * 22);
    assert_eq!(r[1], 2);
    assert_eq!(&r[18..34], &name16("bright"));
    assert_eq!(&r[34..40], &[0, 0, 0xFF, 0x03, 0, 0]);
    assert!(rig.send(17, &[LAMP_PIN + 1]).is_empty());
    assert!(rig.send(17, &[]).is_empty());
}

#[test]
fn set_all_answers_with_updated_dump() {
    let mut rig = Rig::new();
    let r = rig.send(18, &partial(LAMP_PIN, &[("warm", 200)]));
    assert_eq!(r.len(), 2 + 16 + 2 * 22);
    let warm = 18 + 22;
    assert_eq!(&r[warm..warm + 16], &name16("warm"));
    assert_eq!(u16::from_le_bytes([r[warm + 20], r[warm + 21]]), 200);
    assert!(rig.sink.events.contains(&AppEvent::ControllerSaved { pin: LAMP_PIN }));
}

#[test]
fn small_reply_buffer_is_an_error() {
    let mut rig = Rig::new();
    let mut reply = [0u8; 10];
    let res = rig.svc.dispatch(
        1,
        &[],
        &mut reply,
        &mut rig.fw,
        &mut rig.sink,
        0,
    );
    assert!(matches!(res, Err(Error::Codec(CodecError::BufferTooSmall { .. }))));
}
