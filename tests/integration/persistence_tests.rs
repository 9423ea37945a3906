//! Identity and controller persistence across simulated reboots.

use rcs_controller::app::events::AppEvent;
use rcs_controller::app::service::DeviceService;
use rcs_controller::config::{FactoryDefaults, SAVE_DEBOUNCE_MS, STORE_CAPACITY};
use rcs_controller::connectivity::LinkState;
use rcs_controller::error::{Error, StoreError};

use crate::mock_hw::{
    LAMP_ADDR, LAMP_PIN, MAC, MockActuator, MockClock, MockIndicator, MockNet, MockStore, MockUpdater,
    RecordingSink, lamp, partial,
};

fn boot(store: MockStore) -> (DeviceService<MockStore>, RecordingSink) {
    let mut svc = DeviceService::new(&FactoryDefaults::named("Lamp", "Hall"), MAC, [lamp()], store).unwrap();
    let mut sink = RecordingSink::default();
    svc.start(
        &mut MockNet::joining_after(0),
        &mut MockClock::default(),
        &mut MockIndicator::default(),
        &mut sink,
    )
    .unwrap();
    (svc, sink)
}

fn reboot(svc: DeviceService<MockStore>) -> (DeviceService<MockStore>, RecordingSink) {
    let cells = svc.store().cells.clone();
    let mut store = MockStore::new(STORE_CAPACITY);
    store.cells = cells;
    boot(store)
}

fn send(svc: &mut DeviceService<MockStore>, code: u8, payload: &[u8], now: u64) -> Vec<u8> {
    let mut reply = [0u8; 256];
    let n = svc
        .dispatch(code, payload, &mut reply, &mut MockUpdater::default(), &mut RecordingSink::default(), now)
        .unwrap();
    reply[..n].to_vec()
}

#[test]
fn first_boot_writes_defaults_once() {
    let (svc, sink) = boot(MockStore::new(STORE_CAPACITY));
    assert_eq!(svc.store().cells[0], 1);
    assert_eq!(&svc.store().cells[1 + 48..1 + 52], b"Lamp");
    assert!(sink.events.contains(&AppEvent::IdentityLoaded { from_store: false }));

    let (again, sink) = reboot(svc);
    assert!(sink.events.contains(&AppEvent::IdentityLoaded { from_store: true }));
    assert_eq!(again.store().commits, 0);
}

#[test]
fn identity_edits_survive_reboot() {
    let (mut svc, _) = boot(MockStore::new(STORE_CAPACITY));
    send(&mut svc, 6, b"Bedroom", 0);
    send(&mut svc, 9, b"Upstairs", 0);

    let (again, _) = reboot(svc);
    assert_eq!(again.identity().device_name, "Bedroom");
    assert_eq!(again.identity().device_location, "Upstairs");
}

#[test]
fn capability_values_survive_reboot() {
    let (mut svc, _) = boot(MockStore::new(STORE_CAPACITY));
    assert_eq!(send(&mut svc, 16, &partial(LAMP_PIN, &[("bright", 640), ("warm", 10)]), 0), vec![1]);
    assert_eq!(svc.store().cells[LAMP_ADDR as usize], LAMP_PIN);

    let (again, _) = reboot(svc);
    let c = again.controller(LAMP_PIN).unwrap();
    assert_eq!(c.get("bright"), Some(640));
    assert_eq!(c.get("warm"), Some(10));
}

#[test]
fn burst_of_updates_costs_one_commit_per_window() {
    let (mut svc, _) = boot(MockStore::new(STORE_CAPACITY));
    let base = svc.store().commits;
    for step in 0..20u16 {
        send(&mut svc, 16, &partial(LAMP_PIN, &[("bright", step)]), u64::from(step) * 100);
    }
    assert_eq!(svc.store().commits, base + 1);
    assert!(svc.controller(LAMP_PIN).unwrap().is_dirty());

    let mut sink = RecordingSink::default();
    let mut act = MockActuator::default();
    svc.tick(&mut act, &mut sink, SAVE_DEBOUNCE_MS).unwrap();
    assert_eq!(svc.store().commits, base + 2);
    assert_eq!(sink.events, vec![AppEvent::ControllerSaved { pin: LAMP_PIN }]);
    assert_eq!(act.applied, vec![(LAMP_PIN, vec![19, 128])]);

    let (again, _) = reboot(svc);
    assert_eq!(again.controller(LAMP_PIN).unwrap().get("bright"), Some(19));
}

#[test]
fn tick_without_changes_does_not_write() {
    let (mut svc, _) = boot(MockStore::new(STORE_CAPACITY));
    let base = svc.store().commits;
    let mut act = MockActuator::default();
    for t in 0..5 {
        svc.tick(&mut act, &mut RecordingSink::default(), t * SAVE_DEBOUNCE_MS).unwrap();
    }
    assert_eq!(svc.store().commits, base);
    assert_eq!(act.applied.len(), 5);
}

#[test]
fn store_failure_surfaces_and_session_closes() {
    let (mut svc, _) = boot(MockStore::new(STORE_CAPACITY));
    svc.store_mut().fail_commit = true;
    let mut reply = [0u8; 8];
    let res = svc.dispatch(
        6,
        b"Broken",
        &mut reply,
        &mut MockUpdater::default(),
        &mut RecordingSink::default(),
        0,
    );
    assert!(matches!(res, Err(Error::Store(StoreError::Io))));
    assert_eq!(svc.store().sessions_open, 0);
}

#[test]
fn unreadable_store_still_self_hosts() {
    let mut store = MockStore::new(STORE_CAPACITY);
    store.fail_begin = true;
    let mut svc = DeviceService::new(&FactoryDefaults::default(), MAC, [lamp()], store).unwrap();
    let mut net = MockNet::unreachable();
    let mut sink = RecordingSink::default();
    let res = svc.start(&mut net, &mut MockClock::default(), &mut MockIndicator::default(), &mut sink);

    assert_eq!(res, Ok(LinkState::SelfHosting));
    assert_eq!(svc.link_state(), LinkState::SelfHosting);
    assert!(net.access_point().is_some());
    assert!(sink.events.contains(&AppEvent::StoreUnavailable {
        error: Error::Store(StoreError::Io)
    }));
    assert_eq!(svc.store().sessions_open, 0);
}

#[test]
fn failed_first_boot_write_keeps_factory_identity() {
    let mut store = MockStore::new(STORE_CAPACITY);
    store.fail_commit = true;
    let mut svc = DeviceService::new(&FactoryDefaults::named("Lamp", "Hall"), MAC, [lamp()], store).unwrap();
    let mut net = MockNet::unreachable();
    let mut sink = RecordingSink::default();
    let res = svc.start(&mut net, &mut MockClock::default(), &mut MockIndicator::default(), &mut sink);

    assert_eq!(res, Ok(LinkState::SelfHosting));
    assert_eq!(svc.identity().device_name, "Lamp");
    assert!(!svc.identity().configured);
    assert_eq!(svc.store().commits, 0);
    assert!(sink.events.contains(&AppEvent::IdentityLoaded { from_store: false }));
    assert!(sink.events.contains(&AppEvent::StoreUnavailable {
        error: Error::Store(StoreError::Io)
    }));
    assert_eq!(sink.events.last(), Some(&AppEvent::LinkSettled(LinkState::SelfHosting)));
}

#[test]
fn factory_reset_returns_to_defaults_on_next_boot() {
    let (mut svc, _) = boot(MockStore::new(STORE_CAPACITY));
    send(&mut svc, 6, b"Renamed", 0);
    svc.factory_reset().unwrap();
    assert!(svc.store().cells.iter().all(|&b| b == 0xFF));

    let (again, sink) = reboot(svc);
    assert!(sink.events.contains(&AppEvent::IdentityLoaded { from_store: false }));
    assert_eq!(again.identity().device_name, "Lamp");
}
