//! Fuzz target: `codec::controller::decode_values`
//!
//! Feeds arbitrary bytes as a stored/inbound value record and asserts that
//! decoding never panics, never reports more entries than the buffer can
//! hold, and never leaves a capability outside its bounds.
//!
//! cargo fuzz run fuzz_controller_record

#![no_main]

use libfuzzer_sys::fuzz_target;
use rcs_controller::capability::{Capability, Controller};
use rcs_controller::codec::controller::{DecodeOutcome, decode_values, stored_len};

fuzz_target!(|data: &[u8]| {
    let caps = [
        Capability::new("red", 0, 255, 0).unwrap(),
        Capability::new("green", 0, 255, 0).unwrap(),
        Capability::new("blue", 10, 20, 15).unwrap(),
    ];
    let mut ctrl = Controller::new(4, "RGB", 100, &caps).unwrap();

    if let DecodeOutcome::Applied { entries, accepted } = decode_values(&mut ctrl, data) {
        assert!(accepted <= entries);
        assert!(entries == 0 || stored_len(entries as usize) <= data.len());
    }
    for cap in ctrl.capabilities() {
        assert!(cap.min() <= cap.value() && cap.value() <= cap.max());
    }
});
