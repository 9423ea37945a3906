//! Controller capability records.
//!
//! ```text
//! store / inbound update : [pin:1][count:1]{ [name:16][value:2] } × count
//! outbound full dump     : [pin:1][count:1][controller_name:16]
//!                          { [name:16][min:2][max:2][value:2] } × count
//! ```
//!
//! Inbound updates never carry bounds or the controller name: a remote
//! client can only change values, and only through the validated
//! [`Controller::set`].

use log::debug;

use super::{ByteReader, ByteWriter};
use crate::bounded::NameStr;
use crate::capability::{Capability, Controller};
use crate::error::CodecError;

const NAME_LEN: usize = NameStr::CAPACITY;
const HEADER_LEN: usize = 2;
const STORED_ENTRY_LEN: usize = NAME_LEN + 2;
const FULL_ENTRY_LEN: usize = NAME_LEN + 6;

/// Result of applying a value record to a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// The leading pin byte names another controller (or is missing); nothing changed.
    OwnerMismatch,
    /// `entries` complete `(name, value)` pairs were read, `accepted` of them
    /// passed validation.
    Applied { entries: u8, accepted: u8 },
}

impl DecodeOutcome {
    /// Every decoded value was accepted.
    pub fn all_accepted(&self) -> bool {
        matches!(self, Self::Applied { entries, accepted } if entries == accepted)
    }
}

/// Size of the stored (and inbound update) form for `count` capabilities.
pub const fn stored_len(count: usize) -> usize {
    HEADER_LEN + count * STORED_ENTRY_LEN
}

/// Size of the outbound full dump for `count` capabilities.
pub const fn full_len(count: usize) -> usize {
    HEADER_LEN + NAME_LEN + count * FULL_ENTRY_LEN
}

/// Encode the stored form. Returns bytes written.
pub fn encode_values(ctrl: &Controller, buf: &mut [u8]) -> Result<usize, CodecError> {
    let mut w = ByteWriter::new(buf);
    w.reserve(stored_len(ctrl.capability_count()))?;
    w.put_u8(ctrl.pin())?;
    w.put_u8(ctrl.capability_count() as u8)?;
    for cap in ctrl.capabilities() {
        w.put_fixed(cap.name())?;
        w.put_u16(cap.value())?;
    }
    Ok(w.finish())
}

/// Apply a stored record or an inbound partial update.
///
/// The pin byte must match `ctrl`; otherwise nothing is touched. The count
/// byte is trusted only as far as the buffer reaches: decoding stops at the
/// first incomplete entry.
pub fn decode_values(ctrl: &mut Controller, buf: &[u8]) -> DecodeOutcome {
    let mut r = ByteReader::new(buf);
    match r.u8() {
        Some(pin) if pin == ctrl.pin() => {}
        other => {
            debug!("controller pin {}: record for pin {:?} ignored", ctrl.pin(), other);
            return DecodeOutcome::OwnerMismatch;
        }
    }
    let count = r.u8().unwrap_or(0);

    let mut entries = 0u8;
    let mut accepted = 0u8;
    for _ in 0..count {
        if r.remaining() < STORED_ENTRY_LEN {
            break;
        }
        let (Some(name), Some(value)) = (r.fixed::<NAME_LEN>(), r.u16()) else {
            break;
        };
        entries += 1;
        if ctrl.set(name.as_str(), value) {
            accepted += 1;
        }
    }
    DecodeOutcome::Applied { entries, accepted }
}

/// Encode the outbound full dump (names, bounds and values).
pub fn encode_full(ctrl: &Controller, buf: &mut [u8]) -> Result<usize, CodecError> {
    let mut w = ByteWriter::new(buf);
    w.reserve(full_len(ctrl.capability_count()))?;
    w.put_u8(ctrl.pin())?;
    w.put_u8(ctrl.capability_count() as u8)?;
    w.put_fixed(ctrl.name())?;
    for cap in ctrl.capabilities() {
        put_full_entry(&mut w, cap)?;
    }
    Ok(w.finish())
}

/// Encode the outbound layout restricted to one capability.
/// Returns `Ok(None)` when the controller has no capability called `name`.
pub fn encode_single(ctrl: &Controller, name: &str, buf: &mut [u8]) -> Result<Option<usize>, CodecError> {
    let Some(cap) = ctrl.find(name) else {
        return Ok(None);
    };
    let mut w = ByteWriter::new(buf);
    w.reserve(full_len(1))?;
    w.put_u8(ctrl.pin())?;
    w.put_u8(1)?;
    w.put_fixed(ctrl.name())?;
    put_full_entry(&mut w, cap)?;
    Ok(Some(w.finish()))
}

fn put_full_entry(w: &mut ByteWriter<'_>, cap: &Capability) -> Result<(), CodecError> {
    w.put_fixed(cap.name())?;
    w.put_u16(cap.min())?;
    w.put_u16(cap.max())?;
    w.put_u16(cap.value())
}
