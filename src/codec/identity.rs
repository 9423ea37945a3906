//! Identity / network records.
//!
//! ```text
//! store (after the flag byte) : [ssid:24][key:24][name:16][location:16]
//! outbound status (discover)  : [configured:1][mac:6][ssid:24][key:24]
//!                               [name:16][location:16][firmware:16]
//! ```
//!
//! The inbound full-configuration payload uses the stored layout.

use super::{ByteReader, ByteWriter};
use crate::bounded::{NameStr, SsidStr};
use crate::config::{MAC_LEN, NAME_CAPACITY, SSID_CAPACITY};
use crate::error::CodecError;
use crate::identity::DeviceIdentity;

/// Stored record size (flag byte excluded).
pub const STORED_LEN: usize = 2 * SsidStr::CAPACITY + 2 * NameStr::CAPACITY;

/// Outbound status payload size.
pub const STATUS_LEN: usize = 1 + MAC_LEN + STORED_LEN + NameStr::CAPACITY;

/// Encode the stored record. Returns bytes written.
pub fn encode_record(id: &DeviceIdentity, buf: &mut [u8]) -> Result<usize, CodecError> {
    let mut w = ByteWriter::new(buf);
    w.reserve(STORED_LEN)?;
    put_record(&mut w, id)?;
    Ok(w.finish())
}

/// Replace the stored fields of `id` from `buf`.
///
/// Fields are applied in order; a buffer that ends early leaves the
/// remaining fields untouched. Returns the number of fields applied.
pub fn decode_record(id: &mut DeviceIdentity, buf: &[u8]) -> usize {
    let mut r = ByteReader::new(buf);
    let Some(ssid) = r.fixed::<SSID_CAPACITY>() else { return 0 };
    id.network_ssid = ssid;
    let Some(key) = r.fixed::<SSID_CAPACITY>() else { return 1 };
    id.network_key = key;
    let Some(name) = r.fixed::<NAME_CAPACITY>() else { return 2 };
    id.device_name = name;
    let Some(location) = r.fixed::<NAME_CAPACITY>() else { return 3 };
    id.device_location = location;
    4
}

/// Encode the outbound status payload answered to discovery.
pub fn encode_status(id: &DeviceIdentity, buf: &mut [u8]) -> Result<usize, CodecError> {
    let mut w = ByteWriter::new(buf);
    w.reserve(STATUS_LEN)?;
    w.put_u8(u8::from(id.configured))?;
    w.put_bytes(&id.mac)?;
    put_record(&mut w, id)?;
    w.put_fixed(&id.firmware_version)?;
    Ok(w.finish())
}

fn put_record(w: &mut ByteWriter<'_>, id: &DeviceIdentity) -> Result<(), CodecError> {
    w.put_fixed(&id.network_ssid)?;
    w.put_fixed(&id.network_key)?;
    w.put_fixed(&id.device_name)?;
    w.put_fixed(&id.device_location)
}
