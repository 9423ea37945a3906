//! Persistent store manager.
//!
//! Maps the identity record and every controller record onto fixed byte
//! ranges of a [`PersistentStore`]:
//!
//! ```text
//! 0        configured flag (1 = configured)
//! 1..81    identity record
//! addr..   controller record, one fixed range per controller (addr != 0)
//! ```
//!
//! Every access runs inside a [`StoreSession`], which releases the store on
//! drop whatever the exit path. Updates that were not committed are lost.

use log::{debug, info, warn};

use crate::app::ports::PersistentStore;
use crate::capability::Controller;
use crate::codec::{controller as ctrl_codec, identity as id_codec};
use crate::config::{CONFIGURED_FLAG_ADDR, IDENTITY_RECORD_ADDR, MAX_CAPABILITIES};
use crate::error::{Error, Result};
use crate::identity::DeviceIdentity;

const CONFIGURED: u8 = 1;

/// First byte available to controller records.
pub const CONTROLLER_REGION_START: usize = IDENTITY_RECORD_ADDR + id_codec::STORED_LEN;

const FILL_CHUNK: usize = 64;

/// Result of a controller save request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Written,
    /// Inside the debounce interval; the controller stays dirty.
    Deferred,
    /// The controller has no store address.
    NotStored,
}

// ───────────────────────────────────────────────────────────────
// Session guard
// ───────────────────────────────────────────────────────────────

/// An open store. Dropping it ends the session.
pub struct StoreSession<'a, S: PersistentStore> {
    store: &'a mut S,
}

impl<'a, S: PersistentStore> StoreSession<'a, S> {
    fn open(store: &'a mut S) -> Result<Self> {
        store.begin()?;
        Ok(Self { store })
    }

    pub fn read(&self, addr: usize, buf: &mut [u8]) -> Result<()> {
        self.store.read(addr, buf).map_err(Error::from)
    }

    pub fn read_u8(&self, addr: usize) -> Result<u8> {
        let mut b = [0u8; 1];
        self.read(addr, &mut b)?;
        Ok(b[0])
    }

    pub fn update(&mut self, addr: usize, data: &[u8]) -> Result<()> {
        self.store.update(addr, data).map_err(Error::from)
    }

    pub fn commit(&mut self) -> Result<()> {
        self.store.commit().map_err(Error::from)
    }
}

impl<S: PersistentStore> Drop for StoreSession<'_, S> {
    fn drop(&mut self) {
        self.store.end();
    }
}

// ───────────────────────────────────────────────────────────────
// Manager
// ───────────────────────────────────────────────────────────────

pub struct StoreManager<S: PersistentStore> {
    store: S,
}

impl<S: PersistentStore> StoreManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    pub fn session(&mut self) -> Result<StoreSession<'_, S>> {
        StoreSession::open(&mut self.store)
    }

    /// Whether the configured flag is set.
    pub fn is_configured(&mut self) -> Result<bool> {
        let s = self.session()?;
        Ok(s.read_u8(CONFIGURED_FLAG_ADDR)? == CONFIGURED)
    }

    // ── Identity ──────────────────────────────────────────────

    /// Replace the stored identity fields of `id` from the store.
    ///
    /// Returns `false` and leaves `id` untouched when the configured flag is
    /// not set.
    pub fn load_identity(&mut self, id: &mut DeviceIdentity) -> Result<bool> {
        let s = self.session()?;
        if s.read_u8(CONFIGURED_FLAG_ADDR)? != CONFIGURED {
            debug!("store: not configured, identity left at defaults");
            return Ok(false);
        }
        let mut buf = [0u8; id_codec::STORED_LEN];
        s.read(IDENTITY_RECORD_ADDR, &mut buf)?;
        id_codec::decode_record(id, &buf);
        id.configured = true;
        info!("store: identity loaded (name '{}')", id.device_name);
        Ok(true)
    }

    /// Set the configured flag and write the identity record.
    pub fn save_identity(&mut self, id: &mut DeviceIdentity) -> Result<()> {
        let mut buf = [0u8; id_codec::STORED_LEN];
        let n = id_codec::encode_record(id, &mut buf)?;
        let mut s = self.session()?;
        s.update(CONFIGURED_FLAG_ADDR, &[CONFIGURED])?;
        s.update(IDENTITY_RECORD_ADDR, &buf[..n])?;
        s.commit()?;
        id.configured = true;
        debug!("store: identity saved");
        Ok(())
    }

    // ── Controllers ───────────────────────────────────────────

    /// Apply the stored values of `ctrl`.
    ///
    /// No-op when the controller has no address or the stored pin byte
    /// belongs to someone else. The stored count is trusted only up to the
    /// controller's own capability count.
    pub fn load_controller(&mut self, ctrl: &mut Controller) -> Result<ctrl_codec::DecodeOutcome> {
        let addr = ctrl.address() as usize;
        if addr == 0 {
            return Ok(ctrl_codec::DecodeOutcome::OwnerMismatch);
        }
        let s = self.session()?;
        let mut header = [0u8; 2];
        s.read(addr, &mut header)?;
        if header[0] != ctrl.pin() {
            debug!("store: pin {} record not present (found {})", ctrl.pin(), header[0]);
            return Ok(ctrl_codec::DecodeOutcome::OwnerMismatch);
        }
        let count = (header[1] as usize).min(ctrl.capability_count());
        let len = ctrl_codec::stored_len(count);
        let mut buf = [0u8; ctrl_codec::stored_len(MAX_CAPABILITIES)];
        s.read(addr, &mut buf[..len])?;
        buf[1] = count as u8;
        drop(s);

        let outcome = ctrl_codec::decode_values(ctrl, &buf[..len]);
        ctrl.mark_clean();
        if !outcome.all_accepted() {
            warn!("store: pin {} record partially rejected: {:?}", ctrl.pin(), outcome);
        }
        Ok(outcome)
    }

    /// Write the controller record, subject to the per-controller debounce.
    pub fn save_controller(&mut self, ctrl: &mut Controller, now_ms: u64) -> Result<SaveOutcome> {
        let addr = ctrl.address() as usize;
        if addr == 0 {
            return Ok(SaveOutcome::NotStored);
        }
        if !ctrl.save_allowed(now_ms) {
            debug!("store: pin {} save deferred", ctrl.pin());
            return Ok(SaveOutcome::Deferred);
        }
        let mut buf = [0u8; ctrl_codec::stored_len(MAX_CAPABILITIES)];
        let n = ctrl_codec::encode_values(ctrl, &mut buf)?;
        let mut s = self.session()?;
        s.update(CONFIGURED_FLAG_ADDR, &[CONFIGURED])?;
        s.update(addr, &buf[..n])?;
        s.commit()?;
        drop(s);
        ctrl.mark_persisted(now_ms);
        debug!("store: pin {} saved ({} bytes at {})", ctrl.pin(), n, addr);
        Ok(SaveOutcome::Written)
    }

    // ── Factory helpers ───────────────────────────────────────

    /// Fill the whole store with 0x00.
    pub fn clear(&mut self) -> Result<()> {
        self.fill(0x00)
    }

    /// Fill the whole store with 0xFF.
    pub fn reset(&mut self) -> Result<()> {
        self.fill(0xFF)
    }

    fn fill(&mut self, byte: u8) -> Result<()> {
        let capacity = self.capacity();
        let chunk = [byte; FILL_CHUNK];
        let mut s = self.session()?;
        let mut addr = 0;
        while addr < capacity {
            let n = FILL_CHUNK.min(capacity - addr);
            s.update(addr, &chunk[..n])?;
            addr += n;
        }
        s.commit()?;
        info!("store: filled {} bytes with {:#04x}", capacity, byte);
        Ok(())
    }
}

/// Check that every stored controller range lies past the identity record,
/// inside the store and clear of every other range.
pub fn validate_layout(capacity: usize, controllers: &[Controller]) -> Result<()> {
    let range = |c: &Controller| {
        let start = c.address() as usize;
        start..start + ctrl_codec::stored_len(c.capability_count())
    };
    for (i, c) in controllers.iter().enumerate() {
        if controllers[..i].iter().any(|o| o.pin() == c.pin()) {
            return Err(Error::Config("duplicate controller pin"));
        }
        if c.address() == 0 {
            continue;
        }
        let r = range(c);
        if r.start < CONTROLLER_REGION_START {
            return Err(Error::Config("controller record overlaps the identity record"));
        }
        if r.end > capacity {
            return Err(Error::Config("controller record exceeds store capacity"));
        }
        let clash = controllers[..i]
            .iter()
            .filter(|o| o.address() != 0)
            .map(range)
            .any(|o| o.start < r.end && r.start < o.end);
        if clash {
            return Err(Error::Config("controller records overlap"));
        }
    }
    Ok(())
}
