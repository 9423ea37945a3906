//! Named, bounded capabilities and the per-controller capability set.
//!
//! A [`Controller`] is one logical device output (an LED channel group, a
//! dimmer) with a fixed list of [`Capability`] slots. Only the slot values
//! and the persistence bookkeeping change after construction.

use log::{debug, warn};
use serde::Serialize;

use crate::bounded::NameStr;
use crate::config::{MAX_CAPABILITIES, SAVE_DEBOUNCE_MS};
use crate::error::{Error, Result};

/// A named `u16` with inclusive bounds. `min <= value <= max` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capability {
    name: NameStr,
    min: u16,
    max: u16,
    value: u16,
}

impl Capability {
    pub fn new(name: &str, min: u16, max: u16, value: u16) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::Config("capability name must not be empty"));
        }
        if min > max {
            return Err(Error::Config("capability min must not exceed max"));
        }
        if !(min..=max).contains(&value) {
            return Err(Error::Config("capability initial value out of bounds"));
        }
        Ok(Self {
            name: NameStr::from(name),
            min,
            max,
            value,
        })
    }

    pub fn name(&self) -> &NameStr {
        &self.name
    }

    pub fn min(&self) -> u16 {
        self.min
    }

    pub fn max(&self) -> u16 {
        self.max
    }

    pub fn value(&self) -> u16 {
        self.value
    }

    pub fn accepts(&self, value: u16) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Capability set owned by one logical device output.
#[derive(Debug, Clone, Serialize)]
pub struct Controller {
    pin: u8,
    name: NameStr,
    /// Start of this controller's record in the persistent store; 0 = not stored.
    #[serde(skip)]
    address: u16,
    capabilities: heapless::Vec<Capability, MAX_CAPABILITIES>,
    #[serde(skip)]
    dirty: bool,
    #[serde(skip)]
    last_persisted_at: Option<u64>,
}

impl Controller {
    /// Build a controller with a fixed capability list.
    ///
    /// Names must be unique within the controller; the list length is fixed
    /// for the lifetime of the instance.
    pub fn new(pin: u8, name: &str, address: u16, capabilities: &[Capability]) -> Result<Self> {
        if capabilities.is_empty() {
            return Err(Error::Config("controller needs at least one capability"));
        }
        let caps = heapless::Vec::from_slice(capabilities)
            .map_err(|()| Error::Config("too many capabilities for one controller"))?;
        for (i, cap) in caps.iter().enumerate() {
            if caps[..i].iter().any(|c| c.name == cap.name) {
                return Err(Error::Config("duplicate capability name"));
            }
        }
        Ok(Self {
            pin,
            name: NameStr::from(name),
            address,
            capabilities: caps,
            dirty: false,
            last_persisted_at: None,
        })
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn name(&self) -> &NameStr {
        &self.name
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn capability_count(&self) -> usize {
        self.capabilities.len()
    }

    pub fn find(&self, name: &str) -> Option<&Capability> {
        self.capabilities.iter().find(|c| c.name == name)
    }

    /// Current value of `name`, if the controller has it.
    pub fn get(&self, name: &str) -> Option<u16> {
        self.find(name).map(Capability::value)
    }

    /// Validated write. Returns `false` (and changes nothing) when the name
    /// is unknown or `value` lies outside the capability bounds.
    pub fn set(&mut self, name: &str, value: u16) -> bool {
        let Some(cap) = self.capabilities.iter_mut().find(|c| c.name == name) else {
            debug!("pin {}: unknown capability '{}'", self.pin, name);
            return false;
        };
        if !cap.accepts(value) {
            warn!(
                "pin {}: {}={} rejected (bounds {}..={})",
                self.pin, cap.name, value, cap.min, cap.max
            );
            return false;
        }
        cap.value = value;
        self.dirty = true;
        debug!("pin {}: {}={}", self.pin, name, value);
        true
    }

    /// In-memory state differs from the stored record.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn last_persisted_at(&self) -> Option<u64> {
        self.last_persisted_at
    }

    /// Whether a stored write at `now_ms` respects the debounce interval.
    pub fn save_allowed(&self, now_ms: u64) -> bool {
        self.last_persisted_at
            .is_none_or(|last| now_ms.saturating_sub(last) >= SAVE_DEBOUNCE_MS)
    }

    /// Record a completed stored write.
    pub(crate) fn mark_persisted(&mut self, now_ms: u64) {
        self.dirty = false;
        self.last_persisted_at = Some(now_ms);
    }

    /// Values were just read back from the store; nothing is pending.
    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
