//! EEPROM emulation adapter.
//!
//! Implements [`PersistentStore`] as a fixed-size byte image with a
//! session-scoped working copy.
//!
//! - **`target_os = "espidf"`**: the image lives in one NVS blob
//!   (`rcs` / `eeprom`); `commit()` rewrites the blob and calls
//!   `nvs_commit()`, which is atomic.
//! - **all other targets**: the image lives in memory. Erased cells read
//!   0xFF, like blank flash.
//!
//! Only bytes whose value changes are written. The adapter counts commits
//! and cell writes since boot so tests and diagnostics can check wear.

use log::{debug, info, warn};

use crate::app::ports::PersistentStore;
use crate::error::StoreError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const ERASED: u8 = 0xFF;

#[cfg(target_os = "espidf")]
const NVS_NAMESPACE: &[u8] = b"rcs\0";
#[cfg(target_os = "espidf")]
const NVS_KEY: &[u8] = b"eeprom\0";

/// Write counters since boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WearStats {
    /// Commits that reached the backing medium.
    pub commits: u32,
    /// Cell writes across all commits.
    pub cell_writes: u32,
    /// Highest write count of any single cell.
    pub hottest_cell: u32,
}

pub struct EepromAdapter {
    capacity: usize,
    /// Working copy while a session is open.
    shadow: Option<Vec<u8>>,
    /// Cells changed in the open session, in first-write order.
    pending: Vec<usize>,
    /// `dirty[cell]` is set while `cell` is in `pending`.
    dirty: Vec<bool>,
    cell_writes: Vec<u32>,
    stats: WearStats,
    #[cfg(not(target_os = "espidf"))]
    flash: Vec<u8>,
}

impl EepromAdapter {
    /// Create an adapter over `capacity` bytes.
    ///
    /// On ESP-IDF this initialises NVS flash, erasing the partition when its
    /// layout version is stale.
    pub fn new(capacity: usize) -> Result<Self, StoreError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any other NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("EEPROM: erasing and re-initialising NVS partition");
                if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(StoreError::Io);
                }
            } else if ret != ESP_OK {
                return Err(StoreError::Io);
            }
            info!("EepromAdapter: NVS backend, {} bytes", capacity);
        }

        #[cfg(not(target_os = "espidf"))]
        info!("EepromAdapter: simulation backend, {} bytes", capacity);

        Ok(Self {
            capacity,
            shadow: None,
            pending: Vec::new(),
            dirty: vec![false; capacity],
            cell_writes: vec![0; capacity],
            stats: WearStats::default(),
            #[cfg(not(target_os = "espidf"))]
            flash: vec![ERASED; capacity],
        })
    }

    pub fn wear(&self) -> WearStats {
        self.stats
    }

    /// Write count of one cell since boot.
    pub fn cell_wear(&self, addr: usize) -> u32 {
        self.cell_writes.get(addr).copied().unwrap_or(0)
    }

    pub fn is_open(&self) -> bool {
        self.shadow.is_some()
    }

    fn clear_pending(&mut self) {
        for cell in self.pending.drain(..) {
            self.dirty[cell] = false;
        }
    }

    /// Committed contents, bypassing sessions. Simulation only.
    #[cfg(not(target_os = "espidf"))]
    pub fn image(&self) -> &[u8] {
        &self.flash
    }

    fn range(&self, addr: usize, len: usize) -> Result<core::ops::Range<usize>, StoreError> {
        let end = addr.checked_add(len).ok_or(StoreError::OutOfRange)?;
        if end > self.capacity {
            return Err(StoreError::OutOfRange);
        }
        Ok(addr..end)
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    fn platform_load(&self) -> Result<Vec<u8>, StoreError> {
        Ok(self.flash.clone())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_store(&mut self, image: &[u8]) -> Result<(), StoreError> {
        self.flash.copy_from_slice(image);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_load(&self) -> Result<Vec<u8>, StoreError> {
        let mut image = vec![ERASED; self.capacity];
        let result = with_nvs_handle(false, |handle| {
            let mut size = image.len();
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    NVS_KEY.as_ptr() as *const _,
                    image.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(size)
        });
        match result {
            Ok(_) => Ok(image),
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => {
                debug!("EEPROM: no blob yet, starting erased");
                Ok(image)
            }
            Err(e) => {
                warn!("EEPROM: NVS read error {}", e);
                Err(StoreError::Io)
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_store(&mut self, image: &[u8]) -> Result<(), StoreError> {
        with_nvs_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    NVS_KEY.as_ptr() as *const _,
                    image.as_ptr() as *const _,
                    image.len(),
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        })
        .map_err(|e| {
            warn!("EEPROM: NVS write error {}", e);
            StoreError::Io
        })
    }
}

/// Open the adapter's NVS namespace, run `f` with the handle, then close.
#[cfg(target_os = "espidf")]
fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
where
    F: FnOnce(nvs_handle_t) -> Result<T, i32>,
{
    let mut handle: nvs_handle_t = 0;
    let mode = if write {
        nvs_open_mode_t_NVS_READWRITE
    } else {
        nvs_open_mode_t_NVS_READONLY
    };
    let ret = unsafe { nvs_open(NVS_NAMESPACE.as_ptr() as *const _, mode, &mut handle) };
    if ret != ESP_OK {
        return Err(ret);
    }
    let result = f(handle);
    unsafe {
        nvs_close(handle);
    }
    result
}

impl PersistentStore for EepromAdapter {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        if self.shadow.is_some() {
            warn!("EEPROM: begin() on an open session, discarding it");
        }
        self.shadow = Some(self.platform_load()?);
        self.clear_pending();
        Ok(())
    }

    fn read(&self, addr: usize, buf: &mut [u8]) -> Result<(), StoreError> {
        let range = self.range(addr, buf.len())?;
        let shadow = self.shadow.as_ref().ok_or(StoreError::NotOpen)?;
        buf.copy_from_slice(&shadow[range]);
        Ok(())
    }

    fn update(&mut self, addr: usize, data: &[u8]) -> Result<(), StoreError> {
        let range = self.range(addr, data.len())?;
        let shadow = self.shadow.as_mut().ok_or(StoreError::NotOpen)?;
        for (cell, &byte) in range.zip(data) {
            if shadow[cell] != byte {
                shadow[cell] = byte;
                if !self.dirty[cell] {
                    self.dirty[cell] = true;
                    self.pending.push(cell);
                }
            }
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        let Some(shadow) = self.shadow.take() else {
            return Err(StoreError::NotOpen);
        };
        if self.pending.is_empty() {
            self.shadow = Some(shadow);
            return Ok(());
        }
        let result = self.platform_store(&shadow);
        self.shadow = Some(shadow);
        result?;

        for &cell in &self.pending {
            let w = &mut self.cell_writes[cell];
            *w = w.saturating_add(1);
            self.stats.hottest_cell = self.stats.hottest_cell.max(*w);
        }
        self.stats.commits = self.stats.commits.saturating_add(1);
        self.stats.cell_writes = self.stats.cell_writes.saturating_add(self.pending.len() as u32);
        debug!("EEPROM: committed {} cells", self.pending.len());
        self.clear_pending();
        Ok(())
    }

    fn end(&mut self) {
        if !self.pending.is_empty() {
            debug!("EEPROM: {} uncommitted cells discarded", self.pending.len());
        }
        self.shadow = None;
        self.clear_pending();
    }
}
