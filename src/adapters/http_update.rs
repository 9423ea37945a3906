//! HTTP firmware updater, backed by the `esp-ota` crate.
//!
//! Flow: GET location → 304 = no update, 200 = stream body into the
//! inactive OTA partition → finalize → set boot partition → optional reboot.
//!
//! The running image name travels in the `x-rcs-version` request header so
//! the server can answer 304 when the device is current.

use core::fmt;
use log::{info, warn};

use crate::app::ports::{FirmwareReport, FirmwareUpdater, UpdateOutcome};

#[cfg(target_os = "espidf")]
const VERSION_HEADER: &str = "x-rcs-version";
#[cfg(target_os = "espidf")]
const CHUNK_SIZE: usize = 1024;

// ── Error type ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateError {
    Connect,
    Forbidden,
    FileNotFound,
    WrongHttpCode(u16),
    EmptyImage,
    BeginFailed,
    WriteFailed,
    VerifyFailed,
    BootSetFailed,
}

impl UpdateError {
    /// Numeric code reported to clients alongside the message.
    pub fn code(self) -> i32 {
        match self {
            Self::Connect => -1,
            Self::BeginFailed => -100,
            Self::EmptyImage => -101,
            Self::FileNotFound => -102,
            Self::Forbidden => -103,
            Self::WrongHttpCode(_) => -104,
            Self::WriteFailed => -105,
            Self::VerifyFailed => -106,
            Self::BootSetFailed => -107,
        }
    }
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "HTTP connection failed"),
            Self::Forbidden => write!(f, "Forbidden (403)"),
            Self::FileNotFound => write!(f, "File Not Found (404)"),
            Self::WrongHttpCode(c) => write!(f, "Wrong HTTP Code ({c})"),
            Self::EmptyImage => write!(f, "Server sent an empty image"),
            Self::BeginFailed => write!(f, "Update begin failed"),
            Self::WriteFailed => write!(f, "Flash write failed"),
            Self::VerifyFailed => write!(f, "Image verification failed"),
            Self::BootSetFailed => write!(f, "Set boot partition failed"),
        }
    }
}

/// What a successful fetch produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fetch {
    NotModified,
    Installed { bytes: usize },
}

// ── Updater ───────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone)]
struct SimImage {
    location: String,
    version: String,
}

pub struct HttpUpdater {
    #[cfg(not(target_os = "espidf"))]
    sim_images: Vec<SimImage>,
    #[cfg(not(target_os = "espidf"))]
    sim_installed: Option<String>,
    #[cfg(not(target_os = "espidf"))]
    sim_reboots: u32,
}

impl Default for HttpUpdater {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpUpdater {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            sim_images: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_installed: None,
            #[cfg(not(target_os = "espidf"))]
            sim_reboots: 0,
        }
    }

    /// Simulation: serve an image called `version` at `location`.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_publish(&mut self, location: &str, version: &str) {
        self.sim_images.retain(|i| i.location != location);
        self.sim_images.push(SimImage {
            location: location.to_owned(),
            version: version.to_owned(),
        });
    }

    /// Simulation: version of the last installed image.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_installed(&self) -> Option<&str> {
        self.sim_installed.as_deref()
    }

    /// Simulation: reboots requested after a successful install.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_reboots(&self) -> u32 {
        self.sim_reboots
    }

    #[cfg(target_os = "espidf")]
    fn platform_fetch(&mut self, location: &str, current_version: &str) -> Result<Fetch, UpdateError> {
        use esp_idf_svc::http::Method;
        use esp_idf_svc::http::client::{Configuration as HttpConfiguration, EspHttpConnection};
        use esp_idf_svc::io::Read;

        let conf = HttpConfiguration {
            timeout: Some(core::time::Duration::from_secs(30)),
            ..Default::default()
        };
        let mut conn = EspHttpConnection::new(&conf).map_err(|_| UpdateError::Connect)?;
        conn.initiate_request(Method::Get, location, &[(VERSION_HEADER, current_version)])
            .map_err(|_| UpdateError::Connect)?;
        conn.initiate_response().map_err(|_| UpdateError::Connect)?;

        match conn.status() {
            200 => {}
            304 => return Ok(Fetch::NotModified),
            403 => return Err(UpdateError::Forbidden),
            404 => return Err(UpdateError::FileNotFound),
            other => return Err(UpdateError::WrongHttpCode(other)),
        }

        let mut update = esp_ota::OtaUpdate::begin().map_err(|e| {
            warn!("esp-ota begin failed: {:?}", e);
            UpdateError::BeginFailed
        })?;
        let mut chunk = [0u8; CHUNK_SIZE];
        let mut total = 0usize;
        loop {
            let n = conn.read(&mut chunk).map_err(|_| UpdateError::Connect)?;
            if n == 0 {
                break;
            }
            update.write(&chunk[..n]).map_err(|e| {
                warn!("esp-ota write failed: {:?}", e);
                UpdateError::WriteFailed
            })?;
            total += n;
        }
        if total == 0 {
            return Err(UpdateError::EmptyImage);
        }

        let mut completed = update.finalize().map_err(|e| {
            warn!("esp-ota finalize failed: {:?}", e);
            UpdateError::VerifyFailed
        })?;
        completed.set_as_boot_partition().map_err(|e| {
            warn!("esp-ota set_as_boot_partition failed: {:?}", e);
            UpdateError::BootSetFailed
        })?;
        Ok(Fetch::Installed { bytes: total })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_fetch(&mut self, location: &str, current_version: &str) -> Result<Fetch, UpdateError> {
        let image = self
            .sim_images
            .iter()
            .find(|i| i.location == location)
            .ok_or(UpdateError::FileNotFound)?;
        if image.version == current_version {
            return Ok(Fetch::NotModified);
        }
        self.sim_installed = Some(image.version.clone());
        Ok(Fetch::Installed {
            bytes: image.version.len(),
        })
    }

    #[cfg(target_os = "espidf")]
    fn reboot(&mut self) {
        info!("firmware: rebooting into new image");
        esp_ota::restart();
    }

    #[cfg(not(target_os = "espidf"))]
    fn reboot(&mut self) {
        info!("firmware: reboot requested (simulation, skipped)");
        self.sim_reboots += 1;
    }
}

impl FirmwareUpdater for HttpUpdater {
    fn update(&mut self, location: &str, current_version: &str, reboot_on_success: bool) -> FirmwareReport {
        info!("firmware: checking {} (running {})", location, current_version);
        match self.platform_fetch(location, current_version) {
            Ok(Fetch::NotModified) => {
                info!("firmware: no update available");
                FirmwareReport::new(UpdateOutcome::NoUpdates, 0, "No updates")
            }
            Ok(Fetch::Installed { bytes }) => {
                info!("firmware: installed {} bytes", bytes);
                if reboot_on_success {
                    self.reboot();
                }
                FirmwareReport::new(UpdateOutcome::Applied, 0, "Update ok")
            }
            Err(e) => {
                warn!("firmware: update failed: {}", e);
                FirmwareReport::new(UpdateOutcome::Failed, e.code(), &e.to_string())
            }
        }
    }
}

// ── Boot validation ───────────────────────────────────────────

/// Mark the running image valid so the bootloader does not roll back.
#[cfg(target_os = "espidf")]
pub fn check_rollback() {
    match esp_ota::mark_app_valid() {
        Ok(()) => info!("firmware: image marked valid"),
        Err(e) => warn!("firmware: mark_app_valid failed: {:?}", e),
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn check_rollback() {
    info!("firmware: rollback check skipped (simulation)");
}
