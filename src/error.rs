//! Unified error types for the controller firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the command
//! listener and startup path handle failures uniformly. All variants are
//! `Copy`; nothing here allocates.
//!
//! Validation failures (out-of-range capability values, unknown names) and
//! owner mismatches are *not* errors: they are reported through `bool` or
//! outcome enums and never reach this type.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The persistent store could not be opened, read or committed.
    Store(StoreError),
    /// A record did not fit the buffer it was encoded into.
    Codec(CodecError),
    /// The network driver refused a request.
    Connectivity(ConnectivityError),
    /// Static configuration is inconsistent (bounds, layout).
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Codec(e) => write!(f, "codec: {e}"),
            Self::Connectivity(e) => write!(f, "connectivity: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Access attempted outside an open session.
    NotOpen,
    /// The address range lies (partly) outside the store.
    OutOfRange,
    /// The backing medium reported a failure.
    Io,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotOpen => write!(f, "store not open"),
            Self::OutOfRange => write!(f, "address out of range"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

impl core::error::Error for StoreError {}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Codec errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// The output buffer is shorter than the record being encoded.
    BufferTooSmall { needed: usize, available: usize },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall { needed, available } => {
                write!(f, "buffer too small ({needed} needed, {available} available)")
            }
        }
    }
}

impl core::error::Error for CodecError {}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

// ---------------------------------------------------------------------------
// Connectivity errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    /// Station-mode join could not be started.
    JoinRejected,
    /// The access point could not be brought up.
    AccessPointFailed,
    /// The radio driver is unavailable.
    DriverUnavailable,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JoinRejected => write!(f, "WiFi join rejected"),
            Self::AccessPointFailed => write!(f, "access point start failed"),
            Self::DriverUnavailable => write!(f, "WiFi driver unavailable"),
        }
    }
}

impl core::error::Error for ConnectivityError {}

impl From<ConnectivityError> for Error {
    fn from(e: ConnectivityError) -> Self {
        Self::Connectivity(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
