//! RCS controller firmware library.
//!
//! Exposes the capability store, record codec, persistence manager,
//! command dispatcher and connectivity machine for host testing. All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod bounded;
pub mod capability;
pub mod codec;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod identity;
pub mod persist;
