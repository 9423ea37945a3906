//! Application core: pure domain logic, zero I/O.
//!
//! Command handling, identity persistence and the periodic controller tick
//! live in [`service`]. All interaction with storage, the network, the
//! firmware transport and outputs happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
