//! Network join state machine.
//!
//! ```text
//!  Unconfigured ──▶ Configured ──┬─ no credentials ─────────────▶ SelfHosting
//!                                └─▶ Joining ──┬─ joined ──────▶ Joined
//!                                              └─ budget spent ─▶ SelfHosting
//! ```
//!
//! The join wait blocks. Each wait step is two half-periods of
//! [`JOIN_POLL_MS`]: indicator off, then indicator at the waiting level.
//! Both halves count against the budget.

use log::{info, warn};
use serde::Serialize;

use crate::adapters::device_id::{SelfHostSsid, self_host_ssid};
use crate::app::ports::{Clock, Indicator, NetworkPort};
use crate::config::{JOIN_BUDGET_MS, JOIN_POLL_MS, SELF_HOST_KEY};
use crate::error::Result;
use crate::identity::DeviceIdentity;

/// Indicator level while unconfigured or waiting for a join.
pub const LEVEL_WAITING: u8 = 25;
/// Indicator level on the dark half of a wait step.
pub const LEVEL_OFF: u8 = 0;
/// Indicator level once joined.
pub const LEVEL_JOINED: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LinkState {
    Unconfigured,
    Configured,
    Joining,
    Joined,
    SelfHosting,
}

pub struct Connectivity {
    state: LinkState,
    /// Time spent in the last join wait.
    join_elapsed_ms: u32,
    self_host_ssid: Option<SelfHostSsid>,
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new()
    }
}

impl Connectivity {
    pub fn new() -> Self {
        Self {
            state: LinkState::Unconfigured,
            join_elapsed_ms: 0,
            self_host_ssid: None,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn join_elapsed_ms(&self) -> u32 {
        self.join_elapsed_ms
    }

    /// Network name advertised while self-hosting.
    pub fn self_host_ssid(&self) -> Option<&str> {
        self.self_host_ssid.as_deref()
    }

    /// The identity has been loaded or initialised and persisted.
    pub fn mark_configured(&mut self) {
        if self.state == LinkState::Unconfigured {
            self.state = LinkState::Configured;
        }
    }

    /// Decide between joining `id`'s network and hosting our own.
    ///
    /// Runs to completion: returns only once `Joined` or `SelfHosting` is
    /// reached. Evaluating an unconfigured machine is treated as configured.
    pub fn evaluate<N, C, I>(
        &mut self,
        id: &DeviceIdentity,
        net: &mut N,
        clock: &mut C,
        indicator: &mut I,
    ) -> Result<LinkState>
    where
        N: NetworkPort,
        C: Clock,
        I: Indicator,
    {
        self.state = LinkState::Configured;
        self.join_elapsed_ms = 0;
        indicator.set_level(LEVEL_WAITING);

        if !id.has_credentials() {
            info!("link: no network credentials, self-hosting");
            return self.self_host(id, net);
        }

        self.state = LinkState::Joining;
        info!("link: joining '{}'", id.network_ssid);
        if let Err(e) = net.begin_join(id.network_ssid.as_str(), id.network_key.as_str()) {
            warn!("link: join not started: {}", e);
            return self.self_host(id, net);
        }

        while !net.is_joined() && self.join_elapsed_ms < JOIN_BUDGET_MS {
            indicator.set_level(LEVEL_OFF);
            clock.delay_ms(JOIN_POLL_MS);
            self.join_elapsed_ms += JOIN_POLL_MS;
            indicator.set_level(LEVEL_WAITING);
            clock.delay_ms(JOIN_POLL_MS);
            self.join_elapsed_ms += JOIN_POLL_MS;
        }

        if net.is_joined() {
            indicator.set_level(LEVEL_JOINED);
            self.state = LinkState::Joined;
            info!("link: joined after {} ms", self.join_elapsed_ms);
            Ok(self.state)
        } else {
            warn!("link: join budget of {} ms spent", JOIN_BUDGET_MS);
            self.self_host(id, net)
        }
    }

    fn self_host<N: NetworkPort>(&mut self, id: &DeviceIdentity, net: &mut N) -> Result<LinkState> {
        let ssid = self_host_ssid(&id.mac);
        net.start_access_point(&ssid, SELF_HOST_KEY)?;
        info!("link: self-hosting '{}'", ssid);
        self.self_host_ssid = Some(ssid);
        self.state = LinkState::SelfHosting;
        Ok(self.state)
    }
}
