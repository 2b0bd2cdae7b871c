//! # Link State
//!
//! The only delivery signal the VTX core gets: is the receiver link up?
//!
//! The ELRS module reports link statistics while a receiver is connected.
//! [`LinkMonitor`] turns that stream into a connected/disconnected level.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::crsf::protocol::LinkStatistics;

/// Connection state of the wireless control link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    Connected,
    Disconnected,
}

impl LinkState {
    /// Returns `true` when the link is up
    pub fn is_connected(self) -> bool {
        self == LinkState::Connected
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkState::Connected => write!(f, "connected"),
            LinkState::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Derives [`LinkState`] from link statistics arrival
///
/// The link counts as connected while statistics with a non-zero uplink
/// link quality keep arriving within `timeout`.
#[derive(Debug, Clone)]
pub struct LinkMonitor {
    timeout: Duration,
    last_seen_ms: Option<u64>,
    reported: LinkState,
}

impl LinkMonitor {
    /// Creates a monitor that starts disconnected
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_seen_ms: None,
            reported: LinkState::Disconnected,
        }
    }

    /// Records a link statistics report received at `now_ms`
    pub fn on_link_statistics(&mut self, stats: &LinkStatistics, now_ms: u64) {
        if stats.uplink_lq > 0 {
            self.last_seen_ms = Some(now_ms);
        }
    }

    /// Current link state at `now_ms`
    pub fn state(&mut self, now_ms: u64) -> LinkState {
        let timeout_ms = self.timeout.as_millis() as u64;
        let state = match self.last_seen_ms {
            Some(seen) if now_ms.saturating_sub(seen) < timeout_ms => LinkState::Connected,
            _ => LinkState::Disconnected,
        };

        if state != self.reported {
            info!("Receiver link {}", state);
            self.reported = state;
        }

        state
    }
}
