//! # Device Scheduling
//!
//! A small cooperative scheduler for event/timer driven devices.
//!
//! A [`Device`] exposes four callbacks. The host calls [`DeviceRunner::update`]
//! on every loop iteration and the runner decides which callback is due:
//!
//! - `event` runs once after something happened (link transition, config
//!   edit, switch edge, user action)
//! - `timeout` runs when the delay last requested by the device has elapsed
//!
//! Each callback answers with a [`Schedule`] telling the runner when the
//! device wants its next `timeout`.
//!
//! ## Usage
//!
//! ```
//! use vtx_sync::config::VtxSettings;
//! use vtx_sync::device::{DeviceContext, DeviceRunner};
//! use vtx_sync::link::LinkState;
//! use vtx_sync::msp::MspQueue;
//! use vtx_sync::vtx::{VtxDevice, VtxTiming};
//!
//! let settings = VtxSettings { band: 1, power: 1, ..VtxSettings::default() };
//! let mut queue = MspQueue::new();
//! let mut runner = DeviceRunner::new(VtxDevice::new(VtxTiming::default()));
//!
//! let mut ctx = DeviceContext::new(&settings, LinkState::Connected, &mut queue);
//! runner.start(0, &mut ctx);
//! runner.update(0, &mut ctx);
//! assert_eq!(runner.deadline_ms(), Some(1000));
//! ```

use std::time::Duration;

use tracing::trace;

use crate::config::VtxSettings;
use crate::link::LinkState;
use crate::msp::MspTransport;

/// When a device wants its `timeout` callback next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Call `timeout` after this delay, replacing any pending deadline
    After(Duration),
    /// Cancel any pending deadline
    Never,
    /// Keep the current deadline as it is
    Ignore,
}

/// Collaborators available to a device callback
pub struct DeviceContext<'a> {
    /// Current VTX configuration
    pub settings: &'a VtxSettings,
    /// Receiver link state sampled for this update
    pub link: LinkState,
    /// Outbound MSP transport
    pub transport: &'a mut dyn MspTransport,
}

impl<'a> DeviceContext<'a> {
    pub fn new(
        settings: &'a VtxSettings,
        link: LinkState,
        transport: &'a mut dyn MspTransport,
    ) -> Self {
        Self {
            settings,
            link,
            transport,
        }
    }
}

/// A scheduled device
pub trait Device {
    /// One-time setup before the first update
    fn initialize(&mut self) {}

    /// Called once after `initialize`
    fn start(&mut self, _ctx: &mut DeviceContext<'_>) -> Schedule {
        Schedule::Ignore
    }

    /// Called after an event was triggered
    fn event(&mut self, ctx: &mut DeviceContext<'_>) -> Schedule;

    /// Called when the requested delay has elapsed
    fn timeout(&mut self, ctx: &mut DeviceContext<'_>) -> Schedule;
}

/// Drives one [`Device`] on a millisecond timeline
#[derive(Debug)]
pub struct DeviceRunner<D> {
    device: D,
    deadline_ms: Option<u64>,
    event_pending: bool,
    last_link: Option<LinkState>,
}

impl<D: Device> DeviceRunner<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            deadline_ms: None,
            event_pending: false,
            last_link: None,
        }
    }

    /// Initializes and starts the device
    pub fn start(&mut self, now_ms: u64, ctx: &mut DeviceContext<'_>) {
        self.device.initialize();
        let schedule = self.device.start(ctx);
        self.apply(schedule, now_ms);
        self.event_pending = true;
    }

    /// Requests an `event` callback on the next update
    ///
    /// Several triggers before the next update collapse into one callback.
    pub fn trigger_event(&mut self) {
        self.event_pending = true;
    }

    /// Runs whichever callbacks are due at `now_ms`
    pub fn update(&mut self, now_ms: u64, ctx: &mut DeviceContext<'_>) {
        if self.last_link != Some(ctx.link) {
            self.last_link = Some(ctx.link);
            self.event_pending = true;
        }

        if self.event_pending {
            self.event_pending = false;
            let schedule = self.device.event(ctx);
            self.apply(schedule, now_ms);
        }

        if let Some(deadline) = self.deadline_ms {
            if now_ms >= deadline {
                self.deadline_ms = None;
                let schedule = self.device.timeout(ctx);
                self.apply(schedule, now_ms);
            }
        }
    }

    /// Absolute time of the next `timeout`, if armed
    pub fn deadline_ms(&self) -> Option<u64> {
        self.deadline_ms
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    fn apply(&mut self, schedule: Schedule, now_ms: u64) {
        match schedule {
            Schedule::After(delay) => {
                let deadline = now_ms.saturating_add(delay.as_millis() as u64);
                trace!("Next device timeout at {} ms", deadline);
                self.deadline_ms = Some(deadline);
            }
            Schedule::Never => self.deadline_ms = None,
            Schedule::Ignore => {}
        }
    }
}
