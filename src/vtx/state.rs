//! # VTX Delivery State Machine
//!
//! Delivers the VTX configuration to the receiver at least once over a link
//! that never acknowledges individual messages.
//!
//! ## States
//!
//! ```text
//!            edit / switch edge / resync (from any state)
//!                          │
//!                          ▼
//! Unknown ──connected──▶ Modified ──event──▶ Sending1 ─▶ Sending2 ─▶ Sending3 ─▶ SendingDone
//!    ▲                                                                               │
//!    ├──────────────── burst ended disconnected (queue purged) ◀──────────────────────┤
//!    │                                                                               ▼
//!    └──── still disconnected after debounce ◀──── Confirmed ◀──── burst ended connected
//! ```
//!
//! The config is sent once per timer step, unconditionally, three times.
//! Delivery is inferred from the link being up when the burst ends. A link
//! drop right after confirmation is tolerated for the debounce window so a
//! brief dropout does not restart the burst.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::VtxSettings;
use crate::crsf::protocol::RcChannels;
use crate::device::{Device, DeviceContext, Schedule};

use super::builder::{build_eeprom_write, build_vtx_config};
use super::switches::{AuxState, AuxSwitchMonitor};

/// Delay before the first send of a burst
pub const VTX_SEND_DELAY_MS: u64 = 1000;

/// Delay between sends within a burst
pub const VTX_RESEND_INTERVAL_MS: u64 = 500;

/// How long a confirmed delivery survives a disconnect.
/// Long enough to reconnect, short enough to reset when equipment is swapped.
pub const VTX_DISCONNECT_DEBOUNCE_MS: u64 = 10_000;

/// Belief about the receiver's VTX configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VtxSendState {
    /// Remote state unknown; send as soon as the link is up
    Unknown,
    /// Config changed; send regardless of link state
    Modified,
    Sending1,
    Sending2,
    Sending3,
    /// Burst complete, outcome not yet decided
    SendingDone,
    /// Remote side believed to match the local config
    Confirmed,
}

impl VtxSendState {
    /// State after one more send
    fn next(self) -> Self {
        match self {
            VtxSendState::Unknown => VtxSendState::Modified,
            VtxSendState::Modified => VtxSendState::Sending1,
            VtxSendState::Sending1 => VtxSendState::Sending2,
            VtxSendState::Sending2 => VtxSendState::Sending3,
            VtxSendState::Sending3 | VtxSendState::SendingDone => VtxSendState::SendingDone,
            VtxSendState::Confirmed => VtxSendState::Confirmed,
        }
    }

    /// Returns `true` while a burst is in flight
    pub fn is_sending(self) -> bool {
        matches!(
            self,
            VtxSendState::Sending1 | VtxSendState::Sending2 | VtxSendState::Sending3
        )
    }
}

/// Delivery intervals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VtxTiming {
    /// Settle time before the first send of a burst
    pub send_delay: Duration,
    /// Spacing between sends in a burst
    pub resend_interval: Duration,
    /// How long `Confirmed` survives a disconnect
    pub disconnect_debounce: Duration,
}

impl Default for VtxTiming {
    fn default() -> Self {
        Self {
            send_delay: Duration::from_millis(VTX_SEND_DELAY_MS),
            resend_interval: Duration::from_millis(VTX_RESEND_INTERVAL_MS),
            disconnect_debounce: Duration::from_millis(VTX_DISCONNECT_DEBOUNCE_MS),
        }
    }
}

/// The VTX delivery device
///
/// Owns all delivery state; only [`Device::event`] and [`Device::timeout`]
/// advance it, while the `trigger_*` methods and [`VtxDevice::update_switches`]
/// mark the config as modified.
#[derive(Debug, Clone)]
pub struct VtxDevice {
    status: VtxSendState,
    switches: AuxSwitchMonitor,
    /// Send `MSP_EEPROM_WRITE` after the next confirmed burst
    commit_pending: bool,
    timing: VtxTiming,
}

impl Default for VtxDevice {
    fn default() -> Self {
        Self::new(VtxTiming::default())
    }
}

impl VtxDevice {
    pub fn new(timing: VtxTiming) -> Self {
        Self {
            status: VtxSendState::Unknown,
            switches: AuxSwitchMonitor::new(),
            commit_pending: true,
            timing,
        }
    }

    pub fn status(&self) -> VtxSendState {
        self.status
    }

    /// Whether the next confirmed burst will be followed by a commit
    pub fn commit_pending(&self) -> bool {
        self.commit_pending
    }

    /// Current switch-derived selections
    pub fn aux_state(&self) -> AuxState {
        self.switches.state()
    }

    /// Force a resync (e.g. from a bound button)
    ///
    /// The host should trigger an event afterwards.
    pub fn trigger_send(&mut self) {
        debug!("VTX send triggered ({:?} -> Modified)", self.status);
        self.status = VtxSendState::Modified;
    }

    /// The VTX configuration was edited; resync and commit afterwards
    pub fn config_changed(&mut self) {
        self.commit_pending = true;
        self.trigger_send();
    }

    /// Polls the AUX switches
    ///
    /// A switch edge resyncs without a commit, so flicking a switch does not
    /// wear the receiver's storage. Returns `true` when the host should
    /// trigger an event.
    pub fn update_switches(&mut self, settings: &VtxSettings, channels: &RcChannels) -> bool {
        if !self.switches.update(settings, channels) {
            return false;
        }

        self.commit_pending = false;
        self.trigger_send();
        true
    }

    fn send_vtx_config(&self, ctx: &mut DeviceContext<'_>) {
        let aux = self.switches.state();
        let packet = build_vtx_config(ctx.settings, &aux);
        debug!(
            "Sending VTX config {:?} (alt channel {:?}, link {})",
            packet.payload, aux.alt_channel_index, ctx.link
        );
        ctx.transport.enqueue(packet);
    }
}

impl Device for VtxDevice {
    fn initialize(&mut self) {
        self.status = VtxSendState::Unknown;
        debug!("VTX device initialized");
    }

    fn event(&mut self, ctx: &mut DeviceContext<'_>) -> Schedule {
        // Band 0 means VTX control is off: nothing to synchronize
        if ctx.settings.band == 0 {
            self.status = VtxSendState::Confirmed;
            return Schedule::Never;
        }

        let connected = ctx.link.is_connected();

        if self.status == VtxSendState::Modified
            || (self.status == VtxSendState::Unknown && connected)
        {
            debug!("VTX burst armed ({:?} -> Sending1)", self.status);
            self.status = VtxSendState::Sending1;
            return Schedule::After(self.timing.send_delay);
        }

        if !connected {
            // Keep a fresh confirmation through a short dropout
            if self.status == VtxSendState::Confirmed {
                return Schedule::After(self.timing.disconnect_debounce);
            }
            if self.status != VtxSendState::Unknown {
                debug!("Link lost, VTX state {:?} -> Unknown", self.status);
            }
            self.status = VtxSendState::Unknown;
        } else if self.status == VtxSendState::Confirmed {
            return Schedule::Never;
        }

        Schedule::Ignore
    }

    fn timeout(&mut self, ctx: &mut DeviceContext<'_>) -> Schedule {
        if ctx.settings.band == 0 {
            self.status = VtxSendState::Confirmed;
            return Schedule::Never;
        }

        // Only reachable in Confirmed when the debounce expired while disconnected
        if self.status == VtxSendState::Confirmed {
            info!("Link still down after debounce, VTX state now unknown");
            self.status = VtxSendState::Unknown;
            return Schedule::Never;
        }

        self.send_vtx_config(ctx);

        let next = self.status.next();
        debug!("VTX state {:?} -> {:?}", self.status, next);
        self.status = next;
        if self.status != VtxSendState::SendingDone {
            return Schedule::After(self.timing.resend_interval);
        }

        if ctx.link.is_connected() {
            self.status = VtxSendState::Confirmed;
            if self.commit_pending {
                ctx.transport.enqueue(build_eeprom_write());
            }
            info!(
                "VTX config delivered{}",
                if self.commit_pending { ", commit sent" } else { "" }
            );
            self.commit_pending = true;
        } else {
            // Nobody heard the burst; stale copies must not be replayed on connect
            self.status = VtxSendState::Unknown;
            ctx.transport.purge();
            info!("VTX burst finished while disconnected, outbound queue purged");
        }

        Schedule::Never
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AltChannel;
    use crate::crsf::protocol::CRSF_CHANNEL_VALUE_MID;
    use crate::device::DeviceRunner;
    use crate::link::LinkState;
    use crate::msp::{MockMspTransport, MspPacket, MspTransport, MSP_EEPROM_WRITE, MSP_SET_VTX_CONFIG};

    const AUX1: usize = 4;
    const TICK_MS: u64 = 10;

    /// Transport that remembers everything it was given
    #[derive(Default)]
    struct RecordingTransport {
        sent: Vec<MspPacket>,
        purges: usize,
    }

    impl MspTransport for RecordingTransport {
        fn enqueue(&mut self, packet: MspPacket) {
            self.sent.push(packet);
        }

        fn purge(&mut self) {
            self.purges += 1;
        }
    }

    impl RecordingTransport {
        fn count(&self, function: u8) -> usize {
            self.sent.iter().filter(|p| p.function == function).count()
        }

        fn clear(&mut self) {
            self.sent.clear();
            self.purges = 0;
        }
    }

    /// Host loop on a simulated millisecond clock
    struct Harness {
        runner: DeviceRunner<VtxDevice>,
        settings: VtxSettings,
        channels: RcChannels,
        transport: RecordingTransport,
        link: LinkState,
        now: u64,
    }

    impl Harness {
        fn new(settings: VtxSettings, link: LinkState) -> Self {
            let mut harness = Self {
                runner: DeviceRunner::new(VtxDevice::default()),
                settings,
                channels: [CRSF_CHANNEL_VALUE_MID; 16],
                transport: RecordingTransport::default(),
                link,
                now: 0,
            };
            let mut ctx = DeviceContext::new(&harness.settings, harness.link, &mut harness.transport);
            harness.runner.start(0, &mut ctx);
            harness
        }

        /// Starts connected and runs the power-on burst to `Confirmed`
        fn confirmed(settings: VtxSettings) -> Self {
            let mut harness = Self::new(settings, LinkState::Connected);
            harness.run_until(2500);
            assert_eq!(harness.status(), VtxSendState::Confirmed);
            harness.transport.clear();
            harness
        }

        fn tick(&mut self) {
            if self.runner.device_mut().update_switches(&self.settings, &self.channels) {
                self.runner.trigger_event();
            }
            let mut ctx = DeviceContext::new(&self.settings, self.link, &mut self.transport);
            self.runner.update(self.now, &mut ctx);
        }

        fn run_until(&mut self, end: u64) {
            while self.now <= end {
                self.tick();
                self.now += TICK_MS;
            }
        }

        fn edit(&mut self, edit: impl FnOnce(&mut VtxSettings)) {
            edit(&mut self.settings);
            self.runner.device_mut().config_changed();
            self.runner.trigger_event();
        }

        fn status(&self) -> VtxSendState {
            self.runner.device().status()
        }
    }

    fn vtx_settings() -> VtxSettings {
        VtxSettings {
            band: 5,
            channel: 1,
            power: 2,
            pitmode: 2, // AUX1
            alt_ch_switch: 0,
            alt_channels: vec![],
        }
    }

    fn with_transport<'a>(
        settings: &'a VtxSettings,
        link: LinkState,
        transport: &'a mut dyn MspTransport,
    ) -> DeviceContext<'a> {
        DeviceContext::new(settings, link, transport)
    }

    #[test]
    fn test_state_transition_table() {
        use VtxSendState::*;
        assert_eq!(Unknown.next(), Modified);
        assert_eq!(Modified.next(), Sending1);
        assert_eq!(Sending1.next(), Sending2);
        assert_eq!(Sending2.next(), Sending3);
        assert_eq!(Sending3.next(), SendingDone);
        assert_eq!(SendingDone.next(), SendingDone);
        assert_eq!(Confirmed.next(), Confirmed);
        assert!(Sending2.is_sending());
        assert!(!Modified.is_sending());
    }

    #[test]
    fn test_new_device_is_unknown_with_commit_pending() {
        let device = VtxDevice::default();
        assert_eq!(device.status(), VtxSendState::Unknown);
        assert!(device.commit_pending());
        assert_eq!(device.aux_state(), AuxState::default());
    }

    #[test]
    fn test_event_unknown_connected_arms_burst() {
        let settings = vtx_settings();
        let mut transport = RecordingTransport::default();
        let mut device = VtxDevice::default();

        let mut ctx = with_transport(&settings, LinkState::Connected, &mut transport);
        assert_eq!(device.event(&mut ctx), Schedule::After(Duration::from_millis(1000)));
        assert_eq!(device.status(), VtxSendState::Sending1);
        assert!(transport.sent.is_empty());
    }

    #[test]
    fn test_event_unknown_disconnected_waits() {
        let settings = vtx_settings();
        let mut transport = RecordingTransport::default();
        let mut device = VtxDevice::default();

        let mut ctx = with_transport(&settings, LinkState::Disconnected, &mut transport);
        assert_eq!(device.event(&mut ctx), Schedule::Ignore);
        assert_eq!(device.status(), VtxSendState::Unknown);
    }

    #[test]
    fn test_event_modified_arms_burst_even_when_disconnected() {
        let settings = vtx_settings();
        let mut transport = RecordingTransport::default();
        let mut device = VtxDevice::default();
        device.trigger_send();

        let mut ctx = with_transport(&settings, LinkState::Disconnected, &mut transport);
        assert_eq!(device.event(&mut ctx), Schedule::After(Duration::from_millis(1000)));
        assert_eq!(device.status(), VtxSendState::Sending1);
    }

    #[test]
    fn test_band_zero_confirms_from_any_state() {
        let settings = VtxSettings::default();

        for prepare in [
            (|_: &mut VtxDevice| {}) as fn(&mut VtxDevice),
            |d: &mut VtxDevice| d.trigger_send(),
            |d: &mut VtxDevice| d.status = VtxSendState::Sending2,
            |d: &mut VtxDevice| d.status = VtxSendState::Confirmed,
        ] {
            for link in [LinkState::Connected, LinkState::Disconnected] {
                let mut transport = MockMspTransport::new();
                transport.expect_enqueue().never();
                transport.expect_purge().never();

                let mut device = VtxDevice::default();
                prepare(&mut device);

                let mut ctx = with_transport(&settings, link, &mut transport);
                assert_eq!(device.event(&mut ctx), Schedule::Never);
                assert_eq!(device.status(), VtxSendState::Confirmed);

                device.status = VtxSendState::Sending1;
                assert_eq!(device.timeout(&mut ctx), Schedule::Never);
                assert_eq!(device.status(), VtxSendState::Confirmed);
            }
        }
    }

    #[test]
    fn test_band_zero_never_schedules_in_host_loop() {
        let mut harness = Harness::new(VtxSettings::default(), LinkState::Connected);
        harness.run_until(100);

        assert_eq!(harness.status(), VtxSendState::Confirmed);
        assert_eq!(harness.runner.deadline_ms(), None);

        harness.runner.device_mut().trigger_send();
        harness.runner.trigger_event();
        harness.run_until(5000);
        assert_eq!(harness.status(), VtxSendState::Confirmed);
        assert!(harness.transport.sent.is_empty());
    }

    #[test]
    fn test_connected_burst_sends_three_configs_and_one_commit() {
        let settings = vtx_settings();
        let mut transport = MockMspTransport::new();
        transport
            .expect_enqueue()
            .withf(|p: &MspPacket| p.function == MSP_SET_VTX_CONFIG)
            .times(3)
            .return_const(());
        transport
            .expect_enqueue()
            .withf(|p: &MspPacket| p.function == MSP_EEPROM_WRITE)
            .times(1)
            .return_const(());
        transport.expect_purge().never();

        let mut device = VtxDevice::default();
        let mut ctx = with_transport(&settings, LinkState::Connected, &mut transport);

        device.event(&mut ctx);
        assert_eq!(device.timeout(&mut ctx), Schedule::After(Duration::from_millis(500)));
        assert_eq!(device.status(), VtxSendState::Sending2);
        assert_eq!(device.timeout(&mut ctx), Schedule::After(Duration::from_millis(500)));
        assert_eq!(device.status(), VtxSendState::Sending3);
        assert_eq!(device.timeout(&mut ctx), Schedule::Never);
        assert_eq!(device.status(), VtxSendState::Confirmed);
        assert!(device.commit_pending());
    }

    #[test]
    fn test_disconnect_before_third_send_purges_without_commit() {
        let settings = vtx_settings();
        let mut transport = MockMspTransport::new();
        transport
            .expect_enqueue()
            .withf(|p: &MspPacket| p.function == MSP_SET_VTX_CONFIG)
            .times(3)
            .return_const(());
        transport
            .expect_enqueue()
            .withf(|p: &MspPacket| p.function == MSP_EEPROM_WRITE)
            .never();
        transport.expect_purge().times(1).return_const(());

        let mut device = VtxDevice::default();
        {
            let mut ctx = with_transport(&settings, LinkState::Connected, &mut transport);
            device.event(&mut ctx);
            device.timeout(&mut ctx);
            device.timeout(&mut ctx);
        }

        let mut ctx = with_transport(&settings, LinkState::Disconnected, &mut transport);
        assert_eq!(device.timeout(&mut ctx), Schedule::Never);
        assert_eq!(device.status(), VtxSendState::Unknown);
    }

    #[test]
    fn test_power_edit_while_connected() {
        let mut harness = Harness::confirmed(vtx_settings());

        harness.now = 3000;
        harness.edit(|s| s.power = 3);
        harness.tick();
        assert_eq!(harness.status(), VtxSendState::Sending1);
        assert_eq!(harness.runner.deadline_ms(), Some(4000));

        harness.run_until(3990);
        assert!(harness.transport.sent.is_empty());

        harness.run_until(4000);
        assert_eq!(harness.transport.count(MSP_SET_VTX_CONFIG), 1);
        harness.run_until(4490);
        assert_eq!(harness.transport.count(MSP_SET_VTX_CONFIG), 1);
        harness.run_until(4500);
        assert_eq!(harness.transport.count(MSP_SET_VTX_CONFIG), 2);
        harness.run_until(5000);

        assert_eq!(harness.status(), VtxSendState::Confirmed);
        assert_eq!(harness.runner.deadline_ms(), None);
        assert_eq!(harness.transport.count(MSP_SET_VTX_CONFIG), 3);
        assert_eq!(harness.transport.count(MSP_EEPROM_WRITE), 1);
        assert_eq!(harness.transport.sent[0].payload, vec![33, 0, 3, 0]);
        // Commit goes out after the last config
        assert_eq!(harness.transport.sent.last().unwrap().function, MSP_EEPROM_WRITE);

        harness.run_until(20_000);
        assert_eq!(harness.transport.sent.len(), 4);
    }

    #[test]
    fn test_switch_edge_burst_skips_commit() {
        let mut harness = Harness::confirmed(vtx_settings());

        harness.channels[AUX1] = 1811;
        harness.tick();
        assert!(!harness.runner.device().commit_pending());
        assert_eq!(harness.status(), VtxSendState::Sending1);

        harness.run_until(harness.now + 2000);

        assert_eq!(harness.status(), VtxSendState::Confirmed);
        assert_eq!(harness.transport.count(MSP_SET_VTX_CONFIG), 3);
        assert_eq!(harness.transport.count(MSP_EEPROM_WRITE), 0);
        assert!(harness.transport.sent.iter().all(|p| p.payload == vec![33, 0, 2, 1]));
        assert!(harness.runner.device().commit_pending());
    }

    #[test]
    fn test_edit_after_switch_edge_still_commits() {
        let mut harness = Harness::confirmed(vtx_settings());

        harness.channels[AUX1] = 1811;
        harness.tick();
        harness.edit(|s| s.channel = 4);
        harness.run_until(harness.now + 2000);

        assert_eq!(harness.transport.count(MSP_SET_VTX_CONFIG), 3);
        assert_eq!(harness.transport.count(MSP_EEPROM_WRITE), 1);
    }

    #[test]
    fn test_edges_between_ticks_coalesce_into_one_burst() {
        let mut harness = Harness::confirmed(vtx_settings());

        harness.edit(|s| s.power = 1);
        harness.edit(|s| s.power = 4);
        harness.runner.device_mut().trigger_send();
        harness.channels[AUX1] = 1811;
        harness.run_until(harness.now + 5000);

        assert_eq!(harness.transport.count(MSP_SET_VTX_CONFIG), 3);
        assert!(harness.transport.sent[0].payload.starts_with(&[33, 0, 4]));
    }

    #[test]
    fn test_switch_flicks_during_burst_restart_it_once() {
        let mut harness = Harness::confirmed(vtx_settings());
        let start = harness.now;

        harness.channels[AUX1] = 1811;
        harness.run_until(start + 1200); // first send done
        harness.channels[AUX1] = 172;
        harness.run_until(start + 1300);
        harness.channels[AUX1] = 1811;
        harness.run_until(start + 6000);

        // One send from the interrupted burst plus one full burst
        assert_eq!(harness.transport.count(MSP_SET_VTX_CONFIG), 4);
        assert_eq!(harness.status(), VtxSendState::Confirmed);
    }

    #[test]
    fn test_resync_from_confirmed() {
        let mut harness = Harness::confirmed(vtx_settings());

        harness.runner.device_mut().trigger_send();
        harness.runner.trigger_event();
        harness.run_until(harness.now + 2000);

        assert_eq!(harness.transport.count(MSP_SET_VTX_CONFIG), 3);
        assert_eq!(harness.transport.count(MSP_EEPROM_WRITE), 1);
    }

    #[test]
    fn test_brief_disconnect_keeps_confirmed() {
        let mut harness = Harness::confirmed(vtx_settings());
        let drop_at = harness.now;

        harness.link = LinkState::Disconnected;
        harness.tick();
        assert_eq!(harness.status(), VtxSendState::Confirmed);
        assert_eq!(harness.runner.deadline_ms(), Some(drop_at + 10_000));

        harness.run_until(drop_at + 3000);
        harness.link = LinkState::Connected;
        harness.run_until(drop_at + 30_000);

        assert_eq!(harness.status(), VtxSendState::Confirmed);
        assert_eq!(harness.runner.deadline_ms(), None);
        assert!(harness.transport.sent.is_empty());
    }

    #[test]
    fn test_long_disconnect_falls_back_to_unknown() {
        let mut harness = Harness::confirmed(vtx_settings());
        let drop_at = harness.now;

        harness.link = LinkState::Disconnected;
        harness.run_until(drop_at + 9990);
        assert_eq!(harness.status(), VtxSendState::Confirmed);

        harness.run_until(drop_at + 10_000);
        assert_eq!(harness.status(), VtxSendState::Unknown);
        assert_eq!(harness.runner.deadline_ms(), None);
        assert!(harness.transport.sent.is_empty());

        // New equipment connects: full burst with commit
        harness.link = LinkState::Connected;
        harness.run_until(drop_at + 20_000);
        assert_eq!(harness.status(), VtxSendState::Confirmed);
        assert_eq!(harness.transport.count(MSP_SET_VTX_CONFIG), 3);
        assert_eq!(harness.transport.count(MSP_EEPROM_WRITE), 1);
    }

    #[test]
    fn test_edit_while_disconnected_sends_and_purges() {
        let mut harness = Harness::new(vtx_settings(), LinkState::Disconnected);
        harness.run_until(500);
        assert_eq!(harness.status(), VtxSendState::Unknown);

        harness.edit(|s| s.channel = 2);
        harness.run_until(5000);

        assert_eq!(harness.status(), VtxSendState::Unknown);
        assert_eq!(harness.transport.count(MSP_SET_VTX_CONFIG), 3);
        assert_eq!(harness.transport.count(MSP_EEPROM_WRITE), 0);
        assert_eq!(harness.transport.purges, 1);
        // Commit stays pending for when the receiver shows up
        assert!(harness.runner.device().commit_pending());
    }

    #[test]
    fn test_link_drop_mid_burst_restarts_burst() {
        let mut harness = Harness::confirmed(vtx_settings());
        let start = harness.now;

        harness.edit(|s| s.power = 5);
        harness.run_until(start + 1500); // two sends
        assert_eq!(harness.transport.count(MSP_SET_VTX_CONFIG), 2);

        harness.link = LinkState::Disconnected;
        harness.tick();
        assert_eq!(harness.status(), VtxSendState::Unknown);

        harness.run_until(start + 10_000);
        assert_eq!(harness.status(), VtxSendState::Unknown);
        assert_eq!(harness.transport.count(MSP_EEPROM_WRITE), 0);
        assert_eq!(harness.transport.purges, 1);
        assert_eq!(harness.runner.deadline_ms(), None);
    }

    #[test]
    fn test_alternate_channel_switch_selects_slot() {
        let mut settings = vtx_settings();
        settings.pitmode = 0;
        settings.alt_ch_switch = 2; // AUX2
        settings.alt_channels = vec![AltChannel { band: 1, channel: 6 }];
        let mut harness = Harness::confirmed(settings);

        harness.channels[5] = 700;
        harness.run_until(harness.now + 2000);

        assert_eq!(harness.runner.device().aux_state().alt_channel_index, Some(0));
        assert_eq!(harness.transport.count(MSP_SET_VTX_CONFIG), 3);
        assert!(harness.transport.sent.iter().all(|p| p.payload[0] == 6));
        assert_eq!(harness.transport.count(MSP_EEPROM_WRITE), 0);
    }

    #[test]
    fn test_custom_timing() {
        let timing = VtxTiming {
            send_delay: Duration::from_millis(200),
            resend_interval: Duration::from_millis(50),
            disconnect_debounce: Duration::from_millis(1000),
        };
        let settings = vtx_settings();
        let mut transport = RecordingTransport::default();
        let mut device = VtxDevice::new(timing);

        let mut ctx = with_transport(&settings, LinkState::Connected, &mut transport);
        assert_eq!(device.event(&mut ctx), Schedule::After(Duration::from_millis(200)));
        assert_eq!(device.timeout(&mut ctx), Schedule::After(Duration::from_millis(50)));
        device.status = VtxSendState::Confirmed;

        let mut ctx = with_transport(&settings, LinkState::Disconnected, &mut transport);
        assert_eq!(device.event(&mut ctx), Schedule::After(Duration::from_millis(1000)));
    }
}
