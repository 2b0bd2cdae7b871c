//! # AUX Switch Monitor
//!
//! Derives the two switch-driven VTX selections from raw channel values:
//!
//! | Selection | Configured by | Channel | Mapping |
//! |-----------|---------------|---------|---------|
//! | Pit-mode | `pitmode` selector ≥ 1 | `selector / 2 + 3` | on/off, odd selector inverts |
//! | Alternate channel | `alt_ch_switch` ≥ 1 | `alt_ch_switch + 3` | `NUM_ALT_VTX_CHANNELS + 1` positions |
//!
//! Channel index 4 is AUX1, so selector 2 (or 3, inverted) reads AUX1.

use tracing::debug;

use crate::config::{VtxSettings, NUM_ALT_VTX_CHANNELS, PITMODE_OFF};
use crate::crsf::protocol::{crsf_to_bit, crsf_to_n, RcChannels};

/// Offset from a selector value to its channel index
const AUX_CHANNEL_OFFSET: usize = 3;

/// Switch-derived VTX selections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuxState {
    /// Live pit-mode switch position (polarity already applied)
    pub pitmode_active: bool,

    /// Selected alternate slot, `None` = primary band/channel
    pub alt_channel_index: Option<usize>,
}

/// Tracks [`AuxState`] across polls and reports edges
#[derive(Debug, Clone, Default)]
pub struct AuxSwitchMonitor {
    state: AuxState,
}

impl AuxSwitchMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last derived state
    pub fn state(&self) -> AuxState {
        self.state
    }

    /// Re-derives the state from `channels`
    ///
    /// Returns `true` when either selection changed since the previous call.
    pub fn update(&mut self, settings: &VtxSettings, channels: &RcChannels) -> bool {
        let pitmode_changed = self.update_pitmode(settings, channels);
        let alt_changed = self.update_alt_channel(settings, channels);
        pitmode_changed || alt_changed
    }

    fn update_pitmode(&mut self, settings: &VtxSettings, channels: &RcChannels) -> bool {
        if settings.pitmode == PITMODE_OFF {
            return false;
        }

        let inverted = settings.pitmode % 2 == 1;
        let aux = usize::from(settings.pitmode / 2) + AUX_CHANNEL_OFFSET;
        let Some(&value) = channels.get(aux) else {
            return false;
        };

        let active = crsf_to_bit(value) ^ inverted;
        if active == self.state.pitmode_active {
            return false;
        }

        debug!("Pit-mode switch on channel {} now {}", aux + 1, if active { "on" } else { "off" });
        self.state.pitmode_active = active;
        true
    }

    fn update_alt_channel(&mut self, settings: &VtxSettings, channels: &RcChannels) -> bool {
        let aux = usize::from(settings.alt_ch_switch) + AUX_CHANNEL_OFFSET;
        let value = match channels.get(aux) {
            Some(&value) if settings.alt_ch_switch != 0 && settings.alt_band(0) != 0 => value,
            _ => {
                // Switch unused: the primary pair applies, nothing to announce
                self.state.alt_channel_index = None;
                return false;
            }
        };

        let positions = NUM_ALT_VTX_CHANNELS as u16 + 1;
        let index = usize::from(crsf_to_n(value, positions)).checked_sub(1);
        if index == self.state.alt_channel_index {
            return false;
        }

        debug!(
            "Alt channel switch {} ({:?})",
            if index.is_some() { "to alternate" } else { "back to primary" },
            index
        );
        self.state.alt_channel_index = index;
        true
    }
}
