//! # VTX Packet Builder
//!
//! Builds the two MSP packets the VTX core sends.
//!
//! ## `MSP_SET_VTX_CONFIG` payload
//!
//! | Byte | Content |
//! |------|---------|
//! | 0 | VTX index: `(band - 1) * 8 + channel` |
//! | 1 | Reserved, always 0 |
//! | 2 | Power level (only when power ≠ 0) |
//! | 3 | Pit-mode (only when power ≠ 0) |
//!
//! The pit-mode byte carries the configured selector when it is plain off/on,
//! and the live switch state when the selector maps an AUX switch.

use crate::config::{VtxSettings, NUM_ALT_VTX_CHANNELS, PITMODE_OFF, PITMODE_ON};
use crate::msp::{MspPacket, MSP_EEPROM_WRITE, MSP_SET_VTX_CONFIG};

use super::switches::AuxState;

/// Number of channels per band
const CHANNELS_PER_BAND: u8 = 8;

/// Compute the VTX table index of a band/channel pair
///
/// # Examples
///
/// ```
/// use vtx_sync::vtx::vtx_index;
///
/// assert_eq!(vtx_index(1, 0), 0);
/// assert_eq!(vtx_index(5, 3), 35);
/// ```
pub fn vtx_index(band: u8, channel: u8) -> u8 {
    band.wrapping_sub(1)
        .wrapping_mul(CHANNELS_PER_BAND)
        .wrapping_add(channel)
}

/// Build the `MSP_SET_VTX_CONFIG` command for the current settings
///
/// An alternate slot is only used when the selected index is in range and
/// that slot has a band configured; otherwise the primary pair is sent.
pub fn build_vtx_config(settings: &VtxSettings, aux: &AuxState) -> MspPacket {
    let alt_slot = aux
        .alt_channel_index
        .filter(|&index| index < NUM_ALT_VTX_CHANNELS && settings.alt_band(index) != 0);

    let index = match alt_slot {
        Some(slot) => vtx_index(settings.alt_band(slot), settings.alt_channel(slot)),
        None => vtx_index(settings.band, settings.channel),
    };

    let mut packet = MspPacket::command(MSP_SET_VTX_CONFIG);
    packet.add_byte(index);
    packet.add_byte(0);

    if settings.power != 0 {
        packet.add_byte(settings.power);

        let pitmode = match settings.pitmode {
            PITMODE_OFF | PITMODE_ON => settings.pitmode,
            _ => u8::from(aux.pitmode_active),
        };
        packet.add_byte(pitmode);
    }

    packet
}

/// Build the `MSP_EEPROM_WRITE` packet (no payload)
pub fn build_eeprom_write() -> MspPacket {
    MspPacket::new(MSP_EEPROM_WRITE)
}
