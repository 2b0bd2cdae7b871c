//! # CRSF Protocol Constants and Types
//!
//! Core protocol definitions for CRSF (Crossfire) communication with the
//! ELRS transmitter module, plus the channel-value helpers used to turn
//! switch positions into discrete states.

use crate::error::{Result, VtxSyncError};

/// CRSF frame sync byte (always 0xC8)
pub const CRSF_SYNC_BYTE: u8 = 0xC8;

/// RC Channels packet type
pub const CRSF_FRAMETYPE_RC_CHANNELS_PACKED: u8 = 0x16;

/// Link Statistics packet type
pub const CRSF_FRAMETYPE_LINK_STATISTICS: u8 = 0x14;

/// MSP write packet type (extended frame carrying an encapsulated MSP command)
pub const CRSF_FRAMETYPE_MSP_WRITE: u8 = 0x7C;

/// Flight controller device address
pub const CRSF_ADDRESS_FLIGHT_CONTROLLER: u8 = 0xC8;

/// Radio transmitter (handset) device address
pub const CRSF_ADDRESS_RADIO_TRANSMITTER: u8 = 0xEA;

/// Maximum CRSF payload size
/// Frame structure: sync(1) + length(1) + type(1) + payload(N) + crc(1)
/// Maximum frame size is 64 bytes, so max payload = 64 - 4 = 60 bytes
pub const CRSF_MAX_PAYLOAD_SIZE: usize = 60;

/// Maximum complete frame size on the wire
pub const CRSF_MAX_FRAME_SIZE: usize = 64;

/// RC channels payload size (22 bytes for 16 channels × 11 bits)
pub const CRSF_RC_CHANNELS_PAYLOAD_SIZE: usize = 22;

/// Number of RC channels
pub const CRSF_NUM_CHANNELS: usize = 16;

/// Channel value range (11-bit: 0-2047)
pub const CRSF_CHANNEL_VALUE_MIN: u16 = 0;
pub const CRSF_CHANNEL_VALUE_MAX: u16 = 2047;

/// Channel value at 1000us
pub const CRSF_CHANNEL_VALUE_1000: u16 = 191;

/// Channel value at 1500us (stick center)
pub const CRSF_CHANNEL_VALUE_MID: u16 = 992;

/// Channel value at 2000us
pub const CRSF_CHANNEL_VALUE_2000: u16 = 1792;

/// Switch threshold used by [`crsf_to_bit`]
const CRSF_CHANNEL_BIT_THRESHOLD: u16 = 1000;

/// Link Statistics payload size
pub const CRSF_LINK_STATS_PAYLOAD_SIZE: usize = 10;

/// RC channels array type (16 channels, 11-bit values)
pub type RcChannels = [u16; CRSF_NUM_CHANNELS];

/// Link statistics telemetry data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkStatistics {
    /// Uplink RSSI (antenna 1) in -dBm
    pub uplink_rssi_1: u8,

    /// Uplink RSSI (antenna 2) in -dBm (diversity)
    pub uplink_rssi_2: u8,

    /// Uplink link quality (0-100%)
    pub uplink_lq: u8,

    /// Uplink SNR in dB
    pub uplink_snr: i8,

    /// Active antenna (0 or 1)
    pub active_antenna: u8,

    /// RF mode / packet rate
    pub rf_mode: u8,

    /// Uplink TX power in mW (encoded)
    pub uplink_tx_power: u8,

    /// Downlink RSSI in -dBm
    pub downlink_rssi: u8,

    /// Downlink link quality (0-100%)
    pub downlink_lq: u8,

    /// Downlink SNR in dB
    pub downlink_snr: i8,
}

/// CRSF frame structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrsfFrame {
    /// Frame type
    pub frame_type: u8,

    /// Payload data
    pub payload: Vec<u8>,
}

impl CrsfFrame {
    /// Create a new CRSF frame
    ///
    /// # Errors
    ///
    /// Returns error if payload exceeds CRSF_MAX_PAYLOAD_SIZE (60 bytes)
    pub fn new(frame_type: u8, payload: Vec<u8>) -> Result<Self> {
        if payload.len() > CRSF_MAX_PAYLOAD_SIZE {
            return Err(VtxSyncError::CrsfProtocol(
                format!("Payload size {} exceeds maximum {}", payload.len(), CRSF_MAX_PAYLOAD_SIZE)
            ));
        }

        Ok(Self {
            frame_type,
            payload,
        })
    }

    /// Get frame length (type + payload + crc)
    ///
    /// This is guaranteed not to overflow since payload is validated to be ≤ 60 bytes
    pub fn length(&self) -> u8 {
        (1 + self.payload.len() + 1) as u8
    }
}

/// Convert a channel value to a two-position switch state
///
/// Anything above 1000 (just past center) is "on".
pub fn crsf_to_bit(value: u16) -> bool {
    value > CRSF_CHANNEL_BIT_THRESHOLD
}

/// Quantize a channel value into `count` equal buckets (`0..count`)
///
/// The usable range is constrained between the 1000us and 2000us points;
/// anything outside saturates to the first or last bucket. The span is one
/// wider than the range so the 2000us value itself never yields `count`.
/// Identical input always maps to the same bucket.
///
/// # Examples
///
/// ```
/// use vtx_sync::crsf::protocol::crsf_to_n;
///
/// assert_eq!(crsf_to_n(172, 4), 0);
/// assert_eq!(crsf_to_n(992, 4), 2);
/// assert_eq!(crsf_to_n(1811, 4), 3);
/// ```
pub fn crsf_to_n(value: u16, count: u16) -> u16 {
    if count == 0 {
        return 0;
    }
    if value <= CRSF_CHANNEL_VALUE_1000 {
        return 0;
    }
    if value >= CRSF_CHANNEL_VALUE_2000 {
        return count - 1;
    }

    let span = u32::from(CRSF_CHANNEL_VALUE_2000 - CRSF_CHANNEL_VALUE_1000) + 1;
    let offset = u32::from(value - CRSF_CHANNEL_VALUE_1000);
    (offset * u32::from(count) / span) as u16
}
