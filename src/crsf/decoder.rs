//! # CRSF Packet Decoder
//!
//! Decodes inbound CRSF frames from the ELRS module: RC channels (the raw
//! aux switch positions) and link statistics (the connection signal).

use bytes::{Buf, BytesMut};
use tracing::debug;

use super::crc::crc8_dvb_s2;
use super::protocol::*;
use crate::error::{Result, VtxSyncError};

/// Smallest valid frame: sync(1) + length(1) + type(1) + crc(1)
const CRSF_MIN_FRAME_SIZE: usize = 4;

/// Returns `true` for bytes that may start a frame
///
/// Modules address the handset with 0xEA; flight-controller style links use 0xC8.
fn is_frame_start(byte: u8) -> bool {
    byte == CRSF_SYNC_BYTE || byte == CRSF_ADDRESS_RADIO_TRANSMITTER
}

/// Decode a complete CRSF frame
///
/// # Arguments
///
/// * `frame` - Complete CRSF frame bytes (including sync, length, type, payload, crc)
///
/// # Errors
///
/// Returns error if:
/// - Frame is too short
/// - Sync byte is incorrect
/// - CRC check fails
pub fn decode_frame(frame: &[u8]) -> Result<CrsfFrame> {
    if frame.len() < CRSF_MIN_FRAME_SIZE {
        return Err(VtxSyncError::CrsfProtocol(
            "Frame too short".to_string()
        ));
    }

    if !is_frame_start(frame[0]) {
        return Err(VtxSyncError::CrsfProtocol(
            format!("Invalid sync byte: 0x{:02X}", frame[0])
        ));
    }

    let length = frame[1] as usize;
    if length < 2 {
        return Err(VtxSyncError::CrsfProtocol(
            format!("Invalid length field: {}", length)
        ));
    }

    // sync(1) + length(1) + [type + payload + crc]
    if frame.len() < 2 + length {
        return Err(VtxSyncError::CrsfProtocol(
            format!("Frame too short: expected {} bytes, got {}", 2 + length, frame.len())
        ));
    }

    let received_crc = frame[1 + length];
    let calculated_crc = crc8_dvb_s2(&frame[2..1 + length]);

    if calculated_crc != received_crc {
        return Err(VtxSyncError::CrsfProtocol(
            format!("CRC mismatch: expected 0x{:02X}, got 0x{:02X}", calculated_crc, received_crc)
        ));
    }

    let frame_type = frame[2];
    let payload = frame[3..1 + length].to_vec();

    CrsfFrame::new(frame_type, payload)
}

/// Decode Link Statistics telemetry packet
///
/// # Arguments
///
/// * `payload` - Link Statistics payload (10 bytes)
pub fn decode_link_statistics(payload: &[u8]) -> Result<LinkStatistics> {
    if payload.len() < CRSF_LINK_STATS_PAYLOAD_SIZE {
        return Err(VtxSyncError::CrsfProtocol(
            format!("Link stats payload too short: {} bytes", payload.len())
        ));
    }

    Ok(LinkStatistics {
        uplink_rssi_1: payload[0],
        uplink_rssi_2: payload[1],
        uplink_lq: payload[2],
        uplink_snr: payload[3] as i8,
        active_antenna: payload[4],
        rf_mode: payload[5],
        uplink_tx_power: payload[6],
        downlink_rssi: payload[7],
        downlink_lq: payload[8],
        downlink_snr: payload[9] as i8,
    })
}

/// Unpack an RC channels payload into 16 channel values
///
/// Channels are packed as a continuous 11-bit bitstream, LSB first:
/// ```text
/// Byte 0: Ch1[0:7]
/// Byte 1: Ch1[8:10] | Ch2[0:4]
/// Byte 2: Ch2[5:10] | Ch3[0:1]
/// ...
/// ```
pub fn decode_rc_channels(payload: &[u8]) -> Result<RcChannels> {
    if payload.len() < CRSF_RC_CHANNELS_PAYLOAD_SIZE {
        return Err(VtxSyncError::CrsfProtocol(
            format!("RC channels payload too short: {} bytes", payload.len())
        ));
    }

    let mut channels = [0u16; CRSF_NUM_CHANNELS];
    let mut bit_index = 0;

    for channel in channels.iter_mut() {
        let mut value = 0u16;
        for bit in 0..11 {
            let byte = payload[bit_index / 8];
            if (byte >> (bit_index % 8)) & 1 == 1 {
                value |= 1 << bit;
            }
            bit_index += 1;
        }
        *channel = value;
    }

    Ok(channels)
}

/// Reassembles CRSF frames from an arbitrary chunked byte stream
///
/// Garbage before a frame start and frames failing validation are skipped.
#[derive(Debug, Default)]
pub struct FrameReader {
    buffer: BytesMut,
}

impl FrameReader {
    /// Creates an empty reader
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(CRSF_MAX_FRAME_SIZE * 2),
        }
    }

    /// Appends received bytes
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Returns the next complete, CRC-valid frame, if one is buffered
    pub fn next_frame(&mut self) -> Option<CrsfFrame> {
        loop {
            let start = self.buffer.iter().position(|&b| is_frame_start(b));
            match start {
                Some(offset) => self.buffer.advance(offset),
                None => {
                    self.buffer.clear();
                    return None;
                }
            }

            if self.buffer.len() < 2 {
                return None;
            }

            let length = self.buffer[1] as usize;
            if length < 2 || length + 2 > CRSF_MAX_FRAME_SIZE {
                // Not a real frame start, resync on the next candidate byte
                self.buffer.advance(1);
                continue;
            }

            if self.buffer.len() < length + 2 {
                return None;
            }

            let raw = self.buffer.split_to(length + 2);
            match decode_frame(&raw) {
                Ok(frame) => return Some(frame),
                Err(e) => debug!("Dropping invalid CRSF frame: {}", e),
            }
        }
    }
}
