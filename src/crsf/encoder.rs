//! # CRSF Packet Encoder
//!
//! Wraps MSP commands into CRSF `MSP_WRITE` extended frames for the ELRS
//! transmitter module, which relays them to the receiver.

use super::crc::{crc8_dvb_s2, msp_v1_checksum};
use super::protocol::*;
use crate::error::{Result, VtxSyncError};
use crate::msp::MspPacket;

/// Encapsulated MSP header (status, size, function) plus its checksum
pub const ENCAPSULATED_MSP_HEADER_CRC_LEN: usize = 4;

/// Largest MSP payload that fits in a single encapsulated frame
pub const ENCAPSULATED_MSP_MAX_PAYLOAD_SIZE: usize = 4;

/// Extended frame overhead counted by the length byte (type + dest + origin + crc)
pub const CRSF_FRAME_LENGTH_EXT_TYPE_CRC: usize = 4;

/// Bytes not counted by the length byte (sync + length)
pub const CRSF_FRAME_NOT_COUNTED_BYTES: usize = 2;

/// Encapsulated MSP status byte: protocol version 1, start-of-message, sequence 0
const ENCAPSULATED_MSP_STATUS: u8 = 0x30;

/// Encode an MSP packet into a complete CRSF `MSP_WRITE` frame
///
/// # Frame Layout
///
/// ```text
/// [sync][len][0x7C][dest][origin][status][size][function][payload..][msp crc][crc]
/// ```
///
/// # Errors
///
/// Returns error if the payload exceeds [`ENCAPSULATED_MSP_MAX_PAYLOAD_SIZE`]
///
/// # Examples
///
/// ```
/// use vtx_sync::crsf::encoder::encode_msp_write_frame;
/// use vtx_sync::msp::{MspPacket, MSP_EEPROM_WRITE};
///
/// let frame = encode_msp_write_frame(&MspPacket::new(MSP_EEPROM_WRITE))?;
/// assert_eq!(frame.len(), 10);
/// # Ok::<(), vtx_sync::error::VtxSyncError>(())
/// ```
pub fn encode_msp_write_frame(packet: &MspPacket) -> Result<Vec<u8>> {
    let payload_size = packet.payload_size();
    if payload_size > ENCAPSULATED_MSP_MAX_PAYLOAD_SIZE {
        return Err(VtxSyncError::CrsfProtocol(format!(
            "MSP payload size {} exceeds maximum {}",
            payload_size, ENCAPSULATED_MSP_MAX_PAYLOAD_SIZE
        )));
    }

    let length = payload_size + ENCAPSULATED_MSP_HEADER_CRC_LEN + CRSF_FRAME_LENGTH_EXT_TYPE_CRC;
    let mut frame = Vec::with_capacity(length + CRSF_FRAME_NOT_COUNTED_BYTES);

    // Extended frame header
    frame.push(CRSF_SYNC_BYTE);
    frame.push(length as u8);
    frame.push(CRSF_FRAMETYPE_MSP_WRITE);
    frame.push(CRSF_ADDRESS_FLIGHT_CONTROLLER);
    frame.push(CRSF_ADDRESS_RADIO_TRANSMITTER);

    // Encapsulated MSP
    frame.push(ENCAPSULATED_MSP_STATUS);
    let msp_start = frame.len();
    frame.push(payload_size as u8);
    frame.push(packet.function);
    frame.extend_from_slice(&packet.payload);
    let msp_crc = msp_v1_checksum(&frame[msp_start..]);
    frame.push(msp_crc);

    // CRC covers type through the MSP checksum
    let crc = crc8_dvb_s2(&frame[2..]);
    frame.push(crc);

    Ok(frame)
}
