//! # MSP Packet
//!
//! An outbound MSP message. Built fresh for every send and handed to the
//! transport by value.

/// Set VTX band/channel/power/pit-mode on the receiver side
pub const MSP_SET_VTX_CONFIG: u8 = 89;

/// Persist the currently applied settings to non-volatile storage
pub const MSP_EEPROM_WRITE: u8 = 250;

/// MSP packet direction/kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MspPacketType {
    /// Freshly reset packet with no explicit kind
    #[default]
    Unknown,
    /// Request that changes state on the other side
    Command,
    /// Reply to a previous command
    Response,
}

/// MSP packet: function code plus payload
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MspPacket {
    /// Packet kind
    pub packet_type: MspPacketType,

    /// Function code (e.g. [`MSP_SET_VTX_CONFIG`])
    pub function: u8,

    /// Payload bytes
    pub payload: Vec<u8>,
}

impl MspPacket {
    /// Create an empty packet for `function` with no explicit kind
    pub fn new(function: u8) -> Self {
        Self {
            packet_type: MspPacketType::Unknown,
            function,
            payload: Vec::new(),
        }
    }

    /// Create an empty command packet for `function`
    ///
    /// # Examples
    ///
    /// ```
    /// use vtx_sync::msp::{MspPacket, MspPacketType, MSP_SET_VTX_CONFIG};
    ///
    /// let mut packet = MspPacket::command(MSP_SET_VTX_CONFIG);
    /// packet.add_byte(11);
    /// assert_eq!(packet.packet_type, MspPacketType::Command);
    /// assert_eq!(packet.payload, vec![11]);
    /// ```
    pub fn command(function: u8) -> Self {
        Self {
            packet_type: MspPacketType::Command,
            ..Self::new(function)
        }
    }

    /// Append one byte to the payload
    pub fn add_byte(&mut self, byte: u8) {
        self.payload.push(byte);
    }

    /// Payload size in bytes
    pub fn payload_size(&self) -> usize {
        self.payload.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_codes() {
        assert_eq!(MSP_SET_VTX_CONFIG, 0x59);
        assert_eq!(MSP_EEPROM_WRITE, 0xFA);
    }

    #[test]
    fn test_new_packet_is_empty() {
        let packet = MspPacket::new(MSP_EEPROM_WRITE);
        assert_eq!(packet.packet_type, MspPacketType::Unknown);
        assert_eq!(packet.function, MSP_EEPROM_WRITE);
        assert_eq!(packet.payload_size(), 0);
    }

    #[test]
    fn test_add_byte_preserves_order() {
        let mut packet = MspPacket::command(MSP_SET_VTX_CONFIG);
        for byte in [3, 0, 2, 1] {
            packet.add_byte(byte);
        }
        assert_eq!(packet.payload, vec![3, 0, 2, 1]);
    }
}
