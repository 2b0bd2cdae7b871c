//! # Frame Checksums
//!
//! Two checksums protect an MSP command on its way to the receiver:
//!
//! - **CRC-8-DVB-S2** over the outer CRSF frame (polynomial 0xD5, init 0x00)
//! - **MSP v1 XOR checksum** over the encapsulated MSP size, function and payload

/// CRC-8-DVB-S2 polynomial
const CRC8_POLY: u8 = 0xD5;

/// Precomputed CRC8 lookup table
const CRC8_TABLE: [u8; 256] = generate_crc8_table();

/// Generate CRC8 lookup table at compile time
const fn generate_crc8_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;

    while i < 256 {
        let mut crc = i as u8;
        let mut j = 0;

        while j < 8 {
            if (crc & 0x80) != 0 {
                crc = (crc << 1) ^ CRC8_POLY;
            } else {
                crc <<= 1;
            }
            j += 1;
        }

        table[i] = crc;
        i += 1;
    }

    table
}

/// Calculate CRC8-DVB-S2 checksum
///
/// # Arguments
///
/// * `data` - Bytes covered by the CRSF CRC (frame type through last payload byte)
///
/// # Examples
///
/// ```
/// use vtx_sync::crsf::crc::crc8_dvb_s2;
///
/// assert_eq!(crc8_dvb_s2(&[]), 0x00);
/// ```
pub fn crc8_dvb_s2(data: &[u8]) -> u8 {
    data.iter()
        .fold(0u8, |crc, &byte| CRC8_TABLE[(crc ^ byte) as usize])
}

/// Calculate the MSP v1 checksum (XOR of every covered byte)
pub fn msp_v1_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |crc, &byte| crc ^ byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crc8_bitwise(data: &[u8]) -> u8 {
        let mut crc: u8 = 0;
        for &byte in data {
            crc ^= byte;
            for _ in 0..8 {
                crc = if crc & 0x80 != 0 { (crc << 1) ^ CRC8_POLY } else { crc << 1 };
            }
        }
        crc
    }

    #[test]
    fn test_crc8_empty() {
        assert_eq!(crc8_dvb_s2(&[]), 0x00);
    }

    #[test]
    fn test_crc8_table_matches_bitwise() {
        let test_data = [
            vec![0x7C, 0xC8, 0xEA, 0x30, 0x04, 0x59, 0x0B, 0x00, 0x01, 0x00],
            vec![0x7C, 0xC8, 0xEA, 0x30, 0x00, 0xFA],
            vec![0xFF; 10],
            vec![0x00; 24],
        ];

        for data in test_data.iter() {
            assert_eq!(crc8_dvb_s2(data), crc8_bitwise(data), "CRC mismatch for {:02X?}", data);
        }
    }

    #[test]
    fn test_crc8_known_value() {
        // Single 0x01 byte yields the polynomial itself
        assert_eq!(crc8_dvb_s2(&[0x01]), CRC8_POLY);
    }

    #[test]
    fn test_msp_checksum() {
        assert_eq!(msp_v1_checksum(&[]), 0);
        // size 0, MSP_EEPROM_WRITE
        assert_eq!(msp_v1_checksum(&[0x00, 0xFA]), 0xFA);
        // size 2, MSP_SET_VTX_CONFIG, index 11, reserved 0
        assert_eq!(msp_v1_checksum(&[0x02, 0x59, 0x0B, 0x00]), 0x02 ^ 0x59 ^ 0x0B);
    }
}
