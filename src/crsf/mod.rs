//! # CRSF Protocol Module
//!
//! Implementation of the Crossfire (CRSF) framing used between the host and
//! the ExpressLRS transmitter module.
//!
//! This module handles:
//! - MSP-over-CRSF (`MSP_WRITE`) frame encoding for outbound VTX commands
//! - Inbound frame reassembly and validation
//! - RC channels and Link Statistics decoding
//! - CRC8-DVB-S2 and MSP checksums

pub mod protocol;
pub mod encoder;
pub mod decoder;
pub mod crc;
