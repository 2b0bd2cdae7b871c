//! # MSP Module
//!
//! MultiWii Serial Protocol messages sent to the receiver side.
//!
//! This module handles:
//! - Building MSP command packets (function code + byte payload)
//! - The transport seam the VTX core pushes packets into
//! - Buffering outbound packets until the serial writer drains them

pub mod packet;
pub mod queue;

pub use packet::{MspPacket, MspPacketType, MSP_EEPROM_WRITE, MSP_SET_VTX_CONFIG};
pub use queue::{MspQueue, MspTransport};

#[cfg(test)]
pub use queue::MockMspTransport;
