//! # VTX Module
//!
//! Keeps the receiver-side video transmitter in sync with the local VTX
//! configuration over an unacknowledged MSP link.
//!
//! This module handles:
//! - Deriving pit-mode and alternate-channel selections from AUX switches
//! - Building the `MSP_SET_VTX_CONFIG` and `MSP_EEPROM_WRITE` packets
//! - The delivery state machine that bursts the config and infers delivery
//!   from the link state

pub mod builder;
pub mod state;
pub mod switches;

pub use builder::{build_eeprom_write, build_vtx_config, vtx_index};
pub use state::{VtxDevice, VtxSendState, VtxTiming};
pub use switches::{AuxState, AuxSwitchMonitor};
