//! # VTX Sync Library
//!
//! Keeps a VTX configuration in sync with an ExpressLRS receiver over MSP.
//!
//! The receiver never acknowledges individual MSP commands. The library sends
//! each configuration change in a short burst and infers delivery from the
//! link being up when the burst ends, tolerating brief link drops afterwards.

pub mod config;
pub mod crsf;
pub mod device;
pub mod error;
pub mod link;
pub mod msp;
pub mod serial;
pub mod telemetry;
pub mod vtx;
