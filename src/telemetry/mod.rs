//! # Telemetry Module
//!
//! Delivery status log: one JSON line per observed change of the delivery
//! state or the link, written to rotating files.
//!
//! This module handles:
//! - Formatting status records as JSONL (JSON Lines)
//! - Rotating to a new file after N records
//! - Retaining only the last M files

pub mod logger;

pub use logger::{StatusLogger, StatusRecord};
