//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! The `[vtx]` section is the VTX configuration the core keeps in sync with
//! the receiver side; the rest configures the host around it.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, VtxSyncError};
use crate::vtx::VtxTiming;

/// Number of alternate band/channel slots selectable from an aux switch
pub const NUM_ALT_VTX_CHANNELS: usize = 3;

/// Pit-mode selector: pit-mode always off
pub const PITMODE_OFF: u8 = 0;

/// Pit-mode selector: pit-mode always on
pub const PITMODE_ON: u8 = 1;

/// Highest band number (A, B, E, F, R, L)
pub const VTX_BAND_MAX: u8 = 6;

/// Highest channel number within a band
pub const VTX_CHANNEL_MAX: u8 = 7;

/// Highest power level index
pub const VTX_POWER_MAX: u8 = 8;

/// Highest pit-mode selector (AUX switch on channel 16, inverted)
pub const VTX_PITMODE_SELECTOR_MAX: u8 = 25;

/// Highest alternate-channel switch selector (AUX12 on channel 16)
pub const VTX_ALT_SWITCH_MAX: u8 = 12;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub serial: SerialConfig,
    pub vtx: VtxSettings,
    pub timing: TimingConfig,
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

/// One alternate band/channel slot
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct AltChannel {
    /// Band (1-based), 0 = slot unused
    #[serde(default)]
    pub band: u8,

    /// Channel within the band (0-based)
    #[serde(default)]
    pub channel: u8,
}

/// VTX configuration pushed to the receiver side
///
/// `band == 0` disables VTX control entirely.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct VtxSettings {
    /// Band (1-based), 0 = VTX control off
    #[serde(default)]
    pub band: u8,

    /// Channel within the band (0-based)
    #[serde(default)]
    pub channel: u8,

    /// Power level, 0 = leave the VTX power alone
    #[serde(default)]
    pub power: u8,

    /// Pit-mode selector: 0 = off, 1 = on, otherwise an AUX switch mapping
    /// (odd selectors invert the switch)
    #[serde(default)]
    pub pitmode: u8,

    /// AUX switch selecting an alternate channel, 0 = none
    #[serde(default)]
    pub alt_ch_switch: u8,

    /// Alternate band/channel slots
    #[serde(default)]
    pub alt_channels: Vec<AltChannel>,
}

impl VtxSettings {
    /// Band of alternate slot `index`, 0 if the slot is unset or out of range
    pub fn alt_band(&self, index: usize) -> u8 {
        self.alt_channels.get(index).map_or(0, |slot| slot.band)
    }

    /// Channel of alternate slot `index`, 0 if the slot is unset or out of range
    pub fn alt_channel(&self, index: usize) -> u8 {
        self.alt_channels.get(index).map_or(0, |slot| slot.channel)
    }
}

/// Delivery and host loop timing
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    #[serde(default = "default_send_delay_ms")]
    pub send_delay_ms: u64,

    #[serde(default = "default_resend_interval_ms")]
    pub resend_interval_ms: u64,

    #[serde(default = "default_disconnect_debounce_ms")]
    pub disconnect_debounce_ms: u64,

    #[serde(default = "default_link_timeout_ms")]
    pub link_timeout_ms: u64,

    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl TimingConfig {
    /// Intervals used by the delivery state machine
    pub fn vtx_timing(&self) -> VtxTiming {
        VtxTiming {
            send_delay: Duration::from_millis(self.send_delay_ms),
            resend_interval: Duration::from_millis(self.resend_interval_ms),
            disconnect_debounce: Duration::from_millis(self.disconnect_debounce_ms),
        }
    }
}

/// Delivery status log configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,
}

/// Diagnostic log output
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Directory for daily-rolling log files; console only when unset
    #[serde(default)]
    pub file_dir: Option<String>,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyACM0".to_string() }
fn default_baud_rate() -> u32 { 420000 }

fn default_send_delay_ms() -> u64 { 1000 }
fn default_resend_interval_ms() -> u64 { 500 }
fn default_disconnect_debounce_ms() -> u64 { 10_000 }
fn default_link_timeout_ms() -> u64 { 1000 }
fn default_tick_interval_ms() -> u64 { 10 }

fn default_telemetry_enabled() -> bool { true }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }

fn invalid(message: impl std::fmt::Display) -> VtxSyncError {
    VtxSyncError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use vtx_sync::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if ![115200, 400000, 420000, 921600, 1870000, 3750000].contains(&self.serial.baud_rate) {
            return Err(invalid(
                "baud_rate must be one of: 115200, 400000, 420000, 921600, 1870000, 3750000",
            ));
        }

        self.validate_vtx()?;

        for (name, value, max) in [
            ("send_delay_ms", self.timing.send_delay_ms, 10_000),
            ("resend_interval_ms", self.timing.resend_interval_ms, 10_000),
            ("disconnect_debounce_ms", self.timing.disconnect_debounce_ms, 60_000),
            ("link_timeout_ms", self.timing.link_timeout_ms, 60_000),
            ("tick_interval_ms", self.timing.tick_interval_ms, 1000),
        ] {
            if value == 0 || value > max {
                return Err(invalid(format!("{} must be between 1 and {}", name, max)));
            }
        }

        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        if matches!(&self.logging.file_dir, Some(dir) if dir.is_empty()) {
            return Err(invalid("logging file_dir cannot be empty"));
        }

        Ok(())
    }

    fn validate_vtx(&self) -> Result<()> {
        let vtx = &self.vtx;

        if vtx.band > VTX_BAND_MAX {
            return Err(invalid(format!("vtx band must be between 0 and {}", VTX_BAND_MAX)));
        }

        if vtx.channel > VTX_CHANNEL_MAX {
            return Err(invalid(format!("vtx channel must be between 0 and {}", VTX_CHANNEL_MAX)));
        }

        if vtx.power > VTX_POWER_MAX {
            return Err(invalid(format!("vtx power must be between 0 and {}", VTX_POWER_MAX)));
        }

        if vtx.pitmode > VTX_PITMODE_SELECTOR_MAX {
            return Err(invalid(format!(
                "vtx pitmode must be between 0 and {}",
                VTX_PITMODE_SELECTOR_MAX
            )));
        }

        if vtx.alt_ch_switch > VTX_ALT_SWITCH_MAX {
            return Err(invalid(format!(
                "vtx alt_ch_switch must be between 0 and {}",
                VTX_ALT_SWITCH_MAX
            )));
        }

        if vtx.alt_channels.len() > NUM_ALT_VTX_CHANNELS {
            return Err(invalid(format!(
                "at most {} alt_channels may be configured",
                NUM_ALT_VTX_CHANNELS
            )));
        }

        for (index, slot) in vtx.alt_channels.iter().enumerate() {
            if slot.band > VTX_BAND_MAX || slot.channel > VTX_CHANNEL_MAX {
                return Err(invalid(format!("alt_channels[{}] is out of range", index)));
            }
        }

        Ok(())
    }
}
