//! # VTX Sync
//!
//! Keeps the VTX settings of an ExpressLRS receiver in sync with a local
//! TOML configuration, through the ELRS transmitter module on a USB serial port.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Load configuration (first CLI argument, default `config/default.toml`)
//!    - Set up logging with tracing subscriber (plus optional daily log file)
//!    - Open the serial port and start the CRSF frame reader task
//!
//! 2. **Main Loop**
//!    - Every tick: poll AUX switches, sample the link, run the VTX device,
//!      and write queued MSP commands to the serial port
//!    - Inbound frames: RC channels feed the switch monitor, link statistics
//!      feed the link monitor
//!    - `SIGUSR1` forces a resync, `SIGHUP` reloads the `[vtx]` section
//!
//! 3. **Graceful Shutdown**
//!    - Ctrl+C stops the loop and the reader task
//!
//! # Examples
//!
//! ```bash
//! cargo run --release -- config/default.toml
//! kill -USR1 $(pidof vtx-sync)   # resend the VTX config
//! ```

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use vtx_sync::config::{Config, LoggingConfig};
use vtx_sync::crsf::decoder::{decode_link_statistics, decode_rc_channels};
use vtx_sync::crsf::protocol::{
    CrsfFrame, RcChannels, CRSF_FRAMETYPE_LINK_STATISTICS, CRSF_FRAMETYPE_RC_CHANNELS_PACKED,
};
use vtx_sync::device::{DeviceContext, DeviceRunner};
use vtx_sync::link::{LinkMonitor, LinkState};
use vtx_sync::msp::MspQueue;
use vtx_sync::serial::{spawn_reader, ElrsSerial};
use vtx_sync::telemetry::{StatusLogger, StatusRecord};
use vtx_sync::vtx::{VtxDevice, VtxSendState};

/// Config file used when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Inbound frames buffered between the reader task and the main loop
const FRAME_CHANNEL_CAPACITY: usize = 64;

/// File name prefix of the daily-rolling diagnostic log
const LOG_FILE_PREFIX: &str = "vtx-sync.log";

/// Everything the main loop drives, minus the serial port
struct Host {
    config: Config,
    config_path: PathBuf,
    runner: DeviceRunner<VtxDevice>,
    queue: MspQueue,
    link: LinkMonitor,
    /// Link state sampled on the last tick
    link_state: LinkState,
    /// Last decoded RC channels, `None` until the first frame arrives
    channels: Option<RcChannels>,
    status_log: Option<StatusLogger>,
    last_reported: Option<(VtxSendState, LinkState)>,
}

impl Host {
    fn new(config: Config, config_path: PathBuf) -> Result<Self> {
        let status_log = if config.telemetry.enabled {
            Some(StatusLogger::new(&config.telemetry).context("Failed to open status log")?)
        } else {
            None
        };

        let mut host = Self {
            runner: DeviceRunner::new(VtxDevice::new(config.timing.vtx_timing())),
            queue: MspQueue::new(),
            link: LinkMonitor::new(Duration::from_millis(config.timing.link_timeout_ms)),
            link_state: LinkState::Disconnected,
            channels: None,
            status_log,
            last_reported: None,
            config,
            config_path,
        };

        let mut ctx = DeviceContext::new(&host.config.vtx, LinkState::Disconnected, &mut host.queue);
        host.runner.start(0, &mut ctx);
        Ok(host)
    }

    /// One scheduler pass at `now_ms`
    ///
    /// Switches are only polled once real channel data has been received.
    fn tick(&mut self, now_ms: u64) {
        if let Some(channels) = self.channels.as_ref() {
            if self
                .runner
                .device_mut()
                .update_switches(&self.config.vtx, channels)
            {
                self.runner.trigger_event();
            }
        }

        let link = self.link.state(now_ms);
        self.link_state = link;
        let mut ctx = DeviceContext::new(&self.config.vtx, link, &mut self.queue);
        self.runner.update(now_ms, &mut ctx);

        self.record_status(link);
    }

    fn on_frame(&mut self, frame: &CrsfFrame, now_ms: u64) {
        match frame.frame_type {
            CRSF_FRAMETYPE_RC_CHANNELS_PACKED => match decode_rc_channels(&frame.payload) {
                Ok(channels) => self.channels = Some(channels),
                Err(e) => debug!("Ignoring RC channels frame: {}", e),
            },
            CRSF_FRAMETYPE_LINK_STATISTICS => match decode_link_statistics(&frame.payload) {
                Ok(stats) => self.link.on_link_statistics(&stats, now_ms),
                Err(e) => debug!("Ignoring link statistics frame: {}", e),
            },
            other => debug!("Ignoring CRSF frame type 0x{:02X}", other),
        }
    }

    /// Resend the current config without committing it again
    fn resync(&mut self) {
        self.runner.device_mut().trigger_send();
        self.runner.trigger_event();
    }

    /// Re-read the config file and apply a changed `[vtx]` section
    ///
    /// Other sections take effect on restart.
    fn reload(&mut self) {
        let config = match Config::load(&self.config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Config reload failed, keeping current settings: {}", e);
                return;
            }
        };

        if config.vtx == self.config.vtx {
            info!("Config reloaded, VTX settings unchanged");
            return;
        }

        info!("Config reloaded, VTX settings changed");
        self.config.vtx = config.vtx;
        self.runner.device_mut().config_changed();
        self.runner.trigger_event();
    }

    fn record_status(&mut self, link: LinkState) {
        let device = self.runner.device();
        let current = (device.status(), link);
        if self.last_reported == Some(current) {
            return;
        }
        self.last_reported = Some(current);

        if let Some(log) = self.status_log.as_mut() {
            let record = StatusRecord::now(current.0, link, device.commit_pending());
            if let Err(e) = log.log(&record) {
                warn!("Failed to write status record: {}", e);
            }
        }
    }

    /// Write every queued MSP command to the module
    ///
    /// Packets stay queued while the link is down, so a burst that ends
    /// disconnected is purged in full.
    async fn drain(&mut self, serial: &mut ElrsSerial) {
        if !self.link_state.is_connected() {
            return;
        }

        while let Some(packet) = self.queue.pop() {
            if let Err(e) = serial.send_msp(&packet).await {
                warn!("Failed to send MSP function {}: {}", packet.function, e);
            }
        }
    }
}

fn config_path() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Console logging, plus a daily-rolling file when configured
///
/// The returned guard must live as long as logging is needed.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter).with(fmt::layer());

    match &config.file_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[tokio::main]
async fn main() -> Result<()> {
    let path = config_path();
    let config = Config::load(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    let _log_guard = init_logging(&config.logging);
    info!("VTX Sync v{} starting...", env!("CARGO_PKG_VERSION"));

    let (mut serial, reader) =
        ElrsSerial::open_with_paths(&[config.serial.port.as_str()], config.serial.baud_rate)?;
    info!("ELRS serial port opened at: {}", serial.device_path());

    let (frame_tx, mut frame_rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
    let reader_task = spawn_reader(reader, frame_tx);

    let mut ticker = interval(Duration::from_millis(config.timing.tick_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut resync_signal = signal(SignalKind::user_defined1())?;
    let mut reload_signal = signal(SignalKind::hangup())?;

    let mut host = Host::new(config, path)?;
    let start = Instant::now();

    info!("Press Ctrl+C to exit");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                host.tick(elapsed_ms(start));
                host.drain(&mut serial).await;
            }

            Some(frame) = frame_rx.recv() => {
                host.on_frame(&frame, elapsed_ms(start));
            }

            _ = resync_signal.recv() => {
                info!("Received SIGUSR1, resending VTX config");
                host.resync();
            }

            _ = reload_signal.recv() => {
                info!("Received SIGHUP, reloading {}", host.config_path.display());
                host.reload();
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    reader_task.abort();
    Ok(())
}
