//! # Serial Communication Module
//!
//! Handles serial communication with the ELRS USB module.
//!
//! This module handles:
//! - Opening the serial port with CRSF line settings (8N1, no flow control)
//! - Writing MSP commands wrapped in CRSF frames
//! - Reading inbound CRSF frames (RC channels, link statistics) on a task

pub mod port_trait;

use tokio::io::{AsyncRead, AsyncReadExt, ReadHalf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, warn};

use crate::crsf::decoder::FrameReader;
use crate::crsf::encoder::encode_msp_write_frame;
use crate::crsf::protocol::CrsfFrame;
use crate::error::{Result, VtxSyncError};
use crate::msp::MspPacket;
use port_trait::{SerialPortIO, TokioSerialPort};

/// CRSF baud rate for ELRS (420,000 baud)
pub const CRSF_BAUD_RATE: u32 = 420_000;

/// Default ELRS device paths to try (in order of preference)
pub const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyACM0", // USB CDC devices (most common for ELRS)
    "/dev/ttyUSB0", // USB-to-serial adapters
];

/// Read buffer size for the frame reader task
const READ_CHUNK_SIZE: usize = 256;

/// ELRS Serial Port Handler
///
/// Owns the write half of the port. [`ElrsSerial::open_with_paths`] hands
/// the read half back separately for [`spawn_reader`].
pub struct ElrsSerial {
    port: Box<dyn SerialPortIO>,
    device_path: String,
}

impl std::fmt::Debug for ElrsSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElrsSerial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl ElrsSerial {
    /// Open the first ELRS device found at the default paths
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use vtx_sync::serial::{ElrsSerial, CRSF_BAUD_RATE};
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let (serial, _reader) = ElrsSerial::open(CRSF_BAUD_RATE)?;
    ///     println!("Connected to: {}", serial.device_path());
    ///     Ok(())
    /// }
    /// ```
    pub fn open(baud_rate: u32) -> Result<(Self, ReadHalf<SerialStream>)> {
        Self::open_with_paths(DEFAULT_DEVICE_PATHS, baud_rate)
    }

    /// Open the first path that works
    ///
    /// # Errors
    ///
    /// Returns [`VtxSyncError::SerialPortNotFound`] listing every path tried
    pub fn open_with_paths(
        paths: &[&str],
        baud_rate: u32,
    ) -> Result<(Self, ReadHalf<SerialStream>)> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate) {
                Ok(stream) => {
                    info!("Opened ELRS device at {} ({} baud)", path, baud_rate);
                    let (reader, writer) = tokio::io::split(stream);
                    let serial = Self {
                        port: Box::new(TokioSerialPort::new(writer)),
                        device_path: path.to_string(),
                    };
                    return Ok((serial, reader));
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                }
            }
        }

        Err(VtxSyncError::SerialPortNotFound(paths.join(", ")))
    }

    /// Wrap an already-open port
    pub fn with_port(port: Box<dyn SerialPortIO>, device_path: impl Into<String>) -> Self {
        Self {
            port,
            device_path: device_path.into(),
        }
    }

    fn open_port(path: &str, baud_rate: u32) -> Result<SerialStream> {
        tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| VtxSyncError::Serial(format!("Failed to open {}: {}", path, e)))
    }

    /// Write one complete frame and flush
    pub async fn send_packet(&mut self, packet: &[u8]) -> Result<()> {
        self.port
            .write_all(packet)
            .await
            .map_err(|e| VtxSyncError::Serial(format!("Failed to write packet: {}", e)))?;

        self.port
            .flush()
            .await
            .map_err(|e| VtxSyncError::Serial(format!("Failed to flush serial port: {}", e)))?;

        debug!("Sent CRSF frame ({} bytes)", packet.len());
        Ok(())
    }

    /// Wrap an MSP command in a CRSF `MSP_WRITE` frame and send it
    pub async fn send_msp(&mut self, packet: &MspPacket) -> Result<()> {
        let frame = encode_msp_write_frame(packet)?;
        self.send_packet(&frame).await?;
        debug!("Sent MSP function {} ({:?})", packet.function, packet.payload);
        Ok(())
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

/// Read CRSF frames from `reader` until EOF or the receiver goes away
///
/// Frames that fail validation are dropped by the [`FrameReader`].
pub async fn read_frames<R>(mut reader: R, frames: mpsc::Sender<CrsfFrame>) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut assembler = FrameReader::new();
    let mut buf = [0u8; READ_CHUNK_SIZE];

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            debug!("Serial reader reached end of stream");
            return Ok(());
        }

        assembler.push(&buf[..n]);
        while let Some(frame) = assembler.next_frame() {
            if frames.send(frame).await.is_err() {
                return Ok(());
            }
        }
    }
}

/// Run [`read_frames`] on its own task
pub fn spawn_reader<R>(reader: R, frames: mpsc::Sender<CrsfFrame>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = read_frames(reader, frames).await {
            warn!("Serial reader stopped: {}", e);
        }
    })
}
