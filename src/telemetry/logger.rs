//! # Status Logger
//!
//! Appends [`StatusRecord`]s to `vtx_status_<timestamp>_<seq>.jsonl` files
//! under the configured directory.
//!
//! ## Example Output
//!
//! ```text
//! {"timestamp":"2024-05-01T12:00:00.120Z","status":"sending1","link":"connected","commit_pending":true}
//! {"timestamp":"2024-05-01T12:00:02.130Z","status":"confirmed","link":"connected","commit_pending":true}
//! ```

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::TelemetryConfig;
use crate::error::Result;
use crate::link::LinkState;
use crate::vtx::VtxSendState;

const FILE_PREFIX: &str = "vtx_status_";
const FILE_EXTENSION: &str = "jsonl";

/// One delivery status sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRecord {
    pub timestamp: DateTime<Utc>,
    pub status: VtxSendState,
    pub link: LinkState,
    pub commit_pending: bool,
}

impl StatusRecord {
    /// Sample stamped with the current time
    pub fn now(status: VtxSendState, link: LinkState, commit_pending: bool) -> Self {
        Self {
            timestamp: Utc::now(),
            status,
            link,
            commit_pending,
        }
    }
}

/// Rotating JSONL writer
#[derive(Debug)]
pub struct StatusLogger {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: BufWriter<File>,
    current_path: PathBuf,
    records_in_file: usize,
    file_seq: u32,
}

impl StatusLogger {
    /// Creates the log directory if needed and opens the first file
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        let dir = PathBuf::from(&config.log_dir);
        fs::create_dir_all(&dir)?;

        let (writer, current_path) = Self::open_file(&dir, 0)?;
        info!("Delivery status log: {}", current_path.display());

        let mut logger = Self {
            dir,
            max_records_per_file: config.max_records_per_file.max(1),
            max_files_to_keep: config.max_files_to_keep.max(1),
            writer,
            current_path,
            records_in_file: 0,
            file_seq: 0,
        };
        logger.prune()?;
        Ok(logger)
    }

    /// Appends one record, rotating when the current file is full
    pub fn log(&mut self, record: &StatusRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;

        self.records_in_file += 1;
        if self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }
        Ok(())
    }

    /// File currently written to
    pub fn current_path(&self) -> &Path {
        &self.current_path
    }

    fn rotate(&mut self) -> Result<()> {
        self.file_seq = self.file_seq.wrapping_add(1);
        let (writer, path) = Self::open_file(&self.dir, self.file_seq)?;
        debug!("Rotating delivery status log to {}", path.display());

        self.writer = writer;
        self.current_path = path;
        self.records_in_file = 0;
        self.prune()
    }

    fn open_file(dir: &Path, seq: u32) -> Result<(BufWriter<File>, PathBuf)> {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S%.3f");
        let path = dir.join(format!("{}{}_{:04}.{}", FILE_PREFIX, stamp, seq, FILE_EXTENSION));
        let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
        Ok((BufWriter::new(file), path))
    }

    /// Deletes the oldest log files beyond `max_files_to_keep`
    fn prune(&self) -> Result<()> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_status_log(path))
            .collect();

        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }

        // Names sort chronologically
        files.sort();
        let excess = files.len() - self.max_files_to_keep;
        for path in files.into_iter().take(excess) {
            if path == self.current_path {
                continue;
            }
            if let Err(e) = fs::remove_file(&path) {
                warn!("Failed to remove old status log {}: {}", path.display(), e);
            }
        }
        Ok(())
    }
}

fn is_status_log(path: &Path) -> bool {
    let name_matches = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(FILE_PREFIX));
    name_matches && path.extension().is_some_and(|ext| ext == FILE_EXTENSION)
}
