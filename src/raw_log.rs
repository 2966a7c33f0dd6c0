//! Raw IRC traffic log.
//!
//! Every line a Connection reads or writes is mirrored to a [`RawLog`]
//! tagged with its direction. The sink is handed to each Connection at
//! construction; the daemon shares one [`FileRawLog`] across all networks
//! and tests use [`MemoryRawLog`]. The log is write-only: nothing in the
//! gateway reads it back.

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Which way a line travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Read from the server.
    Inbound,
    /// Written to the server.
    Outbound,
}

impl Direction {
    pub fn tag(self) -> &'static str {
        match self {
            Direction::Inbound => "<--",
            Direction::Outbound => "-->",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Append-only sink for raw traffic.
pub trait RawLog: Send + Sync {
    /// Record one line (without its terminator) for the network at `address`.
    fn record(&self, address: &str, direction: Direction, line: &str);
}

/// Discards everything. Used when raw logging is not configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRawLog;

impl RawLog for NullRawLog {
    fn record(&self, _address: &str, _direction: Direction, _line: &str) {}
}

/// Raw log file, one record per line:
///
/// ```text
/// 2024-05-01T12:00:00.000Z <-- irc.libera.chat:6697 PING :molybdenum.libera.chat
/// ```
pub struct FileRawLog {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl FileRawLog {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RawLog for FileRawLog {
    fn record(&self, address: &str, direction: Direction, line: &str) {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut writer = self.writer.lock();
        let result = writeln!(writer, "{timestamp} {direction} {address} {line}")
            .and_then(|()| writer.flush());
        if let Err(e) = result {
            warn!(path = %self.path.display(), error = %e, "Failed to write raw log");
        }
    }
}

/// One record held by a [`MemoryRawLog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub at: DateTime<Utc>,
    pub address: String,
    pub direction: Direction,
    pub line: String,
}

/// In-memory raw log.
#[derive(Debug, Default)]
pub struct MemoryRawLog {
    records: Mutex<Vec<RawRecord>>,
}

impl MemoryRawLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn records(&self) -> Vec<RawRecord> {
        self.records.lock().clone()
    }

    /// Lines recorded in one direction, in order.
    pub fn lines(&self, direction: Direction) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.direction == direction)
            .map(|r| r.line.clone())
            .collect()
    }
}

impl RawLog for MemoryRawLog {
    fn record(&self, address: &str, direction: Direction, line: &str) {
        self.records.lock().push(RawRecord {
            at: Utc::now(),
            address: address.to_owned(),
            direction,
            line: line.to_owned(),
        });
    }
}
