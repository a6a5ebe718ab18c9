//! Serial capture of raw loadcell counts
//!
//! The firmware logs one JSON object per reading through ESP-IDF's logger:
//!
//! ```text
//! I (123456) UART: {"raw": 8412345}
//! ```
//!
//! [`parse_raw_line`] extracts the `raw` count from such a line and
//! [`CsvLogAppender`] appends timestamped counts to a log file in the format
//! the readers expect.

use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use serialport::SerialPort;

use crate::common::format_timestamp;
use crate::error::Result;
use crate::reader::{TIMESTAMP_COLUMN, VALUE_COLUMN};

/// Read timeout; a timed-out read lets the caller check for shutdown
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);

static LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"I\s*\(\d+\)\s*UART:\s*(\{.*\})").expect("UART line pattern is valid")
});

/// Extract the raw ADC count from a firmware log line.
///
/// Returns `None` for lines that do not match, carry invalid JSON, or have no
/// integral `raw` field. Fractional values are truncated toward zero and
/// numeric strings are accepted.
pub fn parse_raw_line(line: &str) -> Option<i64> {
    let json = LINE_REGEX.captures(line)?.get(1)?.as_str();
    let data: Value = serde_json::from_str(json).ok()?;
    match data.get("raw")? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|v| v.is_finite()).map(|v| v.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Open the UART the loadcell firmware logs to
pub fn open_port(port: &str, baud: u32) -> Result<Box<dyn SerialPort>> {
    let handle = serialport::new(port, baud).timeout(READ_TIMEOUT).open()?;
    log::info!("opened {port} at {baud} baud");
    Ok(handle)
}

/// Append-only CSV log of `(timestamp_iso, raw_value)` rows
pub struct CsvLogAppender {
    path: PathBuf,
    writer: csv::Writer<BufWriter<File>>,
    rows_written: usize,
}

impl CsvLogAppender {
    /// Open `path` for appending, writing the header only if the file is new
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let is_new = !path.exists();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::Writer::from_writer(BufWriter::new(file));
        if is_new {
            writer.write_record([TIMESTAMP_COLUMN, VALUE_COLUMN])?;
            writer.flush()?;
        }
        log::debug!("appending to {} (new file: {is_new})", path.display());
        Ok(Self {
            path,
            writer,
            rows_written: 0,
        })
    }

    /// Write one reading and flush it to disk
    pub fn append(&mut self, timestamp: &NaiveDateTime, raw: i64) -> Result<()> {
        self.writer
            .write_record([format_timestamp(timestamp), raw.to_string()])?;
        self.writer.flush()?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CsvLogAppender {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            log::error!("failed to flush {}: {e}", self.path.display());
        }
    }
}

/// Decode a raw serial line, dropping invalid UTF-8 and surrounding whitespace
pub fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .replace(char::REPLACEMENT_CHARACTER, "")
        .trim()
        .to_string()
}
