//! Series readers for loadcell CSV logs
//!
//! Logs have a header row and the columns `timestamp_iso, raw_value`, as
//! written by the collector. Rows with a missing or unparseable timestamp or
//! value are dropped.
//!
//! Two readers share the [`SeriesReader`] interface:
//! - [`CsvSeriesReader`] uses the `csv` crate, locates the columns by header
//!   name and rejects files without them.
//! - [`PlainSeriesReader`] splits lines on commas and takes the first two
//!   fields positionally, ignoring the header.

use std::fs;
use std::io::Read;
use std::path::Path;

use crate::common::parse_timestamp;
use crate::error::{LoadcellError, Result};
use crate::pipeline::RunInputs;
use crate::series::{Sample, Series};

pub const TIMESTAMP_COLUMN: &str = "timestamp_iso";
pub const VALUE_COLUMN: &str = "raw_value";

/// Source of a timestamped series
pub trait SeriesReader {
    fn read_series(&self, path: &Path) -> Result<Series>;
}

/// Which reader implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReaderKind {
    /// Header-aware reader
    #[default]
    Csv,
    /// Positional line reader
    Plain,
}

impl ReaderKind {
    pub fn reader(self) -> Box<dyn SeriesReader> {
        match self {
            ReaderKind::Csv => Box::new(CsvSeriesReader),
            ReaderKind::Plain => Box::new(PlainSeriesReader),
        }
    }
}

/// Header-aware CSV reader
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvSeriesReader;

impl CsvSeriesReader {
    /// Read a series from any CSV byte source
    pub fn read_from<R: Read>(&self, source: R) -> Result<Series> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(source);

        let headers = rdr.headers()?.clone();
        let column = |name: &str| headers.iter().position(|h| h == name);
        let (ts_idx, value_idx) = match (column(TIMESTAMP_COLUMN), column(VALUE_COLUMN)) {
            (Some(t), Some(v)) => (t, v),
            _ => {
                return Err(LoadcellError::MissingColumns {
                    expected: format!("{TIMESTAMP_COLUMN}, {VALUE_COLUMN}"),
                })
            }
        };

        let mut samples = Vec::new();
        let mut skipped = 0usize;
        for record in rdr.records() {
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    log::debug!("skipping unreadable row: {e}");
                    skipped += 1;
                    continue;
                }
            };
            match parse_fields(record.get(ts_idx), record.get(value_idx)) {
                Some(sample) => samples.push(sample),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            log::debug!("dropped {skipped} invalid rows");
        }
        Ok(Series::new(samples))
    }
}

impl SeriesReader for CsvSeriesReader {
    fn read_series(&self, path: &Path) -> Result<Series> {
        let file = fs::File::open(path)?;
        let series = self.read_from(file)?;
        log::info!("read {} samples from {}", series.len(), path.display());
        Ok(series)
    }
}

/// Positional reader: first field timestamp, second field value
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainSeriesReader;

impl PlainSeriesReader {
    pub fn read_str(&self, text: &str) -> Series {
        text.lines()
            .skip(1)
            .filter_map(|line| {
                let mut fields = line.split(',');
                parse_fields(fields.next(), fields.next())
            })
            .collect()
    }
}

impl SeriesReader for PlainSeriesReader {
    fn read_series(&self, path: &Path) -> Result<Series> {
        let text = fs::read_to_string(path)?;
        let series = self.read_str(&text);
        log::info!("read {} samples from {}", series.len(), path.display());
        Ok(series)
    }
}

fn parse_fields(timestamp: Option<&str>, value: Option<&str>) -> Option<Sample> {
    let timestamp = parse_timestamp(timestamp?).ok()?;
    let value: f64 = value?.trim().parse().ok()?;
    value.is_finite().then_some(Sample::new(timestamp, value))
}

/// Read the offset, calibration and sample captures of one run
pub fn read_inputs(
    reader: &dyn SeriesReader,
    offset: &Path,
    calibration: &Path,
    sample: &Path,
) -> Result<RunInputs> {
    Ok(RunInputs {
        offset: reader.read_series(offset)?,
        calibration: reader.read_series(calibration)?,
        sample: reader.read_series(sample)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LOG: &str = "timestamp_iso,raw_value\n\
        2024-05-01T10:00:00.000000,8123\n\
        2024-05-01T10:00:00.100000,8150\n\
        not-a-time,8000\n\
        2024-05-01T10:00:00.200000,\n\
        \n\
        2024-05-01T10:00:00.300000,8099.5\n";

    #[test]
    fn test_csv_reader_drops_bad_rows() {
        let series = CsvSeriesReader.read_from(LOG.as_bytes()).unwrap();
        assert_eq!(series.values().collect::<Vec<_>>(), vec![8123.0, 8150.0, 8099.5]);
    }

    #[test]
    fn test_csv_reader_finds_columns_by_name() {
        let text = "raw_value,note,timestamp_iso\n42,x,2024-05-01T10:00:00\n";
        let series = CsvSeriesReader.read_from(text.as_bytes()).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.samples()[0].value, 42.0);
    }

    #[test]
    fn test_csv_reader_requires_columns() {
        let text = "time,value\n2024-05-01T10:00:00,1\n";
        assert!(matches!(
            CsvSeriesReader.read_from(text.as_bytes()),
            Err(LoadcellError::MissingColumns { .. })
        ));
    }

    #[test]
    fn test_plain_reader_is_positional() {
        let text = "anything,goes\n2024-05-01T10:00:00,1\nshort\n2024-05-01T10:00:01,2,extra\n";
        let series = PlainSeriesReader.read_str(text);
        assert_eq!(series.values().collect::<Vec<_>>(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_readers_agree_on_collector_output() {
        let csv = CsvSeriesReader.read_from(LOG.as_bytes()).unwrap();
        let plain = PlainSeriesReader.read_str(LOG);
        assert_eq!(csv, plain);
    }

    #[test]
    fn test_read_series_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LOG.as_bytes()).unwrap();
        for kind in [ReaderKind::Csv, ReaderKind::Plain] {
            let series = kind.reader().read_series(file.path()).unwrap();
            assert_eq!(series.len(), 3);
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = CsvSeriesReader
            .read_series(Path::new("/nonexistent/loadcell.csv"))
            .unwrap_err();
        assert!(matches!(err, LoadcellError::Io(_)));
    }
}
