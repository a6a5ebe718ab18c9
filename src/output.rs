//! CSV output for torque series and cycle metrics
//!
//! Files are written to a `.tmp` sibling first and renamed into place once
//! complete, so a failed run never leaves a truncated output behind.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::calibration::CalibrationResult;
use crate::common::format_timestamp;
use crate::error::{LoadcellError, Result};
use crate::pipeline::{CycleRow, TorqueReport, TorqueRow};

pub const TORQUE_HEADER: [&str; 4] = ["timestamp_iso", "raw_value", "adc_corr", "torque_nm"];
pub const CYCLE_HEADER: [&str; 3] = ["cycle_start_iso", "torque_amp_nm", "torque_rms_nm"];

/// Write the torque series, followed by a blank line and the cycle metrics
/// section when there are cycles.
pub fn write_torque_csv<W: Write>(out: &mut W, report: &TorqueReport) -> Result<()> {
    {
        let mut wtr = csv::Writer::from_writer(&mut *out);
        wtr.write_record(TORQUE_HEADER)?;
        for row in &report.rows {
            wtr.write_record(torque_fields(row))?;
        }
        wtr.flush()?;
    }

    if report.has_cycles() {
        writeln!(out)?;
        write_cycles_csv(out, &report.cycles)?;
    }
    Ok(())
}

/// Write the cycle metrics table with its header
pub fn write_cycles_csv<W: Write>(out: &mut W, cycles: &[CycleRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(CYCLE_HEADER)?;
    for cycle in cycles {
        wtr.write_record(cycle_fields(cycle))?;
    }
    wtr.flush()?;
    Ok(())
}

fn torque_fields(row: &TorqueRow) -> [String; 4] {
    [
        format_timestamp(&row.timestamp),
        format!("{:.0}", row.raw_value),
        format!("{:.3}", row.adc_corrected),
        format!("{:.6}", row.torque_nm),
    ]
}

fn cycle_fields(cycle: &CycleRow) -> [String; 3] {
    [
        format_timestamp(&cycle.cycle_start),
        cycle.amplitude.map(|v| format!("{v:.6}")).unwrap_or_default(),
        cycle.rms.map(|v| format!("{v:.6}")).unwrap_or_default(),
    ]
}

/// A fully written `.tmp` sibling waiting to be renamed over its target.
///
/// Dropping it without [`StagedFile::commit`] removes the temporary file.
struct StagedFile {
    tmp_path: PathBuf,
    path: PathBuf,
    committed: bool,
}

impl StagedFile {
    fn write<F>(path: &Path, write: F) -> Result<Self>
    where
        F: FnOnce(&mut BufWriter<fs::File>) -> Result<()>,
    {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let staged = StagedFile {
            tmp_path: tmp_path_for(path),
            path: path.to_path_buf(),
            committed: false,
        };
        let mut out = BufWriter::new(fs::File::create(&staged.tmp_path)?);
        write(&mut out)?;
        let file = out.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(staged)
    }

    fn commit(mut self) -> Result<()> {
        fs::rename(&self.tmp_path, &self.path)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp_path);
        }
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write the torque CSV and, when there are cycles, the stand-alone cycles CSV.
///
/// Both files are fully written before either is moved into place, so a
/// failure leaves neither behind. Returns whether the cycles file was written.
pub fn save_outputs(torque_path: &Path, cycles_path: &Path, report: &TorqueReport) -> Result<bool> {
    let torque = StagedFile::write(torque_path, |out| write_torque_csv(out, report))?;
    let cycles = if report.has_cycles() {
        Some(StagedFile::write(cycles_path, |out| write_cycles_csv(out, &report.cycles))?)
    } else {
        None
    };

    torque.commit()?;
    log::info!("wrote {} torque rows to {}", report.rows.len(), torque_path.display());
    let wrote_cycles = cycles.is_some();
    if let Some(cycles) = cycles {
        cycles.commit()?;
        log::info!("wrote {} cycles to {}", report.cycles.len(), cycles_path.display());
    }
    Ok(wrote_cycles)
}

/// Human-readable calibration summary lines
pub fn summary_lines(calibration: &CalibrationResult) -> [String; 3] {
    [
        format!("ADC_zero (offset): {:.3}", calibration.adc_zero),
        format!("ADC_amp (calibration): {:.3}", calibration.adc_amplitude),
        format!("K_T (Nm/count): {:.9}", calibration.scale_factor),
    ]
}
