//! Torque pipeline: calibration applied to a sample capture
//!
//! Converts every raw count of the sample series into torque using the
//! calibration's zero and scale factor, then windows the torque series into
//! cycles for per-cycle amplitude and RMS.

use std::fmt;

use chrono::NaiveDateTime;

use crate::calibration::{self, CalibrationReference, CalibrationResult};
use crate::error::{LoadcellError, Result};
use crate::series::{Sample, Series};
use crate::window::{self, CycleValue};

/// One calibrated output row per input sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorqueRow {
    pub timestamp: NaiveDateTime,
    pub raw_value: f64,
    pub adc_corrected: f64,
    pub torque_nm: f64,
}

/// Per-cycle torque metrics as emitted; a metric is `None` when unavailable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleRow {
    pub cycle_start: NaiveDateTime,
    pub amplitude: Option<f64>,
    pub rms: Option<f64>,
}

/// Non-fatal conditions raised while producing a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineWarning {
    /// Windowing the torque series produced no cycles
    NoCycles,
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineWarning::NoCycles => {
                write!(f, "No cycles computed. Check timestamps and frequency.")
            }
        }
    }
}

/// Calibrated torque series plus its per-cycle metrics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TorqueReport {
    pub rows: Vec<TorqueRow>,
    pub cycles: Vec<CycleRow>,
    pub warnings: Vec<PipelineWarning>,
}

impl TorqueReport {
    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }

    /// Torque values as a series, for re-windowing or plotting
    pub fn torque_series(&self) -> Series {
        self.rows
            .iter()
            .map(|r| Sample::new(r.timestamp, r.torque_nm))
            .collect()
    }
}

/// Settings shared by calibration and torque conversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Oscillation frequency; `None` or non-positive disables per-cycle processing
    pub frequency_hz: Option<f64>,
    pub reference: CalibrationReference,
}

/// The three captures of one test run
#[derive(Debug, Clone, Default)]
pub struct RunInputs {
    pub offset: Series,
    pub calibration: Series,
    pub sample: Series,
}

/// Convert a sample series to torque and compute per-cycle metrics on the result
pub fn apply_calibration(
    sample: &Series,
    adc_zero: f64,
    scale_factor: f64,
    frequency_hz: Option<f64>,
) -> TorqueReport {
    let rows: Vec<TorqueRow> = sample
        .samples()
        .iter()
        .map(|s| {
            let adc_corrected = s.value - adc_zero;
            TorqueRow {
                timestamp: s.timestamp,
                raw_value: s.value,
                adc_corrected,
                torque_nm: adc_corrected * scale_factor,
            }
        })
        .collect();

    let mut report = TorqueReport {
        rows,
        ..TorqueReport::default()
    };

    let torque = report.torque_series();
    let metrics = frequency_hz
        .map(|f| window::cycle_metrics(&torque, f))
        .unwrap_or_default();
    let amplitudes: Vec<CycleValue> = metrics
        .iter()
        .map(|m| CycleValue {
            cycle_start: m.cycle_start,
            value: m.amplitude,
        })
        .collect();
    let rms: Vec<CycleValue> = metrics
        .iter()
        .map(|m| CycleValue {
            cycle_start: m.cycle_start,
            value: m.rms,
        })
        .collect();

    report.cycles = merge_cycle_rows(&amplitudes, &rms);
    if report.cycles.is_empty() {
        log::warn!("{}", PipelineWarning::NoCycles);
        report.warnings.push(PipelineWarning::NoCycles);
    }
    report
}

/// Pair amplitude and RMS cycles by index.
///
/// Both lists are expected to come from the same windowing pass. When both
/// are present the shorter length wins and cycle starts come from the RMS
/// list; when only one is present the other metric is left empty.
pub fn merge_cycle_rows(amplitudes: &[CycleValue], rms: &[CycleValue]) -> Vec<CycleRow> {
    match (amplitudes.is_empty(), rms.is_empty()) {
        (true, true) => Vec::new(),
        (false, false) => {
            if amplitudes.len() != rms.len() {
                log::warn!(
                    "cycle lists differ in length ({} amplitude, {} rms); truncating",
                    amplitudes.len(),
                    rms.len()
                );
            }
            amplitudes
                .iter()
                .zip(rms)
                .map(|(a, r)| CycleRow {
                    cycle_start: r.cycle_start,
                    amplitude: Some(a.value),
                    rms: Some(r.value),
                })
                .collect()
        }
        (false, true) => amplitudes
            .iter()
            .map(|a| CycleRow {
                cycle_start: a.cycle_start,
                amplitude: Some(a.value),
                rms: None,
            })
            .collect(),
        (true, false) => rms
            .iter()
            .map(|r| CycleRow {
                cycle_start: r.cycle_start,
                amplitude: None,
                rms: Some(r.value),
            })
            .collect(),
    }
}

/// Calibrate from the offset and calibration captures, then convert the sample capture.
///
/// All three series must be non-empty; nothing is computed otherwise.
pub fn run_pipeline(
    inputs: &RunInputs,
    config: &PipelineConfig,
) -> Result<(CalibrationResult, TorqueReport)> {
    for (name, series) in [
        ("offset", &inputs.offset),
        ("calibration", &inputs.calibration),
        ("sample", &inputs.sample),
    ] {
        if series.is_empty() {
            return Err(LoadcellError::InvalidInput { series: name });
        }
    }

    let calibration = calibration::calibrate(
        &inputs.offset,
        &inputs.calibration,
        config.frequency_hz,
        &config.reference,
    )?;
    let report = apply_calibration(
        &inputs.sample,
        calibration.adc_zero,
        calibration.scale_factor,
        config.frequency_hz,
    );

    log::info!(
        "converted {} samples, {} cycles",
        report.rows.len(),
        report.cycles.len()
    );
    Ok((calibration, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn at_ms(ms: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 2)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap()
            + Duration::milliseconds(ms)
    }

    fn series_every_ms(step_ms: i64, values: &[f64]) -> Series {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| Sample::new(at_ms(i as i64 * step_ms), v))
            .collect()
    }

    fn cv(ms: i64, value: f64) -> CycleValue {
        CycleValue {
            cycle_start: at_ms(ms),
            value,
        }
    }

    #[test]
    fn test_rows_follow_offset_and_scale() {
        let sample = series_every_ms(100, &[1000.0, 1500.0, 500.0]);
        let report = apply_calibration(&sample, 1000.0, 0.01, None);
        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.rows[1].raw_value, 1500.0);
        assert_eq!(report.rows[1].adc_corrected, 500.0);
        assert!((report.rows[1].torque_nm - 5.0).abs() < 1e-12);
        assert!((report.rows[2].torque_nm + 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_torque_scales_linearly_with_corrected_counts() {
        let zero = 2048.0;
        let k = 0.004;
        let c = 3.0;
        let corrected = [12.0, -40.5, 7.25, 0.0, 99.0];
        let base: Vec<f64> = corrected.iter().map(|v| v + zero).collect();
        let scaled: Vec<f64> = corrected.iter().map(|v| v * c + zero).collect();

        let a = apply_calibration(&series_every_ms(10, &base), zero, k, None);
        let b = apply_calibration(&series_every_ms(10, &scaled), zero, k, None);
        for (ra, rb) in a.rows.iter().zip(&b.rows) {
            assert!((rb.torque_nm - c * ra.torque_nm).abs() < 1e-9);
        }
    }

    #[test]
    fn test_cycles_are_computed_on_torque() {
        // 1 Hz, 4 samples per cycle, counts swing ±200 around 1000
        let counts = [1200.0, 800.0, 1200.0, 800.0, 1100.0, 900.0, 1100.0, 900.0];
        let report = apply_calibration(&series_every_ms(250, &counts), 1000.0, 0.01, Some(1.0));
        assert_eq!(report.cycles.len(), 2);
        assert_eq!(report.cycles[0].cycle_start, at_ms(0));
        assert_eq!(report.cycles[1].cycle_start, at_ms(1000));
        assert!((report.cycles[0].amplitude.unwrap() - 2.0).abs() < 1e-12);
        assert!((report.cycles[0].rms.unwrap() - 2.0).abs() < 1e-12);
        assert!((report.cycles[1].amplitude.unwrap() - 1.0).abs() < 1e-12);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_no_cycles_is_a_warning_not_an_error() {
        let sample = series_every_ms(100, &[1.0, 2.0, 3.0]);
        let report = apply_calibration(&sample, 0.0, 1.0, Some(0.0));
        assert_eq!(report.rows.len(), 3);
        assert!(!report.has_cycles());
        assert_eq!(report.warnings, vec![PipelineWarning::NoCycles]);
    }

    #[test]
    fn test_merge_pairs_by_index() {
        let rows = merge_cycle_rows(&[cv(0, 1.0), cv(500, 2.0)], &[cv(0, 0.5), cv(500, 1.5)]);
        assert_eq!(
            rows,
            vec![
                CycleRow { cycle_start: at_ms(0), amplitude: Some(1.0), rms: Some(0.5) },
                CycleRow { cycle_start: at_ms(500), amplitude: Some(2.0), rms: Some(1.5) },
            ]
        );
    }

    #[test]
    fn test_merge_with_one_side_missing() {
        let amp_only = merge_cycle_rows(&[cv(0, 1.0)], &[]);
        assert_eq!(amp_only[0].amplitude, Some(1.0));
        assert_eq!(amp_only[0].rms, None);

        let rms_only = merge_cycle_rows(&[], &[cv(0, 0.7), cv(500, 0.8)]);
        assert_eq!(rms_only.len(), 2);
        assert_eq!(rms_only[1].amplitude, None);
        assert_eq!(rms_only[1].rms, Some(0.8));

        assert!(merge_cycle_rows(&[], &[]).is_empty());
    }

    #[test]
    fn test_merge_truncates_to_shorter_list() {
        let rows = merge_cycle_rows(&[cv(0, 1.0), cv(500, 2.0), cv(1000, 3.0)], &[cv(0, 0.5)]);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_run_rejects_empty_sample_before_calibrating() {
        // Flat calibration would be degenerate, but the empty sample is reported first
        let inputs = RunInputs {
            offset: series_every_ms(100, &[5.0; 4]),
            calibration: series_every_ms(100, &[5.0; 4]),
            sample: Series::default(),
        };
        let config = PipelineConfig {
            frequency_hz: Some(1.0),
            reference: CalibrationReference::Torque(1.0),
        };
        assert!(matches!(
            run_pipeline(&inputs, &config),
            Err(LoadcellError::InvalidInput { series: "sample" })
        ));
    }

    #[test]
    fn test_run_end_to_end() {
        let inputs = RunInputs {
            offset: series_every_ms(100, &[1000.0; 10]),
            calibration: series_every_ms(250, &[1500.0, 500.0, 1500.0, 500.0]),
            sample: series_every_ms(250, &[1250.0, 750.0, 1250.0, 750.0, 1000.0]),
        };
        let config = PipelineConfig {
            frequency_hz: Some(1.0),
            reference: CalibrationReference::Weight { kg: 2.0, lever_m: 0.1 },
        };
        let (cal, report) = run_pipeline(&inputs, &config).unwrap();
        assert_eq!(cal.adc_zero, 1000.0);
        assert_eq!(cal.adc_amplitude, 500.0);
        assert!((cal.scale_factor - 1.962 / 500.0).abs() < 1e-12);
        assert_eq!(report.rows.len(), 5);
        assert!((report.rows[0].torque_nm - 250.0 * cal.scale_factor).abs() < 1e-12);
        assert_eq!(report.cycles.len(), 2);
        assert_eq!(report.cycles[1].amplitude, Some(0.0));
    }
}
