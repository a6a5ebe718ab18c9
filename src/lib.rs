//! Loadcell torque calibration library
//!
//! Turns raw ADC counts from an oscillating loadcell into calibrated torque and
//! summarizes each oscillation cycle with its amplitude and RMS.
//!
//! A test run has three captures, each a CSV log of `timestamp_iso, raw_value`:
//! - **offset**: no load, gives the ADC zero
//! - **calibration**: a known torque applied, gives counts per N·m
//! - **sample**: the measurement to convert
//!
//! # Quick Start
//!
//! ## Full Run from Log Files
//! ```no_run
//! use loadcell_torque::{
//!     read_inputs, run_pipeline, CalibrationReference, PipelineConfig, ReaderKind,
//! };
//! use std::path::Path;
//!
//! let reader = ReaderKind::Csv.reader();
//! let inputs = read_inputs(
//!     reader.as_ref(),
//!     Path::new("offset_loadcell_log.csv"),
//!     Path::new("calibration_loadcell_log.csv"),
//!     Path::new("sample_loadcell_log.csv"),
//! )?;
//!
//! let config = PipelineConfig {
//!     frequency_hz: Some(1.66),
//!     reference: CalibrationReference::Weight { kg: 2.0, lever_m: 0.1 },
//! };
//! let (calibration, report) = run_pipeline(&inputs, &config)?;
//!
//! println!("K_T: {:.9} N·m/count", calibration.scale_factor);
//! for cycle in &report.cycles {
//!     println!("{} amp={:?} rms={:?}", cycle.cycle_start, cycle.amplitude, cycle.rms);
//! }
//! # Ok::<(), loadcell_torque::LoadcellError>(())
//! ```
//!
//! ## Cycle Metrics on Any Series
//! ```
//! use chrono::{Duration, NaiveDate};
//! use loadcell_torque::{cycle_metrics, Sample, Series};
//!
//! let t0 = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();
//! let series: Series = [1.0, -1.0, 2.0, -2.0]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, &v)| Sample::new(t0 + Duration::milliseconds(250 * i as i64), v))
//!     .collect();
//!
//! // 2 Hz: two cycles of two samples each
//! let cycles = cycle_metrics(&series, 2.0);
//! assert_eq!(cycles.len(), 2);
//! assert_eq!(cycles[1].amplitude, 2.0);
//! ```

pub mod calibration;
pub mod capture;
pub mod common;
pub mod error;
pub mod output;
pub mod pipeline;
#[cfg(feature = "plot")]
pub mod plot;
pub mod reader;
pub mod series;
pub mod window;

// Re-export public API
pub use calibration::{calibrate, AmplitudeSource, CalibrationReference, CalibrationResult};
pub use capture::{parse_raw_line, CsvLogAppender};
pub use common::{format_timestamp, moving_average, parse_timestamp};
pub use error::{LoadcellError, Result};
pub use pipeline::{
    apply_calibration, merge_cycle_rows, run_pipeline, CycleRow, PipelineConfig, PipelineWarning,
    RunInputs, TorqueReport, TorqueRow,
};
pub use reader::{read_inputs, CsvSeriesReader, PlainSeriesReader, ReaderKind, SeriesReader};
pub use series::{Sample, Series};
pub use window::{
    cycle_amplitudes, cycle_metrics, cycle_rms, window_cycles, CycleMetric, CycleValue, CycleWindow,
};
