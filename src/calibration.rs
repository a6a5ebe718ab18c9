//! Two-point loadcell calibration
//!
//! The offset capture (no load) gives the ADC zero. The calibration capture,
//! taken with a known torque applied at the oscillation frequency, gives the
//! ADC amplitude corresponding to that torque. Their ratio is the scale factor
//! in N·m per count.
//!
//! When a frequency is available the amplitude is the mean of the per-cycle
//! amplitudes, which tolerates drift and isolated spikes over long captures.
//! Without a usable frequency, or when windowing yields no cycles, the
//! whole-series peak-to-peak amplitude is used instead.

use crate::error::{LoadcellError, Result};
use crate::series::{self, Series};
use crate::window;

/// Standard gravity in m/s²
pub const GRAVITY: f64 = 9.81;

/// Known load applied during the calibration capture
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationReference {
    /// Torque in N·m
    Torque(f64),
    /// Mass in kg hung from a lever arm in m
    Weight { kg: f64, lever_m: f64 },
}

impl CalibrationReference {
    /// Build a reference from the mutually exclusive command-line options.
    ///
    /// Exactly one of `torque` or `weight` must be given, and `lever` is
    /// required with `weight`.
    pub fn from_options(
        torque: Option<f64>,
        weight: Option<f64>,
        lever: Option<f64>,
    ) -> Result<Self> {
        match (torque, weight) {
            (Some(nm), None) => Ok(Self::Torque(nm)),
            (None, Some(kg)) => match lever {
                Some(lever_m) => Ok(Self::Weight { kg, lever_m }),
                None => Err(LoadcellError::Configuration(
                    "lever arm is required with weight".to_string(),
                )),
            },
            (Some(_), Some(_)) => Err(LoadcellError::Configuration(
                "specify either known torque or known weight, not both".to_string(),
            )),
            (None, None) => Err(LoadcellError::Configuration(
                "one of known torque or known weight is required".to_string(),
            )),
        }
    }

    /// Reference torque in N·m
    pub fn torque_nm(&self) -> f64 {
        match *self {
            Self::Torque(nm) => nm,
            Self::Weight { kg, lever_m } => kg * GRAVITY * lever_m,
        }
    }
}

/// How the calibration amplitude was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmplitudeSource {
    /// Mean over this many cycles with positive amplitude
    PerCycle { cycles: usize },
    /// Whole-series peak-to-peak
    WholeSeries,
}

/// Outcome of a calibration run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationResult {
    /// Mean ADC count of the offset capture
    pub adc_zero: f64,
    /// ADC amplitude of the offset-corrected calibration capture
    pub adc_amplitude: f64,
    /// N·m per ADC count
    pub scale_factor: f64,
    pub reference_torque_nm: f64,
    pub amplitude_source: AmplitudeSource,
}

/// Derive the ADC zero and scale factor from the offset and calibration captures
pub fn calibrate(
    offset: &Series,
    calibration: &Series,
    frequency_hz: Option<f64>,
    reference: &CalibrationReference,
) -> Result<CalibrationResult> {
    if offset.is_empty() {
        return Err(LoadcellError::InvalidInput { series: "offset" });
    }
    if calibration.is_empty() {
        return Err(LoadcellError::InvalidInput { series: "calibration" });
    }

    let adc_zero = offset.mean();
    let corrected = calibration.offset_corrected(adc_zero);
    let (adc_amplitude, amplitude_source) = calibration_amplitude(&corrected, frequency_hz);

    if adc_amplitude <= 0.0 || !adc_amplitude.is_finite() {
        return Err(LoadcellError::DegenerateCalibration {
            amplitude: adc_amplitude,
        });
    }

    let reference_torque_nm = reference.torque_nm();
    let scale_factor = reference_torque_nm / adc_amplitude;

    log::info!(
        "calibrated: zero={:.3} amplitude={:.3} ({:?}) K={:.9} N·m/count",
        adc_zero,
        adc_amplitude,
        amplitude_source,
        scale_factor
    );

    Ok(CalibrationResult {
        adc_zero,
        adc_amplitude,
        scale_factor,
        reference_torque_nm,
        amplitude_source,
    })
}

/// Amplitude of an offset-corrected calibration series
fn calibration_amplitude(corrected: &Series, frequency_hz: Option<f64>) -> (f64, AmplitudeSource) {
    let frequency_hz = match frequency_hz {
        Some(f) if f > 0.0 => f,
        _ => return (corrected.amplitude(), AmplitudeSource::WholeSeries),
    };

    let cycles = window::cycle_amplitudes(corrected, frequency_hz);
    if cycles.is_empty() {
        log::warn!("no calibration cycles at {frequency_hz} Hz; using whole-series amplitude");
        return (corrected.amplitude(), AmplitudeSource::WholeSeries);
    }

    let positive: Vec<f64> = cycles.iter().map(|c| c.value).filter(|&a| a > 0.0).collect();
    log::debug!(
        "{} calibration cycles, {} with positive amplitude",
        cycles.len(),
        positive.len()
    );
    (
        series::mean(positive.iter().copied()),
        AmplitudeSource::PerCycle {
            cycles: positive.len(),
        },
    )
}
