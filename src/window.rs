//! Fixed-period cycle windowing
//!
//! Splits a timestamped series into oscillation cycles of length
//! `1 / frequency_hz`, aligned to the first sample, and reduces each cycle to
//! a scalar (peak-to-peak amplitude, RMS, or any caller-supplied reduction).
//!
//! Cycles tile forward from the first timestamp with no gaps or overlaps. A
//! sample whose offset from the current cycle start is greater than or equal
//! to the period closes that cycle and opens the next one. Cycles that receive
//! no samples are skipped, and a partial trailing cycle is still emitted.
//!
//! The partitioning runs once per call; every reduction is applied to the same
//! [`CycleWindow`]s, so amplitude and RMS results from [`cycle_metrics`] are
//! always index-aligned.

use chrono::{Duration, NaiveDateTime};

use crate::series::{self, Sample, Series};

/// One non-empty cycle: its start time and the samples that fell inside it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleWindow<'a> {
    pub start: NaiveDateTime,
    pub samples: &'a [Sample],
}

impl<'a> CycleWindow<'a> {
    /// Peak-to-peak amplitude `(max - min) / 2` of the cycle
    pub fn amplitude(&self) -> f64 {
        series::amplitude(self.samples)
    }

    /// Root-mean-square of the cycle
    pub fn rms(&self) -> f64 {
        series::rms(self.samples)
    }

    pub fn reduce<F: Fn(&[Sample]) -> f64>(&self, reduce: F) -> CycleValue {
        CycleValue {
            cycle_start: self.start,
            value: reduce(self.samples),
        }
    }
}

/// A single reduction result for one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleValue {
    pub cycle_start: NaiveDateTime,
    pub value: f64,
}

/// Amplitude and RMS of one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleMetric {
    pub cycle_start: NaiveDateTime,
    pub amplitude: f64,
    pub rms: f64,
}

/// Cycle length for a frequency, rounded to whole microseconds.
///
/// Returns `None` when the frequency is not a positive finite number, or when
/// its period rounds to zero or does not fit a `Duration`.
pub fn cycle_period(frequency_hz: f64) -> Option<Duration> {
    if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
        return None;
    }
    let micros = (1e6 / frequency_hz).round();
    if !micros.is_finite() || micros < 1.0 || micros >= MAX_PERIOD_MICROS {
        return None;
    }
    Some(Duration::microseconds(micros as i64))
}

// One century
const MAX_PERIOD_MICROS: f64 = 100.0 * 365.25 * 86_400.0 * 1e6;

/// Bucket state carried through the single windowing pass
struct CycleAccumulator {
    start: NaiveDateTime,
    pending_from: usize,
}

impl CycleAccumulator {
    fn new(start: NaiveDateTime) -> Self {
        Self {
            start,
            pending_from: 0,
        }
    }

    /// Emit the pending samples `[pending_from, upto)` as a window, if any
    fn close<'a>(&mut self, samples: &'a [Sample], upto: usize, out: &mut Vec<CycleWindow<'a>>) {
        if upto > self.pending_from {
            out.push(CycleWindow {
                start: self.start,
                samples: &samples[self.pending_from..upto],
            });
        }
        self.pending_from = upto;
    }
}

/// Partition a series into non-empty cycle windows.
///
/// Returns an empty vector for fewer than two samples or an unusable
/// frequency (see [`cycle_period`]).
pub fn window_cycles(series: &Series, frequency_hz: f64) -> Vec<CycleWindow<'_>> {
    let samples = series.samples();
    if samples.len() < 2 {
        return Vec::new();
    }
    let Some(period) = cycle_period(frequency_hz) else {
        return Vec::new();
    };

    let mut acc = CycleAccumulator::new(samples[0].timestamp);
    let mut windows = Vec::new();

    'samples: for (i, sample) in samples.iter().enumerate() {
        while sample.timestamp - acc.start >= period {
            acc.close(samples, i, &mut windows);
            match acc.start.checked_add_signed(period) {
                Some(next) => acc.start = next,
                None => break 'samples,
            }
        }
    }
    acc.close(samples, samples.len(), &mut windows);

    log::debug!(
        "windowed {} samples into {} cycles at {:.3} Hz",
        samples.len(),
        windows.len(),
        frequency_hz
    );
    windows
}

/// Apply `reduce` to every non-empty cycle of the series
pub fn reduce_cycles<F>(series: &Series, frequency_hz: f64, reduce: F) -> Vec<CycleValue>
where
    F: Fn(&[Sample]) -> f64,
{
    window_cycles(series, frequency_hz)
        .iter()
        .map(|w| w.reduce(&reduce))
        .collect()
}

/// Per-cycle peak-to-peak amplitude
pub fn cycle_amplitudes(series: &Series, frequency_hz: f64) -> Vec<CycleValue> {
    reduce_cycles(series, frequency_hz, series::amplitude)
}

/// Per-cycle RMS
pub fn cycle_rms(series: &Series, frequency_hz: f64) -> Vec<CycleValue> {
    reduce_cycles(series, frequency_hz, series::rms)
}

/// Amplitude and RMS for every non-empty cycle, from one windowing pass
pub fn cycle_metrics(series: &Series, frequency_hz: f64) -> Vec<CycleMetric> {
    window_cycles(series, frequency_hz)
        .iter()
        .map(|w| CycleMetric {
            cycle_start: w.start,
            amplitude: w.amplitude(),
            rms: w.rms(),
        })
        .collect()
}
