//! Timestamped sample series
//!
//! A [`Series`] is the unit every stage of the pipeline consumes: an ordered
//! run of `(timestamp, value)` pairs as captured from the loadcell. Timestamps
//! are expected to be non-decreasing; nothing here reorders them.

use chrono::NaiveDateTime;

/// One reading with its capture time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Ordered sequence of samples with non-decreasing timestamps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    samples: Vec<Sample>,
}

impl Series {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.value)
    }

    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.samples.iter().map(|s| s.timestamp)
    }

    /// Arithmetic mean of the values, 0.0 for an empty series
    pub fn mean(&self) -> f64 {
        mean(self.values())
    }

    /// Half of the peak-to-peak spread over the whole series
    pub fn amplitude(&self) -> f64 {
        amplitude(&self.samples)
    }

    /// New series with the same timestamps and every value passed through `f`
    pub fn map_values<F: Fn(f64) -> f64>(&self, f: F) -> Series {
        Series {
            samples: self
                .samples
                .iter()
                .map(|s| Sample::new(s.timestamp, f(s.value)))
                .collect(),
        }
    }

    /// Subtract a constant offset from every value
    pub fn offset_corrected(&self, zero: f64) -> Series {
        self.map_values(|v| v - zero)
    }
}

impl From<Vec<Sample>> for Series {
    fn from(samples: Vec<Sample>) -> Self {
        Self::new(samples)
    }
}

impl FromIterator<Sample> for Series {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Arithmetic mean, 0.0 when there are no values
pub fn mean<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Peak-to-peak amplitude `(max - min) / 2`, 0.0 for no samples
pub fn amplitude(samples: &[Sample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let min = samples.iter().map(|s| s.value).fold(f64::INFINITY, f64::min);
    let max = samples.iter().map(|s| s.value).fold(f64::NEG_INFINITY, f64::max);
    (max - min) / 2.0
}

/// Root-mean-square of the values, 0.0 for no samples
pub fn rms(samples: &[Sample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples.iter().map(|s| s.value * s.value).sum();
    (sum_squares / samples.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(secs: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 0, secs)
            .unwrap()
    }

    fn series(values: &[f64]) -> Series {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| Sample::new(ts(i as u32), v))
            .collect()
    }

    #[test]
    fn test_mean_of_constant_offset() {
        let offset = series(&[1000.0; 10]);
        assert_eq!(offset.mean(), 1000.0);
    }

    #[test]
    fn test_mean_empty_is_zero() {
        assert_eq!(Series::default().mean(), 0.0);
    }

    #[test]
    fn test_amplitude_is_half_peak_to_peak() {
        let s = series(&[500.0, -500.0, 250.0, -250.0]);
        assert_eq!(s.amplitude(), 500.0);
    }

    #[test]
    fn test_single_sample_reductions() {
        let s = series(&[-3.5]);
        assert_eq!(amplitude(s.samples()), 0.0);
        assert_eq!(rms(s.samples()), 3.5);
    }

    #[test]
    fn test_rms_of_square_wave() {
        let s = series(&[2.0, -2.0, 2.0, -2.0]);
        assert!((rms(s.samples()) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_offset_correction_keeps_timestamps() {
        let s = series(&[1010.0, 990.0]);
        let corrected = s.offset_corrected(1000.0);
        assert_eq!(corrected.values().collect::<Vec<_>>(), vec![10.0, -10.0]);
        assert_eq!(
            corrected.timestamps().collect::<Vec<_>>(),
            s.timestamps().collect::<Vec<_>>()
        );
    }
}
