//! Error types for loadcell calibration and torque processing

use thiserror::Error;

/// Error type for loadcell operations
#[derive(Error, Debug)]
pub enum LoadcellError {
    /// A required input series contains no samples
    #[error("Input series '{series}' is empty")]
    InvalidInput { series: &'static str },

    /// Calibration amplitude is zero or negative; the scale factor is undefined
    #[error("Calibration amplitude is {amplitude}; check calibration data")]
    DegenerateCalibration { amplitude: f64 },

    /// Calibration reference options are missing or contradictory
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Timestamp could not be parsed as ISO-8601
    #[error("Invalid timestamp '{0}'")]
    Timestamp(String),

    /// CSV header does not carry the expected columns
    #[error("CSV must have columns: {expected}")]
    MissingColumns { expected: String },

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding/decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serial port error
    #[error("Serial error: {0}")]
    Serial(#[from] serialport::Error),

    /// Plot rendering error
    #[error("Failed to render plot: {0}")]
    Plot(String),
}

#[cfg(feature = "plot")]
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for LoadcellError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        LoadcellError::Plot(format!("{value:?}"))
    }
}

/// Result type for loadcell operations
pub type Result<T> = std::result::Result<T, LoadcellError>;
