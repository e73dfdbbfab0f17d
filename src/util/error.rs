//! Error types for peakscan.

use thiserror::Error;

/// Result alias for peakscan operations.
pub type PeakScanResult<T> = std::result::Result<T, PeakScanError>;

/// Errors that can occur when configuring or running the extremum engine.
///
/// All of these are detected eagerly, before any pixel is scanned; the
/// engine never returns partial results.
#[derive(Debug, Error, PartialEq)]
pub enum PeakScanError {
    /// Aperture radius exceeds the hard ceiling that keeps `dx*dx + dy*dy`
    /// within `i32::MAX / 4`.
    #[error("aperture radius {radius} out of range 0..{max}")]
    RadiusOutOfRange {
        /// Requested radius.
        radius: i64,
        /// Exclusive upper bound (`SortedRoundAperture::MAX_SIZE`).
        max: i32,
    },
    /// Row stride too large for flat offsets to fit a signed 32-bit integer.
    #[error("row stride {stride} out of range 0..={max}")]
    StrideOutOfRange {
        /// Requested row stride.
        stride: i64,
        /// Inclusive upper bound (`i32::MAX - 2 * MAX_SIZE`).
        max: i32,
    },
    /// A matrix dimension is zero or the total size overflows `usize`.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },
    /// A flat buffer does not match the matrix size it is paired with.
    #[error("buffer length {got} does not match matrix size {expected}")]
    BufferSizeMismatch {
        /// Length implied by the matrix dimensions.
        expected: usize,
        /// Actual buffer length.
        got: usize,
    },
    /// Percentile level outside `[0, 1]`.
    #[error("percentile level {0} out of range 0..=1")]
    InvalidPercentileLevel(f64),
    /// Negative minimal depth.
    #[error("negative minimal depth {0}")]
    NegativeMinimalDepth(f64),
}
