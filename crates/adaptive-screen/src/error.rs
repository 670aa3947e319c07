//! Error type for scan-buffer setup and option validation.

use std::fmt;

/// Errors raised by the screening algorithm's setup paths.
///
/// Classification itself is infallible; these cover geometry that cannot be
/// buffered and option values outside their domain.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenError {
    /// The scanline width is zero.
    EmptyScanline,
    /// Sample size must be 1 (gray) or 4 (CMYK).
    UnsupportedSampleSize(usize),
    /// Channel offset does not fit inside one sample.
    ChannelOutOfRange { offset: usize, sample_size: usize },
    /// A row handed to the scan window has the wrong length.
    RowLength { expected: usize, actual: usize },
    /// The scan buffers could not be allocated.
    Allocation { bytes: usize },
    /// An option value is outside its valid range.
    InvalidOption { name: &'static str, reason: String },
}

impl fmt::Display for ScreenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenError::EmptyScanline => write!(f, "scanline width must be non-zero"),
            ScreenError::UnsupportedSampleSize(size) => {
                write!(f, "unsupported sample size {} (expected 1 or 4)", size)
            }
            ScreenError::ChannelOutOfRange {
                offset,
                sample_size,
            } => write!(
                f,
                "channel offset {} out of range for {}-byte samples",
                offset, sample_size
            ),
            ScreenError::RowLength { expected, actual } => {
                write!(f, "row has {} bytes, expected {}", actual, expected)
            }
            ScreenError::Allocation { bytes } => {
                write!(f, "scan buffer allocation of {} bytes failed", bytes)
            }
            ScreenError::InvalidOption { name, reason } => {
                write!(f, "invalid {}: {}", name, reason)
            }
        }
    }
}

impl std::error::Error for ScreenError {}
