//! Classifier and resolver tuning.

use crate::error::ScreenError;

/// Thresholds that drive classification and coverage resolution.
///
/// # Defaults
///
/// - value threshold: 13 (about 5% of the 0..=255 sample range)
/// - summary threshold: 38.4 (of the 0..=765 directional-sum range)
/// - diagonal correlation: 1.0
/// - minimum stroke area: 1
/// - crossing test: enabled
///
/// # Example
///
/// ```
/// use adaptive_screen::ScreenOptions;
///
/// let options = ScreenOptions::new()
///     .value_threshold(20)
///     .crossing_test(false);
/// assert_eq!(options.value_threshold, 20);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenOptions {
    /// Per-sample comparison threshold, 0..=255.
    pub value_threshold: i32,

    /// Threshold for the directional sums, 0..=765.
    ///
    /// A pixel whose strongest directional sum does not exceed this value
    /// is stationary.
    pub summary_threshold: f64,

    /// Weight of the far diagonal sample in the diagonal sums.
    ///
    /// The two samples adjacent to it share the remainder so a diagonal
    /// sum always subtracts three samples' worth of weight.
    pub diagonal_correlation: f64,

    /// Minimum coverage for lines and orthogonal sides.
    pub min_area: u8,

    /// Verify that a detected edge crosses the central sample.
    pub crossing_test: bool,
}

impl Default for ScreenOptions {
    fn default() -> Self {
        Self {
            value_threshold: 13,
            summary_threshold: 38.4,
            diagonal_correlation: 1.0,
            min_area: 1,
            crossing_test: true,
        }
    }
}

impl ScreenOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value_threshold(mut self, threshold: i32) -> Self {
        self.value_threshold = threshold;
        self
    }

    pub fn summary_threshold(mut self, threshold: f64) -> Self {
        self.summary_threshold = threshold;
        self
    }

    pub fn diagonal_correlation(mut self, correlation: f64) -> Self {
        self.diagonal_correlation = correlation;
        self
    }

    pub fn min_area(mut self, area: u8) -> Self {
        self.min_area = area;
        self
    }

    pub fn crossing_test(mut self, enabled: bool) -> Self {
        self.crossing_test = enabled;
        self
    }

    /// Check every value against its domain.
    pub fn validate(&self) -> Result<(), ScreenError> {
        if !(0..=255).contains(&self.value_threshold) {
            return Err(ScreenError::InvalidOption {
                name: "value threshold",
                reason: format!("{} is outside 0..=255", self.value_threshold),
            });
        }
        if !self.summary_threshold.is_finite() || !(0.0..=765.0).contains(&self.summary_threshold)
        {
            return Err(ScreenError::InvalidOption {
                name: "summary threshold",
                reason: format!("{} is outside 0..=765", self.summary_threshold),
            });
        }
        if !self.diagonal_correlation.is_finite() || !(0.0..=3.0).contains(&self.diagonal_correlation)
        {
            return Err(ScreenError::InvalidOption {
                name: "diagonal correlation",
                reason: format!("{} is outside 0..=3", self.diagonal_correlation),
            });
        }
        Ok(())
    }
}
