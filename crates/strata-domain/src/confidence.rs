//! Confidence scores

use std::cmp::Ordering;
use std::fmt;

/// Error returned when a score falls outside [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceError(pub f64);

impl fmt::Display for ConfidenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "confidence {} out of range [0.0, 1.0]", self.0)
    }
}

impl std::error::Error for ConfidenceError {}

/// A score in the closed interval [0, 1]
///
/// Out-of-range values are rejected, never clamped. NaN is rejected too,
/// which is what makes the total ordering below sound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Confidence(f64);

impl Confidence {
    /// Create a confidence score, rejecting anything outside [0, 1]
    pub fn new(value: f64) -> Result<Self, ConfidenceError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ConfidenceError(value))
        }
    }

    /// The raw score
    pub fn value(self) -> f64 {
        self.0
    }
}

impl Eq for Confidence {}

impl PartialOrd for Confidence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Confidence {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl TryFrom<f64> for Confidence {
    type Error = ConfidenceError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
