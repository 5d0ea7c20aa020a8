//! Inclusive value range for vote validation

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Inclusive `[min, max]` bounds a vote value must fall within.
///
/// The fields are private so a constructed range is always well-formed:
/// both bounds finite and `min <= max`. Violating either at construction
/// is a configuration fault and panics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoteRange {
    min: f64,
    max: f64,
}

impl VoteRange {
    /// Build a range, panicking on non-finite or inverted bounds.
    pub fn new(min: f64, max: f64) -> Self {
        assert!(
            min.is_finite() && max.is_finite(),
            "vote range bounds must be finite, got [{min}, {max}]"
        );
        assert!(min <= max, "vote range inverted: [{min}, {max}]");
        VoteRange { min, max }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// True if `value` lies within the bounds (inclusive).
    ///
    /// NaN never lies within any range.
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

impl From<RangeInclusive<f64>> for VoteRange {
    fn from(range: RangeInclusive<f64>) -> Self {
        VoteRange::new(*range.start(), *range.end())
    }
}

impl std::fmt::Display for VoteRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}
