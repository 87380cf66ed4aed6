//! DTW distance newtypes.

use std::cmp::Ordering;
use std::fmt;

/// A non-negative DTW distance: the accumulated squared cost of the best alignment.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct DtwDistance(f64);

impl DtwDistance {
    /// Infinite distance, the value of an unreachable cell.
    pub const INFINITY: Self = Self(f64::INFINITY);

    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    /// Return the raw distance value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Total ordering comparison using [`f64::total_cmp`].
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for DtwDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

/// Distance plus the number of matrix cells evaluated to obtain it.
///
/// The cell count is instrumentation only; it never influences a result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DtwCost {
    /// The DTW distance.
    pub distance: DtwDistance,
    /// Number of band cells filled.
    pub cells: usize,
}
