//! Sakoe-Chiba band geometry for banded DTW.

use std::ops::Range;

/// Diagonal band of valid cells in a DTW cost matrix.
///
/// Cell `(i, j)` is valid only when `|i - j| <= radius`. The radius is never
/// smaller than the length difference of the two sequences, so the final
/// cell `(n-1, m-1)` is always inside the band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarpingBand {
    radius: usize,
}

impl WarpingBand {
    /// Band for sequences of lengths `n` and `m` under warping window `window`.
    ///
    /// The effective radius is `max(window, |n - m|)`.
    #[must_use]
    pub fn for_lengths(window: usize, n: usize, m: usize) -> Self {
        Self {
            radius: window.max(n.abs_diff(m)),
        }
    }

    /// Return the effective radius.
    #[must_use]
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Return the valid column range for `row`: `[row - r, row + r]` clipped to `[0, n_cols)`.
    #[must_use]
    pub fn column_range(&self, row: usize, n_cols: usize) -> Range<usize> {
        let start = row.saturating_sub(self.radius);
        let end = (row + self.radius + 1).min(n_cols);
        start..end
    }

    /// Return the widest row of the band: `min(2r + 1, n_cols)`.
    #[must_use]
    pub fn band_width(&self, n_cols: usize) -> usize {
        (2 * self.radius + 1).min(n_cols)
    }

    /// Return true if `(row, col)` lies inside the band of an `n_cols` wide matrix.
    #[must_use]
    pub fn contains(&self, row: usize, col: usize, n_cols: usize) -> bool {
        self.column_range(row, n_cols).contains(&col)
    }
}
