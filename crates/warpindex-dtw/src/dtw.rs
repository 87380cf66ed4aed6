//! Banded DTW distance computation.

use tracing::instrument;

use crate::band::WarpingBand;
use crate::distance::{DtwCost, DtwDistance};
use crate::error::DtwError;
use crate::series::TimeSeriesView;

/// Longest sequence accepted by default.
pub const DEFAULT_CAPACITY: usize = 15_000;

/// Immutable DTW configuration. Thread-safe and copyable.
///
/// The distance is the accumulated squared difference along the optimal
/// alignment inside a Sakoe-Chiba band. No square root is taken, which keeps
/// the value directly comparable with [`Envelope::lb_keogh`](crate::Envelope::lb_keogh).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dtw {
    window: usize,
    capacity: usize,
}

impl Dtw {
    /// Create a DTW calculator with warping window `window` and the default capacity.
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            window,
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Override the longest accepted sequence length.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Return the warping window.
    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    /// Return the longest accepted sequence length.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Reject a sequence length above the working-buffer capacity.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::SequenceTooLong`] | `len > capacity` |
    pub fn check_len(&self, len: usize) -> Result<(), DtwError> {
        if len > self.capacity {
            return Err(DtwError::SequenceTooLong {
                len,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Compute the DTW distance between two sequences.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::SequenceTooLong`] | Either sequence exceeds the capacity |
    pub fn distance(
        &self,
        a: TimeSeriesView<'_>,
        b: TimeSeriesView<'_>,
    ) -> Result<DtwDistance, DtwError> {
        self.cost(a, b).map(|c| c.distance)
    }

    /// Compute the DTW distance together with the number of cells evaluated.
    ///
    /// Uses a rolling two-row buffer. Runs in O(n * bw) time and O(bw) space,
    /// where `bw = min(2r + 1, m)` and `r = max(window, |n - m|)`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DtwError::SequenceTooLong`] | Either sequence exceeds the capacity |
    #[instrument(level = "trace", skip(a, b), fields(n = a.len(), m = b.len()))]
    pub fn cost(&self, a: TimeSeriesView<'_>, b: TimeSeriesView<'_>) -> Result<DtwCost, DtwError> {
        self.check_len(a.len())?;
        self.check_len(b.len())?;
        let (value, cells) = self.rolling(a.as_slice(), b.as_slice());
        Ok(DtwCost {
            distance: DtwDistance::new(value),
            cells,
        })
    }

    /// Each row buffer has `bw + 2` slots: index 0 and `bw + 1` are INF
    /// sentinels, active columns occupy `1..=bw`.
    ///
    /// For column `j` in row `i`:
    /// - current slot: `j - curr_start + 1`
    /// - above `C[i-1][j]`: `j - prev_start + 1` in `prev`
    /// - diagonal `C[i-1][j-1]`: `j - prev_start` in `prev`
    /// - left `C[i][j-1]`: current slot - 1
    fn rolling(&self, a: &[f64], b: &[f64]) -> (f64, usize) {
        let n = a.len();
        let m = b.len();
        let band = WarpingBand::for_lengths(self.window, n, m);
        let buf_width = band.band_width(m) + 2;

        let mut prev = vec![f64::INFINITY; buf_width];
        let mut curr = vec![f64::INFINITY; buf_width];
        let mut prev_start = 0usize;
        let mut cells = 0usize;

        for (i, &ai) in a.iter().enumerate() {
            curr.fill(f64::INFINITY);
            let cols = band.column_range(i, m);
            let curr_start = cols.start;
            cells += cols.len();

            for j in cols {
                let cost = (ai - b[j]).powi(2);
                let cj = j - curr_start + 1;

                if i == 0 && j == 0 {
                    curr[cj] = cost;
                    continue;
                }

                let left = curr[cj - 1];
                let (above, diag) = if i == 0 {
                    (f64::INFINITY, f64::INFINITY)
                } else {
                    let pj = j + 1 - prev_start;
                    let above = prev.get(pj).copied().unwrap_or(f64::INFINITY);
                    let diag = prev.get(pj - 1).copied().unwrap_or(f64::INFINITY);
                    (above, diag)
                };

                curr[cj] = cost + diag.min(above).min(left);
            }

            prev_start = curr_start;
            std::mem::swap(&mut prev, &mut curr);
        }

        // `prev` now holds the last row.
        let last = (m - 1) - band.column_range(n - 1, m).start + 1;
        (prev[last], cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::TimeSeries;

    fn ts(values: &[f64]) -> TimeSeries {
        TimeSeries::new(values.to_vec()).unwrap()
    }

    #[test]
    fn identical_series_distance_zero() {
        let a = ts(&[1.0, 2.0, 3.0, -4.0]);
        for window in [0, 1, 5] {
            let d = Dtw::new(window).distance(a.as_view(), a.as_view()).unwrap();
            assert_eq!(d.value(), 0.0);
        }
    }

    #[test]
    fn hand_computed_2x2() {
        // C[0][0] = 1, C[0][1] = 1, C[1][0] = 1, C[1][1] = 1 + 1 = 2
        let a = ts(&[0.0, 1.0]);
        let b = ts(&[1.0, 0.0]);
        let d = Dtw::new(1).distance(a.as_view(), b.as_view()).unwrap();
        assert!((d.value() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn zero_window_forces_diagonal() {
        let a = ts(&[0.0, 0.0, 0.0]);
        let b = ts(&[1.0, 1.0, 1.0]);
        let cost = Dtw::new(0).cost(a.as_view(), b.as_view()).unwrap();
        assert!((cost.distance.value() - 3.0).abs() < 1e-12);
        assert_eq!(cost.cells, 3);
    }

    #[test]
    fn unequal_lengths_widen_the_band() {
        // Window 0 would make (3, 1) unreachable; the effective radius is 2.
        // Best path: (0,0) (1,0) (2,1) (3,1) = 0 + 1 + 1 + 0.
        let a = ts(&[1.0, 2.0, 3.0, 4.0]);
        let b = ts(&[1.0, 4.0]);
        let d = Dtw::new(0).distance(a.as_view(), b.as_view()).unwrap();
        assert!((d.value() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn symmetric() {
        let a = ts(&[1.0, 5.0, 2.0, 8.0, 3.0]);
        let b = ts(&[2.0, 4.0, 7.0]);
        let dtw = Dtw::new(1);
        let ab = dtw.distance(a.as_view(), b.as_view()).unwrap();
        let ba = dtw.distance(b.as_view(), a.as_view()).unwrap();
        assert!((ab.value() - ba.value()).abs() < 1e-12);
    }

    #[test]
    fn wider_window_never_increases_distance() {
        let a = ts(&[0.0, 1.0, 0.0, 1.0, 0.0]);
        let b = ts(&[1.0, 0.0, 1.0, 0.0, 1.0]);
        let narrow = Dtw::new(0).distance(a.as_view(), b.as_view()).unwrap();
        let wide = Dtw::new(4).distance(a.as_view(), b.as_view()).unwrap();
        assert!(wide.value() <= narrow.value());
    }

    #[test]
    fn cell_count_matches_full_matrix_when_unbanded() {
        let a = ts(&[1.0, 2.0, 3.0]);
        let b = ts(&[3.0, 2.0, 1.0, 0.0]);
        let cost = Dtw::new(10).cost(a.as_view(), b.as_view()).unwrap();
        assert_eq!(cost.cells, 12);
    }

    #[test]
    fn single_element_series() {
        let d = Dtw::new(0)
            .distance(ts(&[5.0]).as_view(), ts(&[3.0]).as_view())
            .unwrap();
        assert!((d.value() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_sequence_over_capacity() {
        let dtw = Dtw::new(2).with_capacity(3);
        let long = ts(&[0.0; 4]);
        let short = ts(&[0.0; 3]);
        let err = dtw.distance(long.as_view(), short.as_view()).unwrap_err();
        assert!(matches!(err, DtwError::SequenceTooLong { len: 4, capacity: 3 }));
        assert!(dtw.distance(short.as_view(), short.as_view()).is_ok());
    }
}
