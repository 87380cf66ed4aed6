//! DBA (DTW Barycenter Averaging) for variable-length clusters.

use tracing::{debug, instrument};

use crate::band::WarpingBand;
use crate::dtw::{DEFAULT_CAPACITY, Dtw};
use crate::error::DbaError;
use crate::series::{TimeSeries, TimeSeriesView};

/// Backpointer of a cell in the alignment matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Diagonal,
    Above,
    Left,
}

/// Alignment matrices reused across members and passes of one refinement.
///
/// Sized for the largest `n * bw` seen so far and reset per member, so a
/// refinement holds at most one set of matrices at a time.
#[derive(Debug, Default)]
struct AlignmentScratch {
    cost: Vec<f64>,
    steps: Vec<Step>,
    path_len: Vec<usize>,
}

impl AlignmentScratch {
    fn reset(&mut self, cells: usize) {
        self.cost.clear();
        self.cost.resize(cells, f64::INFINITY);
        self.steps.clear();
        self.steps.resize(cells, Step::Diagonal);
        self.path_len.clear();
        self.path_len.resize(cells, 0);
    }
}

/// Configuration for DBA centroid refinement.
///
/// # Defaults
///
/// | Parameter    | Default |
/// |--------------|---------|
/// | `iterations` | 10      |
/// | `capacity`   | 15 000  |
#[derive(Debug, Clone)]
pub struct DbaConfig {
    window: usize,
    iterations: usize,
    capacity: usize,
}

impl DbaConfig {
    /// Create a DBA configuration for warping window `window`.
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            window,
            iterations: 10,
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Set the number of refinement passes. Every pass runs; there is no early stop.
    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the longest accepted sequence length.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Return the number of refinement passes.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Refine `initial` towards the DTW barycenter of `members`.
    ///
    /// The centroid keeps the length of `initial`. Each pass aligns every
    /// member against the current centroid and replaces each centroid
    /// position with the mean of the member values aligned to it (0 when
    /// nothing aligned there).
    ///
    /// One set of banded alignment matrices, sized for the widest member, is
    /// shared by every member and pass.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DbaError::EmptyCluster`] | `members` is empty |
    /// | [`DbaError::Dtw`] | A sequence exceeds the capacity |
    #[instrument(skip(self, initial, members), fields(len = initial.len(), n = members.len(), iterations = self.iterations))]
    pub fn refine(
        &self,
        initial: TimeSeriesView<'_>,
        members: &[TimeSeriesView<'_>],
    ) -> Result<DbaResult, DbaError> {
        if members.is_empty() {
            return Err(DbaError::EmptyCluster);
        }
        let dtw = Dtw::new(self.window).with_capacity(self.capacity);
        dtw.check_len(initial.len())?;
        for member in members {
            dtw.check_len(member.len())?;
        }

        let len = initial.len();
        let mut centroid = initial.as_slice().to_vec();
        let mut delta = 0.0_f64;
        let mut scratch = AlignmentScratch::default();

        for iteration in 0..self.iterations {
            let mut sums = vec![0.0_f64; len];
            let mut counts = vec![0usize; len];
            for member in members {
                accumulate(
                    &centroid,
                    member.as_slice(),
                    self.window,
                    &mut scratch,
                    &mut sums,
                    &mut counts,
                );
            }

            delta = 0.0;
            for (t, value) in centroid.iter_mut().enumerate() {
                let next = if counts[t] > 0 {
                    sums[t] / counts[t] as f64
                } else {
                    0.0
                };
                delta = delta.max((next - *value).abs());
                *value = next;
            }
            debug!(iteration, delta, "DBA iteration complete");
        }

        Ok(DbaResult {
            centroid: TimeSeries::new(centroid)?,
            iterations: self.iterations,
            final_delta: delta,
        })
    }
}

/// Result of a DBA refinement.
#[derive(Debug, Clone)]
pub struct DbaResult {
    /// The refined centroid, same length as the initial one.
    pub centroid: TimeSeries,
    /// Number of passes performed.
    pub iterations: usize,
    /// Largest absolute change of any position in the last pass.
    pub final_delta: f64,
}

/// Align `member` against `centroid` and add its values to the per-position sums.
///
/// The walk starts from whichever corner among `(n-1, m-1)`, `(m-1, n-1)`,
/// `(n-1, n-1)` and `(m-1, m-1)` is reachable with the longest nonzero
/// path, first one wins on ties, and falls back to `(n-1, m-1)`.
fn accumulate(
    centroid: &[f64],
    member: &[f64],
    window: usize,
    scratch: &mut AlignmentScratch,
    sums: &mut [f64],
    counts: &mut [usize],
) {
    let n = centroid.len();
    let m = member.len();
    let band = WarpingBand::for_lengths(window, n, m);
    let bw = band.band_width(m);
    let slot = |i: usize, j: usize| -> Option<usize> {
        let cols = band.column_range(i, m);
        cols.contains(&j).then(|| i * bw + (j - cols.start))
    };

    scratch.reset(n * bw);
    let AlignmentScratch {
        cost,
        steps,
        path_len,
    } = scratch;

    for i in 0..n {
        let cols = band.column_range(i, m);
        for j in cols.clone() {
            let idx = i * bw + (j - cols.start);
            let d = (centroid[i] - member[j]).powi(2);
            if i == 0 && j == 0 {
                cost[idx] = d;
                continue;
            }

            let diag = if i > 0 && j > 0 { slot(i - 1, j - 1) } else { None };
            let above = if i > 0 { slot(i - 1, j) } else { None };
            let left = if j > 0 { slot(i, j - 1) } else { None };
            let value = |s: Option<usize>| s.map_or(f64::INFINITY, |k| cost[k]);
            let (dv, av, lv) = (value(diag), value(above), value(left));

            let (best, from, step) = if dv <= av && dv <= lv {
                (dv, diag, Step::Diagonal)
            } else if av <= lv {
                (av, above, Step::Above)
            } else {
                (lv, left, Step::Left)
            };
            if let Some(k) = from
                && best.is_finite()
            {
                cost[idx] = d + best;
                steps[idx] = step;
                path_len[idx] = path_len[k] + 1;
            }
        }
    }

    let corners = [(n - 1, m - 1), (m - 1, n - 1), (n - 1, n - 1), (m - 1, m - 1)];
    let mut start = (n - 1, m - 1);
    let mut longest = 0usize;
    for (i, j) in corners {
        if i >= n || j >= m {
            continue;
        }
        if let Some(k) = slot(i, j)
            && cost[k].is_finite()
            && path_len[k] > longest
        {
            longest = path_len[k];
            start = (i, j);
        }
    }

    let (mut i, mut j) = start;
    loop {
        sums[i] += member[j];
        counts[i] += 1;
        if i == 0 && j == 0 {
            break;
        }
        let Some(k) = slot(i, j) else { break };
        match steps[k] {
            Step::Diagonal if i > 0 && j > 0 => {
                i -= 1;
                j -= 1;
            }
            Step::Above if i > 0 => i -= 1,
            Step::Left if j > 0 => j -= 1,
            _ => break,
        }
    }
}
