//! LB_Keogh envelopes and lower bounds.

use std::collections::VecDeque;

use crate::series::TimeSeriesView;

/// Running max/min corridor around a sequence.
///
/// `upper[i]` and `lower[i]` are the max and min of the source over
/// `[i - window, i + window]`, clipped to the sequence. The source samples
/// are retained so the corridor can be widened for candidates whose length
/// difference exceeds the window.
#[derive(Debug, Clone)]
pub struct Envelope {
    source: Vec<f64>,
    window: usize,
    upper: Vec<f64>,
    lower: Vec<f64>,
}

impl Envelope {
    /// Compute the envelope of `series` under warping window `window`.
    #[must_use]
    pub fn compute(series: TimeSeriesView<'_>, window: usize) -> Self {
        let source = series.as_slice().to_vec();
        let (upper, lower) = sliding_extremes(&source, window);
        Self {
            source,
            window,
            upper,
            lower,
        }
    }

    /// Return the upper envelope values.
    #[must_use]
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Return the lower envelope values.
    #[must_use]
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Return the window the envelope was computed with.
    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    /// Return the length of the source sequence.
    #[must_use]
    pub fn len(&self) -> usize {
        self.upper.len()
    }

    /// Return true if the envelope is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.upper.is_empty()
    }

    /// LB_Keogh lower bound on `Dtw::new(window).distance(source, candidate)`.
    ///
    /// Sums the squared excursions of `candidate` outside `[lower, upper]`
    /// over the first `min(len, candidate.len())` positions. When the length
    /// difference exceeds the window, DTW widens its band to that difference,
    /// so the bound is taken against an envelope widened the same way.
    #[must_use]
    pub fn lb_keogh(&self, candidate: TimeSeriesView<'_>) -> f64 {
        let radius = self.window.max(self.len().abs_diff(candidate.len()));
        if radius == self.window {
            excursions(candidate.as_slice(), &self.upper, &self.lower)
        } else {
            let (upper, lower) = sliding_extremes(&self.source, radius);
            excursions(candidate.as_slice(), &upper, &lower)
        }
    }
}

fn excursions(candidate: &[f64], upper: &[f64], lower: &[f64]) -> f64 {
    candidate
        .iter()
        .zip(upper.iter().zip(lower))
        .map(|(&c, (&u, &l))| {
            if c > u {
                (c - u).powi(2)
            } else if c < l {
                (l - c).powi(2)
            } else {
                0.0
            }
        })
        .sum()
}

/// Centered sliding-window max and min in O(n) with monotonic deques.
///
/// Both deques hold indices in increasing order; values decrease along the
/// max deque and increase along the min deque, so each front is the current
/// window extreme.
fn sliding_extremes(data: &[f64], radius: usize) -> (Vec<f64>, Vec<f64>) {
    let n = data.len();
    let mut upper = vec![0.0_f64; n];
    let mut lower = vec![0.0_f64; n];
    let mut max_deque: VecDeque<usize> = VecDeque::new();
    let mut min_deque: VecDeque<usize> = VecDeque::new();
    let mut next_to_add = 0usize;

    for i in 0..n {
        let hi = (i + radius).min(n - 1);
        while next_to_add <= hi {
            let value = data[next_to_add];
            while max_deque.back().is_some_and(|&back| data[back] <= value) {
                max_deque.pop_back();
            }
            max_deque.push_back(next_to_add);
            while min_deque.back().is_some_and(|&back| data[back] >= value) {
                min_deque.pop_back();
            }
            min_deque.push_back(next_to_add);
            next_to_add += 1;
        }

        let lo = i.saturating_sub(radius);
        while max_deque.front().is_some_and(|&front| front < lo) {
            max_deque.pop_front();
        }
        while min_deque.front().is_some_and(|&front| front < lo) {
            min_deque.pop_front();
        }

        // Index i is always inside its own window, so both fronts exist.
        if let (Some(&top), Some(&bottom)) = (max_deque.front(), min_deque.front()) {
            upper[i] = data[top];
            lower[i] = data[bottom];
        }
    }

    (upper, lower)
}
