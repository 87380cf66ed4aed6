//! Optional instrumentation hooks for queries.

use serde::Serialize;

use crate::label::ClassLabel;

/// Bound under which a branch was deferred to one of the branch queues.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BranchBound {
    /// DTW to the branch centroid was already computed.
    Dtw(f64),
    /// Only the LB_Keogh bound is known.
    LowerBound(f64),
}

/// Receives events from a running query. Every hook defaults to a no-op.
pub trait MetricsSink {
    /// One LB_Keogh bound was evaluated.
    fn record_lower_bound(&mut self) {}

    /// One DTW distance was computed, evaluating `cells` matrix cells.
    fn record_dtw(&mut self, cells: usize) {
        let _ = cells;
    }

    /// A reference sequence was examined; `examined` is the running total.
    fn record_examined(&mut self, examined: usize) {
        let _ = examined;
    }

    /// A sibling branch was deferred for backtracking.
    fn record_deferred(&mut self, bound: BranchBound) {
        let _ = bound;
    }

    /// The descent reached a centroid with label `label`, an anytime estimate.
    fn record_centroid_estimate(&mut self, label: ClassLabel) {
        let _ = label;
    }
}

/// Sink that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetrics;

impl MetricsSink for NoMetrics {}

/// Plain tallies of every event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchCounters {
    /// LB_Keogh evaluations.
    pub lower_bounds: usize,
    /// DTW computations.
    pub dtw_computations: usize,
    /// Total DTW matrix cells evaluated.
    pub dtw_cells: usize,
    /// Reference sequences examined.
    pub examined: usize,
    /// Branches deferred with a known DTW distance.
    pub deferred_dtw: usize,
    /// Branches deferred with only a lower bound.
    pub deferred_lower_bound: usize,
    /// Label of the first centroid estimate, before any sequence is examined.
    pub first_estimate: Option<ClassLabel>,
}

impl MetricsSink for SearchCounters {
    fn record_lower_bound(&mut self) {
        self.lower_bounds += 1;
    }

    fn record_dtw(&mut self, cells: usize) {
        self.dtw_computations += 1;
        self.dtw_cells += cells;
    }

    fn record_examined(&mut self, examined: usize) {
        self.examined = examined;
    }

    fn record_deferred(&mut self, bound: BranchBound) {
        match bound {
            BranchBound::Dtw(_) => self.deferred_dtw += 1,
            BranchBound::LowerBound(_) => self.deferred_lower_bound += 1,
        }
    }

    fn record_centroid_estimate(&mut self, label: ClassLabel) {
        if self.first_estimate.is_none() {
            self.first_estimate = Some(label);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_tally_events() {
        let mut c = SearchCounters::default();
        c.record_lower_bound();
        c.record_dtw(12);
        c.record_dtw(3);
        c.record_examined(1);
        c.record_examined(2);
        c.record_deferred(BranchBound::Dtw(1.0));
        c.record_deferred(BranchBound::LowerBound(0.5));
        c.record_centroid_estimate(ClassLabel::new(1));
        c.record_centroid_estimate(ClassLabel::new(0));
        assert_eq!(c.lower_bounds, 1);
        assert_eq!(c.dtw_computations, 2);
        assert_eq!(c.dtw_cells, 15);
        assert_eq!(c.examined, 2);
        assert_eq!((c.deferred_dtw, c.deferred_lower_bound), (1, 1));
        assert_eq!(c.first_estimate, Some(ClassLabel::new(1)));
    }
}
