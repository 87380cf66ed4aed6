//! Wave detection driven by 1-NN classification against a tree index.

use serde::Serialize;
use tracing::{debug, instrument};

use warpindex_dtw::TimeSeries;

use crate::batch::classify_batch;
use crate::config::{SLOW_WAVE_EXAMINE_BUDGET, SearchConfig};
use crate::error::{DetectError, SearchError};
use crate::index::TreeIndex;
use crate::label::ClassLabel;

/// Half-open sample range `[start, end)` within a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interval {
    /// First sample.
    pub start: usize,
    /// One past the last sample.
    pub end: usize,
}

impl Interval {
    /// Number of samples covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Return true if the interval covers no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// A sampled single-channel recording.
#[derive(Debug, Clone)]
pub struct Signal {
    data: Vec<f64>,
    sampling_rate: f64,
}

impl Signal {
    /// Wrap samples taken at `sampling_rate` Hz.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DetectError::InvalidSamplingRate`] | `sampling_rate` is not positive and finite |
    pub fn new(data: Vec<f64>, sampling_rate: f64) -> Result<Self, DetectError> {
        if !(sampling_rate.is_finite() && sampling_rate > 0.0) {
            return Err(DetectError::InvalidSamplingRate {
                rate: sampling_rate,
            });
        }
        Ok(Self {
            data,
            sampling_rate,
        })
    }

    /// Return the samples.
    #[must_use]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Return the sampling rate in Hz.
    #[must_use]
    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    /// Indices `i` where the signal goes from non-negative at `i` to negative at `i + 1`.
    #[must_use]
    pub fn pos_to_neg_zero_crossings(&self) -> Vec<usize> {
        self.data
            .windows(2)
            .enumerate()
            .filter_map(|(i, pair)| (pair[0] >= 0.0 && pair[1] < 0.0).then_some(i))
            .collect()
    }

    /// Intervals between consecutive positive-to-negative zero crossings.
    #[must_use]
    pub fn find_waves(&self) -> Vec<Interval> {
        self.pos_to_neg_zero_crossings()
            .windows(2)
            .map(|pair| Interval {
                start: pair[0],
                end: pair[1],
            })
            .collect()
    }
}

/// A detection algorithm: proposes event intervals, then optionally prunes them.
pub trait Algorithm {
    /// Short human-readable name.
    fn name(&self) -> &str;

    /// Propose event intervals in `signal`.
    ///
    /// # Errors
    ///
    /// Implementation-specific; see [`DetectError`].
    fn compute(&self, signal: &Signal) -> Result<Vec<Interval>, DetectError>;

    /// Reduce the events returned by [`compute`](Algorithm::compute). Keeps all by default.
    fn filter(&self, events: Vec<Interval>, data: &Signal) -> Vec<Interval> {
        let _ = data;
        events
    }
}

/// Detects waves whose shape is nearest to the target class in a reference corpus.
///
/// Candidate waves lie between consecutive positive-to-negative zero
/// crossings and last between `duration_low` and `duration_high` seconds.
/// Each candidate is classified by 1-NN DTW search and kept if the predicted
/// label is the target.
///
/// # Defaults
///
/// | Parameter       | Default                   |
/// |-----------------|---------------------------|
/// | `duration_low`  | 0.8 s                     |
/// | `duration_high` | 3.5 s                     |
/// | `target`        | 1                         |
/// | search          | 1-NN, budget 1000         |
#[derive(Debug, Clone)]
pub struct Dtw1nnDetector {
    index: TreeIndex,
    search: SearchConfig,
    duration_low: f64,
    duration_high: f64,
    target: ClassLabel,
}

impl Dtw1nnDetector {
    /// Create a detector over a prebuilt index, searching under its build window.
    #[must_use]
    pub fn new(index: TreeIndex) -> Self {
        let search = index
            .search_config()
            .with_examine_budget(SLOW_WAVE_EXAMINE_BUDGET);
        Self {
            index,
            search,
            duration_low: 0.8,
            duration_high: 3.5,
            target: ClassLabel::new(1),
        }
    }

    /// Set the accepted wave duration range in seconds.
    #[must_use]
    pub fn with_duration(mut self, low: f64, high: f64) -> Self {
        self.duration_low = low;
        self.duration_high = high;
        self
    }

    /// Set the label that marks a detected wave.
    #[must_use]
    pub fn with_target_label(mut self, target: ClassLabel) -> Self {
        self.target = target;
        self
    }

    /// Replace the query configuration.
    #[must_use]
    pub fn with_search_config(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    /// Return the index the detector searches.
    #[must_use]
    pub fn index(&self) -> &TreeIndex {
        &self.index
    }

    /// Candidate waves whose length in samples lies within the duration range.
    #[must_use]
    pub fn candidates(&self, signal: &Signal) -> Vec<Interval> {
        let fs = signal.sampling_rate();
        let (low, high) = (self.duration_low * fs, self.duration_high * fs);
        signal
            .find_waves()
            .into_iter()
            .filter(|w| {
                let len = w.len() as f64;
                low <= len && len <= high
            })
            .collect()
    }
}

impl Algorithm for Dtw1nnDetector {
    fn name(&self) -> &str {
        "DTW-1NN"
    }

    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DetectError::Dtw`] | A candidate segment holds non-finite samples |
    /// | [`DetectError::Search`] | A query fails for a reason other than an exhausted budget |
    #[instrument(skip_all, fields(samples = signal.data().len(), fs = signal.sampling_rate()))]
    fn compute(&self, signal: &Signal) -> Result<Vec<Interval>, DetectError> {
        let candidates = self.candidates(signal);
        let segments = candidates
            .iter()
            .map(|w| TimeSeries::new(signal.data()[w.start..w.end].to_vec()))
            .collect::<Result<Vec<_>, _>>()?;

        let results = classify_batch(&self.index, &segments, &self.search);
        let mut events = Vec::new();
        for (interval, result) in candidates.iter().zip(results) {
            match result {
                Ok(c) if c.predicted_label == self.target => events.push(*interval),
                Ok(_) | Err(SearchError::NoNeighborFound { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }
        debug!(
            candidates = candidates.len(),
            events = events.len(),
            "waves classified"
        );
        Ok(events)
    }
}
