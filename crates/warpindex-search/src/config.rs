//! Build and query configuration.

use serde::{Deserialize, Serialize};

use warpindex_dtw::DEFAULT_CAPACITY;

use crate::error::{IndexError, SearchError};
use crate::index::TreeIndex;
use crate::label::LabeledSequence;

/// Examine budget used by the slow-wave detector.
pub const SLOW_WAVE_EXAMINE_BUDGET: usize = 1000;

/// Warping window used by the slow-wave detector, in samples.
pub const SLOW_WAVE_WINDOW: usize = 119;

/// Configuration for building a [`TreeIndex`].
///
/// Construct via [`IndexConfig::new`], then chain `with_*` methods to override defaults.
///
/// # Defaults
///
/// | Parameter         | Default |
/// |-------------------|---------|
/// | `leaf_size`       | 30      |
/// | `max_kmeans_iter` | 10      |
/// | `dba_iterations`  | 10      |
/// | `split_cap`       | 1000    |
/// | `seed`            | 42      |
/// | `capacity`        | 15 000  |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    pub(crate) branch_factor: usize,
    pub(crate) window: usize,
    pub(crate) leaf_size: usize,
    pub(crate) max_kmeans_iter: usize,
    pub(crate) dba_iterations: usize,
    pub(crate) split_cap: usize,
    pub(crate) seed: u64,
    pub(crate) capacity: usize,
}

impl IndexConfig {
    /// Create a configuration splitting every node into up to `branch_factor`
    /// children under warping window `window`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IndexError::InvalidBranchFactor`] | `branch_factor` is zero |
    pub fn new(branch_factor: usize, window: usize) -> Result<Self, IndexError> {
        if branch_factor == 0 {
            return Err(IndexError::InvalidBranchFactor { branch_factor });
        }
        Ok(Self {
            branch_factor,
            window,
            leaf_size: 30,
            max_kmeans_iter: 10,
            dba_iterations: 10,
            split_cap: 1000,
            seed: 42,
            capacity: DEFAULT_CAPACITY,
        })
    }

    /// Parameters of the slow-oscillation classifier: 10 branches, leaves of
    /// at most 30 sequences, window 119.
    #[must_use]
    pub fn slow_wave_defaults() -> Self {
        Self {
            branch_factor: 10,
            window: SLOW_WAVE_WINDOW,
            leaf_size: 30,
            max_kmeans_iter: 10,
            dba_iterations: 10,
            split_cap: 1000,
            seed: 42,
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Set the leaf-size threshold. A child with at most this many members becomes a leaf.
    #[must_use]
    pub fn with_leaf_size(mut self, leaf_size: usize) -> Self {
        self.leaf_size = leaf_size;
        self
    }

    /// Set the maximum number of k-means passes per split.
    #[must_use]
    pub fn with_max_kmeans_iter(mut self, max_kmeans_iter: usize) -> Self {
        self.max_kmeans_iter = max_kmeans_iter;
        self
    }

    /// Set the number of DBA passes per centroid update.
    #[must_use]
    pub fn with_dba_iterations(mut self, dba_iterations: usize) -> Self {
        self.dba_iterations = dba_iterations;
        self
    }

    /// Set the maximum number of node splits before the build gives up.
    #[must_use]
    pub fn with_split_cap(mut self, split_cap: usize) -> Self {
        self.split_cap = split_cap;
        self
    }

    /// Set the seed of the master random stream.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the longest sequence accepted by DTW.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    // --- Getters ---

    /// Return the branch factor.
    #[must_use]
    pub fn branch_factor(&self) -> usize {
        self.branch_factor
    }

    /// Return the warping window.
    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    /// Return the leaf-size threshold.
    #[must_use]
    pub fn leaf_size(&self) -> usize {
        self.leaf_size
    }

    /// Return the maximum number of k-means passes per split.
    #[must_use]
    pub fn max_kmeans_iter(&self) -> usize {
        self.max_kmeans_iter
    }

    /// Return the number of DBA passes per centroid update.
    #[must_use]
    pub fn dba_iterations(&self) -> usize {
        self.dba_iterations
    }

    /// Return the split cap.
    #[must_use]
    pub fn split_cap(&self) -> usize {
        self.split_cap
    }

    /// Return the seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return the longest accepted sequence length.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Build a tree index over `corpus`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IndexError::InvalidLeafSize`] | `leaf_size` is zero |
    /// | [`IndexError::InvalidSplitCap`] | `split_cap` is zero |
    /// | [`IndexError::Dtw`] | A corpus sequence exceeds the capacity |
    /// | [`IndexError::Cluster`] | Clustering a node fails |
    pub fn build(&self, corpus: &[LabeledSequence]) -> Result<TreeIndex, IndexError> {
        if self.leaf_size == 0 {
            return Err(IndexError::InvalidLeafSize {
                leaf_size: self.leaf_size,
            });
        }
        if self.split_cap == 0 {
            return Err(IndexError::InvalidSplitCap {
                split_cap: self.split_cap,
            });
        }
        crate::tree::build(corpus, self)
    }
}

/// Configuration for a k-NN query.
///
/// # Defaults
///
/// | Parameter        | Default     |
/// |------------------|-------------|
/// | `k`              | 1           |
/// | `examine_budget` | unlimited   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub(crate) window: usize,
    pub(crate) k: usize,
    pub(crate) examine_budget: Option<usize>,
}

impl SearchConfig {
    /// Create a 1-NN query configuration with an unlimited budget.
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            window,
            k: 1,
            examine_budget: None,
        }
    }

    /// 1-NN under window 119 examining at most 1000 sequences.
    #[must_use]
    pub fn slow_wave_defaults() -> Self {
        Self::new(SLOW_WAVE_WINDOW).with_examine_budget(SLOW_WAVE_EXAMINE_BUDGET)
    }

    /// Set the number of neighbours to return.
    #[must_use]
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Stop after examining `budget` reference sequences.
    #[must_use]
    pub fn with_examine_budget(mut self, budget: usize) -> Self {
        self.examine_budget = Some(budget);
        self
    }

    /// Remove the examine budget; the search becomes exact.
    #[must_use]
    pub fn unlimited(mut self) -> Self {
        self.examine_budget = None;
        self
    }

    /// Return the warping window.
    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    /// Return the number of neighbours.
    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Return the examine budget, `None` when unlimited.
    #[must_use]
    pub fn examine_budget(&self) -> Option<usize> {
        self.examine_budget
    }

    pub(crate) fn validate(&self) -> Result<(), SearchError> {
        if self.k == 0 {
            return Err(SearchError::InvalidK { k: self.k });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_branch_factor_rejected() {
        assert!(matches!(
            IndexConfig::new(0, 5),
            Err(IndexError::InvalidBranchFactor { branch_factor: 0 })
        ));
    }

    #[test]
    fn zero_leaf_size_and_split_cap_rejected_at_build() {
        let cfg = IndexConfig::new(2, 1).unwrap().with_leaf_size(0);
        assert!(matches!(
            cfg.build(&[]),
            Err(IndexError::InvalidLeafSize { leaf_size: 0 })
        ));
        let cfg = IndexConfig::new(2, 1).unwrap().with_split_cap(0);
        assert!(matches!(
            cfg.build(&[]),
            Err(IndexError::InvalidSplitCap { split_cap: 0 })
        ));
    }

    #[test]
    fn slow_wave_defaults_match_detector_parameters() {
        let cfg = IndexConfig::slow_wave_defaults();
        assert_eq!(cfg.branch_factor(), 10);
        assert_eq!(cfg.leaf_size(), 30);
        assert_eq!(cfg.window(), 119);

        let search = SearchConfig::slow_wave_defaults();
        assert_eq!(search.k(), 1);
        assert_eq!(search.examine_budget(), Some(1000));
    }

    #[test]
    fn search_config_builder() {
        let cfg = SearchConfig::new(3).with_k(4).with_examine_budget(10);
        assert_eq!(cfg.window(), 3);
        assert_eq!(cfg.k(), 4);
        assert_eq!(cfg.unlimited().examine_budget(), None);
        assert!(matches!(
            SearchConfig::new(1).with_k(0).validate(),
            Err(SearchError::InvalidK { k: 0 })
        ));
    }
}
