//! Configuration builder for DTW k-means.

use warpindex_dtw::{DEFAULT_CAPACITY, TimeSeriesView};

use crate::error::ClusterError;
use crate::result::KMeansResult;

/// Configuration for DTW k-means clustering.
///
/// Construct via [`KMeansConfig::new`], then chain `with_*` methods to override defaults.
///
/// # Defaults
///
/// | Parameter        | Default |
/// |------------------|---------|
/// | `max_iter`       | 10      |
/// | `dba_iterations` | 10      |
/// | `seed`           | 42      |
/// | `capacity`       | 15 000  |
#[derive(Debug, Clone)]
pub struct KMeansConfig {
    pub(crate) k: usize,
    pub(crate) window: usize,
    pub(crate) max_iter: usize,
    pub(crate) dba_iterations: usize,
    pub(crate) seed: u64,
    pub(crate) capacity: usize,
}

impl KMeansConfig {
    /// Create a configuration for `k` clusters under warping window `window`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::InvalidK`] | `k` is zero |
    pub fn new(k: usize, window: usize) -> Result<Self, ClusterError> {
        if k == 0 {
            return Err(ClusterError::InvalidK { k });
        }
        Ok(Self {
            k,
            window,
            max_iter: 10,
            dba_iterations: 10,
            seed: 42,
            capacity: DEFAULT_CAPACITY,
        })
    }

    /// Set the maximum number of refine/reassign passes.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the number of DBA passes per centroid update.
    #[must_use]
    pub fn with_dba_iterations(mut self, dba_iterations: usize) -> Self {
        self.dba_iterations = dba_iterations;
        self
    }

    /// Set the seed of the k-means++ random stream.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the longest sequence accepted by DTW and DBA.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Return the number of clusters.
    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Return the warping window.
    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    /// Return the maximum number of refine/reassign passes.
    #[must_use]
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Return the number of DBA passes per centroid update.
    #[must_use]
    pub fn dba_iterations(&self) -> usize {
        self.dba_iterations
    }

    /// Return the seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Cluster `series` using this configuration.
    ///
    /// When there are fewer series than clusters, only `series.len()` clusters
    /// are seeded and the rest come back with an empty centroid.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::EmptyInput`] | `series` is empty |
    /// | [`ClusterError::Dtw`] | A series exceeds the DTW capacity |
    /// | [`ClusterError::Dba`] | A DBA centroid update fails |
    pub fn fit(&self, series: &[TimeSeriesView<'_>]) -> Result<KMeansResult, ClusterError> {
        if series.is_empty() {
            return Err(ClusterError::EmptyInput);
        }
        crate::kmeans::run(series, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_k_rejected() {
        assert!(matches!(
            KMeansConfig::new(0, 3),
            Err(ClusterError::InvalidK { k: 0 })
        ));
    }

    #[test]
    fn builder_overrides_defaults() {
        let cfg = KMeansConfig::new(4, 7)
            .unwrap()
            .with_max_iter(3)
            .with_dba_iterations(2)
            .with_seed(9);
        assert_eq!(cfg.k(), 4);
        assert_eq!(cfg.window(), 7);
        assert_eq!(cfg.max_iter(), 3);
        assert_eq!(cfg.dba_iterations(), 2);
        assert_eq!(cfg.seed(), 9);
    }

    #[test]
    fn empty_input_rejected() {
        let cfg = KMeansConfig::new(2, 0).unwrap();
        assert!(matches!(cfg.fit(&[]), Err(ClusterError::EmptyInput)));
    }
}
