//! Result types for DTW k-means.

use std::fmt;

use warpindex_dtw::TimeSeries;

/// Zero-based cluster index within one k-means result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClusterLabel(usize);

impl ClusterLabel {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based cluster index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ClusterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a DTW k-means fit.
#[derive(Debug, Clone)]
pub struct KMeansResult {
    /// One slot per requested cluster. `None` marks a cluster that was never
    /// seeded or lost all of its members.
    pub centroids: Vec<Option<TimeSeries>>,
    /// Cluster of every input series.
    pub assignments: Vec<ClusterLabel>,
    /// Number of refine/reassign passes performed.
    pub iterations: usize,
    /// Whether the last pass left every assignment unchanged.
    pub converged: bool,
}

impl KMeansResult {
    /// Number of series in each cluster, indexed like `centroids`.
    #[must_use]
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.centroids.len()];
        for label in &self.assignments {
            sizes[label.index()] += 1;
        }
        sizes
    }

    /// Positions of the series assigned to `label`, ascending.
    #[must_use]
    pub fn members(&self, label: ClusterLabel) -> Vec<usize> {
        self.assignments
            .iter()
            .enumerate()
            .filter_map(|(i, &l)| (l == label).then_some(i))
            .collect()
    }

    /// Every series position grouped cluster by cluster, in label order.
    #[must_use]
    pub fn assignment_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.assignments.len()).collect();
        order.sort_by_key(|&i| self.assignments[i]);
        order
    }

    /// Clusters that have both a centroid and at least one member.
    pub fn live_clusters(&self) -> impl Iterator<Item = (ClusterLabel, &TimeSeries)> + '_ {
        let sizes = self.cluster_sizes();
        self.centroids
            .iter()
            .enumerate()
            .filter_map(move |(c, centroid)| match centroid {
                Some(centroid) if sizes[c] > 0 => Some((ClusterLabel::new(c), centroid)),
                _ => None,
            })
    }
}
