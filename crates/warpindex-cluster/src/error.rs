use warpindex_dtw::{DbaError, DtwError};

/// Errors from DTW k-means clustering.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    /// Returned when k is zero.
    #[error("k must be at least 1, got {k}")]
    InvalidK {
        /// The invalid k value provided.
        k: usize,
    },

    /// Returned when `fit` is called with no series.
    #[error("cannot cluster an empty set of series")]
    EmptyInput,

    /// Wraps a DBA error encountered during centroid refinement.
    #[error("DBA error during centroid update: {0}")]
    Dba(#[from] DbaError),

    /// Wraps a DTW error encountered during seeding or assignment.
    #[error("DTW error during assignment: {0}")]
    Dtw(#[from] DtwError),
}
