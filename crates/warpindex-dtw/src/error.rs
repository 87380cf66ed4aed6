//! Error types for DTW computation and DBA averaging.

/// Errors from DTW distance computation and time series validation.
#[derive(Debug, thiserror::Error)]
pub enum DtwError {
    /// Returned when an empty slice is provided as a time series.
    #[error("time series must be non-empty")]
    EmptySeries,

    /// Returned when a time series contains NaN, infinity, or negative infinity.
    #[error("time series contains non-finite value at index {index}")]
    NonFiniteValue {
        /// Position of the first non-finite value found.
        index: usize,
    },

    /// Returned when a sequence is longer than the working buffer allows.
    #[error("sequence of length {len} exceeds the DTW capacity of {capacity}")]
    SequenceTooLong {
        /// Length of the rejected sequence.
        len: usize,
        /// Maximum accepted length.
        capacity: usize,
    },
}

/// Errors from DBA barycenter averaging.
#[derive(Debug, thiserror::Error)]
pub enum DbaError {
    /// Returned when `refine()` is called with an empty slice of members.
    #[error("cannot compute barycenter of an empty cluster")]
    EmptyCluster,

    /// Wraps a DTW error encountered during alignment.
    #[error("DTW error during DBA: {0}")]
    Dtw(#[from] DtwError),
}
