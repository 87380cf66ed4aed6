use warpindex_cluster::ClusterError;
use warpindex_dtw::DtwError;

/// Errors from the bounded priority queues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// Returned when inserting into a queue that is already at capacity.
    #[error("priority queue is full (capacity {capacity})")]
    Full {
        /// The fixed capacity of the queue.
        capacity: usize,
    },

    /// Returned when popping from an empty queue.
    #[error("priority queue is empty")]
    Empty,
}

/// Errors from building, encoding, or decoding a tree index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Returned when the branch factor is zero.
    #[error("branch factor must be at least 1, got {branch_factor}")]
    InvalidBranchFactor {
        /// The invalid branch factor provided.
        branch_factor: usize,
    },

    /// Returned when the leaf-size threshold is zero.
    #[error("leaf size must be at least 1, got {leaf_size}")]
    InvalidLeafSize {
        /// The invalid leaf size provided.
        leaf_size: usize,
    },

    /// Returned when the split-iteration cap is zero.
    #[error("split cap must be at least 1, got {split_cap}")]
    InvalidSplitCap {
        /// The invalid split cap provided.
        split_cap: usize,
    },

    /// Wraps a clustering error raised while splitting a node.
    #[error("clustering failed while splitting a node: {0}")]
    Cluster(#[from] ClusterError),

    /// Wraps a DTW error raised while validating the corpus.
    #[error("corpus rejected: {0}")]
    Dtw(#[from] DtwError),

    /// Returned when bincode encoding fails.
    #[error("failed to encode index")]
    Encode {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when bincode decoding fails.
    #[error("failed to decode index")]
    Decode {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when decoding bytes written with a different format version.
    #[error("incompatible index format: expected {expected}, found {found}")]
    IncompatibleFormat {
        /// The format version this build writes and reads.
        expected: u32,
        /// The format version found in the input.
        found: u32,
    },

    /// Returned when decoded bytes do not describe a well-formed tree.
    #[error("corrupt index: {reason}")]
    CorruptIndex {
        /// The first structural violation found.
        reason: String,
    },
}

/// Errors from a k-NN query.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Returned when the index holds no sequences.
    #[error("cannot search an empty index")]
    EmptyIndex,

    /// Returned when the examine budget ran out before any neighbour was found.
    #[error("no neighbour found after examining {examined} sequences")]
    NoNeighborFound {
        /// Number of sequences examined before giving up.
        examined: usize,
    },

    /// Returned when the requested number of neighbours is zero.
    #[error("k must be at least 1, got {k}")]
    InvalidK {
        /// The invalid k value provided.
        k: usize,
    },

    /// Wraps a DTW error, e.g. an oversized query.
    #[error("DTW error during search: {0}")]
    Dtw(#[from] DtwError),

    /// Wraps a queue error. Indicates a mis-sized queue.
    #[error("queue error during search: {0}")]
    Queue(#[from] QueueError),
}

/// Errors from the wave detector.
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    /// Wraps a DTW error raised while building a candidate segment.
    #[error("invalid candidate segment: {0}")]
    Dtw(#[from] DtwError),

    /// Wraps a search error other than an unresolved query.
    #[error("classification failed: {0}")]
    Search(#[from] SearchError),

    /// Returned when the sampling rate is not a positive finite number.
    #[error("sampling rate must be positive and finite, got {rate}")]
    InvalidSamplingRate {
        /// The invalid sampling rate provided.
        rate: f64,
    },
}
