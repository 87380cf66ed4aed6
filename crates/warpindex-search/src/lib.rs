//! Clustered tree index and branch-and-bound DTW k-NN search.
//!
//! [`IndexConfig::build`] splits a labelled corpus breadth-first with DTW
//! k-means into a tree of DBA centroids. [`TreeIndex::classify`] answers
//! k-NN queries by descending towards the nearest centroid and backtracking
//! through two branch queues, pruning with LB_Keogh. An examine budget trades
//! exactness for speed; without one the answer equals a linear DTW scan.

pub mod batch;
pub mod detect;

mod config;
mod error;
mod index;
mod label;
mod metrics;
mod node;
mod queue;
mod search;
mod serialize;
mod tree;

pub use config::{IndexConfig, SLOW_WAVE_EXAMINE_BUDGET, SLOW_WAVE_WINDOW, SearchConfig};
pub use error::{DetectError, IndexError, QueueError, SearchError};
pub use index::{BuildWarning, TreeIndex};
pub use label::{ClassLabel, LabeledSequence};
pub use metrics::{BranchBound, MetricsSink, NoMetrics, SearchCounters};
pub use node::{NodeIndex, TreeNode};
pub use queue::{BranchQueue, MaxQueue, MinQueue};
pub use search::{Classification, Neighbor};
