//! DTW k-means for building tree-index splits.
//!
//! Seeds with k-means++ (LB_Keogh-gated DTW), then alternates DBA centroid
//! refinement and nearest-centroid reassignment until the assignment stops
//! changing or the iteration budget runs out.

mod config;
mod error;
mod init;
mod kmeans;
mod result;

pub use config::KMeansConfig;
pub use error::ClusterError;
pub use result::{ClusterLabel, KMeansResult};
