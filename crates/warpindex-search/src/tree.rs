//! Breadth-first tree construction by repeated DTW k-means.

use std::collections::{BTreeMap, VecDeque};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument, warn};

use warpindex_cluster::KMeansConfig;
use warpindex_dtw::{Dtw, TimeSeriesView};

use crate::config::IndexConfig;
use crate::error::IndexError;
use crate::index::{BuildWarning, TreeIndex};
use crate::label::{ClassLabel, LabeledSequence};
use crate::node::{NodeIndex, TreeNode};

/// Build the index breadth-first from a root covering the whole corpus.
///
/// A child is queued for splitting only while it is larger than the leaf
/// size and strictly smaller than its parent, so splits that make no
/// progress end in a leaf. Hitting the split cap turns every queued node
/// into a leaf and records [`BuildWarning::ClusteringNonconvergence`].
#[instrument(skip_all, fields(
    n = corpus.len(),
    k = config.branch_factor,
    leaf_size = config.leaf_size,
    window = config.window,
))]
pub(crate) fn build(
    corpus: &[LabeledSequence],
    config: &IndexConfig,
) -> Result<TreeIndex, IndexError> {
    let dtw = Dtw::new(config.window).with_capacity(config.capacity);
    for item in corpus {
        dtw.check_len(item.series.len())?;
    }

    let mut nodes = vec![TreeNode::root((0..corpus.len()).collect())];
    let mut warnings = Vec::new();
    let mut queue = VecDeque::new();
    if corpus.is_empty() {
        nodes[0].is_leaf = true;
    } else {
        queue.push_back(NodeIndex::new(0));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut splits = 0usize;

    while splits < config.split_cap {
        let Some(parent) = queue.pop_front() else {
            break;
        };
        let seed: u64 = rng.r#gen();
        let children = split_node(corpus, &nodes[parent.index()].members, config, seed)?;
        splits += 1;

        let parent_size = nodes[parent.index()].members.len();
        let n_children = children.len();
        for mut child in children {
            let size = child.members.len();
            let idx = NodeIndex::new(nodes.len());
            if size > config.leaf_size && size < parent_size {
                queue.push_back(idx);
            } else {
                child.is_leaf = true;
            }
            nodes.push(child);
            nodes[parent.index()].children.push(idx);
        }
        debug!(
            node = parent.index(),
            size = parent_size,
            children = n_children,
            queued = queue.len(),
            "node split"
        );
    }

    if !queue.is_empty() {
        let pending = queue.len();
        for idx in queue.drain(..) {
            nodes[idx.index()].is_leaf = true;
        }
        warn!(
            pending,
            split_cap = config.split_cap,
            "split cap reached, clustering is incomplete"
        );
        warnings.push(BuildWarning::ClusteringNonconvergence { pending });
    }

    let index = TreeIndex {
        nodes,
        corpus: corpus.to_vec(),
        window: config.window,
        capacity: config.capacity,
        warnings,
    };
    info!(
        nodes = index.node_count(),
        leaves = index.leaf_count(),
        depth = index.depth(),
        splits,
        "tree index built"
    );
    Ok(index)
}

/// Cluster the sequences at `members` and return one child per live cluster.
fn split_node(
    corpus: &[LabeledSequence],
    members: &[usize],
    config: &IndexConfig,
    seed: u64,
) -> Result<Vec<TreeNode>, IndexError> {
    let views: Vec<TimeSeriesView<'_>> = members
        .iter()
        .map(|&p| corpus[p].series.as_view())
        .collect();
    let result = KMeansConfig::new(config.branch_factor, config.window)?
        .with_max_iter(config.max_kmeans_iter)
        .with_dba_iterations(config.dba_iterations)
        .with_seed(seed)
        .with_capacity(config.capacity)
        .fit(&views)?;

    let mut children = Vec::new();
    for (cluster, centroid) in result.live_clusters() {
        let positions: Vec<usize> = result
            .members(cluster)
            .into_iter()
            .map(|i| members[i])
            .collect();
        let Some(label) = majority_label(positions.iter().map(|&p| corpus[p].label)) else {
            continue;
        };
        children.push(TreeNode::child(centroid.clone(), label, positions));
    }
    Ok(children)
}

/// Most frequent label; the lowest label wins a tie.
fn majority_label(labels: impl IntoIterator<Item = ClassLabel>) -> Option<ClassLabel> {
    let mut counts: BTreeMap<ClassLabel, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    let mut best: Option<(ClassLabel, usize)> = None;
    for (label, count) in counts {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label)
}
