//! The immutable tree index and its structural queries.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::label::LabeledSequence;
use crate::node::{NodeIndex, TreeNode};

/// Non-fatal conditions recorded while building an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildWarning {
    /// The split cap was reached; `pending` queued nodes were turned into leaves.
    ClusteringNonconvergence {
        /// Number of nodes still waiting to be split.
        pending: usize,
    },
}

/// A clustered tree over a labelled corpus, built once and read by any
/// number of concurrent queries.
///
/// Node 0 is the root. Leaf `members` are positions into [`corpus`](Self::corpus).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeIndex {
    pub(crate) nodes: Vec<TreeNode>,
    pub(crate) corpus: Vec<LabeledSequence>,
    pub(crate) window: usize,
    pub(crate) capacity: usize,
    pub(crate) warnings: Vec<BuildWarning>,
}

impl TreeIndex {
    /// Return the root node index.
    #[must_use]
    pub fn root(&self) -> NodeIndex {
        NodeIndex::new(0)
    }

    /// Return the node at `index`, if it exists.
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> Option<&TreeNode> {
        self.nodes.get(index.index())
    }

    /// Return all nodes in arena order.
    #[must_use]
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Return the number of nodes, root included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaves.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf).count()
    }

    /// Return the number of levels: 1 for a lone root, 2 for root plus leaves.
    #[must_use]
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut deepest = 0;
        let mut queue = VecDeque::from([(self.root(), 1usize)]);
        while let Some((idx, level)) = queue.pop_front() {
            deepest = deepest.max(level);
            if let Some(node) = self.node(idx) {
                queue.extend(node.children.iter().map(|&c| (c, level + 1)));
            }
        }
        deepest
    }

    /// Return the indexed corpus. Node members are positions into it.
    #[must_use]
    pub fn corpus(&self) -> &[LabeledSequence] {
        &self.corpus
    }

    /// Return true if the index holds no sequences.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }

    /// Return the warping window used to build the index.
    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    /// Return the longest sequence accepted by the index.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Return the warnings recorded during the build.
    #[must_use]
    pub fn warnings(&self) -> &[BuildWarning] {
        &self.warnings
    }

    /// 1-NN exact query configuration under the build window.
    #[must_use]
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig::new(self.window)
    }
}
