use std::fmt;

use warpindex_dtw::TimeSeries;

use crate::label::ClassLabel;

/// Index into the `Vec<TreeNode>` arena of a [`TreeIndex`](crate::TreeIndex).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node in the tree-index arena.
///
/// Either a leaf holding corpus positions, or an interior node whose
/// `children` are non-empty. Every node below the root carries the DBA
/// centroid of its members and their majority label. Interior nodes keep
/// `members` too: the union of their descendant leaves.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TreeNode {
    pub(crate) is_leaf: bool,
    pub(crate) centroid: Option<TimeSeries>,
    pub(crate) centroid_label: Option<ClassLabel>,
    pub(crate) members: Vec<usize>,
    pub(crate) children: Vec<NodeIndex>,
}

impl TreeNode {
    pub(crate) fn root(members: Vec<usize>) -> Self {
        Self {
            is_leaf: false,
            centroid: None,
            centroid_label: None,
            members,
            children: Vec::new(),
        }
    }

    pub(crate) fn child(centroid: TimeSeries, label: ClassLabel, members: Vec<usize>) -> Self {
        Self {
            is_leaf: false,
            centroid: Some(centroid),
            centroid_label: Some(label),
            members,
            children: Vec::new(),
        }
    }

    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    /// Return the centroid, absent only on the root.
    #[must_use]
    pub fn centroid(&self) -> Option<&TimeSeries> {
        self.centroid.as_ref()
    }

    /// Return the majority label of the members, absent only on the root.
    #[must_use]
    pub fn centroid_label(&self) -> Option<ClassLabel> {
        self.centroid_label
    }

    /// Return the corpus positions covered by this node.
    #[must_use]
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Return the children in cluster order.
    #[must_use]
    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }
}
