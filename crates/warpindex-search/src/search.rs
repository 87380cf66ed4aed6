//! Branch-and-bound k-NN search over a [`TreeIndex`].
//!
//! A query descends greedily towards the nearest centroid, ranking siblings by
//! LB_Keogh and computing DTW only while a bound could still beat the best
//! sibling. Unexplored siblings are deferred to two branch queues, one keyed
//! by DTW and one by LB_Keogh only, and revisited best-first until both
//! queues drain or the examine budget runs out. Leaf members are pruned
//! against the current worst of the best k, so an unlimited budget gives the
//! exact answer.

use serde::Serialize;
use tracing::{debug, instrument};

use warpindex_dtw::{Dtw, Envelope, TimeSeries, TimeSeriesView};

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::index::TreeIndex;
use crate::label::ClassLabel;
use crate::metrics::{BranchBound, MetricsSink, NoMetrics};
use crate::node::{NodeIndex, TreeNode};
use crate::queue::{BranchQueue, MaxQueue, MinQueue};

/// One reference sequence returned by a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbor {
    /// Global dataset index of the sequence.
    pub index: usize,
    /// Position of the sequence in the index corpus.
    pub position: usize,
    /// Class of the sequence.
    pub label: ClassLabel,
    /// DTW distance to the query.
    pub distance: f64,
}

/// Outcome of a k-NN query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    /// Label of the nearest neighbour.
    pub predicted_label: ClassLabel,
    /// Neighbours, nearest first.
    pub neighbors: Vec<Neighbor>,
    /// Number of DTW distances computed.
    pub distance_computations: usize,
    /// Number of reference sequences examined.
    pub sequences_examined: usize,
}

impl Classification {
    /// Global dataset indices of the neighbours, nearest first.
    #[must_use]
    pub fn neighbor_indices(&self) -> Vec<usize> {
        self.neighbors.iter().map(|n| n.index).collect()
    }

    /// Return the nearest neighbour.
    #[must_use]
    pub fn nearest(&self) -> Option<&Neighbor> {
        self.neighbors.first()
    }
}

impl TreeIndex {
    /// Classify `query` by its nearest neighbours.
    ///
    /// # Errors
    ///
    /// See [`TreeIndex::classify_with_metrics`].
    pub fn classify(
        &self,
        query: TimeSeriesView<'_>,
        config: &SearchConfig,
    ) -> Result<Classification, SearchError> {
        self.classify_with_metrics(query, config, &mut NoMetrics)
    }

    /// Classify `query`, reporting search events to `metrics`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SearchError::InvalidK`] | `config.k()` is zero |
    /// | [`SearchError::Dtw`] | The query exceeds the index capacity |
    /// | [`SearchError::EmptyIndex`] | The index holds no sequences |
    /// | [`SearchError::NoNeighborFound`] | The budget ran out before any neighbour qualified |
    /// | [`SearchError::Queue`] | A branch queue was mis-sized |
    #[instrument(skip_all, fields(len = query.len(), k = config.k, budget = ?config.examine_budget))]
    pub fn classify_with_metrics(
        &self,
        query: TimeSeriesView<'_>,
        config: &SearchConfig,
        metrics: &mut dyn MetricsSink,
    ) -> Result<Classification, SearchError> {
        config.validate()?;
        let dtw = Dtw::new(config.window).with_capacity(self.capacity);
        dtw.check_len(query.len())?;
        if self.corpus.is_empty() {
            return Err(SearchError::EmptyIndex);
        }

        let mut search = Search {
            index: self,
            query,
            envelope: Envelope::compute(query, config.window),
            dtw,
            budget: config.examine_budget.unwrap_or(usize::MAX),
            // More neighbours than sequences can never be held.
            best: MaxQueue::new(config.k.min(self.corpus.len())),
            dtw_branches: BranchQueue::new(self.node_count()),
            lb_branches: BranchQueue::new(self.node_count()),
            examined: 0,
            computations: 0,
            metrics,
        };
        search.run()?;
        search.finalize()
    }
}

/// Whether the examine budget is spent.
enum Flow {
    Continue,
    Exhausted,
}

/// Children of one interior node visited during a descent.
struct Frame {
    /// `(LB_Keogh, child)` in ascending bound order.
    ranked: Vec<(f64, NodeIndex)>,
    /// DTW to each ranked child, where computed.
    known: Vec<Option<f64>>,
    /// Slot of the child the descent continued into.
    chosen: usize,
}

struct Search<'a, 'm> {
    index: &'a TreeIndex,
    query: TimeSeriesView<'a>,
    envelope: Envelope,
    dtw: Dtw,
    budget: usize,
    best: MaxQueue<usize>,
    dtw_branches: BranchQueue,
    lb_branches: BranchQueue,
    examined: usize,
    computations: usize,
    metrics: &'m mut dyn MetricsSink,
}

impl Search<'_, '_> {
    fn exhausted(&self) -> bool {
        self.examined >= self.budget
    }

    fn lower_bound(&mut self, candidate: TimeSeriesView<'_>) -> f64 {
        self.metrics.record_lower_bound();
        self.envelope.lb_keogh(candidate)
    }

    fn distance(&mut self, candidate: &TimeSeries) -> Result<f64, SearchError> {
        let cost = self.dtw.cost(self.query, candidate.as_view())?;
        self.computations += 1;
        self.metrics.record_dtw(cost.cells);
        Ok(cost.distance.value())
    }

    fn run(&mut self) -> Result<(), SearchError> {
        if let Flow::Exhausted = self.descend(self.index.root())? {
            return Ok(());
        }
        while (!self.dtw_branches.is_empty() || !self.lb_branches.is_empty()) && !self.exhausted() {
            self.promote()?;
            let (_, branch) = self.dtw_branches.pop()?;
            if let Flow::Exhausted = self.descend(branch)? {
                break;
            }
        }
        Ok(())
    }

    /// Move LB-only branches whose bound beats the best DTW-known branch
    /// into the DTW queue, computing their centroid distance.
    fn promote(&mut self) -> Result<(), SearchError> {
        let index = self.index;
        while !self.lb_branches.is_empty()
            && (self.dtw_branches.is_empty()
                || self.lb_branches.first_distance() < self.dtw_branches.first_distance())
        {
            let (lb, branch) = self.lb_branches.pop()?;
            let d = match index.node(branch).and_then(TreeNode::centroid) {
                Some(centroid) => self.distance(centroid)?,
                None => lb,
            };
            self.dtw_branches.insert(d, branch)?;
        }
        Ok(())
    }

    /// Walk from `start` to a leaf, collect it, then defer the unexplored siblings.
    fn descend(&mut self, start: NodeIndex) -> Result<Flow, SearchError> {
        let index = self.index;
        let mut frames = Vec::new();
        let mut current = start;

        while let Some(node) = index.node(current) {
            if node.is_leaf {
                if let Flow::Exhausted = self.collect(node)? {
                    return Ok(Flow::Exhausted);
                }
                break;
            }

            let mut ranked: Vec<(f64, NodeIndex)> = Vec::with_capacity(node.children.len());
            for &child in &node.children {
                if let Some(centroid) = index.node(child).and_then(TreeNode::centroid) {
                    ranked.push((self.lower_bound(centroid.as_view()), child));
                }
            }
            if ranked.is_empty() {
                break;
            }
            ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut known = vec![None; ranked.len()];
            let mut best = f64::INFINITY;
            let mut chosen = 0;
            for (slot, &(lb, child)) in ranked.iter().enumerate() {
                if lb >= best {
                    continue;
                }
                let Some(child_node) = index.node(child) else {
                    continue;
                };
                let Some(centroid) = child_node.centroid() else {
                    continue;
                };
                let d = self.distance(centroid)?;
                known[slot] = Some(d);
                if d < best {
                    best = d;
                    chosen = slot;
                    if let Some(label) = child_node.centroid_label() {
                        self.metrics.record_centroid_estimate(label);
                    }
                }
            }

            let next = ranked[chosen].1;
            frames.push(Frame {
                ranked,
                known,
                chosen,
            });
            if self.exhausted() {
                break;
            }
            current = next;
        }

        self.backtrack(frames)?;
        Ok(Flow::Continue)
    }

    /// Scan a leaf in ascending LB_Keogh order, offering qualifiers to the best k.
    fn collect(&mut self, leaf: &TreeNode) -> Result<Flow, SearchError> {
        let index = self.index;
        let corpus = index.corpus();
        let mut ranked: Vec<(f64, usize)> = Vec::with_capacity(leaf.members.len());
        for &position in &leaf.members {
            ranked.push((self.lower_bound(corpus[position].series.as_view()), position));
        }
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

        for (lb, position) in ranked {
            if self.exhausted() {
                return Ok(Flow::Exhausted);
            }
            let threshold = if self.best.is_full() {
                self.best.first_distance()
            } else {
                f64::INFINITY
            };
            if lb < threshold {
                let d = self.distance(&corpus[position].series)?;
                if d < threshold {
                    self.best.offer(d, position);
                }
            }
            self.examined += 1;
            self.metrics.record_examined(self.examined);
        }
        Ok(Flow::Continue)
    }

    fn backtrack(&mut self, frames: Vec<Frame>) -> Result<(), SearchError> {
        for frame in frames.into_iter().rev() {
            for (slot, &(lb, child)) in frame.ranked.iter().enumerate() {
                if slot == frame.chosen {
                    continue;
                }
                match frame.known[slot] {
                    Some(d) => {
                        self.dtw_branches.insert(d, child)?;
                        self.metrics.record_deferred(BranchBound::Dtw(d));
                    }
                    None => {
                        self.lb_branches.insert(lb, child)?;
                        self.metrics.record_deferred(BranchBound::LowerBound(lb));
                    }
                }
            }
        }
        Ok(())
    }

    /// Re-sort the best k nearest first and build the result.
    fn finalize(mut self) -> Result<Classification, SearchError> {
        if self.best.is_empty() {
            return Err(SearchError::NoNeighborFound {
                examined: self.examined,
            });
        }
        let mut ordered = MinQueue::new(self.best.len());
        while !self.best.is_empty() {
            let (distance, position) = self.best.pop()?;
            ordered.insert(distance, position)?;
        }

        let index = self.index;
        let corpus = index.corpus();
        let mut neighbors = Vec::with_capacity(ordered.len());
        while !ordered.is_empty() {
            let (distance, position) = ordered.pop()?;
            let item = &corpus[position];
            neighbors.push(Neighbor {
                index: item.index,
                position,
                label: item.label,
                distance,
            });
        }
        let Some(nearest) = neighbors.first() else {
            return Err(SearchError::NoNeighborFound {
                examined: self.examined,
            });
        };

        debug!(
            label = %nearest.label,
            distance = nearest.distance,
            examined = self.examined,
            computations = self.computations,
            "query classified"
        );
        Ok(Classification {
            predicted_label: nearest.label,
            neighbors,
            distance_computations: self.computations,
            sequences_examined: self.examined,
        })
    }
}
