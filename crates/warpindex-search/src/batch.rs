//! Parallel classification of independent queries.

use rayon::iter::{IntoParallelIterator, IntoParallelRefIterator, ParallelIterator};
use serde::Serialize;
use tracing::{info, instrument};

use warpindex_dtw::TimeSeries;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::index::TreeIndex;
use crate::label::{ClassLabel, LabeledSequence};
use crate::search::Classification;

/// Outcome of one labelled query in [`evaluate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Global dataset index of the query.
    pub index: usize,
    /// True class of the query.
    pub actual: ClassLabel,
    /// Predicted class, `None` when the budget ran out with no neighbour.
    pub predicted: Option<ClassLabel>,
    /// DTW distance to the nearest neighbour.
    pub distance: Option<f64>,
    /// Number of DTW distances computed.
    pub distance_computations: usize,
}

/// Summary of a labelled batch evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    /// One entry per query, in input order.
    pub predictions: Vec<Prediction>,
    /// Fraction of queries predicted wrongly or not at all.
    pub error_rate: f64,
    /// Number of queries that ended with no neighbour.
    pub unresolved: usize,
    /// Mean DTW computations per query.
    pub mean_distance_computations: f64,
}

/// Classify every query in parallel. Results come back in input order.
pub fn classify_batch(
    index: &TreeIndex,
    queries: &[TimeSeries],
    config: &SearchConfig,
) -> Vec<Result<Classification, SearchError>> {
    queries
        .par_iter()
        .map(|q| index.classify(q.as_view(), config))
        .collect()
}

/// Classify labelled queries in parallel and score them.
///
/// A query that runs out of budget without a neighbour counts as an error
/// and the batch continues.
///
/// # Errors
///
/// Any [`SearchError`] other than [`SearchError::NoNeighborFound`] aborts the batch.
#[instrument(skip_all, fields(n = queries.len(), k = config.k, budget = ?config.examine_budget))]
pub fn evaluate(
    index: &TreeIndex,
    queries: &[LabeledSequence],
    config: &SearchConfig,
) -> Result<BatchReport, SearchError> {
    let predictions: Vec<Prediction> = queries
        .into_par_iter()
        .map(|q| match index.classify(q.series.as_view(), config) {
            Ok(c) => Ok(Prediction {
                index: q.index,
                actual: q.label,
                predicted: Some(c.predicted_label),
                distance: c.nearest().map(|n| n.distance),
                distance_computations: c.distance_computations,
            }),
            Err(SearchError::NoNeighborFound { .. }) => Ok(Prediction {
                index: q.index,
                actual: q.label,
                predicted: None,
                distance: None,
                distance_computations: 0,
            }),
            Err(e) => Err(e),
        })
        .collect::<Result<_, _>>()?;

    let n = predictions.len().max(1) as f64;
    let wrong = predictions
        .iter()
        .filter(|p| p.predicted != Some(p.actual))
        .count();
    let unresolved = predictions.iter().filter(|p| p.predicted.is_none()).count();
    let total_computations: usize = predictions.iter().map(|p| p.distance_computations).sum();
    let report = BatchReport {
        error_rate: wrong as f64 / n,
        unresolved,
        mean_distance_computations: total_computations as f64 / n,
        predictions,
    };
    info!(
        error_rate = report.error_rate,
        unresolved = report.unresolved,
        mean_distance_computations = report.mean_distance_computations,
        "batch evaluated"
    );
    Ok(report)
}
