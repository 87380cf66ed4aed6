//! Accuracy regression tests for warpindex-search.
//!
//! The central guarantee: with no examine budget the branch-and-bound search
//! returns exactly what a linear DTW scan returns, whatever the tree shape.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use warpindex_dtw::{Dtw, DtwError, TimeSeries};
use warpindex_search::{
    ClassLabel, IndexConfig, LabeledSequence, SearchConfig, SearchCounters, SearchError,
    TreeIndex, batch,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ts(values: &[f64]) -> TimeSeries {
    TimeSeries::new(values.to_vec()).unwrap()
}

fn labeled(values: &[f64], label: i32, index: usize) -> LabeledSequence {
    LabeledSequence::new(ts(values), ClassLabel::new(label), index)
}

/// Random walks of length 5..=25, labelled round-robin over 3 classes.
fn random_corpus(rng: &mut ChaCha8Rng, n: usize) -> Vec<LabeledSequence> {
    (0..n)
        .map(|i| {
            let len = rng.gen_range(5..=25);
            let mut level = 0.0;
            let values: Vec<f64> = (0..len)
                .map(|_| {
                    level += rng.gen_range(-1.0..1.0);
                    level
                })
                .collect();
            labeled(&values, (i % 3) as i32, 1000 + i)
        })
        .collect()
}

fn random_query(rng: &mut ChaCha8Rng) -> TimeSeries {
    let len = rng.gen_range(5..=25);
    let mut level = 0.0;
    ts(&(0..len)
        .map(|_| {
            level += rng.gen_range(-1.0..1.0);
            level
        })
        .collect::<Vec<_>>())
}

/// Sorted DTW distances from `query` to every corpus sequence.
fn brute_force(corpus: &[LabeledSequence], query: &TimeSeries, window: usize) -> Vec<f64> {
    let dtw = Dtw::new(window);
    let mut d: Vec<f64> = corpus
        .iter()
        .map(|c| dtw.distance(query.as_view(), c.series.as_view()).unwrap().value())
        .collect();
    d.sort_by(f64::total_cmp);
    d
}

fn zeros_and_ones() -> Vec<LabeledSequence> {
    let mut corpus = Vec::new();
    for i in 0..10 {
        let jitter = i as f64 * 0.01;
        corpus.push(labeled(&[jitter; 10], 0, i));
        corpus.push(labeled(&[1.0 - jitter; 10], 1, 10 + i));
    }
    corpus
}

// ---------------------------------------------------------------------------
// a) well_separated_clusters_classify_correctly
// ---------------------------------------------------------------------------

#[test]
fn well_separated_clusters_classify_correctly() {
    let corpus = zeros_and_ones();
    let index = IndexConfig::new(2, 2)
        .unwrap()
        .with_leaf_size(4)
        .build(&corpus)
        .unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let noisy_zeros: Vec<f64> = (0..10).map(|_| rng.gen_range(-0.1..0.1)).collect();
    let result = index.classify(ts(&noisy_zeros).as_view(), &index.search_config()).unwrap();
    assert_eq!(result.predicted_label, ClassLabel::new(0));

    let noisy_ones: Vec<f64> = (0..10).map(|_| 1.0 + rng.gen_range(-0.1..0.1)).collect();
    let result = index.classify(ts(&noisy_ones).as_view(), &index.search_config()).unwrap();
    assert_eq!(result.predicted_label, ClassLabel::new(1));
}

// ---------------------------------------------------------------------------
// b) single_branch_tree_is_searched_through_its_only_child
// ---------------------------------------------------------------------------

#[test]
fn single_branch_tree_is_searched_through_its_only_child() {
    let corpus = zeros_and_ones();
    let index = IndexConfig::new(1, 2)
        .unwrap()
        .with_leaf_size(4)
        .build(&corpus)
        .unwrap();
    assert_eq!(index.depth(), 2);

    let mut counters = SearchCounters::default();
    let result = index
        .classify_with_metrics(ts(&[0.05; 10]).as_view(), &index.search_config(), &mut counters)
        .unwrap();
    assert_eq!(result.predicted_label, ClassLabel::new(0));
    assert_eq!(counters.deferred_dtw + counters.deferred_lower_bound, 0);
    assert_eq!(result.sequences_examined, corpus.len());
}

// ---------------------------------------------------------------------------
// c) exhaustive_search_matches_brute_force
// ---------------------------------------------------------------------------

#[test]
fn exhaustive_search_matches_brute_force() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let corpus = random_corpus(&mut rng, 40);

    for (k_branch, leaf_size, window) in [(1, 5, 2), (2, 1, 0), (3, 4, 3), (5, 8, 1), (2, 40, 4)] {
        let index = IndexConfig::new(k_branch, window)
            .unwrap()
            .with_leaf_size(leaf_size)
            .with_seed(k_branch as u64)
            .build(&corpus)
            .unwrap();
        let unlimited = SearchConfig::new(window);
        let corpus_budget = SearchConfig::new(window).with_examine_budget(corpus.len());

        for _ in 0..10 {
            let query = random_query(&mut rng);
            let expected = brute_force(&corpus, &query, window);
            for config in [&unlimited, &corpus_budget] {
                let result = index.classify(query.as_view(), config).unwrap();
                let nearest = result.nearest().unwrap();
                assert!(
                    (nearest.distance - expected[0]).abs() < 1e-9,
                    "K={k_branch} leaf={leaf_size} w={window} budget={:?}: got {}, brute force {}",
                    config.examine_budget(),
                    nearest.distance,
                    expected[0]
                );
                assert_eq!(result.sequences_examined, corpus.len());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// d) exhaustive_knn_matches_brute_force
// ---------------------------------------------------------------------------

#[test]
fn exhaustive_knn_matches_brute_force() {
    let mut rng = ChaCha8Rng::seed_from_u64(12);
    let corpus = random_corpus(&mut rng, 30);
    let index = IndexConfig::new(3, 2)
        .unwrap()
        .with_leaf_size(3)
        .build(&corpus)
        .unwrap();
    let config = SearchConfig::new(2).with_k(3);

    for _ in 0..10 {
        let query = random_query(&mut rng);
        let expected = brute_force(&corpus, &query, 2);
        let result = index.classify(query.as_view(), &config).unwrap();
        assert_eq!(result.neighbors.len(), 3);
        for (got, want) in result.neighbors.iter().zip(&expected) {
            assert!((got.distance - want).abs() < 1e-9);
        }
        assert!(result.neighbors.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert_eq!(result.predicted_label, result.neighbors[0].label);
        for n in &result.neighbors {
            assert_eq!(corpus[n.position].index, n.index);
            assert_eq!(corpus[n.position].label, n.label);
        }
        assert_eq!(
            result.neighbor_indices(),
            result.neighbors.iter().map(|n| n.index).collect::<Vec<_>>()
        );
    }
}

// ---------------------------------------------------------------------------
// d2) k_above_corpus_size_returns_every_sequence
// ---------------------------------------------------------------------------

#[test]
fn k_above_corpus_size_returns_every_sequence() {
    let corpus = zeros_and_ones();
    let index = IndexConfig::new(2, 1)
        .unwrap()
        .with_leaf_size(4)
        .build(&corpus)
        .unwrap();
    let query = ts(&[0.03; 10]);

    for k in [corpus.len() + 1, 1 << 40, usize::MAX] {
        let result = index
            .classify(query.as_view(), &SearchConfig::new(1).with_k(k))
            .unwrap();
        assert_eq!(result.neighbors.len(), corpus.len(), "k={k}");
        assert!(result.neighbors.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert_eq!(result.predicted_label, ClassLabel::new(0));

        let mut positions: Vec<usize> = result.neighbors.iter().map(|n| n.position).collect();
        positions.sort_unstable();
        assert_eq!(positions, (0..corpus.len()).collect::<Vec<_>>());
    }
}

// ---------------------------------------------------------------------------
// e) build_is_deterministic_for_a_seed
// ---------------------------------------------------------------------------

#[test]
fn build_is_deterministic_for_a_seed() {
    let mut rng = ChaCha8Rng::seed_from_u64(13);
    let corpus = random_corpus(&mut rng, 30);
    let cfg = IndexConfig::new(3, 2).unwrap().with_leaf_size(4).with_seed(77);
    let a = cfg.build(&corpus).unwrap();
    let b = cfg.build(&corpus).unwrap();
    assert_eq!(a, b);
}

// ---------------------------------------------------------------------------
// f) byte_round_trip_classifies_identically
// ---------------------------------------------------------------------------

#[test]
fn byte_round_trip_classifies_identically() {
    let mut rng = ChaCha8Rng::seed_from_u64(14);
    let corpus = random_corpus(&mut rng, 30);
    let index = IndexConfig::new(3, 2)
        .unwrap()
        .with_leaf_size(4)
        .build(&corpus)
        .unwrap();
    let restored = TreeIndex::from_bytes(&index.to_bytes().unwrap()).unwrap();

    let config = SearchConfig::new(2).with_examine_budget(10);
    for _ in 0..10 {
        let query = random_query(&mut rng);
        assert_eq!(
            index.classify(query.as_view(), &config).unwrap(),
            restored.classify(query.as_view(), &config).unwrap()
        );
    }
}

// ---------------------------------------------------------------------------
// g) budget_bounds_examined_sequences
// ---------------------------------------------------------------------------

#[test]
fn budget_bounds_examined_sequences() {
    let mut rng = ChaCha8Rng::seed_from_u64(15);
    let corpus = random_corpus(&mut rng, 30);
    let index = IndexConfig::new(2, 2)
        .unwrap()
        .with_leaf_size(3)
        .build(&corpus)
        .unwrap();
    let query = random_query(&mut rng);

    let limited = index
        .classify(query.as_view(), &SearchConfig::new(2).with_examine_budget(5))
        .unwrap();
    assert_eq!(limited.sequences_examined, 5);

    let full = index.classify(query.as_view(), &SearchConfig::new(2)).unwrap();
    assert_eq!(full.sequences_examined, corpus.len());
    assert!(full.nearest().unwrap().distance <= limited.nearest().unwrap().distance);
}

// ---------------------------------------------------------------------------
// h) failure_modes
// ---------------------------------------------------------------------------

#[test]
fn failure_modes() {
    let corpus = zeros_and_ones();
    let index = IndexConfig::new(2, 1).unwrap().build(&corpus).unwrap();
    let query = ts(&[0.0; 10]);

    let zero_budget = SearchConfig::new(1).with_examine_budget(0);
    assert!(matches!(
        index.classify(query.as_view(), &zero_budget),
        Err(SearchError::NoNeighborFound { examined: 0 })
    ));

    assert!(matches!(
        index.classify(query.as_view(), &SearchConfig::new(1).with_k(0)),
        Err(SearchError::InvalidK { k: 0 })
    ));

    let empty = IndexConfig::new(2, 1).unwrap().build(&[]).unwrap();
    assert!(matches!(
        empty.classify(query.as_view(), &SearchConfig::new(1)),
        Err(SearchError::EmptyIndex)
    ));

    let small = IndexConfig::new(2, 1)
        .unwrap()
        .with_capacity(16)
        .build(&corpus)
        .unwrap();
    let long = ts(&[0.0; 17]);
    assert!(matches!(
        small.classify(long.as_view(), &SearchConfig::new(1)),
        Err(SearchError::Dtw(DtwError::SequenceTooLong { len: 17, capacity: 16 }))
    ));
}

// ---------------------------------------------------------------------------
// i) batch_evaluation
// ---------------------------------------------------------------------------

#[test]
fn batch_evaluation_scores_and_survives_unresolved_queries() {
    let corpus = zeros_and_ones();
    let index = IndexConfig::new(2, 1)
        .unwrap()
        .with_leaf_size(4)
        .build(&corpus)
        .unwrap();
    let queries = vec![
        labeled(&[0.02; 10], 0, 0),
        labeled(&[0.97; 10], 1, 1),
        labeled(&[0.9; 10], 0, 2),
    ];

    let report = batch::evaluate(&index, &queries, &index.search_config()).unwrap();
    assert_eq!(report.predictions.len(), 3);
    assert_eq!(report.unresolved, 0);
    assert!((report.error_rate - 1.0 / 3.0).abs() < 1e-12);
    assert!(report.mean_distance_computations > 0.0);

    let starved = SearchConfig::new(1).with_examine_budget(0);
    let report = batch::evaluate(&index, &queries, &starved).unwrap();
    assert_eq!(report.unresolved, 3);
    assert_eq!(report.error_rate, 1.0);

    let series: Vec<TimeSeries> = queries.iter().map(|q| q.series.clone()).collect();
    let results = batch::classify_batch(&index, &series, &index.search_config());
    let labels: Vec<i32> = results
        .iter()
        .map(|r| r.as_ref().unwrap().predicted_label.value())
        .collect();
    assert_eq!(labels, vec![0, 1, 1]);
}
