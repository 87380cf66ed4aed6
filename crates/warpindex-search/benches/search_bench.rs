//! Criterion benchmarks for warpindex-search: index build and 1-NN queries.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use warpindex_dtw::TimeSeries;
use warpindex_search::{ClassLabel, IndexConfig, LabeledSequence, SearchConfig};

fn make_corpus(n: usize) -> Vec<LabeledSequence> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    (0..n)
        .map(|i| {
            let class = i % 4;
            let len = rng.gen_range(48..=80);
            let values: Vec<f64> = (0..len)
                .map(|t| (t as f64 * 0.1 * (class + 1) as f64).sin() + rng.gen_range(-0.2..0.2))
                .collect();
            LabeledSequence::new(TimeSeries::new(values).unwrap(), ClassLabel::new(class as i32), i)
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let corpus = make_corpus(200);
    let cfg = IndexConfig::new(4, 6).unwrap().with_leaf_size(10);

    c.bench_function("index_build_200_k4_leaf10", |b| {
        b.iter(|| cfg.build(&corpus).unwrap());
    });
}

fn bench_classify(c: &mut Criterion) {
    let corpus = make_corpus(400);
    let index = IndexConfig::new(4, 6)
        .unwrap()
        .with_leaf_size(10)
        .build(&corpus)
        .unwrap();
    let query = corpus[7].series.clone();

    let exact = SearchConfig::new(6);
    c.bench_function("classify_exact_400", |b| {
        b.iter(|| index.classify(query.as_view(), &exact).unwrap());
    });

    let budgeted = SearchConfig::new(6).with_examine_budget(50);
    c.bench_function("classify_budget50_400", |b| {
        b.iter(|| index.classify(query.as_view(), &budgeted).unwrap());
    });
}

criterion_group!(benches, bench_build, bench_classify);
criterion_main!(benches);
