//! Criterion benchmarks for warpindex-dtw: DTW distance, LB_Keogh and DBA refinement.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use warpindex_dtw::{DbaConfig, Dtw, Envelope, TimeSeries};

fn make_sine_series(n: usize, offset: f64) -> TimeSeries {
    let values: Vec<f64> = (0..n).map(|i| (i as f64 * 0.1).sin() + offset).collect();
    TimeSeries::new(values).unwrap()
}

fn bench_dtw_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("dtw_distance");
    for &len in &[64usize, 256, 1024] {
        for &window in &[2usize, 10, 119] {
            let a = make_sine_series(len, 0.0);
            let b = make_sine_series(len, 1.0);
            let dtw = Dtw::new(window);
            let id = BenchmarkId::new(format!("len{len}"), format!("w{window}"));
            group.bench_with_input(id, &(a, b, dtw), |bencher, (a, b, dtw)| {
                bencher.iter(|| dtw.distance(a.as_view(), b.as_view()).unwrap());
            });
        }
    }
    group.finish();
}

fn bench_lb_keogh(c: &mut Criterion) {
    let q = make_sine_series(1024, 0.0);
    let candidate = make_sine_series(1024, 0.5);
    let envelope = Envelope::compute(q.as_view(), 119);

    c.bench_function("lb_keogh_1024_w119", |b| {
        b.iter(|| envelope.lb_keogh(candidate.as_view()));
    });
}

fn bench_dba_refine(c: &mut Criterion) {
    let series: Vec<TimeSeries> = (0..20)
        .map(|i| make_sine_series(128 + i, i as f64 * 0.1))
        .collect();
    let views: Vec<_> = series.iter().map(|s| s.as_view()).collect();
    let config = DbaConfig::new(10).with_iterations(10);

    c.bench_function("dba_refine_20x128_w10_iter10", |b| {
        b.iter(|| config.refine(views[0], &views).unwrap());
    });
}

criterion_group!(benches, bench_dtw_distance, bench_lb_keogh, bench_dba_refine);
criterion_main!(benches);
