//! Accuracy regression tests for warpindex-dtw.
//!
//! Reference distances are accumulated squared costs worked out by hand, so
//! any change to the recurrence or the band geometry shows up here.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use warpindex_dtw::{DbaConfig, Dtw, DtwError, Envelope, TimeSeries};

// ---------------------------------------------------------------------------
// Helper
// ---------------------------------------------------------------------------

fn ts(values: &[f64]) -> TimeSeries {
    TimeSeries::new(values.to_vec()).expect("valid test series")
}

fn random_series(rng: &mut ChaCha8Rng, max_len: usize) -> TimeSeries {
    let len = rng.gen_range(1..=max_len);
    ts(&(0..len).map(|_| rng.gen_range(-3.0..3.0)).collect::<Vec<_>>())
}

// ---------------------------------------------------------------------------
// a) dtw_distances_match_known_values
// ---------------------------------------------------------------------------

#[test]
fn dtw_distances_match_known_values() {
    let cases: Vec<(TimeSeries, TimeSeries, usize, f64)> = vec![
        (ts(&[0.0, 0.0, 0.0]), ts(&[1.0, 1.0, 1.0]), 3, 3.0), // constant offset
        (ts(&[0.0, 1.0, 0.0]), ts(&[0.0, 0.0, 0.0]), 3, 1.0), // single peak
        (ts(&[1.0, 2.0, 3.0]), ts(&[3.0, 2.0, 1.0]), 3, 8.0), // reversed
        (ts(&[1.0]), ts(&[5.0]), 0, 16.0),                     // single point
        (ts(&[0.0, 0.0, 1.0]), ts(&[1.0, 0.0, 0.0]), 3, 2.0), // shifted peak
        (ts(&[0.0, 0.0, 1.0]), ts(&[1.0, 0.0, 0.0]), 0, 2.0), // shifted peak, diagonal only
        (ts(&[1.0, 2.0]), ts(&[1.0, 2.0, 2.0, 2.0]), 0, 0.0), // stretched tail
    ];

    for (i, (a, b, window, expected)) in cases.iter().enumerate() {
        let d = Dtw::new(*window)
            .distance(a.as_view(), b.as_view())
            .expect("within capacity")
            .value();
        assert!(
            (d - expected).abs() < 1e-10,
            "case {i}: got {d}, expected {expected}"
        );
    }
}

// ---------------------------------------------------------------------------
// b) self_distance_is_zero
// ---------------------------------------------------------------------------

#[test]
fn self_distance_is_zero() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    for _ in 0..200 {
        let q = random_series(&mut rng, 50);
        let window = rng.gen_range(0..10);
        let d = Dtw::new(window).distance(q.as_view(), q.as_view()).unwrap();
        assert_eq!(d.value(), 0.0);
    }
}

// ---------------------------------------------------------------------------
// c) lb_keogh_is_a_lower_bound
// ---------------------------------------------------------------------------

#[test]
fn lb_keogh_is_a_lower_bound() {
    let mut rng = ChaCha8Rng::seed_from_u64(12);
    for case in 0..1_000 {
        let q = random_series(&mut rng, 60);
        let c = random_series(&mut rng, 60);
        let window = rng.gen_range(0..15);

        let lb = Envelope::compute(q.as_view(), window).lb_keogh(c.as_view());
        let d = Dtw::new(window).distance(q.as_view(), c.as_view()).unwrap().value();
        assert!(
            lb <= d + 1e-9,
            "case {case}: lb {lb} > dtw {d} (|q|={}, |c|={}, w={window})",
            q.len(),
            c.len()
        );
    }
}

// ---------------------------------------------------------------------------
// d) capacity_is_enforced
// ---------------------------------------------------------------------------

#[test]
fn capacity_is_enforced() {
    let long = ts(&vec![0.5; 15_001]);
    let short = ts(&[0.5]);
    let err = Dtw::new(5)
        .distance(short.as_view(), long.as_view())
        .unwrap_err();
    assert!(matches!(
        err,
        DtwError::SequenceTooLong {
            len: 15_001,
            capacity: 15_000
        }
    ));
}

// ---------------------------------------------------------------------------
// e) dba_centroid_sits_between_offset_members
// ---------------------------------------------------------------------------

#[test]
fn dba_centroid_sits_between_offset_members() {
    let low = ts(&[0.0, 0.0, 0.0, 0.0]);
    let high = ts(&[10.0, 10.0, 10.0, 10.0]);
    let result = DbaConfig::new(1)
        .refine(low.as_view(), &[low.as_view(), high.as_view()])
        .expect("DBA should succeed");

    for (i, &v) in result.centroid.as_slice().iter().enumerate() {
        assert!((v - 5.0).abs() < 1e-10, "centroid[{i}] = {v}, expected 5.0");
    }
}
