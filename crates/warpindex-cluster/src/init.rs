//! K-means++ seeding with LB_Keogh-gated distance updates (private module).

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use warpindex_dtw::{Dtw, DtwError, Envelope, TimeSeriesView};

/// Chosen seeds plus the nearest-seed assignment they induce.
pub(crate) struct Seeding {
    /// Series indices of the seeds, in draw order. Seed `c` starts cluster `c`.
    pub(crate) seeds: Vec<usize>,
    /// Cluster of every series: the seed it is nearest to.
    pub(crate) assignments: Vec<usize>,
}

/// Draw up to `k` seeds from `series`.
///
/// The first seed is uniform. Every later seed is an unchosen series drawn
/// with probability proportional to its DTW distance to the nearest seed so
/// far (already a squared cost). After each draw the incumbents are updated,
/// skipping DTW whenever LB_Keogh already reaches the incumbent.
///
/// When all remaining weights are zero the first unchosen series is taken.
pub(crate) fn kmeans_plus_plus(
    series: &[TimeSeriesView<'_>],
    k: usize,
    dtw: &Dtw,
    rng: &mut ChaCha8Rng,
) -> Result<Seeding, DtwError> {
    let n = series.len();
    let k = k.min(n);

    let first = rng.gen_range(0..n);
    let mut taken = vec![false; n];
    taken[first] = true;
    let mut seeds = vec![first];
    let mut assignments = vec![0usize; n];
    let mut nearest = series
        .iter()
        .map(|s| dtw.distance(series[first], *s).map(|d| d.value()))
        .collect::<Result<Vec<f64>, _>>()?;

    while seeds.len() < k {
        let total: f64 = (0..n).filter(|&i| !taken[i]).map(|i| nearest[i]).sum();
        let mut untaken = (0..n).filter(|&i| !taken[i]);

        let next = if total > 0.0 {
            let threshold = rng.gen_range(0.0..total);
            let mut cumsum = 0.0;
            let mut selected = None;
            let mut last = None;
            for i in untaken {
                cumsum += nearest[i];
                last = Some(i);
                if cumsum > threshold {
                    selected = Some(i);
                    break;
                }
            }
            selected.or(last)
        } else {
            untaken.next()
        };
        let Some(next) = next else { break };

        let label = seeds.len();
        taken[next] = true;
        seeds.push(next);
        nearest[next] = 0.0;
        assignments[next] = label;

        let envelope = Envelope::compute(series[next], dtw.window());
        for j in 0..n {
            if taken[j] || envelope.lb_keogh(series[j]) >= nearest[j] {
                continue;
            }
            let d = dtw.distance(series[next], series[j])?.value();
            if d < nearest[j] {
                nearest[j] = d;
                assignments[j] = label;
            }
        }
    }

    Ok(Seeding { seeds, assignments })
}
