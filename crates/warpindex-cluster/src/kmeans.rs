//! Core DTW k-means loop: DBA update, LB-gated reassignment.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument};

use warpindex_dtw::{DbaConfig, Dtw, DtwError, Envelope, TimeSeries, TimeSeriesView};

use crate::config::KMeansConfig;
use crate::error::ClusterError;
use crate::init::kmeans_plus_plus;
use crate::result::{ClusterLabel, KMeansResult};

// ── assign ────────────────────────────────────────────────────────────────────

/// Assign each series to its nearest live centroid.
///
/// Centroids are scanned in label order and DTW is skipped whenever the
/// LB_Keogh bound of the series already reaches the best distance so far.
/// Only a strictly smaller distance replaces the incumbent, so ties go to
/// the lowest label.
#[instrument(skip_all, fields(n = series.len(), k = centroids.len()))]
pub(crate) fn assign(
    series: &[TimeSeriesView<'_>],
    centroids: &[Option<TimeSeries>],
    dtw: &Dtw,
) -> Result<Vec<usize>, DtwError> {
    let mut assignments = Vec::with_capacity(series.len());
    let mut computed = 0usize;
    for &s in series {
        let envelope = Envelope::compute(s, dtw.window());
        let mut best = f64::INFINITY;
        let mut label = 0usize;
        for (c, centroid) in centroids.iter().enumerate() {
            let Some(centroid) = centroid else { continue };
            if envelope.lb_keogh(centroid.as_view()) >= best {
                continue;
            }
            computed += 1;
            let d = dtw.distance(s, centroid.as_view())?.value();
            if d < best {
                best = d;
                label = c;
            }
        }
        assignments.push(label);
    }
    debug!(computed, "assignment step complete");
    Ok(assignments)
}

// ── update ────────────────────────────────────────────────────────────────────

/// Recompute every centroid by DBA over its current members.
///
/// Each refinement starts from the previous centroid. A cluster without
/// members loses its centroid.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ClusterError::Dba`] | DBA refinement fails |
#[instrument(skip_all, fields(k = previous.len(), iteration = iteration))]
pub(crate) fn update(
    series: &[TimeSeriesView<'_>],
    assignments: &[usize],
    previous: &[Option<TimeSeries>],
    dba: &DbaConfig,
    iteration: usize,
) -> Result<Vec<Option<TimeSeries>>, ClusterError> {
    let mut groups: Vec<Vec<TimeSeriesView<'_>>> = vec![Vec::new(); previous.len()];
    for (&s, &label) in series.iter().zip(assignments) {
        groups[label].push(s);
    }

    groups
        .iter()
        .zip(previous)
        .map(|(members, prev)| -> Result<Option<TimeSeries>, ClusterError> {
            let Some(&first) = members.first() else {
                return Ok(None);
            };
            let start = prev.as_ref().map_or(first, TimeSeries::as_view);
            let refined = dba.refine(start, members)?;
            Ok(Some(refined.centroid))
        })
        .collect()
}

// ── run ───────────────────────────────────────────────────────────────────────

/// Seed with k-means++ and alternate update/assign until the assignment is stable.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ClusterError::Dtw`] | A series exceeds the DTW capacity |
/// | [`ClusterError::Dba`] | DBA refinement fails |
#[instrument(skip_all, fields(n = series.len(), k = config.k, window = config.window))]
pub(crate) fn run(
    series: &[TimeSeriesView<'_>],
    config: &KMeansConfig,
) -> Result<KMeansResult, ClusterError> {
    let dtw = Dtw::new(config.window).with_capacity(config.capacity);
    for s in series {
        dtw.check_len(s.len())?;
    }
    let dba = DbaConfig::new(config.window)
        .with_iterations(config.dba_iterations)
        .with_capacity(config.capacity);

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let seeding = kmeans_plus_plus(series, config.k, &dtw, &mut rng)?;

    let mut centroids: Vec<Option<TimeSeries>> = (0..config.k)
        .map(|c| seeding.seeds.get(c).map(|&i| series[i].to_owned_series()))
        .collect();
    let mut assignments = seeding.assignments;
    let mut iterations = 0usize;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;
        centroids = update(series, &assignments, &centroids, &dba, iterations)?;
        let next = assign(series, &centroids, &dtw)?;
        let changed = next.iter().zip(&assignments).filter(|(a, b)| a != b).count();
        debug!(iteration = iterations, changed, "k-means pass complete");
        assignments = next;
        if changed == 0 {
            converged = true;
            break;
        }
    }

    // Clusters emptied by the last reassignment have no members left.
    let mut occupied = vec![false; centroids.len()];
    for &label in &assignments {
        occupied[label] = true;
    }
    for (centroid, occupied) in centroids.iter_mut().zip(occupied) {
        if !occupied {
            *centroid = None;
        }
    }

    info!(
        seed = config.seed,
        iterations,
        converged,
        live = centroids.iter().filter(|c| c.is_some()).count(),
        "k-means finished"
    );

    Ok(KMeansResult {
        centroids,
        assignments: assignments.into_iter().map(ClusterLabel::new).collect(),
        iterations,
        converged,
    })
}
