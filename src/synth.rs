//! Synthetic labelled corpora and signals for the CLI.
//!
//! Everything is built from random walks smoothed by a running mean, so no
//! dataset files are needed.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use warpindex_dtw::{DtwError, TimeSeries};
use warpindex_search::{ClassLabel, LabeledSequence};

/// Random walk of `len` steps in `[-step, step]`.
pub fn random_walk(rng: &mut ChaCha8Rng, len: usize, step: f64) -> Vec<f64> {
    let mut level = 0.0;
    (0..len)
        .map(|_| {
            level += rng.gen_range(-step..=step);
            level
        })
        .collect()
}

/// Centered running mean over `2 * half + 1` samples, clipped at the ends.
pub fn running_mean(values: &[f64], half: usize) -> Vec<f64> {
    let n = values.len();
    let mut prefix = vec![0.0; n + 1];
    for (i, v) in values.iter().enumerate() {
        prefix[i + 1] = prefix[i] + v;
    }
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(n);
            (prefix[hi] - prefix[lo]) / (hi - lo) as f64
        })
        .collect()
}

/// Linearly resample `values` to `len` points.
fn resample(values: &[f64], len: usize) -> Vec<f64> {
    if values.len() == 1 || len == 1 {
        return vec![values[0]; len];
    }
    let scale = (values.len() - 1) as f64 / (len - 1) as f64;
    (0..len)
        .map(|i| {
            let x = i as f64 * scale;
            let lo = x.floor() as usize;
            let hi = (lo + 1).min(values.len() - 1);
            let frac = x - lo as f64;
            values[lo] * (1.0 - frac) + values[hi] * frac
        })
        .collect()
}

/// Shape parameters of a synthetic classification corpus.
#[derive(Debug, Clone, Copy)]
pub struct CorpusShape {
    pub classes: usize,
    pub min_len: usize,
    pub max_len: usize,
    pub noise: f64,
}

/// One smoothed random-walk prototype per class.
pub fn prototypes(rng: &mut ChaCha8Rng, shape: &CorpusShape) -> Vec<Vec<f64>> {
    (0..shape.classes)
        .map(|_| running_mean(&random_walk(rng, shape.max_len, 1.0), 3))
        .collect()
}

/// `n` sequences, round-robin over classes: each a prototype stretched to a
/// random length plus smoothed noise. Indices start at `first_index`.
///
/// # Errors
///
/// Returns [`DtwError`] if a generated sequence is invalid.
pub fn labeled_corpus(
    rng: &mut ChaCha8Rng,
    prototypes: &[Vec<f64>],
    shape: &CorpusShape,
    n: usize,
    first_index: usize,
) -> Result<Vec<LabeledSequence>, DtwError> {
    (0..n)
        .map(|i| {
            let class = i % prototypes.len();
            let len = rng.gen_range(shape.min_len..=shape.max_len);
            let noise = running_mean(&random_walk(rng, len, shape.noise), 2);
            let values: Vec<f64> = resample(&prototypes[class], len)
                .iter()
                .zip(&noise)
                .map(|(p, e)| p + e)
                .collect();
            Ok(LabeledSequence::new(
                TimeSeries::new(values)?,
                ClassLabel::new(class as i32),
                first_index + i,
            ))
        })
        .collect()
}

/// One period of a negative-first sine of `len` samples.
fn slow_wave(len: usize, amplitude: f64) -> Vec<f64> {
    (0..len)
        .map(|i| -amplitude * (std::f64::consts::TAU * i as f64 / len as f64).sin())
        .collect()
}

/// Reference corpus for the detector: large single-period waves (class 1)
/// and low-amplitude background waves (class 0) of 0.8 to 3.5 seconds.
///
/// # Errors
///
/// Returns [`DtwError`] if a generated sequence is invalid.
pub fn slow_wave_corpus(
    rng: &mut ChaCha8Rng,
    sampling_rate: f64,
    n: usize,
) -> Result<Vec<LabeledSequence>, DtwError> {
    let min_len = (0.8 * sampling_rate).ceil() as usize;
    let max_len = (3.5 * sampling_rate).floor() as usize;
    (0..n)
        .map(|i| {
            let len = rng.gen_range(min_len..=max_len);
            let (amplitude, class) = if i % 2 == 0 {
                (rng.gen_range(60.0..90.0), 1)
            } else {
                (rng.gen_range(5.0..15.0), 0)
            };
            let jitter = running_mean(&random_walk(rng, len, 1.0), 4);
            let values: Vec<f64> = slow_wave(len, amplitude)
                .iter()
                .zip(&jitter)
                .map(|(w, j)| w + j)
                .collect();
            Ok(LabeledSequence::new(TimeSeries::new(values)?, ClassLabel::new(class), i))
        })
        .collect()
}

/// A `seconds`-long recording of background waves with a large slow wave
/// roughly every `spacing` waves.
pub fn slow_wave_signal(
    rng: &mut ChaCha8Rng,
    sampling_rate: f64,
    seconds: f64,
    spacing: usize,
) -> Vec<f64> {
    let total = (seconds * sampling_rate) as usize;
    let mut data = Vec::with_capacity(total + 1);
    let mut wave = 0usize;
    while data.len() < total {
        let len = (rng.gen_range(1.0..2.5) * sampling_rate) as usize;
        let amplitude = if spacing > 0 && wave % spacing == spacing - 1 {
            rng.gen_range(60.0..90.0)
        } else {
            rng.gen_range(5.0..15.0)
        };
        data.extend(slow_wave(len.max(2), amplitude));
        wave += 1;
    }
    data.truncate(total);
    data
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn running_mean_clips_at_edges() {
        let smoothed = running_mean(&[0.0, 3.0, 6.0, 9.0], 1);
        assert_eq!(smoothed, vec![1.5, 3.0, 6.0, 7.5]);
    }

    #[test]
    fn resample_keeps_endpoints() {
        let r = resample(&[0.0, 10.0], 6);
        assert_eq!(r.len(), 6);
        assert_eq!(r[0], 0.0);
        assert!((r[5] - 10.0).abs() < 1e-12);
        assert!((r[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn corpus_lengths_and_labels() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let shape = CorpusShape {
            classes: 3,
            min_len: 10,
            max_len: 20,
            noise: 0.1,
        };
        let protos = prototypes(&mut rng, &shape);
        let corpus = labeled_corpus(&mut rng, &protos, &shape, 9, 100).unwrap();
        assert_eq!(corpus.len(), 9);
        for (i, item) in corpus.iter().enumerate() {
            assert!((10..=20).contains(&item.series.len()));
            assert_eq!(item.label.value(), (i % 3) as i32);
            assert_eq!(item.index, 100 + i);
        }
    }

    #[test]
    fn signal_has_requested_length() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        assert_eq!(slow_wave_signal(&mut rng, 50.0, 10.0, 4).len(), 500);
    }
}
