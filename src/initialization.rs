//! Initialization methods for k-prototypes clustering

use crate::distance::{compute_modes, Dissimilarity, MixedDissimilarity};
use crate::engine::Centroid;
use crate::error::{Error, Result};
use crate::utils::distinct_representatives;
use ndarray::{ArrayView1, ArrayView2};
use rand::distributions::{Distribution, WeightedIndex};
use rand::prelude::*;
use rand::seq::index;
use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How many times a duplicate seed is redrawn before a fallback is taken
pub const MAX_DUPLICATE_RESAMPLES: usize = 10;

/// Half-width of the density window, in standard deviations of the feature
const DENSITY_BANDWIDTH: f64 = 0.5;

/// Initialization methods for clustering algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InitMethod {
    /// Random initialization - randomly select distinct records as initial centroids
    Random,
    /// Huang initialization - density-biased sampling of prototype components
    #[default]
    Huang,
}

/// Initialize `n_clusters` centroids from a scaled numeric matrix and its categorical matrix
pub fn initialize_centroids<R: Rng>(
    numeric: ArrayView2<f64>,
    categorical: ArrayView2<u8>,
    n_clusters: usize,
    method: InitMethod,
    metric: &MixedDissimilarity,
    rng: &mut R,
) -> Result<Vec<Centroid>> {
    if n_clusters == 0 {
        return Err(Error::invalid_parameter("Number of clusters must be > 0"));
    }
    if numeric.nrows() != categorical.nrows() {
        return Err(Error::dimension_mismatch(
            "categorical rows",
            numeric.nrows(),
            categorical.nrows(),
        ));
    }
    if n_clusters > numeric.nrows() {
        return Err(Error::invalid_parameter(
            "Number of clusters cannot exceed number of data points",
        ));
    }

    let rows = match method {
        InitMethod::Random => random_init(numeric, categorical, n_clusters, rng),
        InitMethod::Huang => huang_init(numeric, categorical, n_clusters, metric, rng)?,
    };

    Ok(rows
        .into_iter()
        .map(|row| Centroid::new(numeric.row(row).to_owned(), categorical.row(row).to_owned()))
        .collect())
}

/// Random initialization: pick distinct records uniformly, falling back to
/// any records when there are fewer distinct ones than clusters
fn random_init<R: Rng>(
    numeric: ArrayView2<f64>,
    categorical: ArrayView2<u8>,
    n_clusters: usize,
    rng: &mut R,
) -> Vec<usize> {
    let reps = distinct_representatives(numeric, categorical);
    let mut unique: Vec<usize> = reps
        .iter()
        .enumerate()
        .filter(|(row, &rep)| *row == rep)
        .map(|(row, _)| row)
        .collect();
    if unique.len() < n_clusters {
        unique = (0..numeric.nrows()).collect();
    }

    index::sample(rng, unique.len(), n_clusters)
        .into_iter()
        .map(|i| unique[i])
        .collect()
}

/// Huang initialization.
///
/// Each seed starts as a synthetic prototype:
/// - every numeric component is drawn from the observed values of that
///   feature, weighted by how many observations lie within
///   `DENSITY_BANDWIDTH` standard deviations of the value, so dense regions
///   are favoured;
/// - every categorical component is the mode of that attribute over a
///   random, non-empty subset of the records.
///
/// The prototype is then moved onto the closest training record. If that
/// record duplicates an earlier seed the prototype is redrawn, up to
/// [`MAX_DUPLICATE_RESAMPLES`] times, after which the closest record not yet
/// used is taken, or the duplicate is accepted when none is left.
fn huang_init<R: Rng>(
    numeric: ArrayView2<f64>,
    categorical: ArrayView2<u8>,
    n_clusters: usize,
    metric: &MixedDissimilarity,
    rng: &mut R,
) -> Result<Vec<usize>> {
    let samplers = density_samplers(numeric)?;
    let reps = distinct_representatives(numeric, categorical);

    let mut chosen = Vec::with_capacity(n_clusters);
    let mut used: HashSet<usize> = HashSet::with_capacity(n_clusters);

    for _ in 0..n_clusters {
        let mut attempt = 0;
        let row = loop {
            let prototype = sample_prototype(numeric, categorical, &samplers, rng)?;
            let row = closest_row(numeric, categorical, &prototype, metric, |_| true)?;
            if !used.contains(&reps[row]) {
                break row;
            }

            attempt += 1;
            if attempt >= MAX_DUPLICATE_RESAMPLES {
                break closest_row(numeric, categorical, &prototype, metric, |r| {
                    !used.contains(&reps[r])
                })
                .unwrap_or(row);
            }
        };

        used.insert(reps[row]);
        chosen.push(row);
    }

    Ok(chosen)
}

/// One weighted sampler per numeric feature
fn density_samplers(numeric: ArrayView2<f64>) -> Result<Vec<WeightedIndex<usize>>> {
    numeric
        .columns()
        .into_iter()
        .map(|column| {
            WeightedIndex::new(density_weights(column))
                .map_err(|e| Error::invalid_data(format!("Cannot build density weights: {}", e)))
        })
        .collect()
}

/// For each value, the number of values in the column within the density window around it
fn density_weights(column: ArrayView1<f64>) -> Vec<usize> {
    let n = column.len() as f64;
    let mean = column.sum() / n;
    let std = (column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    let h = DENSITY_BANDWIDTH * std;

    let mut sorted: Vec<f64> = column.to_vec();
    sorted.sort_by(f64::total_cmp);

    column
        .iter()
        .map(|&v| {
            let lo = sorted.partition_point(|&x| x < v - h);
            let hi = sorted.partition_point(|&x| x <= v + h);
            (hi - lo).max(1)
        })
        .collect()
}

fn sample_prototype<R: Rng>(
    numeric: ArrayView2<f64>,
    categorical: ArrayView2<u8>,
    samplers: &[WeightedIndex<usize>],
    rng: &mut R,
) -> Result<Centroid> {
    let numeric_part = samplers
        .iter()
        .enumerate()
        .map(|(feature, sampler)| numeric[[sampler.sample(rng), feature]])
        .collect::<Vec<f64>>();

    let n = categorical.nrows();
    let subset_size = rng.gen_range(1..=n);
    let subset = index::sample(rng, n, subset_size).into_vec();
    let categorical_part = compute_modes(categorical, &subset)
        .ok_or_else(|| Error::invalid_data("Cannot sample categorical prototype from empty data"))?;

    Ok(Centroid::new(numeric_part.into(), categorical_part.into()))
}

/// Closest row to `prototype` among rows accepted by `allow`; ties go to the lowest row
fn closest_row<F>(
    numeric: ArrayView2<f64>,
    categorical: ArrayView2<u8>,
    prototype: &Centroid,
    metric: &MixedDissimilarity,
    allow: F,
) -> Result<usize>
where
    F: Fn(usize) -> bool,
{
    let mut best: Option<(usize, f64)> = None;
    for row in (0..numeric.nrows()).filter(|&r| allow(r)) {
        let d = metric.distance(numeric.row(row), categorical.row(row), prototype)?;
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((row, d)),
        }
    }
    best.map(|(row, _)| row)
        .ok_or_else(|| Error::invalid_data("No candidate rows for centroid"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn metric() -> MixedDissimilarity {
        MixedDissimilarity::new(1.0).unwrap()
    }

    fn sample_data() -> (Array2<f64>, Array2<u8>) {
        let numeric = array![
            [1.2, 1.1],
            [1.0, 0.9],
            [1.1, 1.0],
            [-1.0, -1.1],
            [-1.2, -0.9],
            [-1.1, -1.0],
        ];
        let categorical = array![
            [1, 1, 0],
            [1, 1, 0],
            [1, 1, 1],
            [0, 0, 0],
            [0, 0, 1],
            [0, 0, 0],
        ];
        (numeric, categorical)
    }

    #[test]
    fn test_random_init() {
        let (numeric, categorical) = sample_data();
        let mut rng = StdRng::seed_from_u64(42);

        let centroids = initialize_centroids(
            numeric.view(),
            categorical.view(),
            3,
            InitMethod::Random,
            &metric(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(centroids.len(), 3);
        assert!(centroids.iter().all(|c| c.numeric.len() == 2 && c.categorical.len() == 3));
    }

    #[test]
    fn test_huang_init_distinct_seeds() {
        let (numeric, categorical) = sample_data();
        let mut rng = StdRng::seed_from_u64(7);

        let centroids = initialize_centroids(
            numeric.view(),
            categorical.view(),
            6,
            InitMethod::Huang,
            &metric(),
            &mut rng,
        )
        .unwrap();

        // Every record is distinct, so all six seeds must be different records
        for i in 0..centroids.len() {
            for j in (i + 1)..centroids.len() {
                assert_ne!(centroids[i], centroids[j]);
            }
        }
    }

    #[test]
    fn test_huang_accepts_duplicates_when_forced() {
        let numeric = array![[0.0], [0.0], [1.0]];
        let categorical = array![[1u8], [1], [0]];
        let mut rng = StdRng::seed_from_u64(3);

        // Two distinct records, three clusters: a duplicate seed is unavoidable
        let centroids = initialize_centroids(
            numeric.view(),
            categorical.view(),
            3,
            InitMethod::Huang,
            &metric(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(centroids.len(), 3);
    }

    #[test]
    fn test_huang_is_reproducible() {
        let (numeric, categorical) = sample_data();
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            initialize_centroids(
                numeric.view(),
                categorical.view(),
                2,
                InitMethod::Huang,
                &metric(),
                &mut rng,
            )
            .unwrap()
        };
        assert_eq!(run(11), run(11));
    }

    #[test]
    fn test_density_weights_favour_clusters() {
        let column = array![0.0, 0.1, 0.2, 5.0];
        let weights = density_weights(column.view());
        assert!(weights[1] > weights[3]);
        assert!(weights.iter().all(|&w| w >= 1));
    }

    #[test]
    fn test_invalid_parameters() {
        let (numeric, categorical) = sample_data();
        let mut rng = StdRng::seed_from_u64(42);

        assert!(initialize_centroids(
            numeric.view(),
            categorical.view(),
            0,
            InitMethod::Random,
            &metric(),
            &mut rng
        )
        .is_err());
        assert!(initialize_centroids(
            numeric.view(),
            categorical.view(),
            7,
            InitMethod::Huang,
            &metric(),
            &mut rng
        )
        .is_err());
    }
}
