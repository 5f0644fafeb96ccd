//! Dissimilarity between mixed records and centroids

use crate::engine::Centroid;
use crate::error::{Error, Result};
use ndarray::{ArrayView1, ArrayView2};
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Trait for measuring how far a mixed point lies from a centroid
pub trait Dissimilarity {
    /// Distance between one point (scaled numeric part + categorical part) and a centroid
    fn distance(
        &self,
        numeric: ArrayView1<f64>,
        categorical: ArrayView1<u8>,
        centroid: &Centroid,
    ) -> Result<f64>;

    /// Distances from one point to every centroid, in centroid order
    fn distances_to_centroids(
        &self,
        numeric: ArrayView1<f64>,
        categorical: ArrayView1<u8>,
        centroids: &[Centroid],
    ) -> Result<Vec<f64>> {
        centroids
            .iter()
            .map(|centroid| self.distance(numeric, categorical, centroid))
            .collect()
    }

    /// Index of and distance to the closest centroid; ties go to the lowest index
    fn nearest(
        &self,
        numeric: ArrayView1<f64>,
        categorical: ArrayView1<u8>,
        centroids: &[Centroid],
    ) -> Result<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, centroid) in centroids.iter().enumerate() {
            let d = self.distance(numeric, categorical, centroid)?;
            if d.is_nan() {
                return Err(Error::invalid_data(format!(
                    "Distance to centroid {} is not a number",
                    idx
                )));
            }
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((idx, d)),
            }
        }
        best.ok_or_else(|| Error::invalid_data("No centroids provided"))
    }
}

/// Squared Euclidean distance over the numeric part plus `gamma` times the
/// number of categorical mismatches.
///
/// ```text
/// d(x, c) = Σᵢ (xᵢ - cᵢ)² + γ · Σⱼ [xⱼ ≠ cⱼ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MixedDissimilarity {
    gamma: f64,
}

impl MixedDissimilarity {
    /// Create a metric with the given categorical weight
    pub fn new(gamma: f64) -> Result<Self> {
        if !gamma.is_finite() || gamma < 0.0 {
            return Err(Error::invalid_parameter("Gamma must be finite and non-negative"));
        }
        Ok(Self { gamma })
    }

    /// Categorical weight
    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl Dissimilarity for MixedDissimilarity {
    fn distance(
        &self,
        numeric: ArrayView1<f64>,
        categorical: ArrayView1<u8>,
        centroid: &Centroid,
    ) -> Result<f64> {
        let numeric_part = squared_euclidean(numeric, centroid.numeric.view())?;
        let mismatches = matching_distance(categorical, centroid.categorical.view())?;
        Ok(numeric_part + self.gamma * mismatches)
    }
}

/// Sum of squared differences
pub fn squared_euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> Result<f64> {
    if a.len() != b.len() {
        return Err(Error::dimension_mismatch("numeric features", b.len(), a.len()));
    }
    Ok(a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum())
}

/// Number of positions where two categorical vectors differ
pub fn matching_distance<T: PartialEq>(a: ArrayView1<T>, b: ArrayView1<T>) -> Result<f64> {
    if a.len() != b.len() {
        return Err(Error::dimension_mismatch("categorical features", b.len(), a.len()));
    }
    Ok(a.iter().zip(b.iter()).filter(|(x, y)| x != y).count() as f64)
}

/// Most frequent value; ties resolve to the smallest value
pub fn compute_mode<T: Clone + Ord>(values: &[T]) -> Option<T> {
    let mut counts: BTreeMap<&T, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut best: Option<(&T, usize)> = None;
    for (value, count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((value, count)),
        }
    }
    best.map(|(value, _)| value.clone())
}

/// Per-column mode over the given rows; `None` when `rows` is empty
pub fn compute_modes<T: Clone + Ord>(data: ArrayView2<T>, rows: &[usize]) -> Option<Vec<T>> {
    if rows.is_empty() {
        return None;
    }
    (0..data.ncols())
        .map(|col| {
            let column: Vec<T> = rows.iter().map(|&row| data[[row, col]].clone()).collect();
            compute_mode(&column)
        })
        .collect()
}
