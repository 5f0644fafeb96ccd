//! Standardization of numeric features
//!
//! [`FeatureScaler::fit`] learns a per-feature mean and population standard
//! deviation over a training batch. The resulting [`ScaledFeatureSet`] is
//! immutable; every later transform, including prediction-time transforms,
//! must go through the same set so that training and new records share one
//! coordinate system.

use crate::error::{Error, Result};
use crate::ingest::Dataset;
use ndarray::{Array1, Array2, ArrayView2, Axis};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Relative spread below which a feature is treated as constant
const ZERO_VARIANCE_TOLERANCE: f64 = 1e-12;

/// Fitted per-feature statistics
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScaledFeatureSet {
    /// Feature names in column order
    pub features: Vec<String>,
    /// Per-feature mean
    pub means: Array1<f64>,
    /// Per-feature population standard deviation, always > 0
    pub stds: Array1<f64>,
}

/// Fits [`ScaledFeatureSet`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureScaler;

impl FeatureScaler {
    /// Fit over the numeric columns of a dataset
    pub fn fit(data: &Dataset) -> Result<ScaledFeatureSet> {
        Self::fit_matrix(data.numeric_matrix().view(), &data.schema.numeric)
    }

    /// Fit over a raw `n_records x n_features` matrix
    pub fn fit_matrix(numeric: ArrayView2<f64>, names: &[String]) -> Result<ScaledFeatureSet> {
        if numeric.nrows() == 0 {
            return Err(Error::invalid_data("Cannot fit scaler on empty data"));
        }
        if numeric.ncols() != names.len() {
            return Err(Error::dimension_mismatch("feature names", numeric.ncols(), names.len()));
        }

        let means = numeric
            .mean_axis(Axis(0))
            .ok_or_else(|| Error::invalid_data("Cannot fit scaler on empty data"))?;
        let stds = numeric.std_axis(Axis(0), 0.0);

        for (idx, (&std, &mean)) in stds.iter().zip(means.iter()).enumerate() {
            if !(std > ZERO_VARIANCE_TOLERANCE * mean.abs().max(1.0)) {
                return Err(Error::ZeroVarianceFeature {
                    feature: names[idx].clone(),
                });
            }
        }

        Ok(ScaledFeatureSet {
            features: names.to_vec(),
            means,
            stds,
        })
    }
}

impl ScaledFeatureSet {
    /// Number of numeric features
    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    /// Standardize one record: `(x - mean) / std` per feature
    pub fn transform(&self, numeric: &[f64]) -> Result<Array1<f64>> {
        self.check_width(numeric.len())?;
        Ok(Array1::from_shape_fn(self.n_features(), |j| {
            self.scale(numeric[j], j)
        }))
    }

    /// Standardize a whole batch with the same arithmetic as [`Self::transform`]
    pub fn transform_batch(&self, numeric: ArrayView2<f64>) -> Result<Array2<f64>> {
        self.check_width(numeric.ncols())?;
        Ok(Array2::from_shape_fn(numeric.dim(), |(i, j)| {
            self.scale(numeric[[i, j]], j)
        }))
    }

    /// Map scaled values back to raw units
    pub fn inverse_transform(&self, scaled: &[f64]) -> Result<Array1<f64>> {
        self.check_width(scaled.len())?;
        Ok(Array1::from_shape_fn(self.n_features(), |j| {
            scaled[j] * self.stds[j] + self.means[j]
        }))
    }

    /// Mean of the raw standard deviations; the default categorical weight
    pub fn mean_std(&self) -> f64 {
        self.stds.mean().unwrap_or(1.0)
    }

    #[inline]
    fn scale(&self, value: f64, feature: usize) -> f64 {
        (value - self.means[feature]) / self.stds[feature]
    }

    fn check_width(&self, found: usize) -> Result<()> {
        if found != self.n_features() {
            return Err(Error::dimension_mismatch("numeric features", self.n_features(), found));
        }
        Ok(())
    }
}
