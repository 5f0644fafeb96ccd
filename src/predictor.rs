//! Classifying new records against a fitted model

use crate::distance::{Dissimilarity, MixedDissimilarity};
use crate::engine::{ClusteringEngine, ClusteringResult};
use crate::error::{Error, Result};
use crate::scaler::ScaledFeatureSet;
use crate::schema::Record;
use ndarray::ArrayView1;
use rayon::prelude::*;

/// Nearest-centroid label for one record.
///
/// The record's numeric part is standardized with `features`, then compared
/// to every centroid of `result` with the mixed metric weighted by `gamma`.
/// Ties go to the lowest label.
pub fn predict(
    record: &Record,
    features: &ScaledFeatureSet,
    result: &ClusteringResult,
    gamma: f64,
) -> Result<usize> {
    let metric = MixedDissimilarity::new(gamma)?;
    nearest_label(&record.numeric, &record.categorical, features, result, &metric)
}

fn nearest_label(
    numeric: &[f64],
    categorical: &[u8],
    features: &ScaledFeatureSet,
    result: &ClusteringResult,
    metric: &MixedDissimilarity,
) -> Result<usize> {
    if let Some((idx, value)) = categorical.iter().enumerate().find(|(_, &v)| v > 1) {
        return Err(Error::InvalidCategoricalValue {
            column: format!("categorical feature {}", idx),
            row: 0,
            value: value.to_string(),
        });
    }

    if let Some((idx, _)) = numeric.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        let column = features
            .features
            .get(idx)
            .map(String::as_str)
            .unwrap_or("unknown");
        return Err(Error::invalid_data(format!(
            "Non-finite value in numeric column '{}' at row 0",
            column
        )));
    }

    let scaled = features.transform(numeric)?;
    let (label, _) = metric.nearest(scaled.view(), ArrayView1::from(categorical), &result.centroids)?;
    Ok(label)
}

/// Read-only view over a fitted scaler and result.
///
/// Holds no mutable state, so one predictor can serve any number of threads.
#[derive(Debug, Clone, Copy)]
pub struct Predictor<'a> {
    features: &'a ScaledFeatureSet,
    result: &'a ClusteringResult,
    metric: MixedDissimilarity,
}

impl<'a> Predictor<'a> {
    /// Predictor over a fitted engine; fails with [`Error::ModelNotFitted`] otherwise
    pub fn new(engine: &'a ClusteringEngine, features: &'a ScaledFeatureSet) -> Result<Self> {
        let result = engine.result()?;
        Self::from_parts(features, result)
    }

    /// Predictor over an existing scaler and result, using the result's gamma
    pub fn from_parts(features: &'a ScaledFeatureSet, result: &'a ClusteringResult) -> Result<Self> {
        if let Some(centroid) = result.centroids.first() {
            if centroid.numeric.len() != features.n_features() {
                return Err(Error::dimension_mismatch(
                    "centroid numeric features",
                    features.n_features(),
                    centroid.numeric.len(),
                ));
            }
        }
        Ok(Self {
            features,
            result,
            metric: result.metric()?,
        })
    }

    /// Label of the nearest centroid
    pub fn predict(&self, record: &Record) -> Result<usize> {
        self.predict_values(&record.numeric, &record.categorical)
    }

    /// Label of the nearest centroid for raw numeric and categorical values
    pub fn predict_values(&self, numeric: &[f64], categorical: &[u8]) -> Result<usize> {
        nearest_label(numeric, categorical, self.features, self.result, &self.metric)
    }

    /// Labels for many records, computed in parallel
    pub fn predict_batch(&self, records: &[Record]) -> Result<Vec<usize>> {
        records.par_iter().map(|record| self.predict(record)).collect()
    }

    /// Categorical weight in use
    pub fn gamma(&self) -> f64 {
        self.metric.gamma()
    }
}
