//! Utility functions for assignment bookkeeping and validation

use crate::error::{Error, Result};
use ndarray::{ArrayView1, ArrayView2};
use std::collections::HashMap;

/// True when no record changed cluster
pub fn assignments_equal(a: ArrayView1<usize>, b: ArrayView1<usize>) -> bool {
    a == b
}

/// Member rows of every cluster, in row order; labels outside `0..n_clusters` are ignored
pub fn get_cluster_indices(labels: ArrayView1<usize>, n_clusters: usize) -> Vec<Vec<usize>> {
    let mut members = vec![Vec::new(); n_clusters];
    for (row, &label) in labels.indexed_iter() {
        if let Some(rows) = members.get_mut(label) {
            rows.push(row);
        }
    }
    members
}

/// Number of members per cluster
pub fn cluster_sizes(labels: ArrayView1<usize>, n_clusters: usize) -> Vec<usize> {
    labels.iter().fold(vec![0; n_clusters], |mut sizes, &label| {
        if let Some(size) = sizes.get_mut(label) {
            *size += 1;
        }
        sizes
    })
}

/// For every row, the index of the first row holding exactly the same values
pub fn distinct_representatives(numeric: ArrayView2<f64>, categorical: ArrayView2<u8>) -> Vec<usize> {
    let mut first_seen: HashMap<(Vec<u64>, Vec<u8>), usize> = HashMap::new();

    (0..numeric.nrows())
        .map(|row| {
            // +0.0 folds negative zero into positive zero
            let key = (
                numeric.row(row).iter().map(|v| (v + 0.0).to_bits()).collect(),
                categorical.row(row).to_vec(),
            );
            *first_seen.entry(key).or_insert(row)
        })
        .collect()
}

/// Number of distinct records
pub fn count_distinct(numeric: ArrayView2<f64>, categorical: ArrayView2<u8>) -> usize {
    distinct_representatives(numeric, categorical)
        .iter()
        .enumerate()
        .filter(|(row, &rep)| *row == rep)
        .count()
}

/// Validate clustering parameters
pub fn validate_parameters(n_clusters: usize, max_iterations: usize, n_restarts: usize) -> Result<()> {
    if n_clusters == 0 {
        return Err(Error::invalid_parameter("n_clusters must be > 0"));
    }

    if max_iterations == 0 {
        return Err(Error::invalid_parameter("max_iterations must be > 0"));
    }

    if n_restarts == 0 {
        return Err(Error::invalid_parameter("n_restarts must be > 0"));
    }

    Ok(())
}

/// Validate the shape and values of a training batch
pub fn validate_data(numeric: ArrayView2<f64>, categorical: ArrayView2<u8>) -> Result<()> {
    if numeric.nrows() == 0 {
        return Err(Error::invalid_data("Data cannot be empty"));
    }

    if numeric.ncols() == 0 {
        return Err(Error::invalid_data("Data must have at least one numeric feature"));
    }

    if categorical.nrows() != numeric.nrows() {
        return Err(Error::dimension_mismatch(
            "categorical rows",
            numeric.nrows(),
            categorical.nrows(),
        ));
    }

    if let Some(((row, col), _)) = numeric.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(Error::invalid_data(format!(
            "Non-finite numeric value at row {}, feature {}",
            row, col
        )));
    }

    if let Some(((row, col), value)) = categorical.indexed_iter().find(|(_, &v)| v > 1) {
        return Err(Error::InvalidCategoricalValue {
            column: format!("categorical feature {}", col),
            row,
            value: value.to_string(),
        });
    }

    Ok(())
}
