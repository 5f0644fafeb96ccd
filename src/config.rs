//! Settings exposed to the hosting application

use crate::engine::ClusteringEngine;
use crate::error::{Error, Result};
use crate::initialization::InitMethod;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Smallest cluster count offered to users
pub const MIN_CLUSTERS: usize = 2;
/// Largest cluster count offered to users
pub const MAX_CLUSTERS: usize = 6;

/// Clustering settings chosen by the host.
///
/// With the `serde` feature, missing fields fall back to [`Default`], so a
/// host can persist only what the user changed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClusteringConfig {
    /// Number of clusters, within `MIN_CLUSTERS..=MAX_CLUSTERS`
    pub n_clusters: usize,
    /// Independent restarts
    pub n_restarts: usize,
    /// Update steps allowed per restart
    pub max_iterations: usize,
    /// Categorical weight override; `None` uses the mean raw standard deviation
    pub gamma: Option<f64>,
    /// Base seed for every restart
    pub seed: u64,
    /// Centroid seeding strategy
    pub init_method: InitMethod,
    /// Worker threads for restarts; `None` uses the global rayon pool
    pub n_jobs: Option<usize>,
    /// Abort the fit once this much time has passed
    pub timeout: Option<Duration>,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            n_clusters: 3,
            n_restarts: 10,
            max_iterations: 100,
            gamma: None,
            seed: 42,
            init_method: InitMethod::Huang,
            n_jobs: None,
            timeout: None,
        }
    }
}

impl ClusteringConfig {
    /// Default settings with the given cluster count
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            ..Default::default()
        }
    }

    /// Set the number of restarts
    pub fn n_restarts(mut self, n_restarts: usize) -> Self {
        self.n_restarts = n_restarts;
        self
    }

    /// Set the iteration cap per restart
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Override the categorical weight
    pub fn gamma(mut self, gamma: f64) -> Self {
        self.gamma = Some(gamma);
        self
    }

    /// Set the base seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the seeding strategy
    pub fn init_method(mut self, method: InitMethod) -> Self {
        self.init_method = method;
        self
    }

    /// Set the number of worker threads
    pub fn n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = Some(n_jobs);
        self
    }

    /// Set the fit timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Check every bound
    pub fn validate(&self) -> Result<()> {
        if !(MIN_CLUSTERS..=MAX_CLUSTERS).contains(&self.n_clusters) {
            return Err(Error::invalid_parameter(format!(
                "n_clusters must be between {} and {}, got {}",
                MIN_CLUSTERS, MAX_CLUSTERS, self.n_clusters
            )));
        }
        if self.n_restarts == 0 {
            return Err(Error::invalid_parameter("n_restarts must be > 0"));
        }
        if self.max_iterations == 0 {
            return Err(Error::invalid_parameter("max_iterations must be > 0"));
        }
        if let Some(gamma) = self.gamma {
            if !gamma.is_finite() || gamma < 0.0 {
                return Err(Error::invalid_parameter("gamma must be finite and non-negative"));
            }
        }
        if self.n_jobs == Some(0) {
            return Err(Error::invalid_parameter("n_jobs must be > 0"));
        }
        Ok(())
    }

    /// Validated, unfitted engine carrying these settings
    pub fn engine(&self) -> Result<ClusteringEngine> {
        self.validate()?;

        let mut engine = ClusteringEngine::new(self.n_clusters)
            .n_restarts(self.n_restarts)
            .max_iterations(self.max_iterations)
            .seed(self.seed)
            .init_method(self.init_method);
        engine.gamma = self.gamma;
        engine.n_jobs = self.n_jobs;
        engine.timeout = self.timeout;
        Ok(engine)
    }
}
