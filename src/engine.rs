//! K-prototypes clustering over scaled numeric and binary categorical features
//!
//! One restart is the classic alternating optimisation:
//!
//! 1. seed `k` centroids ([`crate::initialization`])
//! 2. assign every record to its nearest centroid
//! 3. move each centroid to the mean (numeric) and mode (categorical) of its records
//! 4. repeat 2-3 until no record changes cluster or `max_iterations` is reached
//!
//! Both steps can only lower the total cost, so the cost history of a
//! restart is non-increasing. Restarts are independent and may run in
//! parallel; the winner is always the lowest cost, ties going to the lowest
//! restart index, so the result does not depend on scheduling.

use crate::distance::{compute_modes, Dissimilarity, MixedDissimilarity};
use crate::error::{Error, Result};
use crate::initialization::{initialize_centroids, InitMethod};
use crate::scaler::ScaledFeatureSet;
use crate::utils::{
    assignments_equal, cluster_sizes, count_distinct, get_cluster_indices, validate_data,
    validate_parameters,
};
use ndarray::{Array1, ArrayView2, Axis};
use rand::prelude::*;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Representative point of a cluster
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Centroid {
    /// Mean of the members' scaled numeric values
    pub numeric: Array1<f64>,
    /// Per-attribute mode of the members' categorical values
    pub categorical: Array1<u8>,
}

impl Centroid {
    /// Create a centroid from its two parts
    pub fn new(numeric: Array1<f64>, categorical: Array1<u8>) -> Self {
        Self {
            numeric,
            categorical,
        }
    }
}

/// Result of k-prototypes clustering
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusteringResult {
    /// Cluster label for each record, in input order
    pub labels: Array1<usize>,
    /// Final centroids, indexed by label; prediction compares against these
    pub centroids: Vec<Centroid>,
    /// Mean and mode of each cluster's final members.
    ///
    /// Equal to `centroids` when the restart converged. When it stopped at
    /// `max_iterations` the last assignment moved records after the last
    /// update, and these describe the clusters as labelled.
    pub member_centroids: Vec<Centroid>,
    /// Sum of every record's distance to its centroid
    pub cost: f64,
    /// Update steps performed by the winning restart
    pub n_iter: usize,
    /// Whether the winning restart stopped because assignments stabilised
    pub converged: bool,
    /// Index of the winning restart
    pub restart: usize,
    /// Categorical weight used by the metric
    pub gamma: f64,
    /// Cost after initial assignment and after every update step of the winning restart
    pub cost_history: Vec<f64>,
    /// Number of records per cluster
    pub cluster_sizes: Vec<usize>,
}

impl ClusteringResult {
    /// Number of clusters
    pub fn n_clusters(&self) -> usize {
        self.centroids.len()
    }

    /// Metric configured with the fitted gamma
    pub fn metric(&self) -> Result<MixedDissimilarity> {
        MixedDissimilarity::new(self.gamma)
    }
}

/// Lifecycle of a [`ClusteringEngine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Not fitted yet
    Unfit,
    /// A fit is running
    Fitting,
    /// Fit succeeded; terminal
    Fit,
    /// Fit failed; terminal
    Failed,
}

/// K-prototypes clustering engine
#[derive(Debug, Clone)]
pub struct ClusteringEngine {
    /// Number of clusters
    pub n_clusters: usize,
    /// Initialization method
    pub init_method: InitMethod,
    /// Maximum number of update steps per restart
    pub max_iterations: usize,
    /// Number of independent restarts
    pub n_restarts: usize,
    /// Base seed; restart `i` uses `seed + i`
    pub seed: u64,
    /// Number of parallel jobs
    pub n_jobs: Option<usize>,
    /// Categorical weight; defaults to the mean raw standard deviation
    pub gamma: Option<f64>,
    /// Wall-clock budget for the whole fit
    pub timeout: Option<Duration>,
    state: EngineState,
    result: Option<Arc<ClusteringResult>>,
}

/// Finished restart
#[derive(Debug)]
struct RestartRun {
    labels: Array1<usize>,
    centroids: Vec<Centroid>,
    member_centroids: Vec<Centroid>,
    cost: f64,
    n_iter: usize,
    converged: bool,
    cost_history: Vec<f64>,
    sizes: Vec<usize>,
}

impl RestartRun {
    fn first_empty_cluster(&self) -> Option<usize> {
        self.sizes.iter().position(|&size| size == 0)
    }
}

#[derive(Debug)]
enum RestartOutcome {
    Completed(RestartRun),
    TimedOut,
}

impl Default for ClusteringEngine {
    fn default() -> Self {
        Self {
            n_clusters: 3,
            init_method: InitMethod::Huang,
            max_iterations: 100,
            n_restarts: 10,
            seed: 42,
            n_jobs: None,
            gamma: None,
            timeout: None,
            state: EngineState::Unfit,
            result: None,
        }
    }
}

impl ClusteringEngine {
    /// Create a new engine with the specified number of clusters
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            ..Default::default()
        }
    }

    /// Set the initialization method
    pub fn init_method(mut self, method: InitMethod) -> Self {
        self.init_method = method;
        self
    }

    /// Set the maximum number of update steps per restart
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the number of restarts
    pub fn n_restarts(mut self, n_restarts: usize) -> Self {
        self.n_restarts = n_restarts;
        self
    }

    /// Set the base random seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Override the categorical weight
    pub fn gamma(mut self, gamma: f64) -> Self {
        self.gamma = Some(gamma);
        self
    }

    /// Set the number of parallel jobs
    pub fn n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = Some(n_jobs);
        self
    }

    /// Abort the fit with [`Error::Aborted`] once this much time has passed
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Fitted result, or [`Error::ModelNotFitted`]
    pub fn result(&self) -> Result<&Arc<ClusteringResult>> {
        match (self.state, &self.result) {
            (EngineState::Fit, Some(result)) => Ok(result),
            _ => Err(Error::ModelNotFitted),
        }
    }

    /// Fit on a scaled numeric matrix and its categorical matrix.
    ///
    /// `features` is the scaler fitted on the same batch; its mean raw
    /// standard deviation is the categorical weight unless one was set with
    /// [`Self::gamma`]. An engine fits once: later calls fail with
    /// [`Error::InvalidState`].
    pub fn fit(
        &mut self,
        scaled: ArrayView2<f64>,
        categorical: ArrayView2<u8>,
        features: &ScaledFeatureSet,
    ) -> Result<Arc<ClusteringResult>> {
        if self.state != EngineState::Unfit {
            return Err(Error::invalid_state(format!(
                "engine is {:?}; fitting again needs a new engine",
                self.state
            )));
        }
        if scaled.ncols() != features.n_features() {
            return Err(Error::dimension_mismatch(
                "numeric features",
                features.n_features(),
                scaled.ncols(),
            ));
        }

        self.state = EngineState::Fitting;
        let gamma = self.gamma.unwrap_or_else(|| features.mean_std());

        match self.run(scaled, categorical, gamma) {
            Ok(result) => {
                let result = Arc::new(result);
                self.result = Some(Arc::clone(&result));
                self.state = EngineState::Fit;
                Ok(result)
            }
            Err(e) => {
                self.state = EngineState::Failed;
                Err(e)
            }
        }
    }

    /// Fit the model and return only the cluster labels
    pub fn fit_predict(
        &mut self,
        scaled: ArrayView2<f64>,
        categorical: ArrayView2<u8>,
        features: &ScaledFeatureSet,
    ) -> Result<Array1<usize>> {
        let result = self.fit(scaled, categorical, features)?;
        Ok(result.labels.clone())
    }

    fn run(
        &self,
        numeric: ArrayView2<f64>,
        categorical: ArrayView2<u8>,
        gamma: f64,
    ) -> Result<ClusteringResult> {
        self.validate_input(numeric, categorical)?;
        let metric = MixedDissimilarity::new(gamma)?;
        let started = Instant::now();
        let deadline = self.timeout.map(|t| started + t);

        let fit_restart = |restart: usize| {
            let seed = self.seed.wrapping_add(restart as u64);
            self.fit_single(numeric, categorical, &metric, restart, seed, deadline)
        };

        // Collected in restart order regardless of how rayon schedules them
        let outcomes: Vec<Result<RestartOutcome>> = match self.n_jobs {
            Some(1) => (0..self.n_restarts).map(fit_restart).collect(),
            Some(n) => rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| Error::invalid_parameter(format!("Cannot build thread pool: {}", e)))?
                .install(|| (0..self.n_restarts).into_par_iter().map(fit_restart).collect()),
            None if self.n_restarts > 1 => {
                (0..self.n_restarts).into_par_iter().map(fit_restart).collect()
            }
            None => (0..self.n_restarts).map(fit_restart).collect(),
        };

        let mut runs = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            if let RestartOutcome::Completed(run) = outcome? {
                runs.push(run);
            }
        }
        if runs.len() < self.n_restarts {
            return Err(Error::Aborted {
                completed_restarts: runs.len(),
                requested_restarts: self.n_restarts,
                elapsed: started.elapsed(),
            });
        }

        let (restart, run) = select_best(runs)?;

        info!(
            restart,
            cost = run.cost,
            n_iter = run.n_iter,
            converged = run.converged,
            gamma,
            "K-prototypes fit complete"
        );

        Ok(ClusteringResult {
            labels: run.labels,
            centroids: run.centroids,
            member_centroids: run.member_centroids,
            cost: run.cost,
            n_iter: run.n_iter,
            converged: run.converged,
            restart,
            gamma,
            cost_history: run.cost_history,
            cluster_sizes: run.sizes,
        })
    }

    /// Single restart of the k-prototypes algorithm
    fn fit_single(
        &self,
        numeric: ArrayView2<f64>,
        categorical: ArrayView2<u8>,
        metric: &MixedDissimilarity,
        restart: usize,
        seed: u64,
        deadline: Option<Instant>,
    ) -> Result<RestartOutcome> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut centroids = initialize_centroids(
            numeric,
            categorical,
            self.n_clusters,
            self.init_method,
            metric,
            &mut rng,
        )?;

        let (mut labels, mut cost) = assign(numeric, categorical, &centroids, metric)?;
        let mut cost_history = vec![cost];
        let mut n_iter = 0;
        let mut converged = false;

        for iter in 0..self.max_iterations {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                debug!(restart, iteration = iter, "Restart aborted by timeout");
                return Ok(RestartOutcome::TimedOut);
            }
            n_iter = iter + 1;

            let empty = self.update_centroids(numeric, categorical, &labels, &mut centroids);
            if !empty.is_empty() {
                warn!(
                    restart,
                    iteration = n_iter,
                    clusters = ?empty,
                    "Empty clusters kept their previous centroid"
                );
            }

            let (new_labels, new_cost) = assign(numeric, categorical, &centroids, metric)?;
            cost_history.push(new_cost);
            debug!(restart, iteration = n_iter, cost = new_cost, "K-prototypes iteration");

            let stable = assignments_equal(new_labels.view(), labels.view());
            labels = new_labels;
            cost = new_cost;
            if stable {
                converged = true;
                break;
            }
        }

        let member_centroids = if converged {
            centroids.clone()
        } else {
            let mut members = centroids.clone();
            self.update_centroids(numeric, categorical, &labels, &mut members);
            members
        };

        let sizes = cluster_sizes(labels.view(), self.n_clusters);
        Ok(RestartOutcome::Completed(RestartRun {
            labels,
            centroids,
            member_centroids,
            cost,
            n_iter,
            converged,
            cost_history,
            sizes,
        }))
    }

    /// Move each centroid to its members' mean and mode; returns the clusters left empty
    fn update_centroids(
        &self,
        numeric: ArrayView2<f64>,
        categorical: ArrayView2<u8>,
        labels: &Array1<usize>,
        centroids: &mut [Centroid],
    ) -> Vec<usize> {
        let mut empty = Vec::new();

        for (cluster_id, indices) in get_cluster_indices(labels.view(), self.n_clusters)
            .iter()
            .enumerate()
        {
            let (mean, modes) = match (
                numeric.select(Axis(0), indices).mean_axis(Axis(0)),
                compute_modes(categorical, indices),
            ) {
                (Some(mean), Some(modes)) => (mean, modes),
                _ => {
                    empty.push(cluster_id);
                    continue;
                }
            };
            centroids[cluster_id] = Centroid::new(mean, Array1::from(modes));
        }

        empty
    }

    /// Validate input parameters and data
    fn validate_input(&self, numeric: ArrayView2<f64>, categorical: ArrayView2<u8>) -> Result<()> {
        validate_parameters(self.n_clusters, self.max_iterations, self.n_restarts)?;
        validate_data(numeric, categorical)?;

        if self.n_jobs == Some(0) {
            return Err(Error::invalid_parameter("n_jobs must be > 0"));
        }

        let distinct = count_distinct(numeric, categorical);
        if distinct < self.n_clusters {
            return Err(Error::InsufficientData {
                required: self.n_clusters,
                actual: distinct,
            });
        }

        Ok(())
    }
}

/// Winning restart: lowest cost among runs with no empty cluster, ties to the
/// lowest restart index. Fails with [`Error::DegenerateCluster`] when every
/// run left a cluster empty.
fn select_best(runs: Vec<RestartRun>) -> Result<(usize, RestartRun)> {
    let restarts = runs.len();
    let mut best: Option<(usize, RestartRun)> = None;
    let mut first_empty: Option<usize> = None;

    for (restart, run) in runs.into_iter().enumerate() {
        if let Some(cluster) = run.first_empty_cluster() {
            debug!(restart, cluster, cost = run.cost, "Restart left a cluster empty");
            first_empty = Some(first_empty.map_or(cluster, |c: usize| c.min(cluster)));
            continue;
        }
        let improves = best.as_ref().map_or(true, |(_, current)| run.cost < current.cost);
        if improves {
            best = Some((restart, run));
        }
    }

    best.ok_or(Error::DegenerateCluster {
        cluster: first_empty.unwrap_or(0),
        restarts,
    })
}

/// Assign every record to its nearest centroid; returns labels and total cost
fn assign(
    numeric: ArrayView2<f64>,
    categorical: ArrayView2<u8>,
    centroids: &[Centroid],
    metric: &MixedDissimilarity,
) -> Result<(Array1<usize>, f64)> {
    let mut labels = Array1::zeros(numeric.nrows());
    let mut cost = 0.0;

    for (i, (num_row, cat_row)) in numeric.rows().into_iter().zip(categorical.rows()).enumerate() {
        let (closest, distance) = metric.nearest(num_row, cat_row, centroids)?;
        labels[i] = closest;
        cost += distance;
    }

    Ok((labels, cost))
}
