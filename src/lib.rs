//! # Mixed-type clustering for student profiles
//!
//! This crate groups records that carry both numeric measurements and binary
//! categorical flags using k-prototypes clustering, then describes each
//! group in plain language and classifies new records against it.
//!
//! ## Features
//!
//! - **Ingestion**: schema checks, mean imputation with a report, binary flag validation
//! - **Scaling**: z-score standardization with an inverse transform
//! - **Clustering**: squared Euclidean plus weighted mismatch dissimilarity,
//!   Huang or random seeding, parallel restarts via Rayon
//! - **Profiling**: banded cluster narratives
//! - **Prediction**: thread-safe nearest-centroid classification
//!
//! ## Example
//!
//! ```rust
//! use kluster::{ClusteringConfig, FittedModel, RawTable, Record, Schema};
//!
//! let table = RawTable::from_strs(
//!     &["No", "Name", "Academic Score", "Attendance",
//!       "Computer Club", "Agriculture Club", "Sewing Club", "Scouting"],
//!     &[
//!         &["1", "Ana", "95", "0.98", "1", "1", "1", "1"],
//!         &["2", "Ben", "96", "0.97", "1", "1", "1", "1"],
//!         &["3", "Cy",  "94", "0.99", "1", "1", "1", "1"],
//!         &["4", "Di",  "55", "0.70", "0", "0", "0", "0"],
//!         &["5", "Ed",  "56", "0.69", "0", "0", "0", "0"],
//!         &["6", "Flo", "54", "0.71", "0", "0", "0", "0"],
//!     ],
//! );
//!
//! let config = ClusteringConfig::new(2).n_restarts(5);
//! let model = FittedModel::fit_table(&table, &Schema::student(), &config).unwrap();
//!
//! for summary in model.cluster_summaries() {
//!     println!("Cluster {} ({}): {}", summary.label, summary.size, summary.description);
//! }
//!
//! let newcomer = Record::new("7", vec![90.0, 0.95], vec![1, 0, 1, 1]);
//! let prediction = model.predict(&newcomer).unwrap();
//! assert_eq!(prediction.label, model.result().labels[0]);
//! ```

#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod distance;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod initialization;
pub mod pipeline;
pub mod predictor;
pub mod profile;
pub mod scaler;
pub mod schema;
pub mod utils;

pub use config::{ClusteringConfig, MAX_CLUSTERS, MIN_CLUSTERS};
pub use distance::{Dissimilarity, MixedDissimilarity};
pub use engine::{Centroid, ClusteringEngine, ClusteringResult, EngineState};
pub use error::{Error, Result};
pub use ingest::{ingest, Dataset, ImputationEntry, ImputationReport, RawTable};
pub use initialization::InitMethod;
pub use pipeline::{Assignment, ClusterSummary, ExportRow, FittedModel, Prediction};
pub use predictor::{predict, Predictor};
pub use profile::{Band, ClusterProfile, ClusterProfiler, FeatureBand};
pub use scaler::{FeatureScaler, ScaledFeatureSet};
pub use schema::{CategoricalAttribute, Record, Schema};

/// Re-export commonly used types from ndarray
pub use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
