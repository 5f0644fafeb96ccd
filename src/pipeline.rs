//! The fitted-model artifact and the data handed to presentation and export
//!
//! [`FittedModel::fit`] runs the whole chain once (scale, cluster, profile)
//! and freezes the outcome. Everything downstream, from cluster summaries to
//! single-record prediction and per-record export, reads from that artifact
//! instead of recomputing anything.

use crate::config::ClusteringConfig;
use crate::engine::ClusteringResult;
use crate::error::{Error, Result};
use crate::ingest::{ingest, Dataset, ImputationReport, RawTable};
use crate::predictor::Predictor;
use crate::profile::{ClusterProfile, ClusterProfiler};
use crate::scaler::{FeatureScaler, ScaledFeatureSet};
use crate::schema::{Record, Schema};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Label and profile text for a classified record
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Prediction {
    /// Assigned cluster
    pub label: usize,
    /// That cluster's profile narrative
    pub description: String,
}

/// Per-record cluster assignment
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Assignment {
    /// Record identifier
    pub id: String,
    /// Assigned cluster
    pub label: usize,
}

/// Per-cluster population and narrative
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterSummary {
    /// Cluster label
    pub label: usize,
    /// Number of records assigned
    pub size: usize,
    /// Profile narrative
    pub description: String,
}

/// Everything a document exporter needs about one record
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExportRow {
    /// Record identifier
    pub id: String,
    /// Raw numeric values (after imputation) keyed by column, in schema order
    pub numeric: Vec<(String, f64)>,
    /// Categorical values keyed by column, in schema order
    pub categorical: Vec<(String, u8)>,
    /// Passthrough descriptive fields
    pub extras: BTreeMap<String, String>,
    /// Assigned cluster
    pub label: usize,
    /// That cluster's profile narrative
    pub description: String,
}

/// Immutable result of one training run
#[derive(Debug, Clone)]
pub struct FittedModel {
    schema: Schema,
    features: ScaledFeatureSet,
    result: Arc<ClusteringResult>,
    profiles: BTreeMap<usize, ClusterProfile>,
    records: Vec<Record>,
    imputation: ImputationReport,
}

impl FittedModel {
    /// Ingest a raw table and fit on it
    pub fn fit_table(table: &RawTable, schema: &Schema, config: &ClusteringConfig) -> Result<Self> {
        let data = ingest(table, schema)?;
        Self::fit(data, config)
    }

    /// Scale, cluster and profile a validated dataset
    pub fn fit(data: Dataset, config: &ClusteringConfig) -> Result<Self> {
        let mut engine = config.engine()?;

        let features = FeatureScaler::fit(&data)?;
        let scaled = features.transform_batch(data.numeric_matrix().view())?;
        let categorical = data.categorical_matrix();
        let result = engine.fit(scaled.view(), categorical.view(), &features)?;

        let profiles = ClusterProfiler::new(&data.schema).describe(&result);

        info!(
            records = data.len(),
            clusters = result.n_clusters(),
            cost = result.cost,
            imputed_columns = data.imputation.entries.len(),
            "Model fitted"
        );

        Ok(Self {
            schema: data.schema,
            features,
            result,
            profiles,
            records: data.records,
            imputation: data.imputation,
        })
    }

    /// Column layout
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Fitted scaler
    pub fn features(&self) -> &ScaledFeatureSet {
        &self.features
    }

    /// Clustering outcome
    pub fn result(&self) -> &ClusteringResult {
        &self.result
    }

    /// Categorical weight used at fit time
    pub fn gamma(&self) -> f64 {
        self.result.gamma
    }

    /// Numeric imputations performed on the training table
    pub fn imputation(&self) -> &ImputationReport {
        &self.imputation
    }

    /// Training records in input order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Profiles keyed by label
    pub fn profiles(&self) -> &BTreeMap<usize, ClusterProfile> {
        &self.profiles
    }

    /// Profile of one cluster
    pub fn profile(&self, label: usize) -> Option<&ClusterProfile> {
        self.profiles.get(&label)
    }

    /// Label of every training record, in input order
    pub fn assignments(&self) -> Vec<Assignment> {
        self.records
            .iter()
            .zip(self.result.labels.iter())
            .map(|(record, &label)| Assignment {
                id: record.id.clone(),
                label,
            })
            .collect()
    }

    /// Size and narrative of every cluster
    pub fn cluster_summaries(&self) -> Vec<ClusterSummary> {
        self.profiles
            .values()
            .map(|profile| ClusterSummary {
                label: profile.label,
                size: profile.size,
                description: profile.description.clone(),
            })
            .collect()
    }

    /// Predictor sharing this model's scaler, centroids and gamma
    pub fn predictor(&self) -> Result<Predictor<'_>> {
        Predictor::from_parts(&self.features, &self.result)
    }

    /// Classify a new record and attach its cluster's narrative
    pub fn predict(&self, record: &Record) -> Result<Prediction> {
        record.validate(&self.schema, 0)?;
        let label = self.predictor()?.predict(record)?;
        Ok(Prediction {
            label,
            description: self.description(label),
        })
    }

    /// Export data for one training record
    pub fn export_row(&self, id: &str) -> Result<ExportRow> {
        let idx = self
            .records
            .iter()
            .position(|record| record.id == id)
            .ok_or_else(|| Error::invalid_parameter(format!("Unknown record id '{}'", id)))?;
        Ok(self.export_at(idx))
    }

    /// Export data for every training record, in input order
    pub fn export_rows(&self) -> Vec<ExportRow> {
        (0..self.records.len()).map(|idx| self.export_at(idx)).collect()
    }

    fn export_at(&self, idx: usize) -> ExportRow {
        let record = &self.records[idx];
        let label = self.result.labels[idx];
        ExportRow {
            id: record.id.clone(),
            numeric: self
                .schema
                .numeric
                .iter()
                .cloned()
                .zip(record.numeric.iter().copied())
                .collect(),
            categorical: self
                .schema
                .categorical
                .iter()
                .map(|attr| attr.column.clone())
                .zip(record.categorical.iter().copied())
                .collect(),
            extras: record.extras.clone(),
            label,
            description: self.description(label),
        }
    }

    fn description(&self, label: usize) -> String {
        self.profiles
            .get(&label)
            .map(|profile| profile.description.clone())
            .unwrap_or_default()
    }
}
