//! Qualitative cluster descriptions
//!
//! Each numeric centroid component is a standardized mean, so it is banded
//! directly against fixed thresholds:
//!
//! ```text
//!            v < -0.75   very low
//!   -0.75 <= v < -0.25   below average
//!   -0.25 <= v <= 0.25   average
//!    0.25 <  v <= 0.75   above average
//!    0.75 <  v           very high
//! ```
//!
//! A categorical attribute is listed as active when its members' mode is 1.

use crate::engine::ClusteringResult;
use crate::schema::Schema;
use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Qualitative level of a standardized mean
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Band {
    /// Below -0.75
    VeryLow,
    /// From -0.75 up to, but excluding, -0.25
    BelowAverage,
    /// Between -0.25 and 0.25 inclusive
    Average,
    /// Above 0.25 up to and including 0.75
    AboveAverage,
    /// Above 0.75
    VeryHigh,
}

impl Band {
    /// Band a standardized value
    pub fn classify(value: f64) -> Self {
        if value > 0.75 {
            Band::VeryHigh
        } else if value > 0.25 {
            Band::AboveAverage
        } else if value < -0.75 {
            Band::VeryLow
        } else if value < -0.25 {
            Band::BelowAverage
        } else {
            Band::Average
        }
    }

    /// Lower-case phrase used in narratives
    pub fn as_str(&self) -> &'static str {
        match self {
            Band::VeryLow => "very low",
            Band::BelowAverage => "below average",
            Band::Average => "average",
            Band::AboveAverage => "above average",
            Band::VeryHigh => "very high",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Band of one numeric feature within a cluster
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FeatureBand {
    /// Feature name
    pub feature: String,
    /// Standardized cluster mean
    pub mean: f64,
    /// Band of `mean`
    pub band: Band,
}

/// Summary of one cluster
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterProfile {
    /// Cluster label
    pub label: usize,
    /// Number of records in the cluster
    pub size: usize,
    /// Numeric bands in schema order
    pub numeric: Vec<FeatureBand>,
    /// Display names of the categorical attributes whose mode is 1
    pub active: Vec<String>,
    /// Human-readable narrative
    pub description: String,
}

/// Builds [`ClusterProfile`]s from a fitted result
#[derive(Debug, Clone)]
pub struct ClusterProfiler<'a> {
    schema: &'a Schema,
    active_heading: String,
    none_active: String,
}

impl<'a> ClusterProfiler<'a> {
    /// Create a profiler using the schema's feature names
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            active_heading: "Active in extracurriculars".to_string(),
            none_active: "Tends not to take part in extracurriculars.".to_string(),
        }
    }

    /// Phrase introducing the active attribute list
    pub fn active_heading(mut self, heading: impl Into<String>) -> Self {
        self.active_heading = heading.into();
        self
    }

    /// Sentence used when no attribute is active
    pub fn none_active(mut self, sentence: impl Into<String>) -> Self {
        self.none_active = sentence.into();
        self
    }

    /// Profile every cluster, keyed by label, from its members' mean and mode
    pub fn describe(&self, result: &ClusteringResult) -> BTreeMap<usize, ClusterProfile> {
        result
            .member_centroids
            .iter()
            .enumerate()
            .map(|(label, centroid)| {
                let numeric: Vec<FeatureBand> = self
                    .schema
                    .numeric
                    .iter()
                    .zip(centroid.numeric.iter())
                    .map(|(feature, &mean)| FeatureBand {
                        feature: feature.clone(),
                        mean,
                        band: Band::classify(mean),
                    })
                    .collect();

                let active: Vec<String> = self
                    .schema
                    .categorical
                    .iter()
                    .zip(centroid.categorical.iter())
                    .filter(|(_, &value)| value == 1)
                    .map(|(attr, _)| attr.display.clone())
                    .collect();

                let description = self.narrative(&numeric, &active);
                let size = result.cluster_sizes.get(label).copied().unwrap_or(0);

                (
                    label,
                    ClusterProfile {
                        label,
                        size,
                        numeric,
                        active,
                        description,
                    },
                )
            })
            .collect()
    }

    fn narrative(&self, numeric: &[FeatureBand], active: &[String]) -> String {
        let mut sentences: Vec<String> = numeric
            .iter()
            .map(|fb| format!("{} is {}.", fb.feature, fb.band))
            .collect();

        if active.is_empty() {
            sentences.push(self.none_active.clone());
        } else {
            sentences.push(format!("{}: {}.", self.active_heading, active.join(", ")));
        }

        sentences.join(" ")
    }
}
