//! Column layout and the typed record it produces

use crate::error::{Error, Result};
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A binary categorical attribute: the input column plus the short name used in profiles
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CategoricalAttribute {
    /// Column header in the input table
    pub column: String,
    /// Short name shown in cluster narratives
    pub display: String,
}

impl CategoricalAttribute {
    /// Create a new attribute
    pub fn new(column: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            display: display.into(),
        }
    }
}

/// Fixed layout of the records fed to the engine.
///
/// The numeric and categorical orders here are the orders used everywhere
/// downstream: scaler means, centroid components and profile lines.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Schema {
    /// Identifier column; the 1-based row number is used when it is absent
    pub id_column: String,
    /// Numeric feature columns
    pub numeric: Vec<String>,
    /// Binary categorical feature columns
    pub categorical: Vec<CategoricalAttribute>,
    /// Descriptive columns carried through to export rows when present
    pub passthrough: Vec<String>,
}

impl Schema {
    /// Create a schema with no passthrough columns
    pub fn new(
        id_column: impl Into<String>,
        numeric: Vec<String>,
        categorical: Vec<CategoricalAttribute>,
    ) -> Self {
        Self {
            id_column: id_column.into(),
            numeric,
            categorical,
            passthrough: Vec::new(),
        }
    }

    /// Add passthrough columns
    pub fn with_passthrough(mut self, columns: Vec<String>) -> Self {
        self.passthrough = columns;
        self
    }

    /// Student layout: academic score and attendance plus four extracurricular flags
    pub fn student() -> Self {
        Self::new(
            "No",
            vec!["Academic Score".to_string(), "Attendance".to_string()],
            vec![
                CategoricalAttribute::new("Computer Club", "Computer"),
                CategoricalAttribute::new("Agriculture Club", "Agriculture"),
                CategoricalAttribute::new("Sewing Club", "Sewing"),
                CategoricalAttribute::new("Scouting", "Scouting"),
            ],
        )
        .with_passthrough(vec!["Name".to_string(), "Gender".to_string(), "Class".to_string()])
    }

    /// Number of numeric features
    pub fn n_numeric(&self) -> usize {
        self.numeric.len()
    }

    /// Number of categorical features
    pub fn n_categorical(&self) -> usize {
        self.categorical.len()
    }

    /// Columns that must be present in every input table
    pub fn required_columns(&self) -> impl Iterator<Item = &str> {
        self.numeric
            .iter()
            .map(String::as_str)
            .chain(self.categorical.iter().map(|attr| attr.column.as_str()))
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.numeric.is_empty() {
            return Err(Error::invalid_parameter("Schema needs at least one numeric column"));
        }
        let mut seen = std::collections::HashSet::new();
        for column in self.required_columns() {
            if !seen.insert(column) {
                return Err(Error::invalid_parameter(format!("Duplicate column '{}' in schema", column)));
            }
        }
        Ok(())
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::student()
    }
}

/// One individual: identifier, raw numeric values and binary categorical values
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Record {
    /// Unique identifier
    pub id: String,
    /// Raw (unscaled) numeric values in schema order
    pub numeric: Vec<f64>,
    /// Categorical values in schema order, each 0 or 1
    pub categorical: Vec<u8>,
    /// Passthrough descriptive fields keyed by column name
    pub extras: BTreeMap<String, String>,
}

impl Record {
    /// Create a record without passthrough fields
    pub fn new(id: impl Into<String>, numeric: Vec<f64>, categorical: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            numeric,
            categorical,
            extras: BTreeMap::new(),
        }
    }

    /// Attach a passthrough field
    pub fn with_extra(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(column.into(), value.into());
        self
    }

    /// Check widths against the schema and that every categorical value is 0 or 1
    pub fn validate(&self, schema: &Schema, row: usize) -> Result<()> {
        if self.numeric.len() != schema.n_numeric() {
            return Err(Error::dimension_mismatch(
                "numeric features",
                schema.n_numeric(),
                self.numeric.len(),
            ));
        }
        if self.categorical.len() != schema.n_categorical() {
            return Err(Error::dimension_mismatch(
                "categorical features",
                schema.n_categorical(),
                self.categorical.len(),
            ));
        }
        if let Some((idx, value)) = self
            .categorical
            .iter()
            .enumerate()
            .find(|(_, &value)| value > 1)
        {
            return Err(Error::InvalidCategoricalValue {
                column: schema.categorical[idx].column.clone(),
                row,
                value: value.to_string(),
            });
        }
        if let Some((idx, _)) = self.numeric.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(Error::invalid_data(format!(
                "Non-finite value in numeric column '{}' at row {}",
                schema.numeric[idx], row
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn student_schema_layout() {
        let schema = Schema::student();
        assert_eq!(schema.n_numeric(), 2);
        assert_eq!(schema.n_categorical(), 4);
        assert_eq!(schema.required_columns().count(), 6);
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn duplicate_columns_rejected() {
        let schema = Schema::new(
            "id",
            vec!["a".into(), "a".into()],
            vec![],
        );
        assert!(schema.validate().is_err());
    }

    #[test]
    fn record_rejects_non_binary_categorical() {
        let schema = Schema::student();
        let record = Record::new("7", vec![80.0, 0.9], vec![1, 0, 2, 0]);
        match record.validate(&schema, 6) {
            Err(Error::InvalidCategoricalValue { column, row, value }) => {
                assert_eq!(column, "Sewing Club");
                assert_eq!(row, 6);
                assert_eq!(value, "2");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn record_rejects_wrong_width() {
        let schema = Schema::student();
        let record = Record::new("1", vec![80.0], vec![1, 0, 0, 0]);
        assert!(matches!(
            record.validate(&schema, 0),
            Err(Error::DimensionMismatch { expected: 2, found: 1, .. })
        ));
    }
}
