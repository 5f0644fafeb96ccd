//! Turning an untyped table into validated records
//!
//! Column presence is checked once, up front, and every missing column is
//! reported in a single error. After that the rows are converted into
//! [`Record`]s whose layout is fixed by the [`Schema`]:
//!
//! - missing categorical cells default to `0`
//! - categorical cells must otherwise read as `0` or `1`
//! - identifiers must be present and unique when the id column exists
//! - missing numeric cells are replaced by the column mean of the present
//!   values, and every replacement is recorded in an [`ImputationReport`]

use crate::error::{Error, Result};
use crate::schema::{Record, Schema};
use ndarray::Array2;
use std::collections::HashMap;
use tracing::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Header names plus rows of optional text cells, as handed over by a file reader
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Column headers
    pub columns: Vec<String>,
    /// Rows; `None` or blank text marks a missing cell
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// Create a table from headers and rows
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    /// Convenience constructor from string slices; empty strings become missing cells
    pub fn from_strs(columns: &[&str], rows: &[&[&str]]) -> Self {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| {
                        if cell.trim().is_empty() {
                            None
                        } else {
                            Some(cell.to_string())
                        }
                    })
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows[row]
            .get(col)
            .and_then(|cell| cell.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// One imputed numeric column
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImputationEntry {
    /// Column name
    pub column: String,
    /// Mean substituted for the missing cells
    pub mean: f64,
    /// Zero-based rows that received the mean
    pub rows: Vec<usize>,
}

/// Every numeric imputation performed during ingestion
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImputationReport {
    /// One entry per column that had missing values
    pub entries: Vec<ImputationEntry>,
}

impl ImputationReport {
    /// True when nothing was imputed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for a column, if it was imputed
    pub fn for_column(&self, column: &str) -> Option<&ImputationEntry> {
        self.entries.iter().find(|entry| entry.column == column)
    }
}

/// Validated training batch
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Layout the records follow
    pub schema: Schema,
    /// Records in input order
    pub records: Vec<Record>,
    /// Imputations applied while building the records
    pub imputation: ImputationReport,
}

impl Dataset {
    /// Build a dataset from records that are already typed, validating each one
    pub fn from_records(schema: Schema, records: Vec<Record>) -> Result<Self> {
        schema.validate()?;
        if records.is_empty() {
            return Err(Error::invalid_data("Data cannot be empty"));
        }
        for (row, record) in records.iter().enumerate() {
            record.validate(&schema, row)?;
        }
        ensure_unique_ids(&records)?;
        Ok(Self {
            schema,
            records,
            imputation: ImputationReport::default(),
        })
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when there are no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Raw numeric values as an `n_records x n_numeric` matrix
    pub fn numeric_matrix(&self) -> Array2<f64> {
        let width = self.schema.n_numeric();
        Array2::from_shape_fn((self.records.len(), width), |(i, j)| self.records[i].numeric[j])
    }

    /// Categorical values as an `n_records x n_categorical` matrix
    pub fn categorical_matrix(&self) -> Array2<u8> {
        let width = self.schema.n_categorical();
        Array2::from_shape_fn((self.records.len(), width), |(i, j)| {
            self.records[i].categorical[j]
        })
    }
}

/// Validate a raw table against the schema and convert it into a [`Dataset`]
pub fn ingest(table: &RawTable, schema: &Schema) -> Result<Dataset> {
    schema.validate()?;

    let positions: HashMap<&str, usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.trim(), idx))
        .collect();

    let missing: Vec<String> = schema
        .required_columns()
        .filter(|column| !positions.contains_key(column))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingColumn { columns: missing });
    }

    if table.rows.is_empty() {
        return Err(Error::invalid_data("Input table has no rows"));
    }

    let n_rows = table.rows.len();
    let numeric = read_numeric_columns(table, schema, &positions)?;
    let (numeric, imputation) = impute_means(numeric, schema)?;

    let id_position = positions.get(schema.id_column.as_str()).copied();

    let mut records = Vec::with_capacity(n_rows);
    for row in 0..n_rows {
        let id = match id_position {
            None => (row + 1).to_string(),
            Some(col) => table.cell(row, col).map(str::to_string).ok_or_else(|| {
                Error::invalid_data(format!(
                    "Row {} has no identifier in column '{}'",
                    row, schema.id_column
                ))
            })?,
        };

        let categorical = schema
            .categorical
            .iter()
            .map(|attr| {
                let cell = table.cell(row, positions[attr.column.as_str()]);
                parse_binary(cell, &attr.column, row)
            })
            .collect::<Result<Vec<u8>>>()?;

        let mut record = Record::new(id, numeric.iter().map(|col| col[row]).collect(), categorical);
        for column in &schema.passthrough {
            if let Some(value) = positions
                .get(column.as_str())
                .and_then(|&col| table.cell(row, col))
            {
                record.extras.insert(column.clone(), value.to_string());
            }
        }
        records.push(record);
    }
    ensure_unique_ids(&records)?;

    Ok(Dataset {
        schema: schema.clone(),
        records,
        imputation,
    })
}

/// Parse every numeric column, keeping gaps as `None`
fn read_numeric_columns(
    table: &RawTable,
    schema: &Schema,
    positions: &HashMap<&str, usize>,
) -> Result<Vec<Vec<Option<f64>>>> {
    schema
        .numeric
        .iter()
        .map(|column| {
            let col = positions[column.as_str()];
            (0..table.rows.len())
                .map(|row| match table.cell(row, col) {
                    None => Ok(None),
                    Some(text) => {
                        let value: f64 = text.parse().map_err(|_| {
                            Error::invalid_data(format!(
                                "Cannot parse {:?} as a number in column '{}' at row {}",
                                text, column, row
                            ))
                        })?;
                        if value.is_nan() {
                            Ok(None)
                        } else if value.is_infinite() {
                            Err(Error::invalid_data(format!(
                                "Infinite value in column '{}' at row {}",
                                column, row
                            )))
                        } else {
                            Ok(Some(value))
                        }
                    }
                })
                .collect()
        })
        .collect()
}

fn impute_means(
    columns: Vec<Vec<Option<f64>>>,
    schema: &Schema,
) -> Result<(Vec<Vec<f64>>, ImputationReport)> {
    let mut report = ImputationReport::default();
    let mut filled = Vec::with_capacity(columns.len());

    for (column, values) in schema.numeric.iter().zip(columns) {
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        if present.is_empty() {
            return Err(Error::invalid_data(format!(
                "Numeric column '{}' has no values",
                column
            )));
        }

        let missing_rows: Vec<usize> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_none())
            .map(|(row, _)| row)
            .collect();

        if missing_rows.is_empty() {
            filled.push(present);
            continue;
        }

        let mean = present.iter().sum::<f64>() / present.len() as f64;
        warn!(
            column = %column,
            mean,
            rows = missing_rows.len(),
            "Missing numeric values imputed with column mean"
        );
        filled.push(values.iter().map(|v| v.unwrap_or(mean)).collect());
        report.entries.push(ImputationEntry {
            column: column.clone(),
            mean,
            rows: missing_rows,
        });
    }

    Ok((filled, report))
}

fn ensure_unique_ids(records: &[Record]) -> Result<()> {
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(records.len());
    for (row, record) in records.iter().enumerate() {
        if let Some(first) = seen.insert(record.id.as_str(), row) {
            return Err(Error::invalid_data(format!(
                "Duplicate identifier '{}' at rows {} and {}",
                record.id, first, row
            )));
        }
    }
    Ok(())
}

fn parse_binary(cell: Option<&str>, column: &str, row: usize) -> Result<u8> {
    let text = match cell {
        None => return Ok(0),
        Some(text) => text,
    };
    match text.parse::<f64>() {
        Ok(value) if value == 0.0 => Ok(0),
        Ok(value) if value == 1.0 => Ok(1),
        _ => Err(Error::InvalidCategoricalValue {
            column: column.to_string(),
            row,
            value: text.to_string(),
        }),
    }
}
