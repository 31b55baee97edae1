//! Numeric feature tables and the data preparation pipeline
//!
//! A [`Dataset`] is an Arrow [`RecordBatch`] whose columns are all
//! non-null `Float64`. Every column also remembers its index in the source
//! file, so plot columns can still be addressed by their original number after
//! a column range has been selected.
//!
//! Transforms never mutate in place: [`normalize`], [`sample`],
//! [`select_by_column`] and [`select_by_time`] all return a new table.
//!
//! ```rust
//! use cluster_sweep::dataset::{normalize, select_by_column, Dataset, NormMethod};
//!
//! let data = Dataset::parse_whitespace("1 10 100\n2 20 200\n3 30 300\n")?;
//! let scaled = normalize(&data, NormMethod::FeatureScale, &[1])?;
//! assert_eq!(scaled.column(1), &[0.0, 0.5, 1.0]);
//!
//! let features = select_by_column(&scaled, [1, 2])?;
//! assert_eq!(features.num_columns(), 2);
//! assert_eq!(features.source_columns(), &[1, 2]);
//! # Ok::<(), cluster_sweep::Error>(())
//! ```

mod normalize;
mod partition;

pub use normalize::{normalize, NormMethod};
pub use partition::{sample, select_by_column, select_by_time};

use std::fs;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Float64Array};
use arrow::datatypes::{DataType, Field, Float64Type, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};

use crate::{Error, Result};

/// Ordered numeric feature table.
#[derive(Debug, Clone)]
pub struct Dataset {
    batch: RecordBatch,
    source_columns: Vec<usize>,
}

impl Dataset {
    /// Build a table from column vectors. Columns are named by their index.
    ///
    /// # Errors
    ///
    /// Returns error if the columns differ in length
    pub fn from_columns(columns: Vec<Vec<f64>>) -> Result<Self> {
        let source_columns: Vec<usize> = (0..columns.len()).collect();
        let names = source_columns.iter().map(ToString::to_string).collect();
        Self::assemble(columns, names, source_columns)
    }

    /// Build a table from row vectors.
    ///
    /// # Errors
    ///
    /// Returns error if the rows differ in width
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let width = rows.first().map_or(0, Vec::len);
        let mut columns = vec![Vec::with_capacity(rows.len()); width];
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(Error::InvalidInput(format!(
                    "row {i} has {} values, expected {width}",
                    row.len()
                )));
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(*value);
            }
        }
        Self::from_columns(columns)
    }

    /// Load a dataset from disk.
    ///
    /// `.parquet` files go through the Arrow reader; anything else is parsed
    /// as whitespace-delimited text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatasetNotFound`] if the path does not exist, or a
    /// parse/storage error if the contents are not a numeric table
    pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::DatasetNotFound(path.to_path_buf()));
        }
        let is_parquet = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"));
        if is_parquet {
            Self::load_parquet(path)
        } else {
            Self::from_whitespace_text(path)
        }
    }

    /// Load a whitespace-delimited text file with no header row.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn from_whitespace_text<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::parse_whitespace(&text)
    }

    /// Parse whitespace-delimited numeric text. Blank lines are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] on a non-numeric field or ragged row, and
    /// [`Error::InvalidInput`] if no rows are present
    pub fn parse_whitespace(text: &str) -> Result<Self> {
        let mut rows: Vec<Vec<f64>> = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let row = line
                .split_whitespace()
                .map(|field| {
                    field.parse::<f64>().map_err(|e| Error::Parse {
                        line: idx + 1,
                        message: format!("'{field}': {e}"),
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            if let Some(first) = rows.first() {
                if first.len() != row.len() {
                    return Err(Error::Parse {
                        line: idx + 1,
                        message: format!("expected {} fields, found {}", first.len(), row.len()),
                    });
                }
            }
            rows.push(row);
        }
        if rows.is_empty() {
            return Err(Error::InvalidInput("dataset contains no rows".to_string()));
        }
        Self::from_rows(&rows)
    }

    /// Load a Parquet file, casting every column to `Float64`.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, a column cannot be cast, or
    /// a column contains nulls
    pub fn load_parquet<P: AsRef<Path>>(path: P) -> Result<Self> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
        use std::fs::File;

        let file = File::open(path.as_ref())?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let schema = builder.schema().clone();
        let reader = builder.build()?;

        let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
        let combined = arrow::compute::concat_batches(&schema, &batches)?;

        let mut columns = Vec::with_capacity(combined.num_columns());
        let mut names = Vec::with_capacity(combined.num_columns());
        for (field, array) in schema.fields().iter().zip(combined.columns()) {
            let cast = arrow::compute::cast(array, &DataType::Float64)?;
            if cast.null_count() > 0 {
                return Err(Error::InvalidInput(format!(
                    "column '{}' contains {} null values",
                    field.name(),
                    cast.null_count()
                )));
            }
            columns.push(cast.as_primitive::<Float64Type>().values().to_vec());
            names.push(field.name().clone());
        }
        let source_columns = (0..columns.len()).collect();
        Self::assemble(columns, names, source_columns)
    }

    fn assemble(
        columns: Vec<Vec<f64>>,
        names: Vec<String>,
        source_columns: Vec<usize>,
    ) -> Result<Self> {
        let num_rows = columns.first().map_or(0, Vec::len);
        if let Some(bad) = columns.iter().position(|c| c.len() != num_rows) {
            return Err(Error::InvalidInput(format!(
                "column {bad} has {} rows, expected {num_rows}",
                columns[bad].len()
            )));
        }
        let schema = Arc::new(Schema::new(
            names
                .iter()
                .map(|name| Field::new(name, DataType::Float64, false))
                .collect::<Vec<_>>(),
        ));
        let arrays: Vec<ArrayRef> = columns
            .into_iter()
            .map(|c| Arc::new(Float64Array::from(c)) as ArrayRef)
            .collect();
        let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
        let batch = RecordBatch::try_new_with_options(schema, arrays, &options)?;
        Ok(Self {
            batch,
            source_columns,
        })
    }

    /// Wrap an existing batch, keeping the given source column indices.
    pub(crate) fn from_batch(batch: RecordBatch, source_columns: Vec<usize>) -> Self {
        debug_assert_eq!(batch.num_columns(), source_columns.len());
        Self {
            batch,
            source_columns,
        }
    }

    /// Replace column values, keeping names and source indices.
    pub(crate) fn with_columns(&self, columns: Vec<Vec<f64>>) -> Result<Self> {
        Self::assemble(columns, self.column_names(), self.source_columns.clone())
    }

    /// Rename every column.
    ///
    /// # Errors
    ///
    /// Returns error if the number of names does not match the column count
    pub fn with_column_names(&self, names: &[String]) -> Result<Self> {
        if names.len() != self.num_columns() {
            return Err(Error::InvalidInput(format!(
                "{} column names given for {} columns",
                names.len(),
                self.num_columns()
            )));
        }
        let columns = (0..self.num_columns())
            .map(|i| self.column(i).to_vec())
            .collect();
        Self::assemble(columns, names.to_vec(), self.source_columns.clone())
    }

    /// Number of rows.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Number of columns.
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// Values of the column at `index` (position in this table).
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds
    #[must_use]
    pub fn column(&self, index: usize) -> &[f64] {
        self.batch.column(index).as_primitive::<Float64Type>().values()
    }

    /// Column names in table order.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Source file index of every column, in table order.
    #[must_use]
    pub fn source_columns(&self) -> &[usize] {
        &self.source_columns
    }

    /// Position in this table of the column that was `source` in the file.
    #[must_use]
    pub fn position_of_source(&self, source: usize) -> Option<usize> {
        self.source_columns.iter().position(|&s| s == source)
    }

    /// Underlying Arrow batch.
    #[must_use]
    pub const fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Row-major copy of the table, the layout the clustering library takes.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        let columns: Vec<&[f64]> = (0..self.num_columns()).map(|i| self.column(i)).collect();
        (0..self.num_rows())
            .map(|r| columns.iter().map(|c| c[r]).collect())
            .collect()
    }
}
