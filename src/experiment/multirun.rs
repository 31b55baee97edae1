//! Multirun table - cluster counts of every repetition, one row per repetition
//!
//! ```text
//! 1,2,3        <- header: swept parameter values
//! 4,3,3        <- repetition 1
//! 5,3,2        <- repetition 2
//! ```

use std::fs::{self, OpenOptions};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::stats::{mean, sample_std};
use crate::{Error, Result};

/// Mean and spread of the cluster count at one parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamStats {
    /// Swept parameter value
    pub param: f64,
    /// Mean cluster count across repetitions
    pub mean: f64,
    /// Sample standard deviation across repetitions
    pub std: f64,
    /// Number of repetitions
    pub n: usize,
}

/// Parsed multirun table.
#[derive(Debug, Clone, PartialEq)]
pub struct MultirunTable {
    params: Vec<f64>,
    rows: Vec<Vec<usize>>,
}

impl MultirunTable {
    /// Create the table file with only its header row.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written
    pub fn write_header(path: &Path, params: &[f64]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        writer.write_record(params.iter().map(ToString::to_string))?;
        writer.flush()?;
        Ok(())
    }

    /// Append one repetition's cluster counts, creating the file if missing.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or written
    pub fn append_row(path: &Path, counts: &[usize]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(counts.iter().map(ToString::to_string))?;
        writer.flush()?;
        Ok(())
    }

    /// Read a single headerless row of counts (a deferred repetition row).
    ///
    /// # Errors
    ///
    /// Returns error if the file is missing, empty or non-numeric
    pub fn read_row(path: &Path) -> Result<Vec<usize>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        let record = reader.records().next().ok_or_else(|| {
            Error::InvalidInput(format!("{} contains no row", path.display()))
        })??;
        parse_counts(&record)
    }

    /// Read a table written by [`write_header`](Self::write_header) and
    /// [`append_row`](Self::append_row).
    ///
    /// # Errors
    ///
    /// Returns error if the file is unreadable, a value is not numeric, or a
    /// row's width differs from the header
    pub fn read(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)?;
        let params = reader
            .headers()?
            .iter()
            .filter(|h| !h.is_empty())
            .map(|h| {
                h.trim().parse::<f64>().map_err(|e| {
                    Error::InvalidInput(format!("bad parameter header '{h}': {e}"))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        let rows = reader
            .records()
            .map(|record| parse_counts(&record?))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { params, rows })
    }

    /// Swept parameter values from the header.
    #[must_use]
    pub fn params(&self) -> &[f64] {
        &self.params
    }

    /// Cluster-count rows, one per repetition.
    #[must_use]
    pub fn rows(&self) -> &[Vec<usize>] {
        &self.rows
    }

    /// Column-wise mean and sample standard deviation.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> Vec<ParamStats> {
        self.params
            .iter()
            .enumerate()
            .map(|(col, &param)| {
                let values: Vec<f64> = self.rows.iter().map(|row| row[col] as f64).collect();
                ParamStats {
                    param,
                    mean: mean(&values),
                    std: sample_std(&values),
                    n: values.len(),
                }
            })
            .collect()
    }

    /// Write `param,mean,std,n` rows.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written
    pub fn write_stats(path: &Path, stats: &[ParamStats]) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for row in stats {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn parse_counts(record: &csv::StringRecord) -> Result<Vec<usize>> {
    record
        .iter()
        .map(|field| {
            field.trim().parse::<usize>().map_err(|e| {
                Error::InvalidInput(format!("bad cluster count '{field}': {e}"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_then_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statistics").join("multirun.csv");

        MultirunTable::write_header(&path, &[1.0, 2.0, 3.0]).unwrap();
        MultirunTable::append_row(&path, &[4, 3, 3]).unwrap();
        MultirunTable::append_row(&path, &[6, 3, 2]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "1,2,3\n4,3,3\n6,3,2\n");

        let table = MultirunTable::read(&path).unwrap();
        assert_eq!(table.params(), &[1.0, 2.0, 3.0]);
        assert_eq!(table.rows().len(), 2);

        let stats = table.stats();
        assert!((stats[0].mean - 5.0).abs() < 1e-12);
        assert!((stats[0].std - 2.0f64.sqrt()).abs() < 1e-12);
        assert!(stats[1].std.abs() < 1e-12);
        assert_eq!(stats[2].n, 2);
    }

    #[test]
    fn test_ragged_row_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("multirun.csv");
        MultirunTable::write_header(&path, &[1.0, 2.0]).unwrap();
        MultirunTable::append_row(&path, &[1, 2, 3]).unwrap();
        assert!(matches!(MultirunTable::read(&path), Err(Error::Csv(_))));
    }

    #[test]
    fn test_read_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("n_clusters.csv");
        MultirunTable::append_row(&path, &[7, 5]).unwrap();
        assert_eq!(MultirunTable::read_row(&path).unwrap(), vec![7, 5]);
    }

    #[test]
    fn test_write_stats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        let stats = vec![ParamStats {
            param: 2.0,
            mean: 3.5,
            std: 0.5,
            n: 2,
        }];
        MultirunTable::write_stats(&path, &stats).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("param,mean,std,n\n"));
        assert!(text.contains("2.0,3.5,0.5,2"));
    }
}
