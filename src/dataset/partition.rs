//! Row sampling and row/column partitioning

use arrow::array::{ArrayRef, BooleanArray, UInt32Array};
use arrow::compute::{filter_record_batch, take};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use rand::Rng;

use super::Dataset;
use crate::{Error, Result};

/// Draw `n` rows without replacement.
///
/// If the table has `n` rows or fewer, every row is kept (in random order).
/// The result is reproducible for a seeded `rng`.
///
/// # Errors
///
/// Returns error if the table is too large to index with `u32`
pub fn sample<R: Rng + ?Sized>(dataset: &Dataset, n: usize, rng: &mut R) -> Result<Dataset> {
    let total = dataset.num_rows();
    let amount = n.min(total);
    let indices = rand::seq::index::sample(rng, total, amount)
        .into_iter()
        .map(|i| {
            u32::try_from(i)
                .map_err(|_| Error::InvalidInput(format!("row index {i} exceeds u32 range")))
        })
        .collect::<Result<Vec<u32>>>()?;
    let indices = UInt32Array::from(indices);

    let batch = dataset.batch();
    let columns = batch
        .columns()
        .iter()
        .map(|c| take(c.as_ref(), &indices, None))
        .collect::<std::result::Result<Vec<ArrayRef>, _>>()?;
    let options = RecordBatchOptions::new().with_row_count(Some(amount));
    let sampled = RecordBatch::try_new_with_options(batch.schema(), columns, &options)?;
    Ok(Dataset::from_batch(sampled, dataset.source_columns().to_vec()))
}

/// Keep the columns at positions `bounds[0]..=bounds[1]`.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the bounds are reversed or past the
/// last column
pub fn select_by_column(dataset: &Dataset, bounds: [usize; 2]) -> Result<Dataset> {
    let [start, end] = bounds;
    if start > end || end >= dataset.num_columns() {
        return Err(Error::InvalidInput(format!(
            "column bounds [{start}, {end}] invalid for {} columns",
            dataset.num_columns()
        )));
    }
    let positions: Vec<usize> = (start..=end).collect();
    let projected = dataset.batch().project(&positions)?;
    let sources = positions
        .iter()
        .map(|&p| dataset.source_columns()[p])
        .collect();
    Ok(Dataset::from_batch(projected, sources))
}

/// Keep the rows whose value in `column` is at most `cutoff`.
///
/// Used with a frame/time column to restrict clustering to the first part
/// of a trajectory. Row order is preserved.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `column` is out of range
pub fn select_by_time(dataset: &Dataset, cutoff: f64, column: usize) -> Result<Dataset> {
    if column >= dataset.num_columns() {
        return Err(Error::InvalidInput(format!(
            "partition column {column} out of range for {} columns",
            dataset.num_columns()
        )));
    }
    let mask: BooleanArray = dataset
        .column(column)
        .iter()
        .map(|&v| Some(v <= cutoff))
        .collect();
    let filtered = filter_record_batch(dataset.batch(), &mask)?;
    Ok(Dataset::from_batch(
        filtered,
        dataset.source_columns().to_vec(),
    ))
}
