//! PNG plots: per-pair cluster scatter plots and the multirun error-bar plot
//!
//! Plots are rendered without any text (the crate is built without a font
//! stack); file names carry the column pair.

use std::ops::Range;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use rayon::prelude::*;
use tracing::debug;

use crate::clustering::NOISE_LABEL;
use crate::dataset::Dataset;
use crate::experiment::ParamStats;
use crate::stats::min_max;
use crate::{Error, Result};

/// Number of hues in the cluster palette; labels past it wrap around.
pub const PALETTE_SIZE: usize = 100;

const SCATTER_SIZE: (u32, u32) = (800, 600);
const ERRORBAR_SIZE: (u32, u32) = (1000, 600);

fn plot_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Plot(e.to_string())
}

/// Evenly spaced HLS hues (lightness 0.6, saturation 0.65), first hue at 0.01.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn hls_palette(n: usize) -> Vec<RGBAColor> {
    (0..n)
        .map(|i| {
            let hue = (i as f64 / n as f64 + 0.01) % 1.0;
            HSLColor(hue, 0.65, 0.6).to_rgba()
        })
        .collect()
}

/// Map cluster labels to colors; noise is black.
#[must_use]
pub fn labels_to_colors(labels: &[i32]) -> Vec<RGBAColor> {
    let palette = hls_palette(PALETTE_SIZE);
    labels
        .iter()
        .map(|&label| match usize::try_from(label) {
            Ok(idx) => palette[idx % PALETTE_SIZE],
            Err(_) => {
                debug_assert_eq!(label, NOISE_LABEL);
                BLACK.to_rgba()
            }
        })
        .collect()
}

/// Render a scatter plot for every pair of `plot_cols`, colored by label.
///
/// `plot_cols` are source column indices; files are named
/// `<a>_vs_<b>.png`. Pairs are rendered in parallel on `threads` threads.
///
/// # Errors
///
/// Returns error if a plot column is not in `dataset`, the labels do not
/// match the rows, or rendering fails
pub fn scatter_pairs(
    dataset: &Dataset,
    plot_cols: &[usize],
    labels: &[i32],
    out_dir: &Path,
    threads: usize,
) -> Result<Vec<PathBuf>> {
    if labels.len() != dataset.num_rows() {
        return Err(Error::InvalidInput(format!(
            "{} labels for {} rows",
            labels.len(),
            dataset.num_rows()
        )));
    }
    let positions = plot_cols
        .iter()
        .map(|&c| {
            dataset.position_of_source(c).ok_or_else(|| {
                Error::InvalidInput(format!("plot column {c} is not among the clustered columns"))
            })
        })
        .collect::<Result<Vec<usize>>>()?;

    let mut pairs = Vec::new();
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            pairs.push((i, j));
        }
    }

    let colors = labels_to_colors(labels);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .map_err(plot_err)?;

    pool.install(|| {
        pairs
            .par_iter()
            .map(|&(i, j)| {
                let path = out_dir.join(format!("{}_vs_{}.png", plot_cols[i], plot_cols[j]));
                render_scatter(
                    dataset.column(positions[i]),
                    dataset.column(positions[j]),
                    &colors,
                    &path,
                )?;
                debug!(path = %path.display(), "scatter plot written");
                Ok(path)
            })
            .collect()
    })
}

fn render_scatter(xs: &[f64], ys: &[f64], colors: &[RGBAColor], path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, SCATTER_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let x_range = padded_range(xs);
    let y_range = padded_range(ys);
    let frame = [(x_range.start, y_range.start), (x_range.end, y_range.end)];
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .build_cartesian_2d(x_range, y_range)
        .map_err(plot_err)?;

    chart
        .draw_series(std::iter::once(Rectangle::new(frame, BLACK.stroke_width(1))))
        .map_err(plot_err)?;
    chart
        .draw_series(
            xs.iter()
                .zip(ys)
                .zip(colors)
                .map(|((&x, &y), color)| Circle::new((x, y), 3, color.mix(0.8).filled())),
        )
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

/// Render mean cluster count against parameter value with ±1 std bars.
///
/// # Errors
///
/// Returns error if `stats` is empty or rendering fails
pub fn errorbar(stats: &[ParamStats], path: &Path) -> Result<()> {
    if stats.is_empty() {
        return Err(Error::InvalidInput("no statistics to plot".to_string()));
    }
    let xs: Vec<f64> = stats.iter().map(|s| s.param).collect();
    let bounds: Vec<f64> = stats
        .iter()
        .flat_map(|s| [s.mean - s.std, s.mean + s.std])
        .collect();
    let x_range = padded_range(&xs);
    let y_range = padded_range(&bounds);
    let cap = (x_range.end - x_range.start) * 0.01;

    let root = BitMapBackend::new(path, ERRORBAR_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let frame = [(x_range.start, y_range.start), (x_range.end, y_range.end)];
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .build_cartesian_2d(x_range, y_range)
        .map_err(plot_err)?;

    chart
        .draw_series(std::iter::once(Rectangle::new(frame, BLACK.stroke_width(1))))
        .map_err(plot_err)?;
    chart
        .draw_series(std::iter::once(PathElement::new(
            stats.iter().map(|s| (s.param, s.mean)).collect::<Vec<_>>(),
            BLUE.stroke_width(2),
        )))
        .map_err(plot_err)?;

    for s in stats {
        let (lo, hi) = (s.mean - s.std, s.mean + s.std);
        let bars = [
            vec![(s.param, lo), (s.param, hi)],
            vec![(s.param - cap, lo), (s.param + cap, lo)],
            vec![(s.param - cap, hi), (s.param + cap, hi)],
        ];
        chart
            .draw_series(bars.into_iter().map(|b| PathElement::new(b, BLUE.mix(0.8))))
            .map_err(plot_err)?;
        chart
            .draw_series(std::iter::once(Circle::new((s.param, s.mean), 4, BLUE.filled())))
            .map_err(plot_err)?;
    }

    root.present().map_err(plot_err)?;
    Ok(())
}

/// Data range padded by 5% on each side (0.5 when the data is flat).
fn padded_range(values: &[f64]) -> Range<f64> {
    let (lo, hi) = min_max(values).unwrap_or((0.0, 1.0));
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 0.5 };
    (lo - pad)..(hi + pad)
}
