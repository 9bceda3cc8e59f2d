//! Thermal sample rasterization.
//!
//! Bins scattered point samples into a uniform lat/lon grid and averages the
//! temperatures per cell. Raw per-cell sample lists are never retained; each
//! cell accumulates a running sum and count, so memory stays proportional to
//! the (capped) grid size rather than the sample count.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core_types::{BoundingBox, TempSummary, ThermalScan};
use crate::error::AnalysisError;

/// Baseline raster cell size in degrees, roughly 100 m at mid latitudes.
pub const DEFAULT_CELL_SIZE_DEG: f64 = 0.001;

/// Hard ceiling on grid allocation; larger bounding boxes trade resolution
/// for memory by scaling the cell size up.
pub const MAX_GRID_CELLS: usize = 10_000;

/// One raster cell after averaging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    /// Mean temperature of the contained samples; `None` iff no sample
    /// landed in this cell.
    pub avg_temp: Option<f64>,
    pub sample_count: u32,
    pub center_lat: f64,
    pub center_lon: f64,
}

/// Uniform temperature grid over a bounding box, row-major from the
/// south-west corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatGrid {
    cells: Vec<GridCell>,
    pub rows: usize,
    pub cols: usize,
    /// Effective cell size after the allocation cap, degrees.
    pub cell_size: f64,
    pub bbox: BoundingBox,
    /// Fetcher-supplied temperature summary, echoed for the scorer.
    pub statistics: TempSummary,
    pub cells_with_data: usize,
}

impl HeatGrid {
    /// Assemble a grid from pre-averaged cells, for callers that already
    /// hold gridded data (fixtures, replayed artifacts).
    ///
    /// # Errors
    /// Returns `AnalysisError::InvalidInput` when the cell count does not
    /// match `rows * cols` or `cell_size` is not positive.
    pub fn from_cells(
        cells: Vec<GridCell>,
        rows: usize,
        cols: usize,
        cell_size: f64,
        bbox: BoundingBox,
        statistics: TempSummary,
    ) -> Result<Self, AnalysisError> {
        if cells.len() != rows * cols {
            return Err(AnalysisError::InvalidInput(format!(
                "grid expects {rows}x{cols} = {} cells, got {}",
                rows * cols,
                cells.len()
            )));
        }
        if !(cell_size > 0.0 && cell_size.is_finite()) {
            return Err(AnalysisError::InvalidInput(format!(
                "cell_size must be a positive number of degrees, got {cell_size}"
            )));
        }
        let cells_with_data = cells.iter().filter(|c| c.avg_temp.is_some()).count();
        Ok(HeatGrid {
            cells,
            rows,
            cols,
            cell_size,
            bbox,
            statistics,
            cells_with_data,
        })
    }

    pub fn cell(&self, row: usize, col: usize) -> &GridCell {
        &self.cells[row * self.cols + col]
    }

    pub fn total_cells(&self) -> usize {
        self.rows * self.cols
    }

    /// Iterate cells in row-major order together with their indices.
    pub fn iter_cells(&self) -> impl Iterator<Item = (usize, usize, &GridCell)> {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (i / self.cols, i % self.cols, cell))
    }

    /// Grid indices for a coordinate, clamped into the nearest edge cell.
    pub fn clamped_cell_at(&self, lat: f64, lon: f64) -> (usize, usize) {
        clamped_indices(
            lat,
            lon,
            &self.bbox,
            self.cell_size,
            self.rows,
            self.cols,
        )
    }
}

pub(crate) fn clamped_indices(
    lat: f64,
    lon: f64,
    bbox: &BoundingBox,
    cell_size: f64,
    rows: usize,
    cols: usize,
) -> (usize, usize) {
    let col = ((lon - bbox.west()) / cell_size).floor() as i64;
    let row = ((lat - bbox.south()) / cell_size).floor() as i64;
    let col = col.clamp(0, cols as i64 - 1) as usize;
    let row = row.clamp(0, rows as i64 - 1) as usize;
    (row, col)
}

/// Grid dimensions for a bbox at a cell size, scaling the cell size up
/// until the cell count fits under [`MAX_GRID_CELLS`].
///
/// The scale step uses `sqrt(max / (rows * cols))` and re-applies `ceil`,
/// repeating when ceiling rounding pushes the product back over the cap so
/// the bound holds for arbitrarily large boxes.
fn capped_dimensions(bbox: &BoundingBox, mut cell_size: f64) -> (usize, usize, f64) {
    loop {
        let cols = ((bbox.width() / cell_size).ceil() as usize).max(1);
        let rows = ((bbox.height() / cell_size).ceil() as usize).max(1);
        if rows * cols <= MAX_GRID_CELLS {
            return (rows, cols, cell_size);
        }
        let scale = (MAX_GRID_CELLS as f64 / (rows * cols) as f64).sqrt();
        cell_size /= scale;
    }
}

/// Rasterize a thermal scan at the default cell size.
///
/// # Errors
/// See [`rasterize_with_cell_size`].
pub fn rasterize(scan: &ThermalScan) -> Result<HeatGrid, AnalysisError> {
    rasterize_with_cell_size(scan, DEFAULT_CELL_SIZE_DEG)
}

/// Rasterize a thermal scan into a uniform temperature grid.
///
/// Malformed samples (missing geometry, non-point geometry, missing
/// temperature) are skipped silently. Well-formed samples whose coordinates
/// fall outside the bbox are clamped into the nearest edge cell.
///
/// # Errors
/// Returns `AnalysisError::InvalidInput` when `cell_size` is not a positive
/// finite number.
pub fn rasterize_with_cell_size(
    scan: &ThermalScan,
    cell_size: f64,
) -> Result<HeatGrid, AnalysisError> {
    if !(cell_size > 0.0 && cell_size.is_finite()) {
        return Err(AnalysisError::InvalidInput(format!(
            "cell_size must be a positive number of degrees, got {cell_size}"
        )));
    }

    let bbox = scan.bbox;
    let (rows, cols, effective_cell_size) = capped_dimensions(&bbox, cell_size);
    if effective_cell_size != cell_size {
        info!(
            requested = cell_size,
            effective = effective_cell_size,
            rows,
            cols,
            "grid cell cap engaged, coarsening raster"
        );
    }

    let mut cells: Vec<GridCell> = (0..rows * cols)
        .map(|i| {
            let row = i / cols;
            let col = i % cols;
            GridCell {
                avg_temp: None,
                sample_count: 0,
                center_lat: bbox.south() + (row as f64 + 0.5) * effective_cell_size,
                center_lon: bbox.west() + (col as f64 + 0.5) * effective_cell_size,
            }
        })
        .collect();

    // Running sums per cell; raw sample lists are never stored.
    let mut sums = vec![0.0f64; rows * cols];
    let mut skipped = 0usize;

    for sample in &scan.thermal_samples {
        let (Some((lon, lat)), Some(temp)) = (sample.point(), sample.temperature()) else {
            skipped += 1;
            continue;
        };
        let (row, col) = clamped_indices(lat, lon, &bbox, effective_cell_size, rows, cols);
        let idx = row * cols + col;
        sums[idx] += temp;
        cells[idx].sample_count += 1;
    }

    let mut cells_with_data = 0;
    for (idx, cell) in cells.iter_mut().enumerate() {
        if cell.sample_count > 0 {
            cell.avg_temp = Some(sums[idx] / f64::from(cell.sample_count));
            cells_with_data += 1;
        }
    }

    if skipped > 0 {
        debug!(skipped, "skipped malformed thermal samples");
    }
    debug!(
        rows,
        cols,
        cells_with_data,
        samples = scan.thermal_samples.len(),
        "rasterized thermal scan"
    );

    Ok(HeatGrid {
        cells,
        rows,
        cols,
        cell_size: effective_cell_size,
        bbox,
        statistics: scan.statistics,
        cells_with_data,
    })
}
