//! Shadow casting from building and tree geometry for one sun position.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core_types::{
    round1, BoundingBox, Building, SunPosition, Tree, Vec2, METERS_PER_DEG_LAT,
    METERS_PER_DEG_LON,
};
use crate::grid::MAX_GRID_CELLS;

/// Default shadow grid cell size in degrees, roughly 50 m. Deliberately
/// finer than the heat raster; the two grids are reconciled by lat/lon
/// lookup, never by shared indices.
pub const DEFAULT_SHADE_GRID_SIZE_DEG: f64 = 0.0005;

/// Sample points along each shadow ray (steps + 1, both ends inclusive).
const SHADOW_RAY_STEPS: usize = 20;

/// Shade added per ray sample to a cell, saturating at full shade.
const SHADE_PER_MARK: f64 = 0.3;

/// Altitude floor in degrees; below this shadows would stretch without
/// bound as `1/tan` blows up near the horizon.
const MIN_SHADOW_ALTITUDE_DEG: f64 = 1.0;

/// Per-cell shade coverage in `[0, 1]`, row-major from the south-west
/// corner of the bbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadeGrid {
    values: Vec<f64>,
    pub rows: usize,
    pub cols: usize,
    pub bbox: BoundingBox,
    pub grid_size: f64,
}

impl ShadeGrid {
    /// Zeroed grid over a bbox, scaling `grid_size` up as needed to keep
    /// the cell count under [`MAX_GRID_CELLS`].
    pub fn empty(bbox: BoundingBox, grid_size: f64) -> Self {
        let (rows, cols, grid_size) = capped_dimensions(&bbox, grid_size);
        ShadeGrid {
            values: vec![0.0; rows * cols],
            rows,
            cols,
            bbox,
            grid_size,
        }
    }

    /// Uniform-value grid, for fixtures and tests.
    pub fn uniform(bbox: BoundingBox, grid_size: f64, value: f64) -> Self {
        let mut grid = Self::empty(bbox, grid_size);
        grid.values.fill(value.clamp(0.0, 1.0));
        grid
    }

    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }

    /// Overwrite one cell, clamped into the valid coverage range.
    pub fn set_value(&mut self, row: usize, col: usize, value: f64) {
        self.values[row * self.cols + col] = value.clamp(0.0, 1.0);
    }

    /// Unclamped accumulation, for weighted averaging before normalization.
    pub(crate) fn add_value(&mut self, row: usize, col: usize, value: f64) {
        self.values[row * self.cols + col] += value;
    }

    pub(crate) fn scale(&mut self, factor: f64) {
        for value in &mut self.values {
            *value *= factor;
        }
    }

    /// Grid indices for a coordinate, clamped to the nearest edge cell.
    pub fn clamped_cell_at(&self, lat: f64, lon: f64) -> (usize, usize) {
        let col = ((lon - self.bbox.west()) / self.grid_size).floor() as i64;
        let row = ((lat - self.bbox.south()) / self.grid_size).floor() as i64;
        (
            row.clamp(0, self.rows as i64 - 1) as usize,
            col.clamp(0, self.cols as i64 - 1) as usize,
        )
    }

    /// Fraction of cells with any (> 0) shade, not an intensity average.
    fn shaded_fraction(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let shaded = self.values.iter().filter(|v| **v > 0.0).count();
        shaded as f64 / self.values.len() as f64
    }

    /// Add shade at a cell neighborhood around a ray sample point.
    ///
    /// `radius` of 0 marks the exact cell only. Each mark saturates the
    /// cell at 1.0; marks from different ray samples still accumulate up
    /// to that cap.
    fn mark(&mut self, lat: f64, lon: f64, radius: i64) {
        let col = ((lon - self.bbox.west()) / self.grid_size).floor() as i64;
        let row = ((lat - self.bbox.south()) / self.grid_size).floor() as i64;
        for dr in -radius..=radius {
            for dc in -radius..=radius {
                let (r, c) = (row + dr, col + dc);
                if r >= 0 && (r as usize) < self.rows && c >= 0 && (c as usize) < self.cols {
                    let idx = r as usize * self.cols + c as usize;
                    self.values[idx] = (self.values[idx] + SHADE_PER_MARK).min(1.0);
                }
            }
        }
    }
}

/// Shadow simulation output for one hour.
///
/// At night there is no grid and no per-source split; `coverage_percent`
/// reports 100 and `is_night` distinguishes the case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyShade {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<ShadeGrid>,
    /// Percent of cells with any shade contribution.
    pub coverage_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_shade_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree_shade_percent: Option<f64>,
    pub hour: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sun_altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sun_azimuth: Option<f64>,
    pub is_night: bool,
}

/// Simulate shade coverage for one sun position.
///
/// Each obstacle casts a shadow ray from its base position, pointing away
/// from the sun, with length `height / tan(altitude)`. Cells along the ray
/// accumulate shade; building rays mark the exact cell per sample while
/// tree rays mark a square neighborhood sized from the canopy radius.
/// When the sun is below the horizon the simulation short-circuits to full
/// coverage with no grid.
pub fn simulate_shade(
    buildings: &[Building],
    trees: &[Tree],
    sun: &SunPosition,
    bbox: BoundingBox,
    grid_size: f64,
) -> HourlyShade {
    if sun.altitude <= 0.0 {
        debug!(hour = sun.hour, "sun below horizon, full shade short-circuit");
        return HourlyShade {
            grid: None,
            coverage_percent: 100.0,
            building_shade_percent: None,
            tree_shade_percent: None,
            hour: sun.hour,
            sun_altitude: None,
            sun_azimuth: None,
            is_night: true,
        };
    }

    let mut building_shade = ShadeGrid::empty(bbox, grid_size);
    let mut tree_shade = ShadeGrid::empty(bbox, grid_size);

    // Shadow points opposite the sun; length scales with 1/tan(altitude),
    // floored to keep near-horizon shadows finite.
    let shadow_azimuth = (sun.azimuth + 180.0) % 360.0;
    let shadow_length_mult = 1.0 / sun.altitude.max(MIN_SHADOW_ALTITUDE_DEG).to_radians().tan();

    // Degrees of displacement per meter of shadow, x = lon, y = lat. The
    // longitude constant is the fixed mid-latitude value, not recomputed
    // per obstacle.
    let azimuth_rad = shadow_azimuth.to_radians();
    let per_meter = Vec2::new(
        azimuth_rad.sin() / METERS_PER_DEG_LON,
        azimuth_rad.cos() / METERS_PER_DEG_LAT,
    );

    for building in buildings {
        let Some(base) = building.centroid() else {
            continue;
        };
        let offset = per_meter * (building.height_m() * shadow_length_mult);
        cast_ray(&mut building_shade, base.lat, base.lon, offset, 0);
    }

    for tree in trees {
        let offset = per_meter * (tree.height_m() * shadow_length_mult);
        let spread_deg = tree.canopy_radius_m() / METERS_PER_DEG_LAT;
        let radius = (spread_deg / tree_shade.grid_size).floor() as i64 + 1;
        cast_ray(&mut tree_shade, tree.lat, tree.lon, offset, radius);
    }

    // Combine the two source grids, capping at full shade per cell.
    let mut combined = ShadeGrid::empty(bbox, building_shade.grid_size);
    for idx in 0..combined.values.len() {
        combined.values[idx] = (building_shade.values[idx] + tree_shade.values[idx]).min(1.0);
    }

    let result = HourlyShade {
        coverage_percent: round1(combined.shaded_fraction() * 100.0),
        building_shade_percent: Some(round1(building_shade.shaded_fraction() * 100.0)),
        tree_shade_percent: Some(round1(tree_shade.shaded_fraction() * 100.0)),
        hour: sun.hour,
        sun_altitude: Some(sun.altitude),
        sun_azimuth: Some(sun.azimuth),
        is_night: false,
        grid: Some(combined),
    };
    info!(
        hour = sun.hour,
        coverage = result.coverage_percent,
        buildings = buildings.len(),
        trees = trees.len(),
        "simulated shade coverage"
    );
    result
}

/// March sample points from an obstacle base along its shadow offset,
/// marking cells at each step.
fn cast_ray(grid: &mut ShadeGrid, start_lat: f64, start_lon: f64, offset: Vec2, radius: i64) {
    for step in 0..=SHADOW_RAY_STEPS {
        let t = step as f64 / SHADOW_RAY_STEPS as f64;
        grid.mark(start_lat + t * offset.y, start_lon + t * offset.x, radius);
    }
}

/// Shadow-grid dimensions with the allocation cap applied.
///
/// Sizing intentionally differs from the heat raster: the shadow grid uses
/// `floor + 1` so a box spanning an exact multiple of `grid_size` still
/// covers its north and east edges.
fn capped_dimensions(bbox: &BoundingBox, mut grid_size: f64) -> (usize, usize, f64) {
    loop {
        let cols = (bbox.width() / grid_size) as usize + 1;
        let rows = (bbox.height() / grid_size) as usize + 1;
        if rows * cols <= MAX_GRID_CELLS {
            return (rows, cols, grid_size);
        }
        let scale = ((rows * cols) as f64 / MAX_GRID_CELLS as f64).sqrt();
        grid_size *= scale;
    }
}
