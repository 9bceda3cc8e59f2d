//! Heat scoring: normalized per-cell heat scores and zone polygons.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core_types::{
    round2, BoundingBox, GeoPoint, HeatZone, Priority, TempRange, ZoneGeometry, ZoneStats,
    METERS_PER_DEG_LAT, METERS_PER_DEG_LON,
};
use crate::error::AnalysisError;
use crate::grid::{FeatureIndex, HeatGrid};

/// Urban boost per building in a cell.
const URBAN_BOOST_PER_BUILDING: f64 = 0.02;

/// Ceiling on the urban boost factor.
const URBAN_FACTOR_MAX: f64 = 1.2;

/// Scored zones with the temperature range they were normalized against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatAnalysis {
    /// All non-empty cells as zones, sorted descending by heat score.
    pub zones: Vec<HeatZone>,
    pub statistics: ZoneStats,
    pub bbox: BoundingBox,
    pub temp_range: TempRange,
}

/// Score every populated grid cell against the scan's temperature range.
///
/// Scores normalize linearly between the range minimum and maximum, then
/// get a small urban boost from building density, capped at 100. Zone ids
/// are assigned 1-based in row-major generation order before the final
/// descending sort; the sort is stable so equal scores keep scan order.
///
/// # Errors
/// Returns `AnalysisError::NoData` when no grid cell holds a temperature.
pub fn score_heat_zones(
    grid: &HeatGrid,
    index: &FeatureIndex,
) -> Result<HeatAnalysis, AnalysisError> {
    // Normalization uses the unrounded range; only the emitted echo is
    // rounded. Rounding the minimum up first would push the coldest cell's
    // score below zero.
    let raw_range = effective_temp_range(grid)?;
    // Degenerate range (all cells equal) normalizes against 1.0 so every
    // score lands at 0 rather than dividing by zero.
    let range = (raw_range.max_celsius - raw_range.min_celsius).max(1.0);

    let mut zones = Vec::with_capacity(grid.cells_with_data);
    let mut next_id: u32 = 1;

    for (row, col, cell) in grid.iter_cells() {
        let Some(temp) = cell.avg_temp else {
            continue;
        };

        let temp_score = (temp - raw_range.min_celsius) / range * 100.0;
        let density = index.building_density_at(row, col);
        let urban_factor = URBAN_FACTOR_MAX
            .min(1.0 + f64::from(density) * URBAN_BOOST_PER_BUILDING);
        // The clamp floor also covers a supplied summary whose minimum
        // overstates the actual coldest cell.
        let heat_score = (temp_score * urban_factor).clamp(0.0, 100.0);

        zones.push(HeatZone {
            id: next_id,
            geometry: cell_polygon(&grid.bbox, grid.cell_size, row, col),
            heat_score: round2(heat_score),
            temp_celsius: round2(temp),
            priority: Priority::from_score(heat_score),
            area_sqm: round2(cell_area_sqm(grid.cell_size, cell.center_lat)),
            center: GeoPoint::new(cell.center_lat, cell.center_lon),
            building_density: density,
            row,
            col,
            plantable: None,
            in_park: None,
            shade_coverage: None,
            shade_deficit: None,
            combined_score: None,
        });
        next_id += 1;
    }

    zones.sort_by(|a, b| b.heat_score.total_cmp(&a.heat_score));

    let statistics = ZoneStats::from_zones(&zones);
    info!(
        zones = zones.len(),
        critical = statistics.critical_count,
        high = statistics.high_count,
        "scored heat zones"
    );

    Ok(HeatAnalysis {
        zones,
        statistics,
        bbox: grid.bbox,
        temp_range: TempRange {
            min_celsius: round2(raw_range.min_celsius),
            max_celsius: round2(raw_range.max_celsius),
            mean_celsius: raw_range.mean_celsius.map(round2),
        },
    })
}

/// Temperature range for normalization: the fetcher summary when complete,
/// otherwise recomputed from the grid itself. Values are unrounded; the
/// emitted echo is rounded during assembly.
fn effective_temp_range(grid: &HeatGrid) -> Result<TempRange, AnalysisError> {
    if grid.cells_with_data == 0 {
        return Err(AnalysisError::NoData(
            "no temperature data available in grid".to_string(),
        ));
    }

    let stats = grid.statistics;
    if let (Some(min), Some(max)) = (stats.min_temp_celsius, stats.max_temp_celsius) {
        return Ok(TempRange {
            min_celsius: min,
            max_celsius: max,
            mean_celsius: stats.mean_temp_celsius,
        });
    }

    debug!("scan statistics incomplete, recomputing temperature range from grid");
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    let mut count = 0usize;
    for (_, _, cell) in grid.iter_cells() {
        if let Some(temp) = cell.avg_temp {
            min = min.min(temp);
            max = max.max(temp);
            sum += temp;
            count += 1;
        }
    }
    Ok(TempRange {
        min_celsius: min,
        max_celsius: max,
        mean_celsius: Some(sum / count as f64),
    })
}

/// Rectangular cell footprint in the grid frame.
fn cell_polygon(bbox: &BoundingBox, cell_size: f64, row: usize, col: usize) -> ZoneGeometry {
    let west = bbox.west() + col as f64 * cell_size;
    let south = bbox.south() + row as f64 * cell_size;
    ZoneGeometry::rect(west, south, west + cell_size, south + cell_size)
}

/// Flat-earth cell area: latitude extent at the fixed meters-per-degree
/// constant, longitude extent additionally scaled by `cos(latitude)`.
fn cell_area_sqm(cell_size: f64, center_lat: f64) -> f64 {
    let lat_meters = cell_size * METERS_PER_DEG_LAT;
    let lon_meters = cell_size * METERS_PER_DEG_LON * center_lat.to_radians().cos();
    lat_meters * lon_meters
}
