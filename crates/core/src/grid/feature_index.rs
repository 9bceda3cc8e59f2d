//! Land-use feature indexing over the heat grid frame.
//!
//! Membership is decided by a first-vertex-in-cell test, not true polygon
//! rasterization: a feature belongs to the cell its first outline vertex
//! falls in. This deliberately simple approximation is part of the output
//! contract; upgrading it to real overlap testing would shift zone scores
//! and exclusion counts.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::core_types::{LandFeature, LandUseData};
use crate::grid::raster::{clamped_indices, HeatGrid};

/// Per-cell feature counts and category membership sets, all keyed by
/// `(row, col)` in the heat grid's frame.
#[derive(Debug, Clone, Default)]
pub struct FeatureIndex {
    /// Buildings whose first vertex landed in each cell. Out-of-bbox
    /// vertices clamp to the nearest edge cell so the density total always
    /// matches the building count.
    pub building_density: FxHashMap<(usize, usize), u32>,
    pub water_cells: FxHashSet<(usize, usize)>,
    pub forest_cells: FxHashSet<(usize, usize)>,
    pub building_cells: FxHashSet<(usize, usize)>,
    pub park_cells: FxHashSet<(usize, usize)>,
}

impl FeatureIndex {
    /// Index land-use features against a rasterized grid's frame.
    pub fn build(land_use: &LandUseData, grid: &HeatGrid) -> Self {
        let index = FeatureIndex {
            building_density: density_map(&land_use.buildings, grid),
            water_cells: membership_cells(&land_use.water, grid),
            forest_cells: membership_cells(&land_use.forests, grid),
            building_cells: membership_cells(&land_use.buildings, grid),
            park_cells: membership_cells(&land_use.parks, grid),
        };
        debug!(
            buildings = land_use.buildings.len(),
            water_cells = index.water_cells.len(),
            forest_cells = index.forest_cells.len(),
            park_cells = index.park_cells.len(),
            "indexed land-use features"
        );
        index
    }

    /// Building count for a cell, zero when no building vertex landed there.
    pub fn building_density_at(&self, row: usize, col: usize) -> u32 {
        self.building_density.get(&(row, col)).copied().unwrap_or(0)
    }
}

fn density_map(features: &[LandFeature], grid: &HeatGrid) -> FxHashMap<(usize, usize), u32> {
    let mut density = FxHashMap::default();
    for feature in features {
        let Some(vertex) = feature.first_vertex() else {
            continue;
        };
        let key = grid.clamped_cell_at(vertex.lat, vertex.lon);
        *density.entry(key).or_insert(0) += 1;
    }
    density
}

/// Membership differs from density in one respect: vertices outside the
/// bbox are dropped rather than clamped, so a feature beyond the edge never
/// claims an edge cell.
fn membership_cells(features: &[LandFeature], grid: &HeatGrid) -> FxHashSet<(usize, usize)> {
    let bbox = grid.bbox;
    let mut cells = FxHashSet::default();
    for feature in features {
        let Some(vertex) = feature.first_vertex() else {
            continue;
        };
        if vertex.lon < bbox.west()
            || vertex.lon > bbox.east()
            || vertex.lat < bbox.south()
            || vertex.lat > bbox.north()
        {
            continue;
        }
        cells.insert(clamped_indices(
            vertex.lat,
            vertex.lon,
            &bbox,
            grid.cell_size,
            grid.rows,
            grid.cols,
        ));
    }
    cells
}
