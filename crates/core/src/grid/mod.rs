//! Rasterization and spatial indexing over the analysis bounding box.

pub mod feature_index;
pub mod raster;

pub use feature_index::FeatureIndex;
pub use raster::{GridCell, HeatGrid, DEFAULT_CELL_SIZE_DEG, MAX_GRID_CELLS};
