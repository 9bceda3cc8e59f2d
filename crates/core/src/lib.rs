//! Urban cooling analysis core.
//!
//! Turns scattered geospatial samples over a bounding box into a ranked
//! set of candidate zones for tree-planting interventions:
//!
//! - thermal point samples are rasterized into a uniform grid and scored
//!   for heat, with a small urban-density boost;
//! - land-use features exclude unplantable cells (water, forest, dense
//!   construction) and mark park candidates;
//! - optionally, building and tree geometry casts simulated shadows across
//!   daylight hours, and the resulting shade deficit re-ranks the zones.
//!
//! The crate is a pure computation library: all network fetching, HTTP
//! handling, and sequencing of stages beyond [`pipeline`]'s helpers belong
//! to the caller. Geometry uses flat-earth degree/meter approximations
//! suitable for city-scale bounding boxes only.

pub mod core_types;
pub mod error;
pub mod grid;
pub mod pipeline;
pub mod scoring;
pub mod shade;
pub mod solar;

pub use core_types::{
    BoundingBox, Building, GeoPoint, HeatZone, LandFeature, LandUseData, Priority, SunPath,
    SunPosition, TempSummary, ThermalSample, ThermalScan, Tree, ZoneStats,
};
pub use error::AnalysisError;
pub use grid::{FeatureIndex, HeatGrid, DEFAULT_CELL_SIZE_DEG, MAX_GRID_CELLS};
pub use pipeline::{
    analyze_combined, analyze_heat, priority_planting_zones, CombinedAnalysis, PriorityZone,
    DEFAULT_SHORTLIST_LIMIT,
};
pub use scoring::{
    filter_plantable, score_heat_zones, FilteringSummary, HeatAnalysis, PlantabilityAnalysis,
    TOP_ZONE_LIMIT,
};
pub use shade::{
    pedestrian_exposure, shade_deficit, simulate_hours, simulate_shade, summarize_hours,
    DeficitAnalysis, HourlyShade, PeakHours, PedestrianArea, PedestrianExposure, ShadeGrid,
    ShadeSummary, DEFAULT_SHADE_GRID_SIZE_DEG,
};
pub use solar::sun_path;
