//! Zone scoring and plantability filtering.

pub mod heat;
pub mod plantability;

pub use heat::{score_heat_zones, HeatAnalysis};
pub use plantability::{
    filter_plantable, FilteringSummary, PlantabilityAnalysis, TOP_ZONE_LIMIT,
};
