//! Core types shared across the analysis stages.

pub mod feature;
pub mod geo;
pub mod sample;
pub mod sun;
pub mod vec2;
pub mod zone;

pub use feature::{Building, LandFeature, LandUseData, Tree};
pub use geo::{BoundingBox, GeoPoint, METERS_PER_DEG_LAT, METERS_PER_DEG_LON};
pub use sample::{TempSummary, ThermalSample, ThermalScan};
pub use sun::{SunPath, SunPosition};
pub use vec2::Vec2;
pub use zone::{HeatZone, Priority, TempRange, ZoneGeometry, ZoneStats};

/// Round to one decimal place, matching the precision of reported
/// percentages.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round to two decimal places, matching the precision of reported scores
/// and temperatures.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
