//! Geographic primitives shared by every analysis stage.
//!
//! All geometry is unprojected WGS84 lon/lat. Meter conversions use the
//! fixed mid-latitude constants below rather than a real projection; the
//! analysis targets city-scale bounding boxes where the error is small
//! relative to grid resolution.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Meters per degree of latitude.
pub const METERS_PER_DEG_LAT: f64 = 111_000.0;

/// Meters per degree of longitude at mid latitudes.
///
/// Longitude spacing shrinks with latitude; area math additionally scales
/// this by `cos(latitude)` while shadow offsets use it as-is.
pub const METERS_PER_DEG_LON: f64 = 85_000.0;

/// A single lon/lat coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        GeoPoint { lat, lon }
    }
}

/// Validated geographic bounding box.
///
/// Serializes as the conventional 4-element array `[west, south, east, north]`
/// so it matches the payloads produced by the upstream data fetchers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    west: f64,
    south: f64,
    east: f64,
    north: f64,
}

impl BoundingBox {
    /// Create a bounding box, validating coordinate ranges and ordering.
    ///
    /// # Errors
    /// Returns `AnalysisError::InvalidInput` unless
    /// `-90 <= south < north <= 90` and `-180 <= west < east <= 180`.
    /// NaN coordinates fail both comparisons and are rejected.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Result<Self, AnalysisError> {
        if !(-90.0 <= south && south < north && north <= 90.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "invalid latitude range: south={south}, north={north}"
            )));
        }
        if !(-180.0 <= west && west < east && east <= 180.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "invalid longitude range: west={west}, east={east}"
            )));
        }
        Ok(BoundingBox {
            west,
            south,
            east,
            north,
        })
    }

    /// Parse a bounding box from a raw coordinate slice.
    ///
    /// # Errors
    /// Returns `AnalysisError::InvalidInput` when the slice is not exactly
    /// `[west, south, east, north]` or the coordinates fail validation.
    pub fn from_slice(raw: &[f64]) -> Result<Self, AnalysisError> {
        if raw.len() != 4 {
            return Err(AnalysisError::InvalidInput(format!(
                "bbox must contain exactly 4 values [west, south, east, north], got {}",
                raw.len()
            )));
        }
        Self::new(raw[0], raw[1], raw[2], raw[3])
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn east(&self) -> f64 {
        self.east
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    /// Longitudinal extent in degrees.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Latitudinal extent in degrees.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Geometric center of the box.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }
}

impl TryFrom<[f64; 4]> for BoundingBox {
    type Error = AnalysisError;

    fn try_from(raw: [f64; 4]) -> Result<Self, Self::Error> {
        Self::new(raw[0], raw[1], raw[2], raw[3])
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(bbox: BoundingBox) -> Self {
        [bbox.west, bbox.south, bbox.east, bbox.north]
    }
}
