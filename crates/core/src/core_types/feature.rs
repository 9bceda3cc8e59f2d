//! Land-use and vegetation features as delivered by the map-data fetcher.
//!
//! Features arrive with raw OpenStreetMap-style tag maps attached. The
//! constructors here resolve physical attributes (building height, canopy
//! radius) from those tags, falling back to fixed defaults when the tags
//! are absent or unparseable.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core_types::geo::GeoPoint;

/// Average floor height used when only a storey count is tagged.
pub const FLOOR_HEIGHT_METERS: f64 = 3.0;

/// Building height assumed when no usable tag exists.
pub const DEFAULT_BUILDING_HEIGHT_M: f64 = 10.0;

/// Tree height assumed when no usable tag exists.
pub const DEFAULT_TREE_HEIGHT_M: f64 = 8.0;

/// Canopy radius assumed when neither species nor crown diameter is tagged.
pub const DEFAULT_CANOPY_RADIUS_M: f64 = 4.0;

/// A categorized vector feature: building footprint, park, water body, or
/// wooded area. The category is carried by the [`LandUseData`] bucket the
/// feature sits in, not by the feature itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandFeature {
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub geometry: Vec<GeoPoint>,
}

impl LandFeature {
    /// Feature with geometry only, for callers that have already dropped tags.
    pub fn from_vertices(geometry: Vec<GeoPoint>) -> Self {
        LandFeature {
            tags: HashMap::new(),
            geometry,
        }
    }

    /// First vertex of the feature outline, used for grid binning.
    pub fn first_vertex(&self) -> Option<GeoPoint> {
        self.geometry.first().copied()
    }
}

/// Land-use features bucketed by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandUseData {
    #[serde(default)]
    pub buildings: Vec<LandFeature>,
    #[serde(default)]
    pub parks: Vec<LandFeature>,
    #[serde(default)]
    pub water: Vec<LandFeature>,
    #[serde(default)]
    pub forests: Vec<LandFeature>,
}

impl LandUseData {
    pub fn total_features(&self) -> usize {
        self.buildings.len() + self.parks.len() + self.water.len() + self.forests.len()
    }
}

/// A building footprint with a resolved or defaulted roof height.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Building {
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub geometry: Vec<GeoPoint>,
}

impl Building {
    pub fn new(height: f64, geometry: Vec<GeoPoint>) -> Self {
        Building {
            height: Some(height),
            geometry,
        }
    }

    /// Build from raw tags, resolving height in priority order:
    /// explicit `height` tag, then `building:levels` (storeys times
    /// [`FLOOR_HEIGHT_METERS`]), then [`DEFAULT_BUILDING_HEIGHT_M`].
    pub fn from_tagged(tags: &HashMap<String, String>, geometry: Vec<GeoPoint>) -> Self {
        Building {
            height: Some(resolve_building_height(tags)),
            geometry,
        }
    }

    /// Roof height in meters, defaulted when unknown.
    pub fn height_m(&self) -> f64 {
        self.height.unwrap_or(DEFAULT_BUILDING_HEIGHT_M)
    }

    /// Arithmetic mean of the footprint vertices.
    ///
    /// Returns `None` for an empty footprint; such buildings cast no shadow.
    pub fn centroid(&self) -> Option<GeoPoint> {
        if self.geometry.is_empty() {
            return None;
        }
        let n = self.geometry.len() as f64;
        let (lat_sum, lon_sum) = self
            .geometry
            .iter()
            .fold((0.0, 0.0), |(lat, lon), v| (lat + v.lat, lon + v.lon));
        Some(GeoPoint::new(lat_sum / n, lon_sum / n))
    }
}

/// An individual tree with resolved or defaulted height and canopy radius.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub canopy_radius: Option<f64>,
}

impl Tree {
    pub fn new(lat: f64, lon: f64, height: f64, canopy_radius: f64) -> Self {
        Tree {
            lat,
            lon,
            height: Some(height),
            canopy_radius: Some(canopy_radius),
        }
    }

    /// Build from raw tags. Canopy radius prefers an explicit
    /// `diameter_crown` tag (halved), then a per-species estimate; height
    /// comes from the `height` tag or [`DEFAULT_TREE_HEIGHT_M`].
    pub fn from_tagged(lat: f64, lon: f64, tags: &HashMap<String, String>) -> Self {
        Tree {
            lat,
            lon,
            height: Some(resolve_tree_height(tags)),
            canopy_radius: Some(resolve_canopy_radius(tags)),
        }
    }

    pub fn height_m(&self) -> f64 {
        self.height.unwrap_or(DEFAULT_TREE_HEIGHT_M)
    }

    pub fn canopy_radius_m(&self) -> f64 {
        self.canopy_radius.unwrap_or(DEFAULT_CANOPY_RADIUS_M)
    }
}

/// Parse a tagged length like `"12"`, `"12 m"`, or `"12m"` into meters.
fn parse_meters(raw: &str) -> Option<f64> {
    raw.replace('m', "").trim().parse::<f64>().ok()
}

fn resolve_building_height(tags: &HashMap<String, String>) -> f64 {
    if let Some(height) = tags.get("height").and_then(|raw| parse_meters(raw)) {
        return height;
    }
    if let Some(levels) = tags
        .get("building:levels")
        .and_then(|raw| raw.trim().parse::<i64>().ok())
    {
        return levels as f64 * FLOOR_HEIGHT_METERS;
    }
    DEFAULT_BUILDING_HEIGHT_M
}

fn resolve_tree_height(tags: &HashMap<String, String>) -> f64 {
    tags.get("height")
        .and_then(|raw| parse_meters(raw))
        .unwrap_or(DEFAULT_TREE_HEIGHT_M)
}

fn resolve_canopy_radius(tags: &HashMap<String, String>) -> f64 {
    if let Some(radius) = tags
        .get("diameter_crown")
        .and_then(|raw| parse_meters(raw))
        .map(|diameter| diameter / 2.0)
    {
        return radius;
    }
    let species = tags
        .get("species")
        .or_else(|| tags.get("genus"))
        .map_or_else(|| "default".to_string(), |s| s.to_lowercase());
    species_canopy_radius(&species)
}

/// Typical canopy radius by species keyword, in meters.
fn species_canopy_radius(species: &str) -> f64 {
    match species {
        "oak" => 8.0,
        "maple" => 6.0,
        "palm" => 3.0,
        "small" => 2.5,
        "large" => 10.0,
        // "pine" matches the default
        _ => DEFAULT_CANOPY_RADIUS_M,
    }
}
