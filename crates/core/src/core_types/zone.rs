//! Heat zone records flowing through the scoring and shade stages.
//!
//! A zone is born in the heat scorer with its score fields populated, is
//! tagged by the plantability filter, and gains shade fields in the deficit
//! aggregation. Stage-specific fields stay `None` until their stage runs so
//! partially processed zones are distinguishable from fully processed ones.

use serde::{Deserialize, Serialize};

use crate::core_types::geo::GeoPoint;

/// Zone priority tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Tier a 0-100 score: critical at 80, high at 60, medium at 40.
    ///
    /// Used for both heat scores and combined heat/shade scores so the two
    /// rankings stay comparable.
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Priority::Critical
        } else if score >= 60.0 {
            Priority::High
        } else if score >= 40.0 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    /// Tier a pedestrian-impact score: critical at 60, high at 40, medium
    /// at 20. Impact scores concentrate lower than heat scores because they
    /// multiply exposure by traffic share.
    pub fn from_impact_score(impact: f64) -> Self {
        if impact >= 60.0 {
            Priority::Critical
        } else if impact >= 40.0 {
            Priority::High
        } else if impact >= 20.0 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// Closed polygon ring geometry for a rectangular zone.
///
/// Shaped like a GeoJSON polygon: `coordinates` holds one ring of
/// `[lon, lat]` pairs whose last vertex repeats the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

impl ZoneGeometry {
    /// Axis-aligned rectangle ring from cell bounds.
    pub fn rect(west: f64, south: f64, east: f64, north: f64) -> Self {
        ZoneGeometry {
            kind: "Polygon".to_string(),
            coordinates: vec![vec![
                [west, south],
                [east, south],
                [east, north],
                [west, north],
                [west, south],
            ]],
        }
    }
}

/// One scored grid cell, the unit every later stage ranks and filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatZone {
    /// 1-based id assigned in row-major generation order, before sorting.
    pub id: u32,
    pub geometry: ZoneGeometry,
    /// Normalized heat score, 0-100.
    pub heat_score: f64,
    /// Average surface temperature of the source cell, celsius.
    pub temp_celsius: f64,
    pub priority: Priority,
    /// Approximate cell area in square meters.
    pub area_sqm: f64,
    pub center: GeoPoint,
    /// Buildings whose first vertex fell in this cell.
    pub building_density: u32,
    pub row: usize,
    pub col: usize,
    /// Set by the plantability filter on zones that survive it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plantable: Option<bool>,
    /// Set by the plantability filter when the zone overlaps a park.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_park: Option<bool>,
    /// Percent of peak-weighted shade cover at the zone center, 0-100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shade_coverage: Option<f64>,
    /// Percent shade shortfall (100 - coverage), 0-100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shade_deficit: Option<f64>,
    /// Heat and shade-deficit combined ranking score, 0-100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combined_score: Option<f64>,
}

/// Per-tier counts and score spread for a zone list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneStats {
    pub total_zones: usize,
    pub critical_count: usize,
    pub high_count: usize,
    pub medium_count: usize,
    pub low_count: usize,
    pub avg_heat_score: f64,
    pub max_heat_score: f64,
    pub min_heat_score: f64,
    /// Only populated by the plantability filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zones_in_parks: Option<usize>,
}

impl ZoneStats {
    /// Summarize stored (already rounded) zone heat scores.
    pub fn from_zones(zones: &[HeatZone]) -> Self {
        if zones.is_empty() {
            return ZoneStats::default();
        }
        let mut stats = ZoneStats {
            total_zones: zones.len(),
            ..ZoneStats::default()
        };
        let mut sum = 0.0;
        let mut max = f64::NEG_INFINITY;
        let mut min = f64::INFINITY;
        for zone in zones {
            match zone.priority {
                Priority::Critical => stats.critical_count += 1,
                Priority::High => stats.high_count += 1,
                Priority::Medium => stats.medium_count += 1,
                Priority::Low => stats.low_count += 1,
            }
            sum += zone.heat_score;
            max = max.max(zone.heat_score);
            min = min.min(zone.heat_score);
        }
        stats.avg_heat_score = crate::core_types::round2(sum / zones.len() as f64);
        stats.max_heat_score = crate::core_types::round2(max);
        stats.min_heat_score = crate::core_types::round2(min);
        stats
    }
}

/// Effective temperature range the heat scores were normalized against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempRange {
    pub min_celsius: f64,
    pub max_celsius: f64,
    /// Mean is informational and may be absent from the source summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_celsius: Option<f64>,
}
