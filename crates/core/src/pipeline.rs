//! Pure-function orchestration of the analysis stages.
//!
//! Every stage takes the prior stage's output and returns its own; nothing
//! here holds state between calls, so concurrent analyses never share
//! grids or zone lists. This module also owns the decisions the stages
//! deliberately leave to their caller: which hours to simulate, the peak
//! window's timezone offset, and truncating the aggregator's full ranking
//! to a shortlist.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core_types::{
    round1, Building, GeoPoint, HeatZone, Priority, SunPath, ThermalScan, Tree,
};
use crate::error::AnalysisError;
use crate::grid::{raster, FeatureIndex};
use crate::scoring::{self, PlantabilityAnalysis, TOP_ZONE_LIMIT};
use crate::shade::{self, DeficitSummary, PeakHours, PedestrianExposure, ShadeSummary};
use crate::solar;

/// Heat-only analysis chain: rasterize, index, score, filter.
///
/// # Errors
/// Propagates `InvalidInput` from rasterization and `NoData` when the grid
/// holds no temperatures.
pub fn analyze_heat(
    scan: &ThermalScan,
    land_use: &crate::core_types::LandUseData,
) -> Result<PlantabilityAnalysis, AnalysisError> {
    let grid = raster::rasterize(scan)?;
    let index = FeatureIndex::build(land_use, &grid);
    let scored = scoring::score_heat_zones(&grid, &index)?;
    Ok(scoring::filter_plantable(&scored, &index))
}

/// Combined heat and shade analysis output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedAnalysis {
    /// Top zones by combined score, truncated here at the orchestration
    /// boundary; the aggregator itself ranks without truncating.
    pub zones: Vec<HeatZone>,
    pub deficit_summary: DeficitSummary,
    pub shade_summary: ShadeSummary,
    pub sun_path: SunPath,
    pub filtering_summary: crate::scoring::FilteringSummary,
}

/// Full chain: heat analysis, per-hour shadow simulation over all daylight
/// hours, and shade-deficit re-ranking.
///
/// `utc_offset_hours` places the 10:00-16:00 local peak window in UTC;
/// callers must pass the analyzed location's offset rather than relying on
/// a UTC default.
///
/// # Errors
/// Propagates stage errors; a day with no daylight soft-fails inside the
/// aggregation instead of erroring, per its contract.
pub fn analyze_combined(
    scan: &ThermalScan,
    land_use: &crate::core_types::LandUseData,
    buildings: &[Building],
    trees: &[Tree],
    date: &str,
    utc_offset_hours: i32,
    shade_grid_size: f64,
) -> Result<CombinedAnalysis, AnalysisError> {
    let plantable = analyze_heat(scan, land_use)?;

    let center = scan.bbox.center();
    let sun_path = solar::sun_path(center.lat, center.lon, date)?;
    let hourly = shade::simulate_hours(
        buildings,
        trees,
        &sun_path,
        scan.bbox,
        None,
        shade_grid_size,
    );

    let peak_hours = PeakHours::local(utc_offset_hours);
    let shade_summary = shade::summarize_hours(&hourly, &peak_hours);
    let deficit = shade::shade_deficit(&hourly, &plantable.zones, &peak_hours);

    let mut zones = deficit.zones;
    zones.truncate(TOP_ZONE_LIMIT);
    info!(
        zones = zones.len(),
        daylight_hours = shade_summary.total_daylight_hours,
        "combined heat and shade analysis complete"
    );

    Ok(CombinedAnalysis {
        zones,
        deficit_summary: deficit.summary,
        shade_summary,
        sun_path,
        filtering_summary: plantable.filtering_summary,
    })
}

/// Planting shortlist entries returned by default.
pub const DEFAULT_SHORTLIST_LIMIT: usize = 10;

/// Proximity window for matching a pedestrian area to a zone, degrees.
const PEDESTRIAN_MATCH_DEG: f64 = 0.001;

/// Fraction of a pedestrian impact added to a matched zone's score.
const PEDESTRIAN_BOOST_FACTOR: f64 = 0.3;

/// A shortlisted planting recommendation with its supporting reasons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityZone {
    pub id: u32,
    pub center: GeoPoint,
    pub heat_score: f64,
    pub shade_deficit: f64,
    pub combined_score: f64,
    pub priority: Priority,
    /// Human-readable grounds for inclusion.
    pub reasons: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pedestrian_impact: Option<f64>,
}

/// Merge the deficit ranking with optional pedestrian exposure into a
/// final planting shortlist.
///
/// Zones near a pedestrian area (within roughly 100 m on each axis) get a
/// score boost proportional to that area's impact and may be promoted a
/// tier. The shortlist is re-sorted on the boosted scores and capped at
/// `max_zones`.
pub fn priority_planting_zones(
    deficit_zones: &[HeatZone],
    pedestrian: Option<&PedestrianExposure>,
    max_zones: usize,
) -> Vec<PriorityZone> {
    let mut shortlist: Vec<PriorityZone> = deficit_zones
        .iter()
        .map(|zone| {
            let heat_score = zone.heat_score;
            let shade_deficit = zone.shade_deficit.unwrap_or(0.0);
            let combined_score = zone.combined_score.unwrap_or(0.0);

            let mut reasons = Vec::new();
            if heat_score >= 70.0 {
                reasons.push("High heat zone".to_string());
            }
            if shade_deficit >= 70.0 {
                reasons.push("Severe shade deficit".to_string());
            }
            if combined_score >= 70.0 {
                reasons.push("Critical combined score".to_string());
            }

            PriorityZone {
                id: zone.id,
                center: zone.center,
                heat_score,
                shade_deficit,
                combined_score,
                priority: zone.priority,
                reasons,
                pedestrian_impact: None,
            }
        })
        .collect();

    if let Some(exposure) = pedestrian {
        for zone in &mut shortlist {
            let nearby = exposure.areas.iter().find(|area| {
                (zone.center.lat - area.center.lat).abs() < PEDESTRIAN_MATCH_DEG
                    && (zone.center.lon - area.center.lon).abs() < PEDESTRIAN_MATCH_DEG
            });
            if let Some(area) = nearby {
                zone.combined_score = round1(
                    zone.combined_score + area.pedestrian_impact * PEDESTRIAN_BOOST_FACTOR,
                );
                zone.pedestrian_impact = Some(area.pedestrian_impact);
                zone.reasons.push("High pedestrian traffic area".to_string());
                // Promote only; the boost never demotes a tier.
                if zone.combined_score >= 70.0 {
                    zone.priority = Priority::Critical;
                } else if zone.combined_score >= 50.0 {
                    zone.priority = Priority::High;
                }
            }
        }
    }

    shortlist.sort_by(|a, b| b.combined_score.total_cmp(&a.combined_score));
    shortlist.truncate(max_zones);
    shortlist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::ZoneGeometry;
    use crate::shade::{ExposedArea, PedestrianSummary};

    fn deficit_zone(id: u32, heat: f64, deficit: f64, lat: f64, lon: f64) -> HeatZone {
        let combined = (heat / 100.0) * (deficit / 100.0) * 100.0;
        HeatZone {
            id,
            geometry: ZoneGeometry::rect(lon, lat, lon + 0.001, lat + 0.001),
            heat_score: heat,
            temp_celsius: 33.0,
            priority: Priority::from_score(combined),
            area_sqm: 9000.0,
            center: GeoPoint::new(lat, lon),
            building_density: 0,
            row: 0,
            col: 0,
            plantable: Some(true),
            in_park: Some(false),
            shade_coverage: Some(100.0 - deficit),
            shade_deficit: Some(deficit),
            combined_score: Some(combined),
        }
    }

    fn exposure(areas: Vec<ExposedArea>) -> PedestrianExposure {
        PedestrianExposure {
            summary: PedestrianSummary {
                total_areas: areas.len(),
                avg_sun_exposure: 0.0,
                avg_pedestrian_impact: 0.0,
                critical_areas_count: 0,
                high_priority_count: 0,
                peak_pedestrian_hours: vec![8, 9, 12, 13, 17, 18],
                error: None,
            },
            areas,
        }
    }

    #[test]
    fn test_reasons_follow_thresholds() {
        let zones = vec![
            deficit_zone(1, 90.0, 85.0, 37.75, -122.40), // all three reasons
            deficit_zone(2, 50.0, 40.0, 37.76, -122.41), // none
        ];
        let shortlist = priority_planting_zones(&zones, None, 10);
        assert_eq!(shortlist.len(), 2);
        assert_eq!(
            shortlist[0].reasons,
            vec!["High heat zone", "Severe shade deficit", "Critical combined score"]
        );
        assert!(shortlist[1].reasons.is_empty());
        assert!(shortlist[0].pedestrian_impact.is_none());
    }

    #[test]
    fn test_pedestrian_boost_promotes_nearby_zone() {
        // Combined 42.0; boost of 0.3 * 60 = 18 lifts it to 60.0 -> high.
        let zones = vec![deficit_zone(1, 70.0, 60.0, 37.75, -122.40)];
        let areas = exposure(vec![ExposedArea {
            name: None,
            center: GeoPoint::new(37.7505, -122.4005), // within 0.001 deg
            traffic_estimate: 80.0,
            shade_coverage: 20.0,
            sun_exposure: 80.0,
            pedestrian_impact: 60.0,
            priority: Priority::Critical,
        }]);
        let shortlist = priority_planting_zones(&zones, Some(&areas), 10);
        assert_eq!(shortlist[0].combined_score, 60.0);
        assert_eq!(shortlist[0].priority, Priority::High);
        assert_eq!(shortlist[0].pedestrian_impact, Some(60.0));
        assert!(shortlist[0]
            .reasons
            .contains(&"High pedestrian traffic area".to_string()));
    }

    #[test]
    fn test_distant_pedestrian_area_ignored() {
        let zones = vec![deficit_zone(1, 70.0, 60.0, 37.75, -122.40)];
        let areas = exposure(vec![ExposedArea {
            name: None,
            center: GeoPoint::new(37.76, -122.41), // > 0.001 deg away
            traffic_estimate: 80.0,
            shade_coverage: 20.0,
            sun_exposure: 80.0,
            pedestrian_impact: 60.0,
            priority: Priority::Critical,
        }]);
        let shortlist = priority_planting_zones(&zones, Some(&areas), 10);
        assert_eq!(shortlist[0].combined_score, 42.0);
        assert!(shortlist[0].pedestrian_impact.is_none());
    }

    #[test]
    fn test_shortlist_resorted_and_capped() {
        let zones: Vec<HeatZone> = (0..15)
            .map(|i| {
                deficit_zone(
                    i + 1,
                    50.0 + f64::from(i) * 3.0,
                    80.0,
                    37.70 + f64::from(i) * 0.01,
                    -122.40,
                )
            })
            .collect();
        let shortlist = priority_planting_zones(&zones, None, DEFAULT_SHORTLIST_LIMIT);
        assert_eq!(shortlist.len(), DEFAULT_SHORTLIST_LIMIT);
        let scores: Vec<f64> = shortlist.iter().map(|z| z.combined_score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(shortlist[0].id, 15);
    }
}
