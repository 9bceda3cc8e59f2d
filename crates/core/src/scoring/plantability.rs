//! Plantability filtering: drop zones where trees cannot go, keep the
//! hottest survivors.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core_types::{BoundingBox, HeatZone, TempRange, ZoneStats};
use crate::grid::FeatureIndex;
use crate::scoring::heat::HeatAnalysis;

/// Zones returned after filtering, at most.
pub const TOP_ZONE_LIMIT: usize = 20;

/// Building count above which a building-occupied cell is excluded. At or
/// below this a few footprints still leave plantable ground between them.
const DENSE_BUILDING_THRESHOLD: u32 = 5;

/// Counts describing what the filter kept and dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteringSummary {
    pub original_count: usize,
    /// Survivors before the top-N truncation.
    pub plantable_count: usize,
    pub returned_count: usize,
    pub excluded_water: usize,
    pub excluded_forest: usize,
    pub excluded_building: usize,
    /// Survivors overlapping a park, across the full survivor list.
    pub marked_in_parks: usize,
}

/// Filtered, truncated zone ranking plus filter accounting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantabilityAnalysis {
    /// Top plantable zones, descending by heat score.
    pub zones: Vec<HeatZone>,
    /// Recomputed over the truncated list only.
    pub statistics: ZoneStats,
    pub filtering_summary: FilteringSummary,
    pub bbox: BoundingBox,
    pub temp_range: TempRange,
}

/// Exclude unplantable zones and truncate to the hottest survivors.
///
/// Exclusion is first-match-wins in a fixed order: water, then forest, then
/// densely built cells. A cell that is both water and forest counts only as
/// a water exclusion. Survivors are tagged `plantable` and `in_park`,
/// re-sorted descending by heat score, and capped at [`TOP_ZONE_LIMIT`].
pub fn filter_plantable(analysis: &HeatAnalysis, index: &FeatureIndex) -> PlantabilityAnalysis {
    let mut summary = FilteringSummary {
        original_count: analysis.zones.len(),
        ..FilteringSummary::default()
    };

    let mut survivors: Vec<HeatZone> = Vec::new();
    for zone in &analysis.zones {
        let key = (zone.row, zone.col);
        if index.water_cells.contains(&key) {
            summary.excluded_water += 1;
            continue;
        }
        if index.forest_cells.contains(&key) {
            summary.excluded_forest += 1;
            continue;
        }
        if index.building_cells.contains(&key)
            && zone.building_density > DENSE_BUILDING_THRESHOLD
        {
            summary.excluded_building += 1;
            continue;
        }

        let mut kept = zone.clone();
        kept.plantable = Some(true);
        let in_park = index.park_cells.contains(&key);
        kept.in_park = Some(in_park);
        if in_park {
            summary.marked_in_parks += 1;
        }
        survivors.push(kept);
    }

    survivors.sort_by(|a, b| b.heat_score.total_cmp(&a.heat_score));
    summary.plantable_count = survivors.len();
    survivors.truncate(TOP_ZONE_LIMIT);
    summary.returned_count = survivors.len();

    let mut statistics = ZoneStats::from_zones(&survivors);
    statistics.zones_in_parks = Some(
        survivors
            .iter()
            .filter(|z| z.in_park == Some(true))
            .count(),
    );

    info!(
        original = summary.original_count,
        plantable = summary.plantable_count,
        returned = summary.returned_count,
        excluded_water = summary.excluded_water,
        excluded_forest = summary.excluded_forest,
        excluded_building = summary.excluded_building,
        "filtered plantable zones"
    );

    PlantabilityAnalysis {
        zones: survivors,
        statistics,
        filtering_summary: summary,
        bbox: analysis.bbox,
        temp_range: analysis.temp_range,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{GeoPoint, Priority, ZoneGeometry};

    fn zone(id: u32, row: usize, col: usize, heat_score: f64, density: u32) -> HeatZone {
        HeatZone {
            id,
            geometry: ZoneGeometry::rect(0.0, 0.0, 0.001, 0.001),
            heat_score,
            temp_celsius: 30.0,
            priority: Priority::from_score(heat_score),
            area_sqm: 9000.0,
            center: GeoPoint::new(0.0005, 0.0005),
            building_density: density,
            row,
            col,
            plantable: None,
            in_park: None,
            shade_coverage: None,
            shade_deficit: None,
            combined_score: None,
        }
    }

    fn analysis(zones: Vec<HeatZone>) -> HeatAnalysis {
        HeatAnalysis {
            zones,
            statistics: ZoneStats::default(),
            bbox: BoundingBox::new(-122.5, 37.7, -122.3, 37.8).unwrap(),
            temp_range: TempRange {
                min_celsius: 25.0,
                max_celsius: 35.0,
                mean_celsius: None,
            },
        }
    }

    #[test]
    fn test_exclusion_order_is_water_then_forest_then_building() {
        let mut index = FeatureIndex::default();
        // Cell (0, 0) is tagged as water AND forest AND built up.
        index.water_cells.insert((0, 0));
        index.forest_cells.insert((0, 0));
        index.building_cells.insert((0, 0));

        let result = filter_plantable(&analysis(vec![zone(1, 0, 0, 90.0, 10)]), &index);
        assert!(result.zones.is_empty());
        assert_eq!(result.filtering_summary.excluded_water, 1);
        assert_eq!(result.filtering_summary.excluded_forest, 0);
        assert_eq!(result.filtering_summary.excluded_building, 0);
    }

    #[test]
    fn test_building_cells_need_density_to_exclude() {
        let mut index = FeatureIndex::default();
        index.building_cells.insert((0, 0));
        index.building_cells.insert((0, 1));

        let zones = vec![zone(1, 0, 0, 90.0, 5), zone(2, 0, 1, 85.0, 6)];
        let result = filter_plantable(&analysis(zones), &index);
        // Density 5 survives the threshold, density 6 does not.
        assert_eq!(result.zones.len(), 1);
        assert_eq!(result.zones[0].id, 1);
        assert_eq!(result.filtering_summary.excluded_building, 1);
    }

    #[test]
    fn test_survivors_tagged_and_parks_marked() {
        let mut index = FeatureIndex::default();
        index.park_cells.insert((0, 1));

        let zones = vec![zone(1, 0, 0, 70.0, 0), zone(2, 0, 1, 60.0, 0)];
        let result = filter_plantable(&analysis(zones), &index);
        assert_eq!(result.zones.len(), 2);
        assert_eq!(result.zones[0].plantable, Some(true));
        assert_eq!(result.zones[0].in_park, Some(false));
        assert_eq!(result.zones[1].in_park, Some(true));
        assert_eq!(result.filtering_summary.marked_in_parks, 1);
        assert_eq!(result.statistics.zones_in_parks, Some(1));
    }

    #[test]
    fn test_truncates_to_top_20_by_heat_score() {
        let zones: Vec<HeatZone> = (0..25)
            .map(|i| zone(i + 1, 0, i as usize, f64::from(i) * 2.0, 0))
            .collect();
        let result = filter_plantable(&analysis(zones), &FeatureIndex::default());
        assert_eq!(result.zones.len(), TOP_ZONE_LIMIT);
        assert_eq!(result.filtering_summary.original_count, 25);
        assert_eq!(result.filtering_summary.plantable_count, 25);
        assert_eq!(result.filtering_summary.returned_count, 20);
        // Hottest first, the five coldest dropped.
        assert_eq!(result.zones[0].heat_score, 48.0);
        assert!(result.zones.iter().all(|z| z.heat_score >= 10.0));
        let scores: Vec<f64> = result.zones.iter().map(|z| z.heat_score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_statistics_recomputed_over_truncated_set() {
        let zones = vec![zone(1, 0, 0, 90.0, 0), zone(2, 0, 1, 30.0, 0)];
        let result = filter_plantable(&analysis(zones), &FeatureIndex::default());
        assert_eq!(result.statistics.total_zones, 2);
        assert_eq!(result.statistics.critical_count, 1);
        assert_eq!(result.statistics.low_count, 1);
        assert_eq!(result.statistics.avg_heat_score, 60.0);
        assert_eq!(result.statistics.max_heat_score, 90.0);
        assert_eq!(result.statistics.min_heat_score, 30.0);
    }

    #[test]
    fn test_empty_input_yields_empty_summary() {
        let result = filter_plantable(&analysis(vec![]), &FeatureIndex::default());
        assert!(result.zones.is_empty());
        assert_eq!(result.filtering_summary, FilteringSummary::default());
        assert_eq!(result.statistics, ZoneStats {
            zones_in_parks: Some(0),
            ..ZoneStats::default()
        });
    }
}
