//! Shadow simulation and shade deficit aggregation.

pub mod deficit;
pub mod simulator;

pub use deficit::{
    pedestrian_exposure, shade_deficit, DeficitAnalysis, DeficitSummary, ExposedArea,
    PeakHours, PedestrianArea, PedestrianExposure, PedestrianSummary,
};
pub use simulator::{
    simulate_shade, HourlyShade, ShadeGrid, DEFAULT_SHADE_GRID_SIZE_DEG,
};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core_types::{round1, BoundingBox, Building, SunPath, Tree};

/// Run the shadow simulator once per requested hour.
///
/// With `hours` unset every daylight hour from the sun path is simulated.
/// Hours without a matching sun position are skipped. Results come back in
/// request order, night hours included as short-circuited entries.
pub fn simulate_hours(
    buildings: &[Building],
    trees: &[Tree],
    sun_path: &SunPath,
    bbox: BoundingBox,
    hours: Option<&[u32]>,
    grid_size: f64,
) -> Vec<HourlyShade> {
    let hours: Vec<u32> = match hours {
        Some(hours) => hours.to_vec(),
        None => sun_path.daylight_hours(),
    };
    info!(hours = hours.len(), "simulating shade across hours");

    hours
        .iter()
        .filter_map(|&hour| sun_path.position(hour))
        .map(|sun| simulate_shade(buildings, trees, sun, bbox, grid_size))
        .collect()
}

/// Coverage statistics across a day's worth of hourly simulations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadeSummary {
    pub total_daylight_hours: usize,
    pub avg_coverage_percent: f64,
    pub min_coverage_percent: f64,
    pub max_coverage_percent: f64,
    pub avg_building_shade_percent: f64,
    pub avg_tree_shade_percent: f64,
    /// Average coverage restricted to the peak-hour window.
    pub peak_hours_avg_coverage: f64,
    /// Daylight hour with the least coverage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worst_hour: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_hour: Option<u32>,
    /// Soft-fail marker when no daylight hours were supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summarize coverage across hourly results, ignoring night entries.
///
/// Soft-fails into an error-marked summary when every entry is night,
/// mirroring the deficit aggregator's behavior.
pub fn summarize_hours(hourly: &[HourlyShade], peak_hours: &PeakHours) -> ShadeSummary {
    let daylight: Vec<&HourlyShade> = hourly.iter().filter(|h| !h.is_night).collect();
    if daylight.is_empty() {
        return ShadeSummary {
            total_daylight_hours: 0,
            avg_coverage_percent: 0.0,
            min_coverage_percent: 0.0,
            max_coverage_percent: 0.0,
            avg_building_shade_percent: 0.0,
            avg_tree_shade_percent: 0.0,
            peak_hours_avg_coverage: 0.0,
            worst_hour: None,
            best_hour: None,
            error: Some(format!(
                "no daylight hours in {} results",
                hourly.len()
            )),
        };
    }

    let avg = |values: &[f64]| round1(values.iter().sum::<f64>() / values.len() as f64);
    let coverages: Vec<f64> = daylight.iter().map(|h| h.coverage_percent).collect();
    let building: Vec<f64> = daylight
        .iter()
        .map(|h| h.building_shade_percent.unwrap_or(0.0))
        .collect();
    let tree: Vec<f64> = daylight
        .iter()
        .map(|h| h.tree_shade_percent.unwrap_or(0.0))
        .collect();
    let peak: Vec<f64> = daylight
        .iter()
        .filter(|h| peak_hours.contains(h.hour))
        .map(|h| h.coverage_percent)
        .collect();

    ShadeSummary {
        total_daylight_hours: daylight.len(),
        avg_coverage_percent: avg(&coverages),
        min_coverage_percent: round1(coverages.iter().copied().fold(f64::INFINITY, f64::min)),
        max_coverage_percent: round1(coverages.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        avg_building_shade_percent: avg(&building),
        avg_tree_shade_percent: avg(&tree),
        peak_hours_avg_coverage: if peak.is_empty() { 0.0 } else { avg(&peak) },
        worst_hour: daylight
            .iter()
            .min_by(|a, b| a.coverage_percent.total_cmp(&b.coverage_percent))
            .map(|h| h.hour),
        best_hour: daylight
            .iter()
            .max_by(|a, b| a.coverage_percent.total_cmp(&b.coverage_percent))
            .map(|h| h.hour),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hour_result(hour: u32, coverage: f64, is_night: bool) -> HourlyShade {
        HourlyShade {
            grid: None,
            coverage_percent: coverage,
            building_shade_percent: if is_night { None } else { Some(coverage / 2.0) },
            tree_shade_percent: if is_night { None } else { Some(coverage / 2.0) },
            hour,
            sun_altitude: None,
            sun_azimuth: None,
            is_night,
        }
    }

    #[test]
    fn test_summary_across_daylight_hours() {
        let hourly = vec![
            hour_result(3, 100.0, true), // night, excluded
            hour_result(8, 10.0, false),
            hour_result(12, 40.0, false),
            hour_result(16, 22.0, false),
        ];
        let summary = summarize_hours(&hourly, &PeakHours::local(0));
        assert_eq!(summary.total_daylight_hours, 3);
        assert_eq!(summary.avg_coverage_percent, 24.0);
        assert_eq!(summary.min_coverage_percent, 10.0);
        assert_eq!(summary.max_coverage_percent, 40.0);
        // Peak window 10-16 covers hours 12 and 16 only.
        assert_eq!(summary.peak_hours_avg_coverage, 31.0);
        assert_eq!(summary.worst_hour, Some(8));
        assert_eq!(summary.best_hour, Some(12));
        assert!(summary.error.is_none());
    }

    #[test]
    fn test_summary_soft_fails_on_all_night() {
        let summary = summarize_hours(
            &[hour_result(1, 100.0, true), hour_result(2, 100.0, true)],
            &PeakHours::local(0),
        );
        assert_eq!(summary.total_daylight_hours, 0);
        assert!(summary.error.as_deref().unwrap().contains("2 results"));
        assert!(summary.worst_hour.is_none());
    }
}
