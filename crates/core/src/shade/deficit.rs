//! Shade deficit aggregation: hourly shade grids folded into the heat
//! zone ranking.
//!
//! The shade grid and the heat grid are two independent rasterizations of
//! the same bbox; zone centers are re-projected into the shade frame by
//! lat/lon lookup rather than index sharing. A zone center sitting exactly
//! on a shade-cell boundary resolves to the higher-index cell (floor on the
//! fractional index), which can differ from its heat-grid cell by one.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core_types::{round1, GeoPoint, HeatZone, Priority};
use crate::shade::simulator::{HourlyShade, ShadeGrid};

/// Weight multiplier for peak hours in the deficit aggregation.
const PEAK_HOUR_WEIGHT: f64 = 2.0;

/// Weight multiplier for pedestrian peak hours, stronger than the general
/// peak weighting because exposure during commute and lunch windows is the
/// whole point of that analysis.
const PEDESTRIAN_PEAK_WEIGHT: f64 = 3.0;

/// Shade deficit at or above which a zone counts as high-deficit.
const HIGH_DEFICIT_THRESHOLD: f64 = 70.0;

/// Fallback shade value when an hourly result carries no bbox frame.
const FALLBACK_SHADE: f64 = 0.5;

/// Hour set receiving extra weight during aggregation.
///
/// The canonical peak window is 10:00-16:00 local time, but every grid in
/// the pipeline runs on UTC hours. The constructor therefore takes the
/// location's UTC offset and shifts the window, so the caller states the
/// timezone explicitly instead of the window silently assuming UTC=local.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeakHours {
    hours: FxHashSet<u32>,
}

impl PeakHours {
    const CANONICAL_WINDOW: [u32; 7] = [10, 11, 12, 13, 14, 15, 16];

    /// The 10:00-16:00 window shifted from local time into UTC hours.
    /// An offset of 0 means the location runs on UTC.
    pub fn local(utc_offset_hours: i32) -> Self {
        let hours = Self::CANONICAL_WINDOW
            .iter()
            .map(|&h| (i64::from(h) - i64::from(utc_offset_hours)).rem_euclid(24) as u32)
            .collect();
        PeakHours { hours }
    }

    /// An arbitrary hour set, already in UTC.
    pub fn from_hours(hours: impl IntoIterator<Item = u32>) -> Self {
        PeakHours {
            hours: hours.into_iter().map(|h| h % 24).collect(),
        }
    }

    /// Default pedestrian peak window (morning commute, lunch, evening
    /// commute), shifted from local time into UTC hours.
    pub fn pedestrian_local(utc_offset_hours: i32) -> Self {
        let hours = [8u32, 9, 12, 13, 17, 18]
            .iter()
            .map(|&h| (i64::from(h) - i64::from(utc_offset_hours)).rem_euclid(24) as u32)
            .collect();
        PeakHours { hours }
    }

    pub fn contains(&self, hour: u32) -> bool {
        self.hours.contains(&hour)
    }

    /// Sorted hour list, for summary echoes.
    pub fn sorted_hours(&self) -> Vec<u32> {
        let mut hours: Vec<u32> = self.hours.iter().copied().collect();
        hours.sort_unstable();
        hours
    }
}

impl Default for PeakHours {
    /// UTC hours 10-16; prefer [`PeakHours::local`] with a real offset.
    fn default() -> Self {
        Self::local(0)
    }
}

/// Aggregate statistics over the re-ranked zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeficitSummary {
    pub total_zones: usize,
    pub avg_shade_deficit: f64,
    pub max_shade_deficit: f64,
    /// Zones with deficit >= 70.
    pub high_deficit_count: usize,
    pub peak_hours_analyzed: Vec<u32>,
    /// Soft-fail marker: set when no daylight data was supplied and the
    /// zones passed through unmodified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Zones re-ranked by combined heat and shade-deficit score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeficitAnalysis {
    /// Full re-ranked list, descending by combined score. Truncation to a
    /// shortlist is the orchestration layer's decision, not this stage's.
    pub zones: Vec<HeatZone>,
    pub summary: DeficitSummary,
}

/// Combine hourly shade grids with heat zones into one ranking.
///
/// Hours are weighted-averaged per shade cell (peak hours double weight),
/// each zone center samples the averaged grid, and the combined score is
/// `heat_score/100 * (1 - shade) * 100`. Priorities are re-tiered on the
/// combined score using the same cutpoints as heat scoring.
///
/// With no daylight hours this soft-fails: the zones come back unmodified
/// with an error marker in the summary.
pub fn shade_deficit(
    hourly: &[HourlyShade],
    heat_zones: &[HeatZone],
    peak_hours: &PeakHours,
) -> DeficitAnalysis {
    let Some(weighted) = weighted_shade_grid(hourly, peak_hours, PEAK_HOUR_WEIGHT) else {
        warn!("no daylight shade data available, returning zones unmodified");
        return DeficitAnalysis {
            zones: heat_zones.to_vec(),
            summary: DeficitSummary {
                total_zones: heat_zones.len(),
                avg_shade_deficit: 0.0,
                max_shade_deficit: 0.0,
                high_deficit_count: 0,
                peak_hours_analyzed: peak_hours.sorted_hours(),
                error: Some("no daylight shade data available".to_string()),
            },
        };
    };

    let mut zones: Vec<HeatZone> = heat_zones
        .iter()
        .map(|zone| {
            let shade_value = sample_shade(&weighted, zone.center);
            let deficit = 1.0 - shade_value;
            let combined = (zone.heat_score / 100.0) * deficit * 100.0;

            let mut out = zone.clone();
            out.shade_coverage = Some(round1(shade_value * 100.0));
            out.shade_deficit = Some(round1(deficit * 100.0));
            out.combined_score = Some(round1(combined));
            out.priority = Priority::from_score(combined);
            out
        })
        .collect();

    zones.sort_by(|a, b| {
        b.combined_score
            .unwrap_or(0.0)
            .total_cmp(&a.combined_score.unwrap_or(0.0))
    });

    let deficits: Vec<f64> = zones.iter().filter_map(|z| z.shade_deficit).collect();
    let summary = DeficitSummary {
        total_zones: zones.len(),
        avg_shade_deficit: if deficits.is_empty() {
            0.0
        } else {
            round1(deficits.iter().sum::<f64>() / deficits.len() as f64)
        },
        max_shade_deficit: round1(deficits.iter().copied().fold(0.0, f64::max)),
        high_deficit_count: deficits
            .iter()
            .filter(|d| **d >= HIGH_DEFICIT_THRESHOLD)
            .count(),
        peak_hours_analyzed: peak_hours.sorted_hours(),
        error: None,
    };
    info!(
        zones = summary.total_zones,
        avg_deficit = summary.avg_shade_deficit,
        high_deficit = summary.high_deficit_count,
        "aggregated shade deficit"
    );

    DeficitAnalysis { zones, summary }
}

/// A pedestrian-traffic area supplied by the orchestration layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PedestrianArea {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub center: GeoPoint,
    /// Relative foot-traffic estimate on a 0-100 scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_estimate: Option<f64>,
}

impl PedestrianArea {
    /// Traffic estimate, defaulting to the 0-100 midpoint when the source
    /// supplied none.
    pub fn traffic(&self) -> f64 {
        self.traffic_estimate.unwrap_or(50.0)
    }
}

/// A pedestrian area annotated with sun exposure and impact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposedArea {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub center: GeoPoint,
    pub traffic_estimate: f64,
    /// Percent shade at the area center across weighted hours.
    pub shade_coverage: f64,
    /// Percent sun exposure (100 - shade).
    pub sun_exposure: f64,
    /// Exposure scaled by traffic share, 0-100.
    pub pedestrian_impact: f64,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PedestrianSummary {
    pub total_areas: usize,
    pub avg_sun_exposure: f64,
    pub avg_pedestrian_impact: f64,
    pub critical_areas_count: usize,
    /// Critical plus high priority.
    pub high_priority_count: usize,
    pub peak_pedestrian_hours: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PedestrianExposure {
    /// Areas sorted descending by pedestrian impact.
    pub areas: Vec<ExposedArea>,
    pub summary: PedestrianSummary,
}

/// Sun exposure for pedestrian areas, weighted toward commute and lunch
/// hours (triple weight).
///
/// Impact multiplies exposure by the area's traffic share, and priorities
/// tier on the lower impact cutpoints. Soft-fails like [`shade_deficit`]
/// when no daylight hours are present.
pub fn pedestrian_exposure(
    hourly: &[HourlyShade],
    areas: &[PedestrianArea],
    peak_pedestrian_hours: &PeakHours,
) -> PedestrianExposure {
    let Some(weighted) = weighted_shade_grid(hourly, peak_pedestrian_hours, PEDESTRIAN_PEAK_WEIGHT)
    else {
        warn!("no daylight shade data available for pedestrian exposure");
        return PedestrianExposure {
            areas: Vec::new(),
            summary: PedestrianSummary {
                total_areas: areas.len(),
                avg_sun_exposure: 0.0,
                avg_pedestrian_impact: 0.0,
                critical_areas_count: 0,
                high_priority_count: 0,
                peak_pedestrian_hours: peak_pedestrian_hours.sorted_hours(),
                error: Some("no daylight shade data available".to_string()),
            },
        };
    };

    let mut exposed: Vec<ExposedArea> = areas
        .iter()
        .map(|area| {
            let shade_value = sample_shade(&weighted, area.center);
            let exposure = 1.0 - shade_value;
            let impact = exposure * (area.traffic() / 100.0) * 100.0;
            ExposedArea {
                name: area.name.clone(),
                center: area.center,
                traffic_estimate: area.traffic(),
                shade_coverage: round1(shade_value * 100.0),
                sun_exposure: round1(exposure * 100.0),
                pedestrian_impact: round1(impact),
                priority: Priority::from_impact_score(impact),
            }
        })
        .collect();

    exposed.sort_by(|a, b| b.pedestrian_impact.total_cmp(&a.pedestrian_impact));

    let n = exposed.len();
    let summary = PedestrianSummary {
        total_areas: n,
        avg_sun_exposure: if n == 0 {
            0.0
        } else {
            round1(exposed.iter().map(|a| a.sun_exposure).sum::<f64>() / n as f64)
        },
        avg_pedestrian_impact: if n == 0 {
            0.0
        } else {
            round1(exposed.iter().map(|a| a.pedestrian_impact).sum::<f64>() / n as f64)
        },
        critical_areas_count: exposed
            .iter()
            .filter(|a| a.priority == Priority::Critical)
            .count(),
        high_priority_count: exposed
            .iter()
            .filter(|a| matches!(a.priority, Priority::Critical | Priority::High))
            .count(),
        peak_pedestrian_hours: peak_pedestrian_hours.sorted_hours(),
        error: None,
    };

    PedestrianExposure {
        areas: exposed,
        summary,
    }
}

/// Weighted per-cell average across daylight hours, using the first
/// daylight grid's frame as the reference for all hours.
///
/// All hourly grids come from the same simulator call pattern over one
/// bbox, so co-registration is assumed rather than checked.
fn weighted_shade_grid(
    hourly: &[HourlyShade],
    peak_hours: &PeakHours,
    peak_weight: f64,
) -> Option<ShadeGrid> {
    let mut reference: Option<ShadeGrid> = None;
    let mut total_weight = 0.0;

    for result in hourly {
        if result.is_night {
            continue;
        }
        let Some(grid) = &result.grid else {
            continue;
        };
        let acc = reference.get_or_insert_with(|| {
            ShadeGrid::uniform(grid.bbox, grid.grid_size, 0.0)
        });

        let weight = if peak_hours.contains(result.hour) {
            peak_weight
        } else {
            1.0
        };
        total_weight += weight;

        let rows = acc.rows.min(grid.rows);
        let cols = acc.cols.min(grid.cols);
        for row in 0..rows {
            for col in 0..cols {
                acc.add_value(row, col, grid.value(row, col) * weight);
            }
        }
    }

    let mut acc = reference?;
    if total_weight > 0.0 {
        acc.scale(1.0 / total_weight);
    }
    Some(acc)
}

/// Shade value at a point, defaulting when the lookup frame is degenerate.
fn sample_shade(grid: &ShadeGrid, point: GeoPoint) -> f64 {
    if grid.rows == 0 || grid.cols == 0 {
        return FALLBACK_SHADE;
    }
    let (row, col) = grid.clamped_cell_at(point.lat, point.lon);
    grid.value(row, col)
}
