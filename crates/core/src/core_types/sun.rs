//! Sun position records produced by the solar ephemeris.

use serde::{Deserialize, Serialize};

/// Sun azimuth and altitude for one integer UTC hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SunPosition {
    /// UTC hour of day, 0-23.
    pub hour: u32,
    /// Compass azimuth in degrees, 0-360.
    pub azimuth: f64,
    /// Elevation above the horizon in degrees; negative at night.
    pub altitude: f64,
    pub is_daylight: bool,
}

/// Full-day sun path: 24 hourly positions plus derived day boundaries.
///
/// Hours are UTC throughout. For longitudes far from the prime meridian the
/// daylight period can wrap past the UTC midnight boundary, which is why the
/// derived sunrise/sunset come from run analysis rather than the first and
/// last daylight hour in index order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunPath {
    pub date: String,
    pub latitude: f64,
    pub longitude: f64,
    pub positions: Vec<SunPosition>,
    /// `"HH:00"`, or `None` when the sun never rises on this date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunrise: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solar_noon: Option<String>,
    /// Peak altitude across the whole day, degrees.
    pub max_altitude: f64,
}

impl SunPath {
    /// Position for a given UTC hour.
    pub fn position(&self, hour: u32) -> Option<&SunPosition> {
        self.positions.iter().find(|p| p.hour == hour)
    }

    /// All hours with the sun above the horizon, in index order.
    pub fn daylight_hours(&self) -> Vec<u32> {
        self.positions
            .iter()
            .filter(|p| p.is_daylight)
            .map(|p| p.hour)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_with_daylight(hours: &[u32]) -> SunPath {
        SunPath {
            date: "2024-06-21".to_string(),
            latitude: 37.75,
            longitude: -122.4,
            positions: (0..24)
                .map(|hour| SunPosition {
                    hour,
                    azimuth: 180.0,
                    altitude: if hours.contains(&hour) { 30.0 } else { -10.0 },
                    is_daylight: hours.contains(&hour),
                })
                .collect(),
            sunrise: None,
            sunset: None,
            solar_noon: None,
            max_altitude: 30.0,
        }
    }

    #[test]
    fn test_daylight_hours_in_index_order() {
        let path = path_with_daylight(&[0, 1, 20, 21, 22, 23]);
        assert_eq!(path.daylight_hours(), vec![0, 1, 20, 21, 22, 23]);
    }

    #[test]
    fn test_position_lookup() {
        let path = path_with_daylight(&[12]);
        assert!(path.position(12).unwrap().is_daylight);
        assert!(!path.position(0).unwrap().is_daylight);
        assert!(path.position(24).is_none());
    }
}
