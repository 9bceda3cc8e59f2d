//! Solar ephemeris: hourly sun positions for one day at one location.
//!
//! Uses the simplified NOAA approximation, good to a degree or two, which
//! is plenty for shadow simulation on a 50 m grid. All hours are UTC; solar
//! time is approximated from longitude alone (15 degrees per hour) with no
//! equation-of-time correction.

use tracing::debug;

use crate::core_types::{round2, SunPath, SunPosition};
use crate::error::AnalysisError;

/// Compute the 24-hour sun path for a location and an ISO `YYYY-MM-DD` date.
///
/// Sunrise and sunset come from the longest consecutive run of daylight
/// hours. At longitudes where local daylight straddles the UTC midnight
/// boundary the run wraps from hour 23 into hour 0; the wrapped run is
/// merged and its first hour reported as sunrise, with sunset taken as the
/// hour before the run's internal descent.
///
/// # Errors
/// Returns `AnalysisError::InvalidInput` for a malformed date string.
pub fn sun_path(latitude: f64, longitude: f64, date: &str) -> Result<SunPath, AnalysisError> {
    let day_of_year = parse_day_of_year(date)?;

    let mut positions = Vec::with_capacity(24);
    let mut max_altitude = f64::NEG_INFINITY;
    let mut solar_noon_hour = 0u32;

    for hour in 0..24u32 {
        let (azimuth, altitude) = solar_position(latitude, longitude, day_of_year, f64::from(hour));
        if altitude > max_altitude {
            max_altitude = altitude;
            solar_noon_hour = hour;
        }
        positions.push(SunPosition {
            hour,
            azimuth: round2(azimuth),
            altitude: round2(altitude),
            is_daylight: altitude > 0.0,
        });
    }

    let daylight: Vec<u32> = positions
        .iter()
        .filter(|p| p.is_daylight)
        .map(|p| p.hour)
        .collect();
    let boundaries = daylight_run_boundaries(&daylight);
    debug!(
        date,
        daylight_hours = daylight.len(),
        wrapped = boundaries.is_some_and(|(sunrise, sunset)| sunset < sunrise),
        "computed sun path"
    );

    Ok(SunPath {
        date: date.to_string(),
        latitude,
        longitude,
        positions,
        sunrise: boundaries.map(|(sunrise, _)| format!("{sunrise:02}:00")),
        sunset: boundaries.map(|(_, sunset)| format!("{sunset:02}:00")),
        solar_noon: Some(format!("{solar_noon_hour:02}:00")),
        max_altitude: round2(max_altitude),
    })
}

/// Sunrise and sunset hours from the longest consecutive daylight run, or
/// `None` when the sun never rises.
fn daylight_run_boundaries(daylight: &[u32]) -> Option<(u32, u32)> {
    let &first = daylight.first()?;

    // Split the sorted daylight hours into consecutive runs.
    let mut runs: Vec<Vec<u32>> = vec![vec![first]];
    for window in daylight.windows(2) {
        if window[1] == window[0] + 1 {
            if let Some(run) = runs.last_mut() {
                run.push(window[1]);
            }
        } else {
            runs.push(vec![window[1]]);
        }
    }

    // A run ending at 23 continues into a run starting at 0 on the same
    // UTC day: merge them so the wrapped daylight period counts as one.
    if runs.len() > 1
        && runs.last().and_then(|run| run.last()) == Some(&23)
        && runs.first().and_then(|run| run.first()) == Some(&0)
    {
        let head = runs.remove(0);
        if let Some(tail) = runs.last_mut() {
            tail.extend(head);
        }
    }

    let longest = runs.iter().max_by_key(|run| run.len())?;
    let (&sunrise, &last) = (longest.first()?, longest.last()?);

    // For a wrapped run the last element is numerically small; sunset is
    // the hour just before the internal 23 -> 0 descent.
    let sunset = if last < sunrise {
        longest
            .windows(2)
            .find(|w| w[1] < w[0])
            .map_or(last, |w| w[0])
    } else {
        last
    };

    Some((sunrise, sunset))
}

/// Azimuth and altitude in degrees for one UTC hour.
fn solar_position(latitude: f64, longitude: f64, day_of_year: u32, hour: f64) -> (f64, f64) {
    let lat_rad = latitude.to_radians();

    let declination =
        23.45 * (360.0 / 365.0 * (f64::from(day_of_year) - 81.0)).to_radians().sin();
    let dec_rad = declination.to_radians();

    // Rough longitude-adjusted solar time; solar noon near 12:00.
    let solar_time = hour + longitude / 15.0;
    let hour_angle = 15.0 * (solar_time - 12.0);
    let hour_angle_rad = hour_angle.to_radians();

    let sin_altitude = lat_rad.sin() * dec_rad.sin()
        + lat_rad.cos() * dec_rad.cos() * hour_angle_rad.cos();
    let altitude = sin_altitude.clamp(-1.0, 1.0).asin().to_degrees();

    // Guard keeps the denominator nonzero when the sun passes the zenith.
    let cos_azimuth = (dec_rad.sin() - lat_rad.sin() * sin_altitude)
        / (lat_rad.cos() * altitude.to_radians().cos() + 0.0001);
    let mut azimuth = cos_azimuth.clamp(-1.0, 1.0).acos().to_degrees();
    if hour_angle > 0.0 {
        azimuth = 360.0 - azimuth;
    }

    (azimuth, altitude)
}

/// Day of year (1-366) from an ISO `YYYY-MM-DD` string.
fn parse_day_of_year(date: &str) -> Result<u32, AnalysisError> {
    let invalid = || AnalysisError::InvalidInput(format!("invalid date '{date}', expected YYYY-MM-DD"));

    let mut parts = date.split('-');
    let year: i32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let month: u32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let day: u32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    if parts.next().is_some() {
        return Err(invalid());
    }

    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    let month_lengths = [
        31,
        if leap { 29 } else { 28 },
        31,
        30,
        31,
        30,
        31,
        31,
        30,
        31,
        30,
        31,
    ];
    if month == 0 || month > 12 {
        return Err(invalid());
    }
    if day == 0 || day > month_lengths[month as usize - 1] {
        return Err(invalid());
    }

    let preceding: u32 = month_lengths[..month as usize - 1].iter().sum();
    Ok(preceding + day)
}
