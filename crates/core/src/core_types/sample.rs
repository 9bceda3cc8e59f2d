//! Thermal sample payloads as delivered by the satellite-imagery fetcher.
//!
//! Samples arrive GeoJSON-point-shaped and are treated as untrusted: any of
//! the nested fields may be missing or malformed, and the rasterizer skips
//! such samples rather than failing the whole scan.

use serde::{Deserialize, Serialize};

use crate::core_types::geo::BoundingBox;

/// One surface-temperature point sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThermalSample {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<PointGeometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<SampleProperties>,
}

impl ThermalSample {
    /// Convenience constructor for a well-formed sample.
    pub fn new(lon: f64, lat: f64, temperature: f64) -> Self {
        ThermalSample {
            geometry: Some(PointGeometry::new(lon, lat)),
            properties: Some(SampleProperties {
                temperature: Some(temperature),
            }),
        }
    }

    /// Extract `(lon, lat)` when the geometry is a well-formed point.
    ///
    /// Returns `None` for a missing geometry, a non-point geometry type, or
    /// fewer than two coordinates.
    pub fn point(&self) -> Option<(f64, f64)> {
        let geometry = self.geometry.as_ref()?;
        if geometry.kind != "Point" || geometry.coordinates.len() < 2 {
            return None;
        }
        Some((geometry.coordinates[0], geometry.coordinates[1]))
    }

    /// Extract the sampled temperature in celsius, if present.
    pub fn temperature(&self) -> Option<f64> {
        self.properties.as_ref()?.temperature
    }
}

/// GeoJSON point geometry (`coordinates` is `[lon, lat]`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

impl PointGeometry {
    pub fn new(lon: f64, lat: f64) -> Self {
        PointGeometry {
            kind: "Point".to_string(),
            coordinates: vec![lon, lat],
        }
    }
}

/// Properties attached to a thermal sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleProperties {
    #[serde(default)]
    pub temperature: Option<f64>,
}

/// Scan-level temperature summary supplied by the fetcher.
///
/// The field is required on the payload but its values are not trusted:
/// the heat scorer recomputes the range from the rasterized grid whenever
/// the minimum or maximum is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TempSummary {
    #[serde(default)]
    pub mean_temp_celsius: Option<f64>,
    #[serde(default)]
    pub min_temp_celsius: Option<f64>,
    #[serde(default)]
    pub max_temp_celsius: Option<f64>,
}

impl TempSummary {
    pub fn new(mean: f64, min: f64, max: f64) -> Self {
        TempSummary {
            mean_temp_celsius: Some(mean),
            min_temp_celsius: Some(min),
            max_temp_celsius: Some(max),
        }
    }
}

/// Complete thermal scan payload: samples, footprint, and summary statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalScan {
    pub thermal_samples: Vec<ThermalSample>,
    pub bbox: BoundingBox,
    pub statistics: TempSummary,
}

impl ThermalScan {
    pub fn new(
        thermal_samples: Vec<ThermalSample>,
        bbox: BoundingBox,
        statistics: TempSummary,
    ) -> Self {
        ThermalScan {
            thermal_samples,
            bbox,
            statistics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_sample_extracts_point_and_temp() {
        let sample = ThermalSample::new(-122.45, 37.75, 28.5);
        assert_eq!(sample.point(), Some((-122.45, 37.75)));
        assert_eq!(sample.temperature(), Some(28.5));
    }

    #[test]
    fn test_malformed_samples_yield_none() {
        // Missing geometry entirely
        let sample = ThermalSample {
            geometry: None,
            properties: Some(SampleProperties {
                temperature: Some(20.0),
            }),
        };
        assert_eq!(sample.point(), None);

        // Wrong geometry type
        let sample = ThermalSample {
            geometry: Some(PointGeometry {
                kind: "Polygon".to_string(),
                coordinates: vec![-122.4, 37.7],
            }),
            properties: None,
        };
        assert_eq!(sample.point(), None);

        // Too few coordinates
        let sample = ThermalSample {
            geometry: Some(PointGeometry {
                kind: "Point".to_string(),
                coordinates: vec![-122.4],
            }),
            properties: None,
        };
        assert_eq!(sample.point(), None);
        assert_eq!(sample.temperature(), None);
    }

    #[test]
    fn test_scan_parses_from_fetcher_json() {
        let json = r#"{
            "thermal_samples": [
                {"geometry": {"type": "Point", "coordinates": [-122.45, 37.75]},
                 "properties": {"temperature": 31.2}},
                {"properties": {"temperature": 25.0}}
            ],
            "bbox": [-122.5, 37.7, -122.3, 37.8],
            "statistics": {"mean_temp_celsius": 28.1, "min_temp_celsius": 25.0, "max_temp_celsius": 31.2}
        }"#;
        let scan: ThermalScan = serde_json::from_str(json).unwrap();
        assert_eq!(scan.thermal_samples.len(), 2);
        assert_eq!(scan.thermal_samples[0].temperature(), Some(31.2));
        assert_eq!(scan.thermal_samples[1].point(), None);
        assert_eq!(scan.statistics.min_temp_celsius, Some(25.0));
    }

    #[test]
    fn test_scan_missing_required_field_fails_parse() {
        // No statistics key at all
        let json = r#"{"thermal_samples": [], "bbox": [-122.5, 37.7, -122.3, 37.8]}"#;
        let parsed: Result<ThermalScan, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }
}
