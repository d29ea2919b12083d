//! Nearest-city attribution reports
//!
//! For one region and one layer, every point inside the region is attributed
//! to its nearest reference city. Per city the report keeps the number of
//! points and the largest point-to-city distance seen. A large maximum means
//! the cluster probably belongs to a city that is not configured, or that
//! coordinate repair produced a wrong value.

use crate::cities::CityIndex;
use crate::layer::Layer;
use crate::region::Region;
use crate::ResolvedPoint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Number of lines in the anomaly banner
pub const WARNING_BANNER_LINES: usize = 5;

/// Per-city aggregate within one region × layer scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionEntry {
    pub city: String,
    pub count: usize,
    pub max_distance_km: f64,
}

/// A point with the city it was attributed to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributedPoint {
    pub point: ResolvedPoint,
    pub city: String,
    pub distance_km: f64,
}

/// Attribution result for one region and one layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionReport {
    pub region: String,
    pub layer: String,
    pub threshold_km: f64,
    /// Sorted by city name ascending
    pub entries: Vec<AttributionEntry>,
    /// Points inside the region, in input order
    pub points: Vec<AttributedPoint>,
}

impl AttributionReport {
    /// Whether any city's max distance exceeds the threshold
    pub fn is_anomalous(&self) -> bool {
        self.anomalies().next().is_some()
    }

    pub fn anomalies(&self) -> impl Iterator<Item = &AttributionEntry> {
        self.entries
            .iter()
            .filter(move |e| e.max_distance_km > self.threshold_km)
    }

    pub fn total_points(&self) -> usize {
        self.points.len()
    }

    #[cfg(test)]
    pub(crate) fn entry(&self, city: &str) -> Option<&AttributionEntry> {
        self.entries.iter().find(|e| e.city == city)
    }

    /// Printable report, one line per city.
    ///
    /// A city whose max distance exceeds the threshold is preceded by the
    /// WARNING banner.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.entries.len());

        for entry in &self.entries {
            if entry.max_distance_km > self.threshold_km {
                lines.extend(std::iter::repeat("WARNING".to_string()).take(WARNING_BANNER_LINES));
            }
            lines.push(format!(
                "  > {:3} {} at max distance {:.2} km from {}",
                entry.count, self.layer, entry.max_distance_km, entry.city
            ));
        }

        lines
    }
}

impl fmt::Display for AttributionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Attribute the points of one layer that fall inside `region`
pub fn attribute(
    region: &Region,
    layer: &Layer,
    points: &[ResolvedPoint],
    index: &CityIndex,
    threshold_km: f64,
) -> AttributionReport {
    let mut by_city: BTreeMap<String, AttributionEntry> = BTreeMap::new();
    let mut attributed = Vec::new();

    for point in region.filter(points) {
        let (city, distance_km) = index.nearest(point.latitude, point.longitude);

        let entry = by_city
            .entry(city.name.clone())
            .or_insert_with(|| AttributionEntry {
                city: city.name.clone(),
                count: 0,
                max_distance_km: 0.0,
            });
        entry.count += 1;
        entry.max_distance_km = entry.max_distance_km.max(distance_km);

        attributed.push(AttributedPoint {
            point: *point,
            city: city.name.clone(),
            distance_km,
        });
    }

    AttributionReport {
        region: region.id.clone(),
        layer: layer.id.clone(),
        threshold_km,
        entries: by_city.into_values().collect(),
        points: attributed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cities::City;
    use crate::{haversine_km, ANOMALY_THRESHOLD_KM};

    fn eastern_province() -> (Region, CityIndex) {
        let region = Region::new("eastern", 27.0, 50.5, 25.5, 49.5);
        let index = CityIndex::new(vec![
            City::new("Dammam", 26.4207, 50.0888),
            City::new("Al Khobar", 26.2172, 50.1971),
            City::new("Riyadh", 24.7136, 46.6753),
        ])
        .unwrap();
        (region, index)
    }

    fn layer() -> Layer {
        Layer::new("Total Cases", "b", "test")
    }

    #[test]
    fn test_counts_and_max_distance() {
        let (region, index) = eastern_province();
        let points = vec![
            ResolvedPoint::new(26.4207, 50.0888),
            ResolvedPoint::new(26.4300, 50.0900),
            ResolvedPoint::new(26.2172, 50.1971),
            ResolvedPoint::new(24.7136, 46.6753), // outside region
        ];

        let report = attribute(&region, &layer(), &points, &index, ANOMALY_THRESHOLD_KM);

        assert_eq!(report.total_points(), 3);
        assert_eq!(report.entries.len(), 2);

        let dammam = report.entry("Dammam").unwrap();
        assert_eq!(dammam.count, 2);
        let expected = haversine_km(26.4300, 50.0900, 26.4207, 50.0888);
        assert!((dammam.max_distance_km - expected).abs() < 1e-9);

        let khobar = report.entry("Al Khobar").unwrap();
        assert_eq!(khobar.count, 1);
        assert_eq!(khobar.max_distance_km, 0.0);

        assert!(report.entry("Riyadh").is_none());
    }

    #[test]
    fn test_entries_sorted_by_city_name() {
        let (region, index) = eastern_province();
        let points = vec![
            ResolvedPoint::new(26.4207, 50.0888),
            ResolvedPoint::new(26.2172, 50.1971),
        ];

        let report = attribute(&region, &layer(), &points, &index, ANOMALY_THRESHOLD_KM);
        let names: Vec<_> = report.entries.iter().map(|e| e.city.as_str()).collect();
        assert_eq!(names, vec!["Al Khobar", "Dammam"]);
    }

    #[test]
    fn test_no_warning_below_threshold() {
        let (region, index) = eastern_province();
        let points = vec![ResolvedPoint::new(26.4300, 50.0900)]; // ~1 km from Dammam

        let report = attribute(&region, &layer(), &points, &index, ANOMALY_THRESHOLD_KM);
        assert!(!report.is_anomalous());

        let lines = report.lines();
        assert_eq!(lines.len(), 1);
        assert!(!lines.iter().any(|l| l == "WARNING"));
        assert!(lines[0].starts_with("  >   1 Total Cases at max distance 1."));
        assert!(lines[0].ends_with(" km from Dammam"));
    }

    #[test]
    fn test_warning_above_threshold() {
        let (region, index) = eastern_province();
        let points = vec![
            ResolvedPoint::new(26.4207, 50.0888),
            ResolvedPoint::new(26.9000, 49.6000), // ~70 km from Dammam
        ];

        let report = attribute(&region, &layer(), &points, &index, ANOMALY_THRESHOLD_KM);
        assert!(report.is_anomalous());
        assert_eq!(report.anomalies().count(), 1);

        let lines = report.lines();
        assert_eq!(lines.len(), WARNING_BANNER_LINES + 1);
        assert!(lines[..WARNING_BANNER_LINES].iter().all(|l| l == "WARNING"));
        assert!(lines[WARNING_BANNER_LINES].contains("  2 Total Cases"));
    }

    #[test]
    fn test_warning_precedes_offending_city() {
        let (region, index) = eastern_province();
        let points = vec![
            ResolvedPoint::new(26.2172, 50.1971),
            ResolvedPoint::new(26.9000, 49.6000), // ~70 km from Dammam
        ];

        let report = attribute(&region, &layer(), &points, &index, ANOMALY_THRESHOLD_KM);
        let lines = report.lines();

        assert_eq!(lines.len(), WARNING_BANNER_LINES + 2);
        assert!(lines[0].ends_with("from Al Khobar"));
        assert!(lines[1..=WARNING_BANNER_LINES].iter().all(|l| l == "WARNING"));
        assert!(lines[WARNING_BANNER_LINES + 1].ends_with("from Dammam"));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let (region, index) = eastern_province();
        let point = ResolvedPoint::new(26.4300, 50.0900);
        let dist = haversine_km(26.4300, 50.0900, 26.4207, 50.0888);

        let report = attribute(&region, &layer(), &[point], &index, dist);
        assert!(!report.is_anomalous());
    }

    #[test]
    fn test_empty_region_report() {
        let (region, index) = eastern_province();
        let report = attribute(&region, &layer(), &[], &index, ANOMALY_THRESHOLD_KM);
        assert!(report.entries.is_empty());
        assert!(report.lines().is_empty());
        assert_eq!(report.to_string(), "");
    }
}
