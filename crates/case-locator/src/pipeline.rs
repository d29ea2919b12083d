//! Point resolution and region × layer attribution runs

use crate::cities::CityIndex;
use crate::coord::{resolve_field, RepairConfig, Resolution};
use crate::feed::RawPoint;
use crate::layer::Layer;
use crate::region::Region;
use crate::report::{attribute, AttributionReport};
use crate::{ResolvedPoint, ANOMALY_THRESHOLD_KM};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Settings for a full attribution run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub repair: RepairConfig,
    /// Max city distance (km) above which a report is flagged
    pub threshold_km: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            repair: RepairConfig::default(),
            threshold_km: ANOMALY_THRESHOLD_KM,
        }
    }
}

/// A layer's resolved points
#[derive(Debug, Clone)]
pub struct LayerPoints {
    pub layer: Layer,
    pub points: Vec<ResolvedPoint>,
}

/// All layer reports for one region
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionSummary {
    pub region: Region,
    pub reports: Vec<AttributionReport>,
}

impl RegionSummary {
    pub fn is_anomalous(&self) -> bool {
        self.reports.iter().any(|r| r.is_anomalous())
    }
}

/// Counters from one resolution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveStats {
    pub resolved: usize,
    /// Records dropped for an unusable latitude or longitude
    pub dropped: usize,
    /// Coordinate fields whose decimal point was reinserted
    pub repaired: usize,
}

/// Resolve raw feed records to coordinates.
///
/// Records with an unusable latitude or longitude are dropped and logged.
/// Repaired values are logged alongside the original text.
pub fn resolve_points(raw_points: &[RawPoint], config: &RepairConfig) -> Vec<ResolvedPoint> {
    resolve_points_with_stats(raw_points, config).0
}

/// Same as [`resolve_points`], also returning drop and repair counts
pub fn resolve_points_with_stats(
    raw_points: &[RawPoint],
    config: &RepairConfig,
) -> (Vec<ResolvedPoint>, ResolveStats) {
    let mut resolved = Vec::with_capacity(raw_points.len());
    let mut stats = ResolveStats::default();

    for raw in raw_points {
        match resolve_point(raw, config, &mut stats) {
            Ok(point) => resolved.push(point),
            Err(e) => {
                warn!("Dropping point: {}", e);
                stats.dropped += 1;
            }
        }
    }
    stats.resolved = resolved.len();

    info!(
        "Resolved {} points ({} dropped, {} coordinates repaired)",
        stats.resolved, stats.dropped, stats.repaired
    );

    (resolved, stats)
}

fn resolve_point(
    raw: &RawPoint,
    config: &RepairConfig,
    stats: &mut ResolveStats,
) -> crate::Result<ResolvedPoint> {
    let longitude = resolve_logged(raw, "longitude", config.lon_digits, stats)?;
    let latitude = resolve_logged(raw, "latitude", config.lat_digits, stats)?;
    Ok(ResolvedPoint::new(latitude, longitude))
}

/// Repairs are logged as soon as the field resolves, even if the record is
/// dropped afterwards.
fn resolve_logged(
    raw: &RawPoint,
    field: &str,
    digits: usize,
    stats: &mut ResolveStats,
) -> crate::Result<f64> {
    let resolution = resolve_field(raw, field, digits)?;
    if let Resolution::Repaired { original, value } = &resolution {
        warn!("{} converted, {} -> {}", field, original, value);
        stats.repaired += 1;
    }
    Ok(resolution.value())
}

/// Attribute every layer within every enabled region.
///
/// Disabled regions are skipped. Each report is logged once its scan is
/// complete.
pub fn run(
    regions: &[Region],
    layers: &[LayerPoints],
    index: &CityIndex,
    config: &RunConfig,
) -> Vec<RegionSummary> {
    let mut summaries = Vec::new();

    for region in regions {
        if !region.enabled {
            debug!("Skipping disabled region {}", region.id);
            continue;
        }

        info!("");
        info!("****** Generating {} ******", region.id);

        let mut reports = Vec::with_capacity(layers.len());
        for layer_points in layers {
            info!(">>>> {}", layer_points.layer.id);
            let report = attribute(
                region,
                &layer_points.layer,
                &layer_points.points,
                index,
                config.threshold_km,
            );
            log_report(&report);
            reports.push(report);
        }

        summaries.push(RegionSummary {
            region: region.clone(),
            reports,
        });
    }

    summaries
}

fn log_report(report: &AttributionReport) {
    for entry in report.anomalies() {
        warn!(
            "{} in {}: points attributed to {} lie up to {:.2} km away (threshold {:.2} km)",
            report.layer, report.region, entry.city, entry.max_distance_km, report.threshold_km
        );
    }

    let anomalous = report.is_anomalous();
    for line in report.lines() {
        if anomalous && line == "WARNING" {
            warn!("{}", line);
        } else {
            info!("{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cities::City;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawPoint {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    fn index() -> CityIndex {
        CityIndex::new(vec![
            City::new("Riyadh", 24.7136, 46.6753),
            City::new("Dammam", 26.4207, 50.0888),
            City::new("Jeddah", 21.4858, 39.1925),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolve_points_drops_and_repairs() {
        let points = vec![
            raw(json!({"latitude": "24.7136", "longitude": "46.6753"})),
            raw(json!({"latitude": "N/A", "longitude": "46.6753"})),
            raw(json!({"latitude": "247200", "longitude": "466800"})),
            raw(json!({"longitude": "46.6753"})),
        ];

        let (resolved, stats) = resolve_points_with_stats(&points, &RepairConfig::default());
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0], ResolvedPoint::new(24.7136, 46.6753));
        assert_eq!(resolved[1], ResolvedPoint::new(24.72, 466.8));
        assert_eq!(
            stats,
            ResolveStats {
                resolved: 2,
                dropped: 2,
                repaired: 2
            }
        );
        assert_eq!(resolve_points(&points, &RepairConfig::default()), resolved);
    }

    #[test]
    fn test_repair_counted_before_drop() {
        // Longitude resolves (and is repaired) before the latitude fails
        let points = vec![raw(json!({"latitude": "unknown", "longitude": "0500888"}))];

        let (resolved, stats) = resolve_points_with_stats(&points, &RepairConfig::default());
        assert!(resolved.is_empty());
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.repaired, 1);
    }

    #[test]
    fn test_end_to_end_single_layer() {
        let raw_points = vec![
            // valid, inside Riyadh region, ~1.1 km from Riyadh
            raw(json!({"latitude": "24.7236", "longitude": "46.6753"})),
            // valid, inside Riyadh region, at Riyadh
            raw(json!({"latitude": "24.7136", "longitude": "46.6753"})),
            // valid, outside (Jeddah)
            raw(json!({"latitude": "21.4858", "longitude": "39.1925"})),
            // malformed
            raw(json!({"latitude": "unknown", "longitude": "46.7000"})),
            // latitude needs repair, lands outside the region
            raw(json!({"latitude": "264207", "longitude": "50.0888"})),
        ];

        let (points, stats) = resolve_points_with_stats(&raw_points, &RepairConfig::default());
        assert_eq!(points.len(), 4);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.repaired, 1);

        // 264207 -> "26" + "." + "4207"
        assert_eq!(points[3], ResolvedPoint::new(26.4207, 50.0888));

        let regions = vec![Region::new("riyadh", 25.0, 47.0, 24.0, 46.0)];
        let layers = vec![LayerPoints {
            layer: Layer::new("Total Cases", "b", "test"),
            points,
        }];

        let summaries = run(&regions, &layers, &index(), &RunConfig::default());
        assert_eq!(summaries.len(), 1);

        let report = &summaries[0].reports[0];
        assert_eq!(report.entries.len(), 1);
        let riyadh = report.entry("Riyadh").unwrap();
        assert_eq!(riyadh.count, 2);
        let expected = crate::haversine_km(24.7236, 46.6753, 24.7136, 46.6753);
        assert!((riyadh.max_distance_km - expected).abs() < 1e-9);
        assert!(!report.is_anomalous());
        assert!(!summaries[0].is_anomalous());
    }

    #[test]
    fn test_run_skips_disabled_regions() {
        let mut disabled = Region::new("jeddah", 22.0, 40.0, 21.0, 39.0);
        disabled.enabled = false;
        let regions = vec![Region::new("riyadh", 25.0, 47.0, 24.0, 46.0), disabled];

        let layers = vec![
            LayerPoints {
                layer: Layer::new("Total Cases", "b", "test"),
                points: vec![ResolvedPoint::new(24.7136, 46.6753)],
            },
            LayerPoints {
                layer: Layer::new("Active Cases", "r", "test"),
                points: vec![ResolvedPoint::new(24.9, 46.9)],
            },
        ];

        let summaries = run(&regions, &layers, &index(), &RunConfig::default());
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].region.id, "riyadh");
        assert_eq!(summaries[0].reports.len(), 2);
        assert_eq!(summaries[0].reports[1].layer, "Active Cases");
        // (24.9, 46.9) is ~30 km from Riyadh
        assert!(summaries[0].reports[1].is_anomalous());
        assert!(summaries[0].is_anomalous());
    }
}
