//! JSON and GeoJSON output of attribution runs

use crate::pipeline::{RegionSummary, RunConfig};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::{Deserialize, Serialize};

/// Serialized result of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutput {
    pub regions: Vec<RegionSummary>,
    pub metadata: RunMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub generated_at: String,
    pub threshold_km: f64,
    pub lat_digits: usize,
    pub lon_digits: usize,
    pub total_regions: usize,
    pub total_points: usize,
    pub anomalous_reports: usize,
}

impl RunOutput {
    pub fn new(regions: Vec<RegionSummary>, config: &RunConfig) -> Self {
        let reports = regions.iter().flat_map(|r| r.reports.iter());
        let (total_points, anomalous_reports) = reports.fold((0, 0), |(points, anomalous), r| {
            (points + r.total_points(), anomalous + usize::from(r.is_anomalous()))
        });

        let metadata = RunMetadata {
            generated_at: chrono::Utc::now().to_rfc3339(),
            threshold_km: config.threshold_km,
            lat_digits: config.repair.lat_digits,
            lon_digits: config.repair.lon_digits,
            total_regions: regions.len(),
            total_points,
            anomalous_reports,
        };

        Self { regions, metadata }
    }
}

/// Export attributed points as a GeoJSON FeatureCollection
pub fn to_geojson(output: &RunOutput) -> FeatureCollection {
    let features = output
        .regions
        .iter()
        .flat_map(|summary| summary.reports.iter())
        .flat_map(|report| {
            report.points.iter().map(move |p| {
                let mut properties = JsonObject::new();
                properties.insert("region".to_string(), report.region.clone().into());
                properties.insert("layer".to_string(), report.layer.clone().into());
                properties.insert("city".to_string(), p.city.clone().into());
                properties.insert("distance_km".to_string(), p.distance_km.into());
                properties.insert(
                    "anomalous".to_string(),
                    (p.distance_km > report.threshold_km).into(),
                );

                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(Value::Point(vec![
                        p.point.longitude,
                        p.point.latitude,
                    ]))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
        })
        .collect();

    let mut metadata = JsonObject::new();
    if let Ok(value) = serde_json::to_value(&output.metadata) {
        metadata.insert("metadata".to_string(), value);
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(metadata),
    }
}
