//! Case Locator
//!
//! Repairs case-location coordinates reported by the public feeds, filters
//! them into configured map regions and attributes each point to the nearest
//! reference city so that suspicious clusters can be spotted before plotting.
//!
//! # Pipeline
//!
//! ```text
//! RawPoint → resolve → ResolvedPoint → Region::contains
//!          → CityIndex::nearest → AttributionReport
//! ```
//!
//! | Stage      | Module        | Description |
//! |------------|---------------|-------------|
//! | Repair     | [`coord`]     | Regex recovery of decimal degrees, decimal-point reinsertion |
//! | Distance   | crate root    | Haversine great-circle distance (R = 6373 km) |
//! | Cities     | [`cities`]    | Nearest reference city lookup |
//! | Regions    | [`region`]    | Inclusive bounding-box filter |
//! | Reporting  | [`report`]    | Per-city counts, max distance, anomaly flag |
//!
//! # Coordinate Repair Assumption
//!
//! Integer-only coordinates are assumed to have lost their decimal point in
//! transit. The point is reinserted after a fixed number of integral digits:
//! 2 for latitude and 3 for longitude. These widths fit the deployment region
//! and give wrong values elsewhere.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;

pub mod cities;
pub mod config;
pub mod coord;
pub mod export;
pub mod feed;
pub mod layer;
pub mod pipeline;
pub mod region;
pub mod report;

pub use cities::{City, CityIndex};
pub use config::{ConfigError, MapsConfig};
pub use coord::{RepairConfig, Resolution};
pub use layer::Layer;
pub use region::Region;
pub use report::{AttributionEntry, AttributionReport};

/// Approximate Earth radius in km used for city attribution
pub const EARTH_RADIUS_KM: f64 = 6373.0;

/// Distance above which a city attribution is flagged as suspicious (km)
pub const ANOMALY_THRESHOLD_KM: f64 = 3.5;

/// Integral digits of a latitude that lost its decimal point
pub const LAT_DIGITS: usize = 2;

/// Integral digits of a longitude that lost its decimal point
pub const LON_DIGITS: usize = 3;

#[derive(Error, Debug)]
pub enum LocatorError {
    #[error("Invalid {field}: {value:?}")]
    MalformedCoordinate { field: String, value: String },
    #[error("No cities configured")]
    NoCitiesConfigured,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, LocatorError>;

/// A coordinate pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl ResolvedPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Haversine distance between two points in km
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    haversine_km_with_radius(lat1, lon1, lat2, lon2, EARTH_RADIUS_KM)
}

/// Haversine distance for an explicit sphere radius
pub fn haversine_km_with_radius(
    lat1: f64,
    lon1: f64,
    lat2: f64,
    lon2: f64,
    radius_km: f64,
) -> f64 {
    let lat1_rad = lat1 * PI / 180.0;
    let lat2_rad = lat2 * PI / 180.0;
    let dlat = (lat2 - lat1) * PI / 180.0;
    let dlon = (lon2 - lon1) * PI / 180.0;

    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    radius_km * c
}
