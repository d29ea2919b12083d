//! Reference cities and nearest-city lookup

use crate::{haversine_km, LocatorError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A configured reference city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl City {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

/// Read-only index of reference cities.
///
/// Lookups scan every city. City lists are tens of entries long, so no
/// spatial index is kept.
#[derive(Debug, Clone)]
pub struct CityIndex {
    cities: Vec<City>,
}

impl CityIndex {
    /// Build the index. At least one city is required.
    pub fn new(cities: Vec<City>) -> Result<Self> {
        if cities.is_empty() {
            return Err(LocatorError::NoCitiesConfigured);
        }
        debug!("Built city index with {} cities", cities.len());
        Ok(Self { cities })
    }

    /// Closest city to the given point and its distance in km.
    ///
    /// On an exact distance tie the city configured first is returned.
    pub fn nearest(&self, lat: f64, lon: f64) -> (&City, f64) {
        let mut best = &self.cities[0];
        let mut best_km = haversine_km(lat, lon, best.latitude, best.longitude);

        for city in &self.cities[1..] {
            let d = haversine_km(lat, lon, city.latitude, city.longitude);
            if d < best_km {
                best = city;
                best_km = d;
            }
        }

        (best, best_km)
    }
}
