//! Map regions and bounding-box filtering

use crate::ResolvedPoint;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A configured map region.
///
/// Bounds are decimal degrees. `north > south` and `east > west` are expected
/// from configuration and not checked here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub north: f64,
    pub east: f64,
    pub south: f64,
    pub west: f64,
    pub enabled: bool,
    /// Background image for plotting; never read by the locator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<PathBuf>,
}

impl Region {
    pub fn new(id: impl Into<String>, north: f64, east: f64, south: f64, west: f64) -> Self {
        Self {
            id: id.into(),
            north,
            east,
            south,
            west,
            enabled: true,
            image: None,
        }
    }

    /// Inclusive bounding-box test on all four sides
    pub fn contains(&self, point: &ResolvedPoint) -> bool {
        point.longitude >= self.west
            && point.longitude <= self.east
            && point.latitude >= self.south
            && point.latitude <= self.north
    }

    /// Points of `points` that fall inside this region
    pub fn filter<'a>(
        &'a self,
        points: &'a [ResolvedPoint],
    ) -> impl Iterator<Item = &'a ResolvedPoint> + 'a {
        points.iter().filter(move |p| self.contains(p))
    }
}
