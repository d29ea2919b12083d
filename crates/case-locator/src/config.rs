//! Maps configuration (maps.ini)
//!
//! ```ini
//! [global]
//! map_count = 2
//!
//! [map_0]
//! image = riyadh.png
//! ; north, east, south, west
//! coordinates = 25.0, 47.0, 24.0, 46.0
//! id = riyadh
//! enabled = yes
//!
//! [cities]
//! cities =
//!     Riyadh: 46.6753, 24.7136
//!     Dammam: 50.0888, 26.4207
//! ```
//!
//! City coordinates are longitude first. Images are resolved relative to the
//! directory holding the config file and must exist.

use crate::cities::{City, CityIndex};
use crate::region::Region;
use ini::{Ini, Properties};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Accepted spellings of `true`
pub const TRUE_VALUES: [&str; 5] = ["true", "yes", "1", "sure", "why_not"];

/// Accepted spellings of `false`
pub const FALSE_VALUES: [&str; 5] = ["false", "no", "0", "nope", "no_way"];

/// Maps configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or parse the INI file
    #[error("Failed to read maps config: {0}")]
    ReadError(#[from] ini::Error),

    /// Required key is absent
    #[error("Missing configuration key: {section}.{key}")]
    MissingKey { section: String, key: String },

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Map image does not exist
    #[error("Map image does not exist: {0}")]
    MissingImage(PathBuf),
}

/// Regions and reference cities loaded from maps.ini
#[derive(Debug, Clone, Default)]
pub struct MapsConfig {
    pub regions: Vec<Region>,
    pub cities: Vec<City>,
}

impl MapsConfig {
    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        info!("Reading maps config {:?}", path);
        let ini = Ini::load_from_file(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let config = Self::from_ini(&ini, base_dir)?;

        info!(
            "Loaded {} regions ({} enabled) and {} cities",
            config.regions.len(),
            config.enabled_regions().count(),
            config.cities.len()
        );
        Ok(config)
    }

    /// Parse configuration text; images resolve against `base_dir`.
    pub fn from_str_in(content: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(content)
            .map_err(|e| ConfigError::ReadError(ini::Error::Parse(e)))?;
        Self::from_ini(&ini, base_dir)
    }

    fn from_ini(ini: &Ini, base_dir: &Path) -> Result<Self, ConfigError> {
        let global = section(ini, "global")?;
        let count_text = required(global, "global", "map_count")?;
        let map_count: usize = count_text.trim().parse().map_err(|_| {
            invalid(
                "global",
                "map_count",
                count_text,
                "expected a non-negative integer",
            )
        })?;

        let mut regions = Vec::with_capacity(map_count);
        for i in 0..map_count {
            let name = format!("map_{}", i);
            regions.push(parse_region(section(ini, &name)?, &name, base_dir)?);
        }

        let cities = parse_cities(section(ini, "cities")?)?;

        Ok(Self { regions, cities })
    }

    pub fn enabled_regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter().filter(|r| r.enabled)
    }

    /// Build the city index; fails when no cities are configured
    pub fn city_index(&self) -> crate::Result<CityIndex> {
        CityIndex::new(self.cities.clone())
    }
}

fn parse_region(props: &Properties, name: &str, base_dir: &Path) -> Result<Region, ConfigError> {
    let image = base_dir.join(required(props, name, "image")?.trim());
    if !image.is_file() {
        return Err(ConfigError::MissingImage(image));
    }

    let coords_text = required(props, name, "coordinates")?;
    let coords = parse_floats(coords_text).ok_or_else(|| {
        invalid(
            name,
            "coordinates",
            coords_text,
            "expected comma-separated numbers",
        )
    })?;
    if coords.len() != 4 {
        return Err(invalid(
            name,
            "coordinates",
            coords_text,
            &format!("expected 4 coordinates (north, east, south, west), got {}", coords.len()),
        ));
    }

    let id = required(props, name, "id")?.trim().to_string();

    let enabled = match props.get("enabled") {
        Some(v) => parse_bool(v).ok_or_else(|| {
            invalid(
                name,
                "enabled",
                v,
                &format!(
                    "accepted values: (for true) {}, (for false) {}",
                    TRUE_VALUES.join(","),
                    FALSE_VALUES.join(",")
                ),
            )
        })?,
        None => true,
    };

    Ok(Region {
        id,
        north: coords[0],
        east: coords[1],
        south: coords[2],
        west: coords[3],
        enabled,
        image: Some(image),
    })
}

/// Cities come either as one multi-line `cities` value or, when the INI
/// reader splits the indented lines, as one `Name: lon, lat` entry each.
/// Indented comment lines are not dropped by the reader and arrive as keys.
fn parse_cities(props: &Properties) -> Result<Vec<City>, ConfigError> {
    let mut cities = Vec::new();

    for (key, value) in props.iter() {
        if key == "cities" {
            for line in value.lines() {
                let line = line.trim();
                if line.is_empty() || is_comment(line) {
                    continue;
                }
                let (name, coords) = line.split_once(':').ok_or_else(|| {
                    invalid("cities", "cities", line, "expected 'Name: longitude, latitude'")
                })?;
                cities.push(parse_city(name, coords)?);
            }
        } else if !is_comment(key.trim()) {
            cities.push(parse_city(key, value)?);
        }
    }

    Ok(cities)
}

fn is_comment(line: &str) -> bool {
    line.starts_with('#') || line.starts_with(';')
}

fn parse_city(name: &str, coords: &str) -> Result<City, ConfigError> {
    let name = name.trim();
    let values = parse_floats(coords).filter(|v| v.len() == 2).ok_or_else(|| {
        invalid("cities", name, coords, "expected 'longitude, latitude'")
    })?;

    let city = City::new(name, values[1], values[0]);
    debug!("Read {:?}", city);
    Ok(city)
}

/// Parse a boolean flag. Case-insensitive.
pub fn parse_bool(value: &str) -> Option<bool> {
    let v = value.trim().to_lowercase();
    if TRUE_VALUES.contains(&v.as_str()) {
        Some(true)
    } else if FALSE_VALUES.contains(&v.as_str()) {
        Some(false)
    } else {
        None
    }
}

fn parse_floats(text: &str) -> Option<Vec<f64>> {
    text.split(',').map(|v| v.trim().parse::<f64>().ok()).collect()
}

fn section<'a>(ini: &'a Ini, name: &str) -> Result<&'a Properties, ConfigError> {
    ini.section(Some(name)).ok_or_else(|| ConfigError::MissingKey {
        section: name.to_string(),
        key: "*".to_string(),
    })
}

fn required<'a>(props: &'a Properties, section: &str, key: &str) -> Result<&'a str, ConfigError> {
    props.get(key).ok_or_else(|| ConfigError::MissingKey {
        section: section.to_string(),
        key: key.to_string(),
    })
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
