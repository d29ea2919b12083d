//! Feed loading from JSON files
//!
//! A feed is a JSON array of point objects as served by the case-location
//! boards. Records are kept untyped so that malformed coordinates reach
//! [`crate::coord`] instead of failing the whole file.

use crate::{LocatorError, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

/// One untyped record from a feed
pub type RawPoint = serde_json::Map<String, serde_json::Value>;

/// Load raw points from a JSON feed file
pub fn load_layer_points(path: impl AsRef<Path>) -> Result<Vec<RawPoint>> {
    let path = path.as_ref();
    info!("Loading points from {:?}", path);

    let file = File::open(path)?;
    let points = parse_points(BufReader::new(file))?;

    info!("Loaded {} raw points from {:?}", points.len(), path);
    Ok(points)
}

/// Parse raw points from any reader.
///
/// Array entries that are not objects are skipped.
pub fn parse_points<R: Read>(reader: R) -> Result<Vec<RawPoint>> {
    let raw: serde_json::Value = serde_json::from_reader(reader)?;

    let entries = match raw {
        serde_json::Value::Array(entries) => entries,
        other => {
            return Err(LocatorError::Json(serde::de::Error::custom(format!(
                "expected an array of points, got {}",
                json_kind(&other)
            ))))
        }
    };

    let mut points = Vec::with_capacity(entries.len());
    let mut skipped = 0;

    for entry in entries {
        match entry {
            serde_json::Value::Object(map) => points.push(map),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("Skipped {} feed entries that are not objects", skipped);
    }

    Ok(points)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
