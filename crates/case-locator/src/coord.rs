//! Coordinate recovery from raw feed fields
//!
//! The feeds deliver coordinates as free text. Three shapes occur in practice:
//! - well-formed decimals (`"24.7136"`, `"-46.6753"`), parsed as-is
//! - digit runs that lost their decimal point (`"247136"`), repaired by
//!   reinserting the point after a fixed number of integral digits
//! - garbage (`"N/A"`, `""`), rejected with [`LocatorError::MalformedCoordinate`]

use crate::feed::RawPoint;
use crate::{LocatorError, Result, LAT_DIGITS, LON_DIGITS};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Integral digit widths used when reinserting a lost decimal point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairConfig {
    pub lat_digits: usize,
    pub lon_digits: usize,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            lat_digits: LAT_DIGITS,
            lon_digits: LON_DIGITS,
        }
    }
}

/// Outcome of resolving a single coordinate field
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A decimal number was found and parsed directly
    Parsed(f64),
    /// An integer-only run was found and its decimal point reinserted
    Repaired { original: String, value: f64 },
}

impl Resolution {
    pub fn value(&self) -> f64 {
        match self {
            Resolution::Parsed(v) => *v,
            Resolution::Repaired { value, .. } => *value,
        }
    }

    pub fn is_repaired(&self) -> bool {
        matches!(self, Resolution::Repaired { .. })
    }
}

fn decimal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-?[0-9]+\.[0-9]+").expect("valid decimal regex"))
}

fn integer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-?[0-9]+").expect("valid integer regex"))
}

/// Resolve a raw coordinate string to decimal degrees.
///
/// The first signed decimal anywhere in `raw` wins. Failing that, the first
/// signed digit run is read as an integer and a decimal point is placed after
/// its first `digits_before_decimal` digits, e.g. `"4523"` with 2 digits
/// becomes `45.23` and `"-1064523"` with 3 digits becomes `-106.4523`.
pub fn resolve(raw: &str, digits_before_decimal: usize) -> Result<Resolution> {
    if let Some(m) = decimal_pattern().find(raw) {
        let value = m.as_str().parse::<f64>().map_err(|_| malformed("coordinate", raw))?;
        return Ok(Resolution::Parsed(value));
    }

    let m = integer_pattern()
        .find(raw)
        .ok_or_else(|| malformed("coordinate", raw))?;

    let text = m.as_str();
    let negative = text.starts_with('-');

    // Integer semantics: leading zeros do not count as integral digits
    let digits = text.trim_start_matches('-').trim_start_matches('0');
    let digits = if digits.is_empty() { "0" } else { digits };

    let split = digits_before_decimal.min(digits.len());
    let (int_part, frac_part) = digits.split_at(split);
    let repaired = if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, frac_part)
    };

    let magnitude = repaired
        .parse::<f64>()
        .map_err(|_| malformed("coordinate", raw))?;
    let value = if negative { -magnitude } else { magnitude };

    Ok(Resolution::Repaired {
        original: raw.to_string(),
        value,
    })
}

/// Resolve a named field of a raw feed record.
///
/// Absent and non-string fields are malformed, same as unparseable text.
pub fn resolve_field(
    point: &RawPoint,
    field: &str,
    digits_before_decimal: usize,
) -> Result<Resolution> {
    let raw = match point.get(field) {
        Some(serde_json::Value::String(s)) => s.as_str(),
        Some(other) => return Err(malformed(field, &other.to_string())),
        None => return Err(malformed(field, "<missing>")),
    };

    resolve(raw, digits_before_decimal).map_err(|e| match e {
        LocatorError::MalformedCoordinate { value, .. } => malformed(field, &value),
        other => other,
    })
}

fn malformed(field: &str, value: &str) -> LocatorError {
    LocatorError::MalformedCoordinate {
        field: field.to_string(),
        value: value.to_string(),
    }
}
