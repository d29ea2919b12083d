//! Point layers
//!
//! A layer groups the points of one feed under a report identity. The two
//! standard layers are the confirmed-case and active-case boards.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Confirmed cases board
pub const CONFIRMED_CASES_URL: &str = "https://covid19.srs.care/boards/people-location/confirmed";

/// Active cases board
pub const ACTIVE_CASES_URL: &str = "https://covid19.srs.care/boards/people-location/active";

/// A named group of points sharing a report identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    /// Report identity, e.g. "Total Cases"
    pub id: String,
    /// Plot color tag; bookkeeping only
    pub color: String,
    /// Where the points come from (URL or local file)
    pub source: String,
}

impl Layer {
    pub fn new(id: impl Into<String>, color: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            color: color.into(),
            source: source.into(),
        }
    }

    /// The confirmed and active case layers, in report order
    pub fn default_layers() -> Vec<Layer> {
        vec![
            Layer::new("Total Cases", "b", CONFIRMED_CASES_URL),
            Layer::new("Active Cases", "r", ACTIVE_CASES_URL),
        ]
    }
}

/// Parses `ID=SOURCE`, e.g. `Total Cases=data/confirmed.json`.
///
/// The color is taken from the default layer with the same id, if any.
impl FromStr for Layer {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (id, source) = s
            .split_once('=')
            .ok_or_else(|| format!("expected ID=SOURCE, got {:?}", s))?;
        let id = id.trim();
        let source = source.trim();
        if id.is_empty() || source.is_empty() {
            return Err(format!("expected ID=SOURCE, got {:?}", s));
        }

        let color = Layer::default_layers()
            .into_iter()
            .find(|l| l.id == id)
            .map(|l| l.color)
            .unwrap_or_else(|| "k".to_string());

        Ok(Layer::new(id, color, source))
    }
}
