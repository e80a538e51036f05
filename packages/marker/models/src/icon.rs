//! Compile-time registry of marker icons.
//!
//! Icons are SVG path definitions keyed by name and embedded via
//! `include_str!`. Point markers copy the chosen icon verbatim into their
//! `icon` field; area markers always carry the `area` icon.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Embedded icon definitions, keyed by icon name.
const ICONS_JSON: &str = include_str!("../assets/icons.json");

/// One icon definition, as the locator-map API expects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Icon {
    /// Icon identifier.
    pub id: String,
    /// SVG path data.
    pub path: String,
    /// Glyph advance width of the SVG font the path was taken from.
    #[serde(rename = "horiz-adv-x")]
    pub horiz_adv_x: u32,
    /// Default scale.
    pub scale: f64,
    /// Optional outline width (e.g. `"2px"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<String>,
    /// Any other keys, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Name → icon lookup table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IconRegistry {
    icons: BTreeMap<String, Icon>,
}

impl IconRegistry {
    /// Loads the icon set embedded in this crate.
    ///
    /// # Panics
    ///
    /// Panics if the embedded icon JSON fails to parse. Since it is a
    /// compile-time constant, a parse failure indicates a development error
    /// and is caught by the tests.
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_json_str(ICONS_JSON)
            .unwrap_or_else(|e| panic!("Failed to parse embedded icon registry: {e}"))
    }

    /// Parses a registry from a JSON object of `name → icon`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or an icon is missing a
    /// required key.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            icons: serde_json::from_str(json)?,
        })
    }

    /// Looks up an icon by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Icon> {
        self.icons.get(name)
    }

    /// All icon names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.icons.keys().map(String::as_str)
    }
}
