//! Default point and area markers.
//!
//! Every field a caller leaves out of an input row is taken from these
//! templates, so they double as the canonical list of marker fields.

use crate::{AreaMarker, PointMarker};

const POINT_JSON: &str = include_str!("../assets/point.json");
const AREA_JSON: &str = include_str!("../assets/area.json");

/// The point and area marker templates.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerTemplates {
    /// Default point marker.
    pub point: PointMarker,
    /// Default area marker; its `feature.geometry` is `null`.
    pub area: AreaMarker,
}

impl MarkerTemplates {
    /// Loads the templates embedded in this crate.
    ///
    /// # Panics
    ///
    /// Panics if either embedded template fails to parse. Since they are
    /// compile-time constants, a parse failure indicates a development
    /// error and is caught by the tests.
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_json_strs(POINT_JSON, AREA_JSON)
            .unwrap_or_else(|e| panic!("Failed to parse embedded marker templates: {e}"))
    }

    /// Parses templates from point and area JSON documents.
    ///
    /// # Errors
    ///
    /// Returns an error if either document is malformed or missing a field.
    pub fn from_json_strs(point: &str, area: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            point: serde_json::from_str(point)?,
            area: serde_json::from_str(area)?,
        })
    }
}
