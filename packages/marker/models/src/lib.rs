#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Locator-map marker schema types.
//!
//! Defines the typed [`InputRow`] that caller datasets are parsed into,
//! the enumerated marker fields, the [`Marker`] shape the Datawrapper
//! locator-map API accepts, the embedded point/area templates that supply
//! every default, and the icon registry point markers draw from.

pub mod icon;
pub mod marker;
pub mod template;

pub use icon::{Icon, IconRegistry};
pub use marker::{
    AreaFeature, AreaMarker, AreaProperties, ConnectorLine, LabelText, Marker, MarkerEntry,
    MarkerList, PointMarker, Tooltip, Visibility,
};
pub use template::MarkerTemplates;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString, VariantNames};

/// The two marker families a locator map supports.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    VariantNames,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MarkerType {
    /// A marker pinned to a single coordinate.
    Point,
    /// A marker drawn from a line or polygon geometry.
    Area,
}

/// Where a point marker's label sits relative to its coordinate.
///
/// Variant order matches the allow-list shown in validation errors.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    VariantNames,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Anchor {
    /// Label to the right of the marker, vertically centered.
    #[default]
    MiddleLeft,
    /// Label centered on the marker.
    MiddleCenter,
    /// Label to the left of the marker, vertically centered.
    MiddleRight,
    /// Label above and to the right.
    BottomLeft,
    /// Label directly above.
    BottomCenter,
    /// Label above and to the left.
    BottomRight,
    /// Label below and to the right.
    TopLeft,
    /// Label directly below.
    TopCenter,
    /// Label below and to the left.
    TopRight,
}

/// A `fill` or `stroke` value, which callers may give either as a custom
/// color or as a visibility toggle for the template's default color.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ColorOrFlag {
    /// The column is missing or null for this row.
    #[default]
    Absent,
    /// A custom color; expected to be a `#rrggbb` hex code.
    Color(String),
    /// Show (`true`) or hide (`false`) the default color.
    Flag(bool),
}

impl ColorOrFlag {
    /// Returns `true` if no value was supplied.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl std::fmt::Display for ColorOrFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absent => f.write_str("<absent>"),
            Self::Color(color) => f.write_str(color),
            Self::Flag(flag) => write!(f, "{flag}"),
        }
    }
}

/// Required data a row can be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MissingField {
    /// No `type` column and nothing to infer it from.
    #[strum(
        to_string = "marker type (no type column, no geometry, and no latitude/longitude pair)"
    )]
    MarkerType,
    /// A point row with neither a point geometry nor latitude/longitude.
    #[strum(to_string = "coordinates (no point geometry and no latitude/longitude pair)")]
    Coordinates,
    /// An area row with no geometry.
    #[strum(to_string = "geometry (area markers need a line or polygon geometry)")]
    Geometry,
}

/// One record of a caller-supplied dataset.
///
/// Every attribute is optional; which ones are required depends on the
/// marker type the row resolves to. Enumerated attributes (`marker_type`,
/// `anchor`, `icon`) are kept as the raw strings the caller wrote so that
/// validation can report the offending value verbatim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputRow {
    /// Declared marker type (`point` or `area`).
    pub marker_type: Option<String>,
    /// Marker title.
    pub title: Option<String>,
    /// Tooltip body text.
    pub tooltip: Option<String>,
    /// Icon registry key (points only).
    pub icon: Option<String>,
    /// Icon scale factor.
    pub scale: Option<f64>,
    /// Marker color, `#rrggbb`.
    pub marker_color: Option<String>,
    /// Short text drawn inside the marker.
    pub marker_symbol: Option<String>,
    /// Color of the marker symbol text, `#rrggbb`.
    pub marker_text_color: Option<String>,
    /// Label anchor (points only).
    pub anchor: Option<String>,
    /// Whether the marker shows on desktop and mobile.
    pub visible: Option<bool>,
    /// Latitude in degrees.
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    pub longitude: Option<f64>,
    /// Point, line or polygon geometry.
    pub geometry: Option<geo::Geometry<f64>>,
    /// Area fill color or visibility toggle.
    pub fill: ColorOrFlag,
    /// Area outline color or visibility toggle.
    pub stroke: ColorOrFlag,
    /// Area fill opacity, 0 to 1.
    pub fill_opacity: Option<f64>,
    /// Area outline opacity, 0 to 1.
    pub stroke_opacity: Option<f64>,
    /// Area outline width in pixels.
    pub stroke_width: Option<f64>,
    /// SVG dash pattern for the area outline (e.g. `"1,2.2"`).
    pub stroke_dasharray: Option<String>,
}

impl InputRow {
    /// Returns the latitude/longitude pair if both halves are present.
    #[must_use]
    pub const fn lat_lon(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr as _;
    use strum::VariantNames as _;

    #[test]
    fn parses_kebab_case_anchors() {
        assert_eq!(Anchor::from_str("middle-right").unwrap(), Anchor::MiddleRight);
        assert_eq!(Anchor::from_str("top-left").unwrap(), Anchor::TopLeft);
        assert!(Anchor::from_str("middle").is_err());
    }

    #[test]
    fn anchor_allow_list_has_nine_entries() {
        assert_eq!(Anchor::VARIANTS.len(), 9);
        assert_eq!(Anchor::VARIANTS[0], "middle-left");
    }

    #[test]
    fn marker_type_round_trips_through_strings() {
        assert_eq!(MarkerType::from_str("area").unwrap(), MarkerType::Area);
        assert_eq!(MarkerType::Point.to_string(), "point");
        assert_eq!(MarkerType::VARIANTS, &["point", "area"]);
    }

    #[test]
    fn lat_lon_requires_both_halves() {
        let row = InputRow {
            latitude: Some(1.0),
            ..InputRow::default()
        };
        assert!(row.lat_lon().is_none());

        let row = InputRow {
            latitude: Some(1.0),
            longitude: Some(2.0),
            ..InputRow::default()
        };
        assert_eq!(row.lat_lon(), Some((1.0, 2.0)));
    }
}
