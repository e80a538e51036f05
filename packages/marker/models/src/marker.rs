//! The marker objects a locator map stores, as the API serializes them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Anchor, Icon, MarkerType};

/// A fully populated marker, ready for upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Marker {
    /// A point marker.
    Point(PointMarker),
    /// An area marker.
    Area(AreaMarker),
}

impl Marker {
    /// Returns which family this marker belongs to.
    #[must_use]
    pub const fn marker_type(&self) -> MarkerType {
        match self {
            Self::Point(_) => MarkerType::Point,
            Self::Area(_) => MarkerType::Area,
        }
    }

    /// Returns the marker id, empty until ids are assigned.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Point(point) => &point.id,
            Self::Area(area) => &area.id,
        }
    }

    /// Replaces the marker id.
    pub fn set_id(&mut self, id: String) {
        match self {
            Self::Point(point) => point.id = id,
            Self::Area(area) => area.id = id,
        }
    }
}

/// A marker pinned to a single `[longitude, latitude]` coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointMarker {
    /// Sequential id (`m0`, `m1`, …).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Label text.
    pub title: String,
    /// Icon definition, copied from the icon registry.
    pub icon: Icon,
    /// Icon scale factor.
    pub scale: f64,
    /// Whether the label is placed next to the icon.
    pub text_position: bool,
    /// Icon color.
    pub marker_color: String,
    /// Text drawn inside the icon.
    pub marker_symbol: String,
    /// Color of [`Self::marker_symbol`].
    pub marker_text_color: String,
    /// Label anchor.
    pub anchor: Anchor,
    /// Vertical label offset in pixels.
    pub offset_y: f64,
    /// Horizontal label offset in pixels.
    pub offset_x: f64,
    /// Label style preset (`plain`, `box`, …).
    pub label_style: String,
    /// Label typography.
    pub text: LabelText,
    /// Extra CSS class.
    pub class: String,
    /// Label rotation in degrees.
    pub rotate: f64,
    /// Whether the marker is shown at all.
    pub visible: bool,
    /// Whether the marker is locked in the editor.
    pub locked: bool,
    /// Editor style preset.
    pub preset: String,
    /// Per-device visibility, mirrored from [`Self::visible`].
    pub visibility: Visibility,
    /// Tooltip shown on hover.
    pub tooltip: Tooltip,
    /// Leader line from label to icon.
    pub connector_line: ConnectorLine,
    /// `[longitude, latitude]` in WGS84 degrees.
    #[serde(default)]
    pub coordinates: [f64; 2],
}

/// A marker drawn from a line or polygon geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaMarker {
    /// Sequential id (`m0`, `m1`, …).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Label text.
    pub title: String,
    /// Whether the marker is shown at all.
    pub visible: bool,
    /// Whether the fill color is drawn.
    pub fill: bool,
    /// Whether the outline is drawn.
    pub stroke: bool,
    /// Whether the map keeps the exact shape instead of simplifying it.
    pub exact_shape: bool,
    /// Whether the area is highlighted.
    pub highlight: bool,
    /// Color used in the editor's marker list.
    pub marker_color: String,
    /// Styling applied to the geometry.
    pub properties: AreaProperties,
    /// The area icon shown in the editor.
    pub icon: Icon,
    /// Per-device visibility, mirrored from [`Self::visible`].
    pub visibility: Visibility,
    /// The geometry, wrapped as a `GeoJSON` `Feature`.
    pub feature: AreaFeature,
}

/// Label typography for point markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelText {
    /// Bold label.
    pub bold: bool,
    /// Label color.
    pub color: String,
    /// Font size in pixels.
    pub font_size: f64,
    /// Halo color drawn behind the label.
    pub halo: String,
    /// Italic label.
    pub italic: bool,
    /// Letter spacing.
    pub space: bool,
    /// Uppercase label.
    pub uppercase: bool,
}

/// Leader line between a point label and its icon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorLine {
    /// Whether the line is drawn.
    pub enabled: bool,
    /// Arrow head style.
    pub arrow_head: String,
    /// Curve style.
    #[serde(rename = "type")]
    pub kind: String,
    /// Gap between the line end and the icon.
    pub target_padding: f64,
    /// Line width.
    pub stroke: f64,
    /// Line length.
    pub line_length: f64,
}

/// Per-device visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    /// Shown on desktop layouts.
    pub desktop: bool,
    /// Shown on mobile layouts.
    pub mobile: bool,
}

impl Visibility {
    /// Same visibility on every device.
    #[must_use]
    pub const fn both(visible: bool) -> Self {
        Self {
            desktop: visible,
            mobile: visible,
        }
    }
}

/// Tooltip body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tooltip {
    /// Tooltip text; may contain HTML.
    pub text: String,
}

/// Styling for an area marker's geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AreaProperties {
    /// Fill color.
    pub fill: String,
    /// Fill opacity, 0 to 1.
    pub fill_opacity: f64,
    /// Outline color.
    pub stroke: String,
    /// Outline width in pixels.
    pub stroke_width: f64,
    /// Outline opacity, 0 to 1.
    pub stroke_opacity: f64,
    /// SVG dash pattern.
    pub stroke_dasharray: String,
    /// Fill pattern (`solid`, `diagonal-up`, …).
    pub pattern: String,
    /// Pattern line width.
    pub pattern_line_width: f64,
    /// Pattern line gap.
    pub pattern_line_gap: f64,
}

/// `GeoJSON` `Feature` envelope around an area geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaFeature {
    /// Always `"Feature"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Always empty.
    #[serde(default)]
    pub properties: Map<String, Value>,
    /// The area geometry; `null` only in the template.
    pub geometry: Option<geojson::Geometry>,
}

impl AreaFeature {
    /// Wraps a geometry in a `Feature` envelope.
    #[must_use]
    pub fn new(geometry: geojson::Geometry) -> Self {
        Self {
            kind: "Feature".to_string(),
            properties: Map::new(),
            geometry: Some(geometry),
        }
    }
}

/// One entry of the final marker list.
///
/// Supplemental shapes are pre-formed JSON objects that are passed through
/// untouched apart from receiving an id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MarkerEntry {
    /// A marker built from an input row.
    Built(Marker),
    /// A caller-authored shape appended verbatim.
    Supplemental(Map<String, Value>),
}

impl MarkerEntry {
    /// Returns the entry id, if one has been assigned.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Built(marker) => Some(marker.id()).filter(|id| !id.is_empty()),
            Self::Supplemental(shape) => shape.get("id").and_then(Value::as_str),
        }
    }

    /// Sets the entry id.
    pub fn set_id(&mut self, id: String) {
        match self {
            Self::Built(marker) => marker.set_id(id),
            Self::Supplemental(shape) => {
                shape.insert("id".to_string(), Value::String(id));
            }
        }
    }
}

/// The ordered marker list, serialized exactly as the upload payload
/// (`{"markers": [...]}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarkerList {
    /// Markers in upload order.
    pub markers: Vec<MarkerEntry>,
}

impl MarkerList {
    /// Number of markers in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Returns `true` if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Assigns `m0`, `m1`, … in list order, overwriting any existing ids.
    pub fn assign_ids(&mut self) {
        for (i, entry) in self.markers.iter_mut().enumerate() {
            entry.set_id(format!("m{i}"));
        }
    }
}
