//! Builds one [`Marker`] from one [`InputRow`].
//!
//! A row is validated first, then its marker type is resolved, then every
//! template field is filled from the row where the row supplies a value
//! and from the template otherwise.

use std::str::FromStr as _;

use dw_graphics_marker_models::{
    Anchor, AreaFeature, AreaMarker, ColorOrFlag, IconRegistry, InputRow, Marker, MarkerTemplates,
    MarkerType, MissingField, PointMarker, Tooltip, Visibility,
};
use geo::Geometry;
use strum::VariantNames as _;

use crate::{MarkerError, validate};

/// Icon used by point rows that do not name one.
pub const DEFAULT_ICON: &str = "circle";

/// Returns the supplied value, or a copy of the template value.
fn supplied_or<T: Clone>(supplied: Option<T>, template: &T) -> T {
    supplied.unwrap_or_else(|| template.clone())
}

/// Resolves a row's marker type.
///
/// A declared `type` wins. Otherwise a non-point geometry means an area,
/// and a point geometry or a full latitude/longitude pair means a point.
///
/// # Errors
///
/// * [`MarkerError::InvalidMarkerData`] if the declared type is unknown
/// * [`MarkerError::MissingData`] if nothing identifies the type
pub fn resolve_marker_type(row: &InputRow) -> Result<MarkerType, MarkerError> {
    if let Some(declared) = row.marker_type.as_deref() {
        return MarkerType::from_str(declared)
            .map_err(|_| validate::invalid_enum("type", declared, MarkerType::VARIANTS));
    }

    match &row.geometry {
        Some(Geometry::Point(_)) => Ok(MarkerType::Point),
        Some(_) => Ok(MarkerType::Area),
        None if row.lat_lon().is_some() => Ok(MarkerType::Point),
        None => Err(MarkerError::MissingData(MissingField::MarkerType)),
    }
}

/// Builds markers from rows using a fixed template set and icon registry.
#[derive(Debug, Clone)]
pub struct MarkerBuilder {
    templates: MarkerTemplates,
    icons: IconRegistry,
}

impl MarkerBuilder {
    /// Creates a builder over the given templates and icons.
    #[must_use]
    pub const fn new(templates: MarkerTemplates, icons: IconRegistry) -> Self {
        Self { templates, icons }
    }

    /// Creates a builder over the templates and icons embedded in
    /// `dw_graphics_marker_models`.
    ///
    /// # Panics
    ///
    /// Panics if the embedded assets fail to parse; see
    /// [`MarkerTemplates::embedded`] and [`IconRegistry::embedded`].
    #[must_use]
    pub fn embedded() -> Self {
        Self::new(MarkerTemplates::embedded(), IconRegistry::embedded())
    }

    /// The icon registry point markers draw from.
    #[must_use]
    pub const fn icons(&self) -> &IconRegistry {
        &self.icons
    }

    /// The templates supplying every default.
    #[must_use]
    pub const fn templates(&self) -> &MarkerTemplates {
        &self.templates
    }

    /// Validates `row` and builds its marker.
    ///
    /// The returned marker has no id; ids are assigned once the full list
    /// is known.
    ///
    /// # Errors
    ///
    /// * [`MarkerError::InvalidMarkerData`] or [`MarkerError::InvalidHexcode`]
    ///   for the first field that fails validation
    /// * [`MarkerError::MissingData`] if the type, coordinates or geometry
    ///   cannot be determined
    /// * [`MarkerError::Geometry`] if the geometry does not suit the type
    /// * [`MarkerError::IconNotFound`] if the default icon is missing from
    ///   the registry
    pub fn build(&self, row: &InputRow) -> Result<Marker, MarkerError> {
        validate::validate_row(row, &self.icons)?;

        match resolve_marker_type(row)? {
            MarkerType::Point => self.build_point(row).map(Marker::Point),
            MarkerType::Area => self.build_area(row).map(Marker::Area),
        }
    }

    fn build_point(&self, row: &InputRow) -> Result<PointMarker, MarkerError> {
        let template = &self.templates.point;

        let icon_name = row.icon.as_deref().unwrap_or(DEFAULT_ICON);
        let icon = self
            .icons
            .get(icon_name)
            .cloned()
            .ok_or_else(|| MarkerError::IconNotFound {
                name: icon_name.to_string(),
            })?;

        let anchor = row
            .anchor
            .as_deref()
            .map(|value| {
                Anchor::from_str(value)
                    .map_err(|_| validate::invalid_enum("anchor", value, Anchor::VARIANTS))
            })
            .transpose()?;

        let visible = supplied_or(row.visible, &template.visible);

        Ok(PointMarker {
            title: supplied_or(row.title.clone(), &template.title),
            icon,
            scale: supplied_or(row.scale, &template.scale),
            marker_color: supplied_or(row.marker_color.clone(), &template.marker_color),
            marker_symbol: supplied_or(row.marker_symbol.clone(), &template.marker_symbol),
            marker_text_color: supplied_or(
                row.marker_text_color.clone(),
                &template.marker_text_color,
            ),
            anchor: supplied_or(anchor, &template.anchor),
            visible,
            visibility: Visibility::both(visible),
            tooltip: Tooltip {
                text: supplied_or(row.tooltip.clone(), &template.tooltip.text),
            },
            coordinates: point_coordinates(row)?,
            ..template.clone()
        })
    }

    fn build_area(&self, row: &InputRow) -> Result<AreaMarker, MarkerError> {
        let template = &self.templates.area;

        let geometry = match &row.geometry {
            Some(Geometry::Point(_)) => {
                return Err(MarkerError::Geometry {
                    message: "area markers need a line or polygon geometry, got a point"
                        .to_string(),
                });
            }
            Some(geometry) => geojson::Geometry::new(geojson::Value::from(geometry)),
            None => return Err(MarkerError::MissingData(MissingField::Geometry)),
        };

        let (fill, fill_color) = color_or_flag(&row.fill, template.fill, &template.properties.fill);
        let (stroke, stroke_color) =
            color_or_flag(&row.stroke, template.stroke, &template.properties.stroke);

        let visible = supplied_or(row.visible, &template.visible);
        let defaults = &template.properties;

        let mut properties = defaults.clone();
        properties.fill = fill_color;
        properties.stroke = stroke_color;
        properties.fill_opacity = supplied_or(row.fill_opacity, &defaults.fill_opacity);
        properties.stroke_opacity = supplied_or(row.stroke_opacity, &defaults.stroke_opacity);
        properties.stroke_width = supplied_or(row.stroke_width, &defaults.stroke_width);
        properties.stroke_dasharray =
            supplied_or(row.stroke_dasharray.clone(), &defaults.stroke_dasharray);

        Ok(AreaMarker {
            title: supplied_or(row.title.clone(), &template.title),
            visible,
            fill,
            stroke,
            marker_color: supplied_or(row.marker_color.clone(), &template.marker_color),
            properties,
            visibility: Visibility::both(visible),
            feature: AreaFeature::new(geometry),
            ..template.clone()
        })
    }
}

/// Resolves a `fill`/`stroke` value into its top-level toggle and its
/// property color.
fn color_or_flag(value: &ColorOrFlag, default_flag: bool, default_color: &str) -> (bool, String) {
    match value {
        ColorOrFlag::Color(color) => (true, color.clone()),
        ColorOrFlag::Flag(flag) => (*flag, default_color.to_string()),
        ColorOrFlag::Absent => (default_flag, default_color.to_string()),
    }
}

/// Returns `[longitude, latitude]` for a point row.
///
/// A point geometry takes precedence over latitude/longitude columns.
fn point_coordinates(row: &InputRow) -> Result<[f64; 2], MarkerError> {
    match (&row.geometry, row.lat_lon()) {
        (Some(Geometry::Point(point)), _) => Ok([point.x(), point.y()]),
        (_, Some((lat, lon))) => Ok([lon, lat]),
        (Some(_), None) => Err(MarkerError::Geometry {
            message: "point markers need a point geometry or latitude/longitude columns"
                .to_string(),
        }),
        (None, None) => Err(MarkerError::MissingData(MissingField::Coordinates)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Point, Polygon, line_string, polygon};

    fn triangle() -> Polygon<f64> {
        polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 0.0)]
    }

    #[test]
    fn infers_area_from_non_point_geometry() {
        let row = InputRow {
            geometry: Some(Geometry::Polygon(triangle())),
            ..InputRow::default()
        };
        assert_eq!(resolve_marker_type(&row).unwrap(), MarkerType::Area);

        let line: LineString<f64> = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)];
        let row = InputRow {
            geometry: Some(Geometry::LineString(line)),
            ..InputRow::default()
        };
        assert_eq!(resolve_marker_type(&row).unwrap(), MarkerType::Area);
    }

    #[test]
    fn infers_point_from_lat_lon_or_point_geometry() {
        let row = InputRow {
            latitude: Some(45.0),
            longitude: Some(-75.0),
            ..InputRow::default()
        };
        assert_eq!(resolve_marker_type(&row).unwrap(), MarkerType::Point);

        let row = InputRow {
            geometry: Some(Geometry::Point(Point::new(-75.0, 45.0))),
            ..InputRow::default()
        };
        assert_eq!(resolve_marker_type(&row).unwrap(), MarkerType::Point);
    }

    #[test]
    fn missing_type_and_location_is_missing_data() {
        let row = InputRow {
            title: Some("Nowhere".into()),
            latitude: Some(45.0),
            ..InputRow::default()
        };
        assert!(matches!(
            resolve_marker_type(&row),
            Err(MarkerError::MissingData(MissingField::MarkerType))
        ));
        assert!(matches!(
            MarkerBuilder::embedded().build(&row),
            Err(MarkerError::MissingData(MissingField::MarkerType))
        ));
    }

    #[test]
    fn declared_type_wins_over_geometry() {
        let row = InputRow {
            marker_type: Some("point".into()),
            geometry: Some(Geometry::Polygon(triangle())),
            latitude: Some(1.0),
            longitude: Some(2.0),
            ..InputRow::default()
        };
        let Marker::Point(point) = MarkerBuilder::embedded().build(&row).unwrap() else {
            panic!("expected a point marker");
        };
        assert_eq!(point.coordinates, [2.0, 1.0]);
    }

    #[test]
    fn fully_specified_point_row() {
        let row = InputRow {
            marker_type: Some("point".into()),
            title: Some("Ottawa".into()),
            tooltip: Some("Capital".into()),
            icon: Some("star-2".into()),
            scale: Some(2.0),
            marker_color: Some("#112233".into()),
            marker_symbol: Some("O".into()),
            marker_text_color: Some("#ffffff".into()),
            anchor: Some("top-center".into()),
            visible: Some(false),
            latitude: Some(1.0),
            longitude: Some(2.0),
            ..InputRow::default()
        };
        let Marker::Point(point) = MarkerBuilder::embedded().build(&row).unwrap() else {
            panic!("expected a point marker");
        };
        assert_eq!(point.coordinates, [2.0, 1.0]);
        assert!((point.scale - 2.0).abs() < f64::EPSILON);
        assert_eq!(point.title, "Ottawa");
        assert_eq!(point.icon.id, "star-2");
        assert_eq!(point.marker_color, "#112233");
        assert_eq!(point.marker_symbol, "O");
        assert_eq!(point.marker_text_color, "#ffffff");
        assert_eq!(point.anchor, Anchor::TopCenter);
        assert!(!point.visible);
        assert_eq!(point.visibility, Visibility::both(false));
        assert_eq!(point.tooltip.text, "Capital");
    }

    #[test]
    fn point_row_with_attention_icon_end_to_end() {
        let row = InputRow {
            title: Some("Road closed".into()),
            tooltip: Some("Closed until <b>Friday</b>".into()),
            icon: Some("attention".into()),
            anchor: Some("middle-right".into()),
            latitude: Some(43.65),
            longitude: Some(-79.38),
            ..InputRow::default()
        };
        let builder = MarkerBuilder::embedded();
        let marker = builder.build(&row).unwrap();
        let json = serde_json::to_value(&marker).unwrap();

        assert_eq!(json["type"], "point");
        assert_eq!(json["icon"], serde_json::to_value(builder.icons().get("attention").unwrap()).unwrap());
        assert_eq!(json["anchor"], "middle-right");
        assert_eq!(json["tooltip"], serde_json::json!({"text": "Closed until <b>Friday</b>"}));
        assert_eq!(json["visible"], true);
        assert_eq!(json["visibility"], serde_json::json!({"desktop": true, "mobile": true}));
        assert_eq!(json["coordinates"], serde_json::json!([-79.38, 43.65]));
        assert_eq!(json["markerColor"], "#C42127");
    }

    #[test]
    fn point_geometry_takes_precedence_over_lat_lon() {
        let row = InputRow {
            geometry: Some(Geometry::Point(Point::new(10.0, 20.0))),
            latitude: Some(1.0),
            longitude: Some(2.0),
            ..InputRow::default()
        };
        let Marker::Point(point) = MarkerBuilder::embedded().build(&row).unwrap() else {
            panic!("expected a point marker");
        };
        assert_eq!(point.coordinates, [10.0, 20.0]);
    }

    #[test]
    fn point_without_coordinates_fails() {
        let builder = MarkerBuilder::embedded();
        let row = InputRow {
            marker_type: Some("point".into()),
            ..InputRow::default()
        };
        assert!(matches!(
            builder.build(&row),
            Err(MarkerError::MissingData(MissingField::Coordinates))
        ));

        let row = InputRow {
            marker_type: Some("point".into()),
            geometry: Some(Geometry::Polygon(triangle())),
            ..InputRow::default()
        };
        assert!(matches!(builder.build(&row), Err(MarkerError::Geometry { .. })));
    }

    #[test]
    fn area_fill_color_turns_fill_on() {
        let row = InputRow {
            geometry: Some(Geometry::Polygon(triangle())),
            fill: ColorOrFlag::Color("#6a3d99".into()),
            ..InputRow::default()
        };
        let Marker::Area(area) = MarkerBuilder::embedded().build(&row).unwrap() else {
            panic!("expected an area marker");
        };
        assert!(area.fill);
        assert_eq!(area.properties.fill, "#6a3d99");
        assert!(area.stroke);
        assert_eq!(area.properties.stroke, "#000000");
    }

    #[test]
    fn area_without_styling_uses_template_defaults() {
        let builder = MarkerBuilder::embedded();
        let row = InputRow {
            geometry: Some(Geometry::Polygon(triangle())),
            ..InputRow::default()
        };
        let Marker::Area(area) = builder.build(&row).unwrap() else {
            panic!("expected an area marker");
        };
        let template = &builder.templates().area;
        assert_eq!(area.fill, template.fill);
        assert_eq!(area.stroke, template.stroke);
        assert_eq!(area.properties, template.properties);
        assert_eq!(area.icon.id, "area");
        assert_eq!(area.feature.kind, "Feature");
        assert!(area.feature.properties.is_empty());
        assert!(area.feature.geometry.is_some());
    }

    #[test]
    fn area_flag_keeps_template_color() {
        let row = InputRow {
            geometry: Some(Geometry::Polygon(triangle())),
            fill: ColorOrFlag::Flag(false),
            fill_opacity: Some(0.0),
            stroke_dasharray: Some("1,2.2".into()),
            ..InputRow::default()
        };
        let Marker::Area(area) = MarkerBuilder::embedded().build(&row).unwrap() else {
            panic!("expected an area marker");
        };
        assert!(!area.fill);
        assert_eq!(area.properties.fill, "#C42127");
        assert!(area.properties.fill_opacity.abs() < f64::EPSILON);
        assert_eq!(area.properties.stroke_dasharray, "1,2.2");
    }

    #[test]
    fn area_geometry_errors() {
        let builder = MarkerBuilder::embedded();
        let row = InputRow {
            marker_type: Some("area".into()),
            geometry: Some(Geometry::Point(Point::new(0.0, 0.0))),
            ..InputRow::default()
        };
        assert!(matches!(builder.build(&row), Err(MarkerError::Geometry { .. })));

        let row = InputRow {
            marker_type: Some("area".into()),
            ..InputRow::default()
        };
        assert!(matches!(
            builder.build(&row),
            Err(MarkerError::MissingData(MissingField::Geometry))
        ));
    }

    #[test]
    fn validation_runs_before_inference() {
        let row = InputRow {
            marker_color: Some("not-a-color".into()),
            ..InputRow::default()
        };
        assert!(matches!(
            MarkerBuilder::embedded().build(&row),
            Err(MarkerError::InvalidHexcode { .. })
        ));
    }

    #[test]
    fn missing_default_icon_is_icon_not_found() {
        let icons = IconRegistry::from_json_str("{}").unwrap();
        let builder = MarkerBuilder::new(MarkerTemplates::embedded(), icons);
        let row = InputRow {
            latitude: Some(1.0),
            longitude: Some(2.0),
            ..InputRow::default()
        };
        assert!(matches!(
            builder.build(&row),
            Err(MarkerError::IconNotFound { ref name }) if name == DEFAULT_ICON
        ));
    }
}
