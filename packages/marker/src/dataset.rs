//! Caller datasets: ordered input rows plus the CRS their geometries use.
//!
//! Rows are read from CSV files or `GeoJSON` feature collections. Both go
//! through the same property mapping, so a column in a CSV and a property
//! on a feature mean the same thing.

use std::io::Read;
use std::path::Path;

use dw_graphics_marker_models::{ColorOrFlag, InputRow};
use geojson::GeoJson;
use serde_json::{Map, Value};

use crate::{Crs, MarkerError};

/// Name of the CSV column that may carry a `GeoJSON` geometry.
pub const GEOMETRY_COLUMN: &str = "geometry";

/// An ordered set of input rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Rows in input order.
    pub rows: Vec<InputRow>,
    /// CRS the row geometries are expressed in. Latitude/longitude columns
    /// are always degrees.
    pub crs: Crs,
}

impl Dataset {
    /// Creates a dataset from rows in the given CRS.
    #[must_use]
    pub const fn new(rows: Vec<InputRow>, crs: Crs) -> Self {
        Self { rows, crs }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends another dataset's rows.
    ///
    /// # Errors
    ///
    /// Returns [`MarkerError::UnsupportedCrs`] if the datasets use different
    /// CRSs and `self` is not empty.
    pub fn extend(&mut self, other: Self) -> Result<(), MarkerError> {
        if self.rows.is_empty() {
            self.crs = other.crs;
        } else if self.crs != other.crs {
            return Err(MarkerError::UnsupportedCrs(format!(
                "cannot mix {} rows into a {} dataset",
                other.crs, self.crs
            )));
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    /// Reads a dataset from a `.csv`, `.json` or `.geojson` file.
    ///
    /// # Errors
    ///
    /// * [`MarkerError::Io`] if the file cannot be read
    /// * any error from [`Self::from_csv_reader`] or [`Self::from_geojson_str`]
    pub fn from_path(path: &Path) -> Result<Self, MarkerError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let dataset = match extension.as_deref() {
            Some("json" | "geojson") => Self::from_geojson_str(&std::fs::read_to_string(path)?)?,
            _ => Self::from_csv_reader(std::fs::File::open(path)?)?,
        };

        log::info!("Read {} rows from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    /// Reads rows from CSV with a header row.
    ///
    /// Empty cells are absent values and every other cell is kept as text;
    /// fields that accept booleans read `true`/`false` themselves. An
    /// optional `geometry` column holds a `GeoJSON` geometry. CSV data is
    /// always WGS84.
    ///
    /// # Errors
    ///
    /// * [`MarkerError::Csv`] for malformed CSV
    /// * [`MarkerError::Geometry`] if a `geometry` cell is not valid `GeoJSON`
    /// * any error from [`from_properties`]
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, MarkerError> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_owned())
            .collect();

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;

            let mut properties = Map::new();
            let mut geometry = None;
            for (i, header) in headers.iter().enumerate() {
                let cell = record.get(i).unwrap_or("").trim();
                if header == GEOMETRY_COLUMN {
                    if !cell.is_empty() {
                        geometry = Some(parse_geometry_cell(cell).map_err(|e| e.at_row(index))?);
                    }
                    continue;
                }
                properties.insert(header.clone(), csv_cell_value(cell));
            }

            rows.push(from_properties(&properties, geometry).map_err(|e| e.at_row(index))?);
        }

        Ok(Self::new(rows, Crs::Wgs84))
    }

    /// Reads rows from a `GeoJSON` `FeatureCollection`, `Feature` or bare
    /// geometry.
    ///
    /// A legacy `crs` member (`{"type": "name", "properties": {"name": …}}`)
    /// sets the dataset CRS; without one the data is WGS84.
    ///
    /// # Errors
    ///
    /// * [`MarkerError::GeoJson`] for malformed `GeoJSON`
    /// * [`MarkerError::UnsupportedCrs`] for an unknown `crs` member
    /// * any error from [`from_properties`]
    pub fn from_geojson_str(json: &str) -> Result<Self, MarkerError> {
        let features = match json.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(collection) => {
                let crs = legacy_crs(collection.foreign_members.as_ref())?;
                return Ok(Self::new(features_to_rows(collection.features)?, crs));
            }
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::Geometry(geometry) => vec![geojson::Feature {
                bbox: None,
                geometry: Some(geometry),
                id: None,
                properties: None,
                foreign_members: None,
            }],
        };

        Ok(Self::new(features_to_rows(features)?, Crs::Wgs84))
    }
}

fn features_to_rows(features: Vec<geojson::Feature>) -> Result<Vec<InputRow>, MarkerError> {
    features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| {
            let geometry = feature
                .geometry
                .map(|g| geo::Geometry::<f64>::try_from(g.value))
                .transpose()
                .map_err(|e| MarkerError::from(e).at_row(index))?;
            let properties = feature.properties.unwrap_or_default();
            from_properties(&properties, geometry).map_err(|e| e.at_row(index))
        })
        .collect()
}

fn legacy_crs(foreign_members: Option<&Map<String, Value>>) -> Result<Crs, MarkerError> {
    foreign_members
        .and_then(|members| members.get("crs"))
        .and_then(|crs| crs.pointer("/properties/name"))
        .and_then(Value::as_str)
        .map_or(Ok(Crs::Wgs84), Crs::from_code)
}

fn csv_cell_value(cell: &str) -> Value {
    if cell.is_empty() {
        Value::Null
    } else {
        Value::String(cell.to_owned())
    }
}

fn parse_geometry_cell(cell: &str) -> Result<geo::Geometry<f64>, MarkerError> {
    let geometry: geojson::Geometry =
        serde_json::from_str(cell).map_err(|e| MarkerError::Geometry {
            message: format!("geometry column is not a GeoJSON geometry: {e}"),
        })?;
    Ok(geo::Geometry::<f64>::try_from(geometry.value)?)
}

/// Maps a property map (CSV columns or `GeoJSON` feature properties) onto an
/// [`InputRow`].
///
/// Null values are absent. Numeric fields accept numbers or numeric
/// strings, and `NaN` or infinite values count as absent. `visible`,
/// `fill` and `stroke` accept booleans or `"true"`/`"false"`. Unknown keys
/// are ignored.
///
/// # Errors
///
/// * [`MarkerError::InvalidNumber`] if a numeric field holds non-numeric text
/// * [`MarkerError::InvalidMarkerData`] if `visible` is not a boolean
pub fn from_properties(
    properties: &Map<String, Value>,
    geometry: Option<geo::Geometry<f64>>,
) -> Result<InputRow, MarkerError> {
    let text = |key: &str| string_value(properties.get(key));
    let number = |key: &str| number_value(key, properties.get(key));

    Ok(InputRow {
        marker_type: text("type"),
        title: text("title"),
        tooltip: text("tooltip"),
        icon: text("icon"),
        scale: number("scale")?,
        marker_color: text("markerColor"),
        marker_symbol: text("markerSymbol"),
        marker_text_color: text("markerTextColor"),
        anchor: text("anchor"),
        visible: bool_value("visible", properties.get("visible"))?,
        latitude: number("latitude")?,
        longitude: number("longitude")?,
        geometry,
        fill: color_or_flag_value(properties.get("fill")),
        stroke: color_or_flag_value(properties.get("stroke")),
        fill_opacity: number("fill-opacity")?,
        stroke_opacity: number("stroke-opacity")?,
        stroke_width: number("stroke-width")?,
        stroke_dasharray: text("stroke-dasharray"),
    })
}

fn string_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn number_value(field: &str, value: Option<&Value>) -> Result<Option<f64>, MarkerError> {
    let invalid = |value: String| MarkerError::InvalidNumber {
        field: field.to_string(),
        value,
    };

    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(Some).ok_or_else(|| invalid(n.to_string())),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(|n| n.is_finite().then_some(n))
            .map_err(|_| invalid(s.clone())),
        Some(other) => Err(invalid(other.to_string())),
    }
}

fn bool_value(field: &str, value: Option<&Value>) -> Result<Option<bool>, MarkerError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(other) => Err(MarkerError::InvalidMarkerData {
            field: field.to_string(),
            value: other.as_str().map_or_else(|| other.to_string(), str::to_owned),
            allowed: vec!["true".to_string(), "false".to_string()],
        }),
    }
}

fn color_or_flag_value(value: Option<&Value>) -> ColorOrFlag {
    match value {
        None | Some(Value::Null) => ColorOrFlag::Absent,
        Some(Value::Bool(b)) => ColorOrFlag::Flag(*b),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => ColorOrFlag::Flag(true),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => ColorOrFlag::Flag(false),
        Some(Value::String(s)) => ColorOrFlag::Color(s.clone()),
        Some(other) => ColorOrFlag::Color(other.to_string()),
    }
}
