//! Dataset → marker list.
//!
//! Reprojects the dataset to WGS84, builds one marker per row, appends any
//! supplemental shapes and then numbers the whole list. The output only
//! depends on the inputs, ids included.

use std::path::Path;

use dw_graphics_marker_models::{MarkerEntry, MarkerList};
use serde_json::{Map, Value};

use crate::{Dataset, MarkerBuilder, MarkerError};

/// Normalizes a dataset and optional supplemental shape document into the
/// upload-ready marker list.
///
/// Built markers keep dataset order and always precede supplemental
/// shapes. Ids `m0`, `m1`, … are assigned over the combined list.
///
/// # Errors
///
/// * [`MarkerError::Row`] wrapping the first row that fails to build
/// * any error from [`read_supplemental`]
pub fn normalize(
    dataset: Dataset,
    supplemental: Option<&Path>,
    builder: &MarkerBuilder,
) -> Result<MarkerList, MarkerError> {
    let row_count = dataset.len();
    let mut markers = build_entries(dataset, builder)?;

    if let Some(path) = supplemental {
        let shapes = read_supplemental(path)?;
        log::info!(
            "Appending {} supplemental shapes from {}",
            shapes.len(),
            path.display()
        );
        markers.extend(shapes.into_iter().map(MarkerEntry::Supplemental));
    }

    let mut list = MarkerList { markers };
    list.assign_ids();

    log::info!(
        "Normalized {row_count} rows into {} markers",
        list.len()
    );
    Ok(list)
}

/// Reprojects and builds every row, stopping at the first failure.
///
/// # Errors
///
/// Returns [`MarkerError::Row`] wrapping the failing row's error.
pub fn build_entries(
    dataset: Dataset,
    builder: &MarkerBuilder,
) -> Result<Vec<MarkerEntry>, MarkerError> {
    let crs = dataset.crs;
    if crs != crate::Crs::Wgs84 {
        log::debug!("Reprojecting {} rows from {crs} to EPSG:4326", dataset.len());
    }

    dataset
        .rows
        .into_iter()
        .enumerate()
        .map(|(index, mut row)| {
            row.geometry = row.geometry.map(|geometry| crs.to_wgs84(geometry));
            builder
                .build(&row)
                .map(MarkerEntry::Built)
                .map_err(|e| e.at_row(index))
        })
        .collect()
}

/// Reads a supplemental shape document.
///
/// # Errors
///
/// * [`MarkerError::Io`] if the file cannot be read
/// * any error from [`parse_supplemental`]
pub fn read_supplemental(path: &Path) -> Result<Vec<Map<String, Value>>, MarkerError> {
    parse_supplemental(&std::fs::read_to_string(path)?)
}

/// Parses a supplemental shape document: a single JSON object or an array
/// of them. Shapes are returned verbatim.
///
/// # Errors
///
/// * [`MarkerError::Json`] if the document is not JSON
/// * [`MarkerError::SupplementalShape`] if the document or an array entry is
///   not a JSON object
pub fn parse_supplemental(json: &str) -> Result<Vec<Map<String, Value>>, MarkerError> {
    let entries = match serde_json::from_str::<Value>(json)? {
        Value::Array(entries) => entries,
        single => vec![single],
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| match entry {
            Value::Object(shape) => Ok(shape),
            other => Err(MarkerError::SupplementalShape {
                message: format!("entry {index} is not a JSON object: {other}"),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Crs;
    use dw_graphics_marker_models::{ColorOrFlag, InputRow, Marker, MissingField};
    use geo::{Geometry, Point, polygon};

    fn sample_dataset() -> Dataset {
        Dataset::new(
            vec![
                InputRow {
                    title: Some("Ottawa".into()),
                    latitude: Some(45.42),
                    longitude: Some(-75.69),
                    ..InputRow::default()
                },
                InputRow {
                    geometry: Some(Geometry::Polygon(
                        polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 0.0)],
                    )),
                    fill: ColorOrFlag::Color("#6a3d99".into()),
                    ..InputRow::default()
                },
            ],
            Crs::Wgs84,
        )
    }

    fn write_supplemental(name: &str, contents: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("dw_graphics_normalize_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn normalize_is_deterministic() {
        let builder = MarkerBuilder::embedded();
        let path = write_supplemental(
            "deterministic.json",
            r#"[{"type": "area", "title": "Extra"}, {"type": "point", "title": "Another"}]"#,
        );

        let first = normalize(sample_dataset(), Some(&path), &builder).unwrap();
        let second = normalize(sample_dataset(), Some(&path), &builder).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn built_markers_precede_supplemental_shapes() {
        let builder = MarkerBuilder::embedded();
        let path = write_supplemental(
            "ordering.json",
            r#"[{"id": "keep-me-not", "type": "area", "title": "Province"}]"#,
        );

        let list = normalize(sample_dataset(), Some(&path), &builder).unwrap();
        assert_eq!(list.len(), 3);
        assert!(matches!(list.markers[0], MarkerEntry::Built(Marker::Point(_))));
        assert!(matches!(list.markers[1], MarkerEntry::Built(Marker::Area(_))));

        let MarkerEntry::Supplemental(shape) = &list.markers[2] else {
            panic!("expected the supplemental shape last");
        };
        assert_eq!(shape["id"], "m2");
        assert_eq!(shape["title"], "Province");

        let ids: Vec<_> = list.markers.iter().filter_map(MarkerEntry::id).collect();
        assert_eq!(ids, vec!["m0", "m1", "m2"]);
    }

    #[test]
    fn single_object_document_becomes_one_entry() {
        let shapes = parse_supplemental(r#"{"type": "area"}"#).unwrap();
        assert_eq!(shapes.len(), 1);
    }

    #[test]
    fn non_object_entries_are_rejected() {
        assert!(matches!(
            parse_supplemental(r#"[{"type": "area"}, 3]"#),
            Err(MarkerError::SupplementalShape { .. })
        ));
        assert!(matches!(
            parse_supplemental("not json"),
            Err(MarkerError::Json(_))
        ));
    }

    #[test]
    fn failing_row_aborts_with_index() {
        let mut dataset = sample_dataset();
        dataset.rows.push(InputRow {
            marker_color: Some("crimson".into()),
            latitude: Some(1.0),
            longitude: Some(1.0),
            ..InputRow::default()
        });

        let err = normalize(dataset, None, &MarkerBuilder::embedded()).unwrap_err();
        assert!(matches!(err, MarkerError::Row { index: 2, .. }));
        assert!(matches!(err.root(), MarkerError::InvalidHexcode { .. }));
    }

    #[test]
    fn nan_latitude_is_missing_not_emitted() {
        let dataset = Dataset::from_csv_reader("title,latitude,longitude\nA,NaN,2\n".as_bytes())
            .unwrap();
        let err = normalize(dataset, None, &MarkerBuilder::embedded()).unwrap_err();
        assert!(matches!(err, MarkerError::Row { index: 0, .. }));
        assert!(matches!(err.root(), MarkerError::MissingData(_)));

        let dataset = Dataset::from_csv_reader(
            "type,title,latitude,longitude\npoint,A,NaN,2\n".as_bytes(),
        )
        .unwrap();
        let err = normalize(dataset, None, &MarkerBuilder::embedded()).unwrap_err();
        assert!(matches!(
            err.root(),
            MarkerError::MissingData(MissingField::Coordinates)
        ));
    }

    #[test]
    fn reprojects_web_mercator_geometries() {
        let dataset = Dataset::new(
            vec![InputRow {
                geometry: Some(Geometry::Point(Point::new(0.0, 0.0))),
                ..InputRow::default()
            }],
            Crs::WebMercator,
        );
        let list = normalize(dataset, None, &MarkerBuilder::embedded()).unwrap();
        let MarkerEntry::Built(Marker::Point(point)) = &list.markers[0] else {
            panic!("expected a point marker");
        };
        assert_eq!(point.coordinates, [0.0, 0.0]);
        assert_eq!(point.id, "m0");
    }

    #[test]
    fn payload_wraps_markers() {
        let list = normalize(sample_dataset(), None, &MarkerBuilder::embedded()).unwrap();
        let payload = serde_json::to_value(&list).unwrap();
        assert_eq!(payload["markers"].as_array().unwrap().len(), 2);
        assert_eq!(payload["markers"][1]["properties"]["fill"], "#6a3d99");
        assert_eq!(payload["markers"][1]["fill"], true);
    }
}
