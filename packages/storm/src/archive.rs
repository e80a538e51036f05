//! NHC shapefile archives.
//!
//! A forecast archive (`{id}_5day_latest.zip`) and a best-track archive
//! (`{id}_best_track.zip`) each hold several shapefiles. A layer is located
//! by the suffix of its `.shp` name; its `.dbf` attribute table and
//! optional `.prj` projection share the same stem.

use std::collections::BTreeMap;
use std::io::{Cursor, Read as _};

use dw_graphics_marker::Crs;
use dw_graphics_storm_models::Layer;
use shapefile::dbase::FieldValue;
use zip::ZipArchive;

use crate::StormError;

/// One feature of a layer: its WGS84 geometry and its attributes as text.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeRecord {
    /// Feature geometry, reprojected to WGS84.
    pub geometry: geo::Geometry<f64>,
    /// DBF attributes. Null fields are omitted.
    pub attributes: BTreeMap<String, String>,
}

impl ShapeRecord {
    /// Returns a trimmed, non-empty attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

/// Downloads an archive.
///
/// # Errors
///
/// Returns [`StormError::ArchiveUnavailable`] if the host cannot be reached,
/// the transfer fails, or the server does not return 2xx.
pub async fn fetch_archive(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, StormError> {
    log::info!("Downloading {url}");

    let unavailable = |reason: String| StormError::ArchiveUnavailable {
        url: url.to_string(),
        reason,
    };

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| unavailable(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(unavailable(format!("HTTP {}", status.as_u16())));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| unavailable(e.to_string()))?;
    log::debug!("Downloaded {} bytes from {url}", bytes.len());
    Ok(bytes.to_vec())
}

/// An in-memory archive.
pub struct StormArchive {
    url: String,
    zip: ZipArchive<Cursor<Vec<u8>>>,
}

impl StormArchive {
    /// Opens archive bytes. `url` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`StormError::Zip`] if the bytes are not a zip archive.
    pub fn from_bytes(url: &str, bytes: Vec<u8>) -> Result<Self, StormError> {
        Ok(Self {
            url: url.to_string(),
            zip: ZipArchive::new(Cursor::new(bytes))?,
        })
    }

    /// The URL the archive was read from.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Entry names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.zip.file_names().collect();
        names.sort_unstable();
        names
    }

    /// Finds the `.shp` entry for a layer.
    ///
    /// # Errors
    ///
    /// Returns [`StormError::LayerNotFound`] if no entry ends with the
    /// layer's suffix.
    pub fn layer_name(&self, layer: Layer) -> Result<String, StormError> {
        self.names()
            .into_iter()
            .find(|name| name.to_ascii_lowercase().ends_with(layer.suffix()))
            .map(ToString::to_string)
            .ok_or_else(|| StormError::LayerNotFound {
                layer: layer.to_string(),
                url: self.url.clone(),
            })
    }

    /// Finds the entry with the same stem as `shp_name` and the given
    /// extension, ignoring case.
    fn sibling(&self, shp_name: &str, extension: &str) -> Option<String> {
        let stem = &shp_name[..shp_name.len() - ".shp".len()];
        let wanted = format!("{stem}.{extension}");
        self.zip
            .file_names()
            .find(|name| name.eq_ignore_ascii_case(&wanted))
            .map(ToString::to_string)
    }

    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, StormError> {
        let mut file = self.zip.by_name(name)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Reads every feature of a layer, reprojected to WGS84.
    ///
    /// A layer without a `.prj` is taken to be WGS84.
    ///
    /// # Errors
    ///
    /// * [`StormError::LayerNotFound`] if the layer or its `.dbf` is missing
    /// * [`StormError::Marker`] if the `.prj` names an unsupported CRS
    /// * [`StormError::Shapefile`] / [`StormError::Dbase`] if decoding fails
    /// * [`StormError::Geometry`] if a shape has no geometry equivalent
    pub fn read_layer(&mut self, layer: Layer) -> Result<Vec<ShapeRecord>, StormError> {
        let shp_name = self.layer_name(layer)?;
        let dbf_name = self
            .sibling(&shp_name, "dbf")
            .ok_or_else(|| StormError::LayerNotFound {
                layer: format!("{layer} attributes"),
                url: self.url.clone(),
            })?;

        let crs = match self.sibling(&shp_name, "prj") {
            Some(prj_name) => {
                let prj = self.read_entry(&prj_name)?;
                Crs::from_prj(&String::from_utf8_lossy(&prj))?
            }
            None => Crs::Wgs84,
        };

        let shp = self.read_entry(&shp_name)?;
        let dbf = self.read_entry(&dbf_name)?;
        let records = read_records(layer, shp, dbf, crs)?;

        log::debug!(
            "Read {} features from {shp_name} ({crs}) in {}",
            records.len(),
            self.url
        );
        Ok(records)
    }
}

/// Decodes a shapefile and its attribute table.
///
/// Null shapes are skipped.
///
/// # Errors
///
/// * [`StormError::Shapefile`] / [`StormError::Dbase`] if decoding fails
/// * [`StormError::Geometry`] if a shape has no geometry equivalent
pub fn read_records(
    layer: Layer,
    shp: Vec<u8>,
    dbf: Vec<u8>,
    crs: Crs,
) -> Result<Vec<ShapeRecord>, StormError> {
    let shape_reader = shapefile::ShapeReader::new(Cursor::new(shp))?;
    let dbase_reader = shapefile::dbase::Reader::new(Cursor::new(dbf))?;
    let mut reader = shapefile::Reader::new(shape_reader, dbase_reader);

    let mut records = Vec::new();
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;
        if matches!(shape, shapefile::Shape::NullShape) {
            continue;
        }

        let geometry =
            geo::Geometry::<f64>::try_from(shape).map_err(|e| StormError::Geometry {
                layer: layer.to_string(),
                message: e.to_string(),
            })?;

        let attributes = std::collections::HashMap::<String, FieldValue>::from(record)
            .into_iter()
            .filter_map(|(name, value)| field_text(value).map(|text| (name, text)))
            .collect();

        records.push(ShapeRecord {
            geometry: crs.to_wgs84(geometry),
            attributes,
        });
    }

    Ok(records)
}

/// Renders a DBF field as text. Whole numbers print without a fraction
/// (`9.0` becomes `"9"`).
#[must_use]
pub fn field_text(value: FieldValue) -> Option<String> {
    match value {
        FieldValue::Character(text) => text.map(|text| text.trim().to_string()),
        FieldValue::Memo(text) => Some(text.trim().to_string()),
        FieldValue::Numeric(number) => number.map(|n| n.to_string()),
        FieldValue::Float(number) => number.map(|n| n.to_string()),
        FieldValue::Double(number) | FieldValue::Currency(number) => Some(number.to_string()),
        FieldValue::Integer(number) => Some(number.to_string()),
        FieldValue::Logical(flag) => flag.map(|flag| flag.to_string()),
        _ => None,
    }
}
