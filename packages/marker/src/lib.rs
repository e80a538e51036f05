#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Locator-map marker pipeline.
//!
//! Turns a [`Dataset`] of loosely typed input rows into the exact marker
//! list the Datawrapper locator-map API accepts: rows are reprojected to
//! WGS84, validated, resolved against the point/area templates, and merged
//! with any caller-authored supplemental shapes before ids are assigned.

pub mod builder;
pub mod crs;
pub mod dataset;
pub mod normalize;
pub mod validate;

pub use builder::MarkerBuilder;
pub use crs::Crs;
pub use dataset::Dataset;
pub use normalize::normalize;

use dw_graphics_marker_models::MissingField;
use thiserror::Error;

/// Errors that can occur while building or normalizing markers.
#[derive(Debug, Error)]
pub enum MarkerError {
    /// An enumerated field holds a value outside its allow-list.
    #[error("Invalid value {value:?} for {field}; allowed values: {}", .allowed.join(", "))]
    InvalidMarkerData {
        /// Field name as it appears in the dataset.
        field: String,
        /// The offending value.
        value: String,
        /// Every accepted value, in display order.
        allowed: Vec<String>,
    },

    /// A color field is not a `#rrggbb` hex code.
    #[error("Invalid hex code {value:?} for {field}; expected a color like #C42127")]
    InvalidHexcode {
        /// Field name as it appears in the dataset.
        field: String,
        /// The offending value.
        value: String,
    },

    /// A row lacks data its marker type requires.
    #[error("Missing {0}")]
    MissingData(MissingField),

    /// A geometry is unusable for the row's marker type.
    #[error("Geometry error: {message}")]
    Geometry {
        /// Description of what went wrong.
        message: String,
    },

    /// The icon registry has no icon with this name.
    #[error("Icon not found: {name}")]
    IconNotFound {
        /// The requested icon name.
        name: String,
    },

    /// A numeric column holds text that is not a number.
    #[error("Invalid number {value:?} for {field}")]
    InvalidNumber {
        /// Field name as it appears in the dataset.
        field: String,
        /// The offending value.
        value: String,
    },

    /// The dataset is in a coordinate reference system that cannot be
    /// reprojected to WGS84.
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    /// The supplemental shape document is malformed.
    #[error("Invalid supplemental shape: {message}")]
    SupplementalShape {
        /// Description of what went wrong.
        message: String,
    },

    /// Building a specific row failed.
    #[error("Row {index}: {source}")]
    Row {
        /// Zero-based row index in the dataset.
        index: usize,
        /// The underlying failure.
        source: Box<Self>,
    },

    /// File I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// `GeoJSON` parsing or conversion failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] Box<geojson::Error>),
}

impl From<geojson::Error> for MarkerError {
    fn from(e: geojson::Error) -> Self {
        Self::GeoJson(Box::new(e))
    }
}

impl MarkerError {
    /// Wraps this error with the index of the row that produced it.
    #[must_use]
    pub fn at_row(self, index: usize) -> Self {
        Self::Row {
            index,
            source: Box::new(self),
        }
    }

    /// Strips any [`Self::Row`] wrappers, returning the underlying error.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Row { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_marker_data_lists_allowed_values() {
        let err = MarkerError::InvalidMarkerData {
            field: "anchor".to_string(),
            value: "middle".to_string(),
            allowed: vec!["middle-left".to_string(), "middle-right".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("\"middle\""));
        assert!(message.contains("anchor"));
        assert!(message.contains("middle-left, middle-right"));
    }

    #[test]
    fn row_wrapper_exposes_root_error() {
        let err = MarkerError::MissingData(MissingField::Coordinates).at_row(3);
        assert!(err.to_string().starts_with("Row 3: Missing coordinates"));
        assert!(matches!(
            err.root(),
            MarkerError::MissingData(MissingField::Coordinates)
        ));
    }
}
