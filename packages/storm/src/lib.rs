#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! NHC storm ingestion.
//!
//! Reads the current state of each requested storm from an NHC RSS feed,
//! downloads its 5-day forecast and best-track shapefile archives, and
//! turns the layers into styled input rows for the locator-map marker
//! pipeline. Storms are processed one at a time.

pub mod archive;
pub mod config;
pub mod dissolve;
pub mod feed;
pub mod ingest;
pub mod rows;
pub mod timestamp;

pub use config::{FormatPolicy, HourPadding, StormConfig};
pub use ingest::{StormBundle, StormIngestor};

use thiserror::Error;

/// Errors that can occur during storm ingestion.
#[derive(Debug, Error)]
pub enum StormError {
    /// The feed has no cyclone matching the requested storm, or the feed
    /// itself could not be found.
    #[error("No storm data for {storm_id}: {reason}")]
    NoStormData {
        /// Requested ATCF id.
        storm_id: String,
        /// What was missing.
        reason: String,
    },

    /// An archive could not be downloaded. NHC removes archives for storms
    /// that are no longer active, so a refusal usually means it has expired.
    #[error("Archive {url} unavailable ({reason}); it has likely expired or the host is unreachable")]
    ArchiveUnavailable {
        /// Archive URL.
        url: String,
        /// HTTP status or transport failure.
        reason: String,
    },

    /// An archive has no file for the requested layer.
    #[error("Layer {layer} not found in {url}")]
    LayerNotFound {
        /// Layer name.
        layer: String,
        /// Archive URL.
        url: String,
    },

    /// Shapefile decoding failed.
    #[error("Shapefile error: {0}")]
    Shapefile(#[from] shapefile::Error),

    /// Attribute table decoding failed.
    #[error("DBF error: {0}")]
    Dbase(#[from] shapefile::dbase::Error),

    /// A shape could not be converted to a geometry.
    #[error("Geometry error in {layer}: {message}")]
    Geometry {
        /// Layer name.
        layer: String,
        /// Description of what went wrong.
        message: String,
    },

    /// Zip archive decoding failed.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The RSS feed is malformed.
    #[error("Feed error: {message}")]
    Feed {
        /// Description of what went wrong.
        message: String,
    },

    /// XML parsing failed.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A forecast timestamp could not be parsed or localized.
    #[error("Timestamp error: {message}")]
    Timestamp {
        /// Description of what went wrong.
        message: String,
    },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// File I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration is invalid.
    #[error("Config error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },

    /// Reprojecting or building rows failed.
    #[error("Marker error: {0}")]
    Marker(#[from] dw_graphics_marker::MarkerError),
}

impl StormError {
    /// Returns `true` for the condition callers may skip: the storm is not
    /// in its feed.
    #[must_use]
    pub const fn is_no_storm_data(&self) -> bool {
        matches!(self, Self::NoStormData { .. })
    }
}
